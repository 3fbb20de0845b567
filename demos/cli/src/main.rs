use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dashboard_core::{
    DashboardConfig, DashboardSnapshot, HistoryEntry, LabResult, PatientSummary, ReportView,
    TreatmentPlan,
};
use dashboard_fhir::build_dashboard_str;

const SAMPLE_RECORD: &str = include_str!("../data/sample_patient.json");

#[derive(Parser, Debug)]
#[command(
    name = "dashboard-cli",
    about = "Render a patient dashboard from a clinical record envelope."
)]
struct Args {
    /// Path to the envelope JSON file; the bundled sample record is used
    /// when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Artificial load delay in milliseconds, mirroring the original
    /// dashboard's simulated fetch.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Print the snapshot as JSON instead of the rendered dashboard.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let data = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read file {:?}", path))?,
        None => SAMPLE_RECORD.to_string(),
    };

    if args.delay_ms > 0 {
        std::thread::sleep(Duration::from_millis(args.delay_ms));
    }

    let snapshot = build_dashboard_str(&data, &DashboardConfig::default())?;
    tracing::debug!(
        labs = snapshot.labs.len(),
        reports = snapshot.reports.len(),
        history = snapshot.history.len(),
        "dashboard snapshot derived"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        render(&snapshot);
    }

    Ok(())
}

fn render(snapshot: &DashboardSnapshot) {
    println!("Patient Dashboard");
    println!("Generated at: {}", snapshot.generated_at);
    println!();

    match &snapshot.patient {
        Some(patient) => render_patient(patient),
        None => println!("Patient Information Unavailable"),
    }

    println!();
    render_labs(&snapshot.labs);
    println!();
    render_history(&snapshot.history);
    println!();
    render_reports(&snapshot.reports);
    println!();
    render_treatments(&snapshot.treatments);

    if let Some(confidence) = &snapshot.confidence {
        println!();
        println!(
            "Confidence Assessment: {} ({}/10)",
            confidence.tier.label(),
            confidence.score
        );
        if let Some(rationale) = &confidence.rationale {
            println!("  Rationale: {rationale}");
        }
    }
}

fn render_patient(patient: &PatientSummary) {
    println!("{}", patient.full_name);
    println!("  ID: {}", patient.identifier.as_deref().unwrap_or("N/A"));
    println!(
        "  Gender: {}",
        patient.gender.as_deref().unwrap_or("Not specified")
    );
    if let Some(birth_date) = patient.birth_date {
        match patient.age {
            Some(age) => println!("  Born: {birth_date} ({age} years old)"),
            None => println!("  Born: {birth_date}"),
        }
    }
    if let Some(phone) = &patient.phone {
        println!("  Phone: {phone}");
    }
    if let Some(email) = &patient.email {
        println!("  Email: {email}");
    }
    if patient.address_line.is_some() || patient.country.is_some() {
        println!(
            "  Address: {} {}",
            patient.address_line.as_deref().unwrap_or("Address not specified"),
            patient.country.as_deref().unwrap_or("")
        );
    }
}

fn render_labs(labs: &[LabResult]) {
    println!("Lab Results & Vital Signs ({})", count(labs.len(), "result"));
    if labs.is_empty() {
        println!("  No lab results available");
        return;
    }
    for lab in labs {
        match lab {
            LabResult::BloodPressure(reading) => {
                println!(
                    "  Blood Pressure: {}/{} {} [{}]",
                    number_or_dash(reading.systolic),
                    number_or_dash(reading.diastolic),
                    reading.unit.as_deref().unwrap_or(""),
                    reading.status.label()
                );
            }
            LabResult::Scalar(reading) => {
                print!(
                    "  {}: {} {} [{}]",
                    reading.name,
                    reading.value,
                    reading.unit.as_deref().unwrap_or(""),
                    reading.status.label()
                );
                if let Some(reference) = &reading.reference {
                    print!(
                        "  normal {} - {} ({:.0}%)",
                        number_or_dash(reference.low),
                        number_or_dash(reference.high),
                        reading.progress
                    );
                }
                println!();
            }
        }
    }
}

fn render_history(history: &[HistoryEntry]) {
    println!("Medical History ({})", count(history.len(), "record"));
    if history.is_empty() {
        println!("  No medical history available");
        return;
    }
    for entry in history {
        match entry {
            HistoryEntry::Parsed(record) => {
                println!(
                    "  {}  {} [{}]",
                    record.encounter_date,
                    record.diagnosis,
                    record.severity.label()
                );
                println!("    {}", record.summary);
            }
            HistoryEntry::Unparsed { excerpt, .. } => {
                println!("  Unable to parse medical record");
                println!("    Raw data: {excerpt}...");
            }
        }
    }
}

fn render_reports(reports: &[ReportView]) {
    println!("Diagnostic Reports ({})", count(reports.len(), "report"));
    if reports.is_empty() {
        println!("  No diagnostic reports available");
        return;
    }
    for report in reports {
        println!(
            "  {} ({}, {})",
            report.name,
            report.category,
            report.status.as_deref().unwrap_or("unknown")
        );
        if let Some(issued_at) = report.issued_at {
            println!("    Report date: {issued_at}");
        }
        if let Some(conclusion) = &report.conclusion {
            let severity = report
                .conclusion_severity
                .map(|tier| tier.label())
                .unwrap_or("routine");
            println!("    Conclusion [{severity}]: {conclusion}");
        }
        if !report.results.is_empty() {
            println!("    Associated results: {}", report.results.join(", "));
        }
        if let Some(form) = &report.presented_form {
            println!(
                "    Attachment: {} ({})",
                form.title.as_deref().unwrap_or("Untitled"),
                form.content_type.as_deref().unwrap_or("unknown format")
            );
            if let Some(size) = form.size_bytes {
                println!("      Size: {:.1} KB", size as f64 / 1024.0);
            }
        }
    }
}

fn render_treatments(treatments: &[TreatmentPlan]) {
    println!(
        "Treatment Recommendations ({})",
        count(treatments.len(), "recommendation")
    );
    if treatments.is_empty() {
        println!("  No treatment recommendations available");
        return;
    }
    for (index, treatment) in treatments.iter().enumerate() {
        let framing = if treatment.lifestyle {
            "Lifestyle"
        } else {
            "Medication"
        };
        println!("  {}. [{framing}]", index + 1);
        if let Some(medication) = &treatment.medication {
            println!("     {} (dosage: {})", medication.name, medication.dose);
        }
        println!("     {}", treatment.text);
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn number_or_dash(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_else(|| "-".to_string())
}
