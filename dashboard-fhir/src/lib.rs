//! Patient-record envelope to `DashboardSnapshot` converter.
//!
//! Consumes a JSON envelope holding a FHIR-like bundle plus loosely
//! structured history/treatment strings and derives the classified view
//! model in `dashboard-core`. All free-text severity classification here is
//! keyword-based and heuristic, not clinically authoritative.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use dashboard_core::{
    BloodPressureReading, ConfidenceAssessment, ConfidenceTier, DashboardConfig, DashboardError,
    DashboardSnapshot, HistoryEntry, HistoryRecord, LabResult, Medication, PatientSummary,
    PresentedForm, ReferenceRange, ReportView, ScalarReading, SeverityTier, TreatmentPlan,
    ValueStatus,
};

/// Derive a dashboard snapshot from an envelope JSON string.
pub fn build_dashboard_str(
    envelope_json: &str,
    config: &DashboardConfig,
) -> Result<DashboardSnapshot, DashboardError> {
    let value: Value =
        serde_json::from_str(envelope_json).map_err(|err| DashboardError::Parse(err.to_string()))?;
    build_dashboard_value(&value, config)
}

/// Derive a dashboard snapshot from an envelope `serde_json::Value`.
///
/// Every envelope field is optional; an absent bundle or an empty section
/// yields the corresponding "no data" state rather than an error.
pub fn build_dashboard_value(
    envelope: &Value,
    config: &DashboardConfig,
) -> Result<DashboardSnapshot, DashboardError> {
    if !envelope.is_object() {
        return Err(DashboardError::MissingData);
    }

    let bundle = envelope.get("recent_patient_record");
    if let Some(bundle) = bundle {
        let bundle_type = bundle
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(DashboardError::MissingData)?;
        if bundle_type != "Bundle" {
            return Err(DashboardError::Parse(format!(
                "expected resourceType Bundle, received {bundle_type}"
            )));
        }
    }

    let today = config.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let patient = entries_of_kind(bundle, "Patient")
        .into_iter()
        .next()
        .map(|resource| summarize_patient(resource, today));

    let labs: Vec<LabResult> = entries_of_kind(bundle, "Observation")
        .into_iter()
        .filter_map(summarize_observation)
        .collect();

    let reports: Vec<ReportView> = entries_of_kind(bundle, "DiagnosticReport")
        .into_iter()
        .map(summarize_report)
        .collect();

    let history: Vec<HistoryEntry> = envelope
        .get("medical_history")
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(Value::as_str)
                .map(|raw| parse_history_entry(raw, config.history_excerpt_len))
                .collect()
        })
        .unwrap_or_default();

    let treatments: Vec<TreatmentPlan> = envelope
        .get("treatment_options")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(Value::as_str)
                .map(parse_treatment)
                .collect()
        })
        .unwrap_or_default();

    let confidence = envelope
        .get("score")
        .and_then(Value::as_f64)
        .map(|score| ConfidenceAssessment {
            score,
            tier: ConfidenceTier::from_score(score),
            rationale: envelope
                .get("rationale")
                .and_then(Value::as_str)
                .map(str::to_string),
        });

    Ok(DashboardSnapshot::new(
        patient, labs, reports, history, treatments, confidence,
    ))
}

/// Ordered resources of one kind from a bundle's entries.
///
/// Absent bundle, absent `entry`, or no matching entries all produce an
/// empty sequence; consumers take the first Patient match and treat a miss
/// as "information unavailable".
pub fn entries_of_kind<'a>(bundle: Option<&'a Value>, kind: &str) -> Vec<&'a Value> {
    let Some(entries) = bundle
        .and_then(|bundle| bundle.get("entry"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| entry.get("resource"))
        .filter(|resource| resource.get("resourceType").and_then(Value::as_str) == Some(kind))
        .collect()
}

/// Completed years between a birth date and a reference date.
///
/// Year difference, minus one when the birthday has not yet occurred in the
/// reference year. Exactly 0 on the birthday itself.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Display name from optional name parts; both absent yields the fixed
/// placeholder.
pub fn display_name(given: Option<&str>, family: Option<&str>) -> String {
    let full = format!("{} {}", given.unwrap_or(""), family.unwrap_or(""))
        .trim()
        .to_string();
    if full.is_empty() {
        "Unknown Patient".to_string()
    } else {
        full
    }
}

fn summarize_patient(resource: &Value, today: NaiveDate) -> PatientSummary {
    let name = resource
        .get("name")
        .and_then(Value::as_array)
        .and_then(|names| names.first());
    let given = name
        .and_then(|name| name.get("given"))
        .and_then(Value::as_array)
        .and_then(|given| given.first())
        .and_then(Value::as_str);
    let family = name
        .and_then(|name| name.get("family"))
        .and_then(Value::as_str);

    let birth_date = resource
        .get("birthDate")
        .and_then(Value::as_str)
        .and_then(parse_date);

    PatientSummary {
        full_name: display_name(given, family),
        identifier: resource
            .get("identifier")
            .and_then(Value::as_array)
            .and_then(|identifiers| identifiers.first())
            .and_then(|identifier| identifier.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string),
        gender: resource
            .get("gender")
            .and_then(Value::as_str)
            .map(str::to_string),
        birth_date,
        age: birth_date.map(|birth| age_on(birth, today)),
        phone: telecom_value(resource, "phone"),
        email: telecom_value(resource, "email"),
        address_line: resource
            .get("address")
            .and_then(Value::as_array)
            .and_then(|addresses| addresses.first())
            .and_then(|address| address.get("line"))
            .and_then(Value::as_array)
            .and_then(|lines| lines.first())
            .and_then(Value::as_str)
            .map(str::to_string),
        country: resource
            .get("address")
            .and_then(Value::as_array)
            .and_then(|addresses| addresses.first())
            .and_then(|address| address.get("country"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn telecom_value(resource: &Value, system: &str) -> Option<String> {
    let telecoms = resource.get("telecom")?.as_array()?;
    telecoms.iter().find_map(|telecom| {
        if telecom.get("system").and_then(Value::as_str) == Some(system) {
            telecom
                .get("value")
                .and_then(Value::as_str)
                .map(str::to_string)
        } else {
            None
        }
    })
}

fn summarize_observation(resource: &Value) -> Option<LabResult> {
    let measured_at = resource
        .get("effectiveDateTime")
        .and_then(Value::as_str)
        .and_then(parse_datetime);
    let display = coding_display(resource.get("code"));

    if let Some(components) = resource.get("component").and_then(Value::as_array) {
        let is_pressure = display
            .as_deref()
            .map(|display| display.to_lowercase().contains("pressure"))
            .unwrap_or(false);
        if is_pressure {
            let systolic = component_value(components, "systolic");
            let diastolic = component_value(components, "diastolic");
            return Some(LabResult::BloodPressure(BloodPressureReading {
                systolic,
                diastolic,
                unit: component_unit(components),
                status: classify_blood_pressure(systolic, diastolic),
                measured_at,
            }));
        }
    }

    let Some(quantity) = resource.get("valueQuantity") else {
        debug!("skipping observation without a scalar value or pressure components");
        return None;
    };
    let value = quantity.get("value").and_then(Value::as_f64)?;

    // The envelope nests the reference range inside valueQuantity; accept
    // the resource-level placement as well.
    let reference = quantity
        .get("referenceRange")
        .or_else(|| resource.get("referenceRange"))
        .and_then(Value::as_array)
        .and_then(|ranges| ranges.first())
        .map(parse_reference_range);

    Some(LabResult::Scalar(ScalarReading {
        name: display.unwrap_or_else(|| "Unknown Test".to_string()),
        value,
        unit: quantity
            .get("unit")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: classify_scalar(value, reference.as_ref()),
        progress: range_progress(value, reference.as_ref()),
        reference,
        measured_at,
    }))
}

fn component_value(components: &[Value], label: &str) -> Option<f64> {
    components.iter().find_map(|component| {
        let display = component
            .get("code")
            .and_then(|code| code.get("display"))
            .and_then(Value::as_str)?;
        if display.to_lowercase().contains(label) {
            component
                .get("valueQuantity")
                .and_then(|quantity| quantity.get("value"))
                .and_then(Value::as_f64)
        } else {
            None
        }
    })
}

fn component_unit(components: &[Value]) -> Option<String> {
    components.iter().find_map(|component| {
        component
            .get("valueQuantity")
            .and_then(|quantity| quantity.get("unit"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn parse_reference_range(value: &Value) -> ReferenceRange {
    ReferenceRange {
        low: value
            .get("low")
            .and_then(|bound| bound.get("value"))
            .and_then(Value::as_f64),
        high: value
            .get("high")
            .and_then(|bound| bound.get("value"))
            .and_then(Value::as_f64),
    }
}

/// Classify a scalar measurement against its reference range.
///
/// A bound only participates when present; no range at all is
/// unclassifiable and reads as normal.
pub fn classify_scalar(value: f64, range: Option<&ReferenceRange>) -> ValueStatus {
    let Some(range) = range else {
        return ValueStatus::Normal;
    };
    if let Some(low) = range.low {
        if value < low {
            return ValueStatus::Low;
        }
    }
    if let Some(high) = range.high {
        if value > high {
            return ValueStatus::High;
        }
    }
    ValueStatus::Normal
}

/// Classify a compound blood-pressure reading against fixed clinical
/// thresholds (140/90 high, 90/60 low), independent of any reference range.
///
/// Either bound alone trips the tier; a missing component fails every
/// comparison.
pub fn classify_blood_pressure(systolic: Option<f64>, diastolic: Option<f64>) -> ValueStatus {
    let above = |reading: Option<f64>, bound: f64| reading.map(|v| v > bound).unwrap_or(false);
    let below = |reading: Option<f64>, bound: f64| reading.map(|v| v < bound).unwrap_or(false);

    if above(systolic, 140.0) || above(diastolic, 90.0) {
        ValueStatus::High
    } else if below(systolic, 90.0) || below(diastolic, 60.0) {
        ValueStatus::Low
    } else {
        ValueStatus::Normal
    }
}

/// Position of a value within its reference range as a percentage,
/// clamped to `[0, 100]`. Missing bounds default to 0/100; no range or a
/// zero-width range yields the midpoint.
pub fn range_progress(value: f64, range: Option<&ReferenceRange>) -> f64 {
    let Some(range) = range else {
        return 50.0;
    };
    let low = range.low.unwrap_or(0.0);
    let high = range.high.unwrap_or(100.0);
    let width = high - low;
    if width == 0.0 {
        return 50.0;
    }
    ((value - low) / width * 100.0).clamp(0.0, 100.0)
}

fn summarize_report(resource: &Value) -> ReportView {
    let conclusion = resource
        .get("conclusion")
        .and_then(Value::as_str)
        .map(str::to_string);

    ReportView {
        name: coding_display(resource.get("code"))
            .unwrap_or_else(|| "Diagnostic Report".to_string()),
        category: resource
            .get("category")
            .and_then(Value::as_array)
            .and_then(|categories| categories.first())
            .and_then(|category| category.get("coding"))
            .and_then(Value::as_array)
            .and_then(|codings| codings.first())
            .and_then(|coding| coding.get("code"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        status: resource
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        conclusion_severity: conclusion.as_deref().map(classify_conclusion),
        conclusion,
        issued_at: resource
            .get("effectiveDateTime")
            .and_then(Value::as_str)
            .and_then(parse_datetime),
        results: resource
            .get("result")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|result| result.get("reference"))
                    .filter_map(Value::as_str)
                    .map(|reference| {
                        reference
                            .split_once('/')
                            .map(|(_, id)| id.to_string())
                            .unwrap_or_else(|| reference.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default(),
        presented_form: resource
            .get("presentedForm")
            .and_then(Value::as_array)
            .and_then(|forms| forms.first())
            .map(parse_presented_form),
    }
}

fn parse_presented_form(value: &Value) -> PresentedForm {
    PresentedForm {
        title: value
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        content_type: value
            .get("contentType")
            .and_then(Value::as_str)
            .map(str::to_string),
        size_bytes: value.get("size").and_then(Value::as_u64),
        url: value.get("url").and_then(Value::as_str).map(str::to_string),
    }
}

fn coding_display(value: Option<&Value>) -> Option<String> {
    value?
        .get("coding")
        .and_then(Value::as_array)
        .and_then(|codings| codings.first())
        .and_then(|coding| coding.get("display"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Tier for a free-text clinical conclusion. Critical keywords take
/// precedence over warning keywords, which take precedence over normal.
pub fn classify_conclusion(conclusion: &str) -> SeverityTier {
    let normalized = conclusion.to_lowercase();
    if normalized.contains("critical")
        || normalized.contains("urgent")
        || normalized.contains("severe")
    {
        SeverityTier::Critical
    } else if normalized.contains("elevated")
        || normalized.contains("high")
        || normalized.contains("abnormal")
    {
        SeverityTier::Warning
    } else if normalized.contains("normal") || normalized.contains("within range") {
        SeverityTier::Normal
    } else {
        SeverityTier::Routine
    }
}

/// Tier for a history diagnosis label, same precedence order as
/// [`classify_conclusion`].
pub fn classify_diagnosis(diagnosis: &str) -> SeverityTier {
    let normalized = diagnosis.to_lowercase();
    if normalized.contains("critical") || normalized.contains("severe") {
        SeverityTier::Critical
    } else if normalized.contains("hypertension") || normalized.contains("diabetes") {
        SeverityTier::Warning
    } else {
        SeverityTier::Routine
    }
}

#[derive(Deserialize)]
struct RawHistoryRecord {
    encounter_date: String,
    diagnosis: String,
    summary: String,
}

/// Decode one opaque history string. Failure keeps the record as an
/// unparseable entry with its raw text; siblings are unaffected.
pub fn parse_history_entry(raw: &str, excerpt_len: usize) -> HistoryEntry {
    match serde_json::from_str::<RawHistoryRecord>(raw) {
        Ok(record) => HistoryEntry::Parsed(HistoryRecord {
            severity: classify_diagnosis(&record.diagnosis),
            encounter_date: record.encounter_date,
            diagnosis: record.diagnosis,
            summary: record.summary,
        }),
        Err(err) => {
            debug!("history record did not decode, keeping raw text: {err}");
            HistoryEntry::Unparsed {
                raw: raw.to_string(),
                excerpt: raw.chars().take(excerpt_len).collect(),
            }
        }
    }
}

static MEDICATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\w+)\s+(\d+)\s*mg").expect("medication pattern is valid"));

/// Best-effort parse of a treatment recommendation string.
///
/// Segment 0 of the `;`-split is the primary description; the medication
/// pattern and the lifestyle keywords are checked against it independently,
/// so any combination of the two can hold.
pub fn parse_treatment(raw: &str) -> TreatmentPlan {
    let mut segments = raw.split(';');
    let primary = segments.next().unwrap_or("");
    let details: Vec<String> = segments.map(str::to_string).collect();

    let medication = MEDICATION_PATTERN.captures(primary).map(|caps| Medication {
        name: caps[1].to_string(),
        dose: format!("{} mg", &caps[2]),
    });

    let normalized = primary.to_lowercase();
    let lifestyle = normalized.contains("lifestyle")
        || normalized.contains("diet")
        || normalized.contains("exercise");

    TreatmentPlan {
        text: raw.to_string(),
        medication,
        lifestyle,
        details,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn age_counts_completed_years() {
        let birth = date("1982-03-12");
        assert_eq!(age_on(birth, date("2025-08-22")), 43);
        assert_eq!(age_on(birth, date("2025-03-11")), 42);
        assert_eq!(age_on(birth, date("2025-03-12")), 43);
        assert_eq!(age_on(birth, date("1982-03-12")), 0);
        assert_eq!(age_on(birth, date("1983-03-11")), 0);
        assert_eq!(age_on(birth, date("1983-03-12")), 1);
    }

    #[test]
    fn display_name_handles_missing_parts() {
        assert_eq!(display_name(Some("Rajesh"), Some("Iyer")), "Rajesh Iyer");
        assert_eq!(display_name(Some("Rajesh"), None), "Rajesh");
        assert_eq!(display_name(None, Some("Iyer")), "Iyer");
        assert_eq!(display_name(None, None), "Unknown Patient");
    }

    #[test]
    fn scalar_classification_against_range() {
        let range = |low, high| ReferenceRange { low, high };
        assert_eq!(
            classify_scalar(238.0, Some(&range(Some(0.0), Some(200.0)))),
            ValueStatus::High
        );
        assert_eq!(
            classify_scalar(39.0, Some(&range(Some(40.0), Some(100.0)))),
            ValueStatus::Low
        );
        assert_eq!(
            classify_scalar(6.1, Some(&range(Some(0.0), Some(5.0)))),
            ValueStatus::High
        );
        assert_eq!(classify_scalar(6.1, None), ValueStatus::Normal);
        // Values on a bound are inside the range.
        assert_eq!(
            classify_scalar(40.0, Some(&range(Some(40.0), Some(100.0)))),
            ValueStatus::Normal
        );
        // Only present bounds participate.
        assert_eq!(
            classify_scalar(500.0, Some(&range(Some(40.0), None))),
            ValueStatus::Normal
        );
    }

    #[test]
    fn blood_pressure_uses_or_of_either_bound() {
        // 138/88 trips neither strict threshold.
        assert_eq!(
            classify_blood_pressure(Some(138.0), Some(88.0)),
            ValueStatus::Normal
        );
        assert_eq!(
            classify_blood_pressure(Some(141.0), Some(80.0)),
            ValueStatus::High
        );
        assert_eq!(
            classify_blood_pressure(Some(120.0), Some(91.0)),
            ValueStatus::High
        );
        assert_eq!(
            classify_blood_pressure(Some(89.0), Some(70.0)),
            ValueStatus::Low
        );
        assert_eq!(
            classify_blood_pressure(Some(100.0), Some(59.0)),
            ValueStatus::Low
        );
        // Missing components fail every comparison.
        assert_eq!(classify_blood_pressure(None, None), ValueStatus::Normal);
        assert_eq!(
            classify_blood_pressure(Some(150.0), None),
            ValueStatus::High
        );
    }

    #[test]
    fn progress_maps_value_into_range() {
        let range = |low, high| ReferenceRange { low, high };
        assert_eq!(
            range_progress(70.0, Some(&range(Some(0.0), Some(100.0)))),
            70.0
        );
        // Degenerate zero-width range yields the midpoint.
        assert_eq!(
            range_progress(50.0, Some(&range(Some(50.0), Some(50.0)))),
            50.0
        );
        assert_eq!(range_progress(70.0, None), 50.0);
        // Out-of-range values clamp.
        assert_eq!(
            range_progress(238.0, Some(&range(Some(0.0), Some(200.0)))),
            100.0
        );
        assert_eq!(
            range_progress(39.0, Some(&range(Some(40.0), Some(100.0)))),
            0.0
        );
    }

    #[test]
    fn history_decode_failure_is_isolated() {
        let valid = r#"{"encounter_date":"2025-05-20","diagnosis":"Hypertension","summary":"Elevated blood pressure readings."}"#;
        let invalid = "Scanned legacy record: BP logs 2019-2021 (unstructured)";

        match parse_history_entry(valid, 100) {
            HistoryEntry::Parsed(record) => {
                assert_eq!(record.encounter_date, "2025-05-20");
                assert_eq!(record.diagnosis, "Hypertension");
                assert_eq!(record.severity, SeverityTier::Warning);
            }
            other => panic!("expected parsed entry, got {other:?}"),
        }

        match parse_history_entry(invalid, 100) {
            HistoryEntry::Unparsed { raw, excerpt } => {
                assert_eq!(raw, invalid);
                assert_eq!(excerpt, invalid);
            }
            other => panic!("expected unparsed entry, got {other:?}"),
        }
    }

    #[test]
    fn history_excerpt_truncates_long_raw_text() {
        let raw = "x".repeat(250);
        match parse_history_entry(&raw, 100) {
            HistoryEntry::Unparsed { raw: kept, excerpt } => {
                assert_eq!(kept.len(), 250);
                assert_eq!(excerpt.len(), 100);
            }
            other => panic!("expected unparsed entry, got {other:?}"),
        }
    }

    #[test]
    fn treatment_medication_and_lifestyle_are_independent() {
        let medicated = parse_treatment(
            "Atorvastatin 80 mg/day as first-line therapy per NICE guidelines for LDL management; aim for an LDL target of <1.4 mmol/L.",
        );
        let medication = medicated.medication.expect("medication detected");
        assert_eq!(medication.name, "Atorvastatin");
        assert_eq!(medication.dose, "80 mg");
        assert!(!medicated.lifestyle);
        assert_eq!(
            medicated.details,
            vec![" aim for an LDL target of <1.4 mmol/L.".to_string()]
        );

        let lifestyle = parse_treatment(
            "Lifestyle measures including diet rich in fruits and vegetables, exercise of 150 minutes per week, and salt reduction to control mild hypertension.",
        );
        assert!(lifestyle.medication.is_none());
        assert!(lifestyle.lifestyle);
        assert!(lifestyle.details.is_empty());

        let both = parse_treatment("Dietary changes alongside Metformin 500 mg twice daily");
        assert!(both.lifestyle);
        assert_eq!(both.medication.expect("medication detected").name, "Metformin");

        let neither = parse_treatment("Schedule follow-up echocardiogram in 6 months");
        assert!(!neither.lifestyle);
        assert!(neither.medication.is_none());
    }

    #[test]
    fn conclusion_tiers_follow_precedence() {
        assert_eq!(
            classify_conclusion("Critically elevated troponin, urgent review"),
            SeverityTier::Critical
        );
        assert_eq!(
            classify_conclusion("Elevated LDL cholesterol"),
            SeverityTier::Warning
        );
        assert_eq!(
            classify_conclusion("All values within range"),
            SeverityTier::Normal
        );
        // "abnormal" must hit the warning tier before the "normal" substring.
        assert_eq!(
            classify_conclusion("Abnormal rhythm noted"),
            SeverityTier::Warning
        );
        assert_eq!(
            classify_conclusion("Follow up in 3 months"),
            SeverityTier::Routine
        );
    }

    #[test]
    fn diagnosis_tiers_follow_precedence() {
        assert_eq!(
            classify_diagnosis("Severe hypertension"),
            SeverityTier::Critical
        );
        assert_eq!(classify_diagnosis("Hypertension"), SeverityTier::Warning);
        assert_eq!(
            classify_diagnosis("Type 2 Diabetes"),
            SeverityTier::Warning
        );
        assert_eq!(classify_diagnosis("Seasonal asthma"), SeverityTier::Routine);
    }

    #[test]
    fn selector_filters_by_kind_preserving_order() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                { "resource": { "resourceType": "Observation", "id": "obs-1" } },
                { "resource": { "resourceType": "Patient", "id": "p-1" } },
                { "resource": { "resourceType": "Medication", "id": "m-1" } },
                { "resource": { "resourceType": "Observation", "id": "obs-2" } }
            ]
        });

        let observations = entries_of_kind(Some(&bundle), "Observation");
        let ids: Vec<&str> = observations
            .iter()
            .filter_map(|resource| resource.get("id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids, vec!["obs-1", "obs-2"]);

        assert_eq!(entries_of_kind(Some(&bundle), "DiagnosticReport").len(), 0);
        assert!(entries_of_kind(None, "Patient").is_empty());
    }

    #[test]
    fn empty_envelope_builds_empty_snapshot() {
        let snapshot =
            build_dashboard_value(&json!({}), &DashboardConfig::default()).expect("builds");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn non_object_envelope_is_missing_data() {
        let err = build_dashboard_value(&json!([1, 2, 3]), &DashboardConfig::default())
            .expect_err("rejected");
        assert!(matches!(err, DashboardError::MissingData));
    }

    #[test]
    fn non_bundle_record_is_a_parse_error() {
        let envelope = json!({ "recent_patient_record": { "resourceType": "Patient" } });
        let err = build_dashboard_value(&envelope, &DashboardConfig::default())
            .expect_err("rejected");
        assert!(matches!(err, DashboardError::Parse(_)));
    }

    #[test]
    fn score_maps_to_confidence_assessment() {
        let envelope = json!({ "score": 8, "rationale": "Guideline-backed." });
        let snapshot =
            build_dashboard_value(&envelope, &DashboardConfig::default()).expect("builds");
        let confidence = snapshot.confidence.expect("assessment present");
        assert_eq!(confidence.tier, ConfidenceTier::High);
        assert_eq!(confidence.rationale.as_deref(), Some("Guideline-backed."));
    }

    #[test]
    fn observation_without_value_is_skipped() {
        let bundle = json!({
            "resourceType": "Bundle",
            "entry": [
                { "resource": {
                    "resourceType": "Observation",
                    "code": { "coding": [{ "display": "Clinical note" }] },
                    "valueString": "stable"
                } }
            ]
        });
        let envelope = json!({ "recent_patient_record": bundle });
        let snapshot =
            build_dashboard_value(&envelope, &DashboardConfig::default()).expect("builds");
        assert!(snapshot.labs.is_empty());
    }
}
