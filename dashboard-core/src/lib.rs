//! Core view-model types for the clinical patient dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Knobs controlling snapshot derivation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Characters of raw text kept as the display excerpt for history
    /// records that fail to decode.
    pub history_excerpt_len: usize,
    /// Date treated as "today" when deriving patient age. `None` uses the
    /// current date; tests pin it for reproducible snapshots.
    pub as_of: Option<NaiveDate>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history_excerpt_len: 100,
            as_of: None,
        }
    }
}

/// Position of a measured value relative to its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueStatus {
    Low,
    Normal,
    High,
}

impl ValueStatus {
    pub fn label(self) -> &'static str {
        match self {
            ValueStatus::Low => "low",
            ValueStatus::Normal => "normal",
            ValueStatus::High => "high",
        }
    }
}

/// Display emphasis derived from free-text diagnoses and conclusions.
///
/// Keyword-based and heuristic; not clinically authoritative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Critical,
    Warning,
    Normal,
    Routine,
}

impl SeverityTier {
    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Critical => "critical",
            SeverityTier::Warning => "warning",
            SeverityTier::Normal => "normal",
            SeverityTier::Routine => "routine",
        }
    }
}

/// Coarse bucket for a numeric confidence score in `[0, 10]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    /// Three-way step function over the score; total for every finite score.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            ConfidenceTier::High
        } else if score >= 6.0 {
            ConfidenceTier::Moderate
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceTier::High => "High Confidence",
            ConfidenceTier::Moderate => "Moderate Confidence",
            ConfidenceTier::Low => "Low Confidence",
        }
    }
}

/// Demographics derived from the Patient resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub full_name: String,
    pub identifier: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub country: Option<String>,
}

/// Low/high bounds considered clinically normal for a measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferenceRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// One lab result, either a scalar measurement or a compound
/// blood-pressure reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabResult {
    Scalar(ScalarReading),
    BloodPressure(BloodPressureReading),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalarReading {
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub reference: Option<ReferenceRange>,
    pub status: ValueStatus,
    /// Position of the value within its range, clamped to `[0, 100]`.
    pub progress: f64,
    pub measured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BloodPressureReading {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub unit: Option<String>,
    pub status: ValueStatus,
    pub measured_at: Option<DateTime<Utc>>,
}

/// Attached document on a diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentedForm {
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub url: Option<String>,
}

/// Display view of a DiagnosticReport resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportView {
    pub name: String,
    pub category: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub conclusion_severity: Option<SeverityTier>,
    pub issued_at: Option<DateTime<Utc>>,
    /// Ids of the constituent observation results.
    pub results: Vec<String>,
    pub presented_form: Option<PresentedForm>,
}

/// A medical-history record, transported as an opaque string that may or
/// may not decode. Decode failure keeps the record; it is never dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Parsed(HistoryRecord),
    Unparsed {
        /// Full raw text, preserved for fallback display.
        raw: String,
        /// Truncated excerpt shown in the "unable to parse" state.
        excerpt: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub encounter_date: String,
    pub diagnosis: String,
    pub severity: SeverityTier,
    pub summary: String,
}

/// Medication name and dose extracted from a recommendation string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub name: String,
    pub dose: String,
}

/// One treatment recommendation after best-effort parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPlan {
    /// Original recommendation text, unmodified.
    pub text: String,
    pub medication: Option<Medication>,
    pub lifestyle: bool,
    /// Auxiliary `;`-separated segments after the primary description.
    pub details: Vec<String>,
}

/// Numeric confidence score with its derived tier and free-text rationale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceAssessment {
    pub score: f64,
    pub tier: ConfidenceTier,
    pub rationale: Option<String>,
}

/// Fully derived dashboard state for one patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub patient: Option<PatientSummary>,
    pub labs: Vec<LabResult>,
    pub reports: Vec<ReportView>,
    pub history: Vec<HistoryEntry>,
    pub treatments: Vec<TreatmentPlan>,
    pub confidence: Option<ConfidenceAssessment>,
}

impl DashboardSnapshot {
    /// Assemble a snapshot from already-derived sections, preserving the
    /// order each section arrived in.
    pub fn new(
        patient: Option<PatientSummary>,
        labs: Vec<LabResult>,
        reports: Vec<ReportView>,
        history: Vec<HistoryEntry>,
        treatments: Vec<TreatmentPlan>,
        confidence: Option<ConfidenceAssessment>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            patient,
            labs,
            reports,
            history,
            treatments,
            confidence,
        }
    }

    /// True when every section rendered would show its "no data" state.
    pub fn is_empty(&self) -> bool {
        self.patient.is_none()
            && self.labs.is_empty()
            && self.reports.is_empty()
            && self.history.is_empty()
            && self.treatments.is_empty()
            && self.confidence.is_none()
    }
}

/// Errors while deriving a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("input is missing the minimum required structure")]
    MissingData,
    #[error("could not read input: {0}")]
    Parse(String),
}

/// Convenience for mock/testing consumers.
pub fn empty_snapshot() -> DashboardSnapshot {
    DashboardSnapshot::new(None, Vec::new(), Vec::new(), Vec::new(), Vec::new(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_tier_steps() {
        assert_eq!(ConfidenceTier::from_score(10.0), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_score(8.0), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_score(7.9), ConfidenceTier::Moderate);
        assert_eq!(ConfidenceTier::from_score(6.0), ConfidenceTier::Moderate);
        assert_eq!(ConfidenceTier::from_score(5.9), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_score(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn empty_snapshot_reports_empty() {
        assert!(empty_snapshot().is_empty());
    }
}
