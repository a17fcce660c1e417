//! Evaluation output: status, per-phase reports and the aggregated score.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Final status of a submission. Serialized with the human-readable labels
/// the caller stores alongside the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "Accepted")]
    Accepted,
    #[serde(rename = "Too Expensive")]
    TooExpensive,
    #[serde(rename = "Wrong Architecture")]
    WrongArchitecture,
    #[serde(rename = "Incomplete")]
    Incomplete,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Accepted => "Accepted",
            SubmissionStatus::TooExpensive => "Too Expensive",
            SubmissionStatus::WrongArchitecture => "Wrong Architecture",
            SubmissionStatus::Incomplete => "Incomplete",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the mandatory constraint gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase1Report {
    pub passed: bool,
    pub status: SubmissionStatus,
    /// Monthly cost of new services in USD.
    pub cost: f64,
    /// Number of new services.
    pub complexity: usize,
    pub errors: Vec<String>,
}

/// A non-blocking finding from the pattern rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleWarning {
    pub rule: String,
    pub message: String,
}

/// Outcome of the pattern rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase2Report {
    pub rules_checked: usize,
    pub rules_passed: usize,
    pub warnings: Vec<RuleWarning>,
}

/// Rubric returned by the qualitative oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitativeAssessment {
    pub functionality_score: u8,
    pub scalability_score: u8,
    pub cost_efficiency_score: u8,
    pub best_practices_score: u8,
    pub meets_requirements: bool,
    #[serde(default, deserialize_with = "text_or_list")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "text_or_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "text_or_list")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Outcome of the optional qualitative phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase3Report {
    /// Oracle provider that produced the assessment.
    pub provider: String,
    pub model: String,
    #[serde(flatten)]
    pub assessment: QualitativeAssessment,
    /// Weighted rubric on a 0..200 scale.
    pub llm_score: f64,
    /// Points added to (or removed from) the final score.
    pub adjustment: f64,
}

/// Every term that went into the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub cost_ratio: f64,
    pub optimal_complexity: usize,
    pub complexity_ratio: f64,
    pub cost_penalty: f64,
    pub complexity_penalty: f64,
    pub cost_bonus: f64,
    pub simplicity_bonus: f64,
    pub warning_penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualitative_adjustment: Option<f64>,
    pub requirements_penalty: f64,
    /// Score before rounding and flooring.
    pub raw_score: f64,
    pub score: u32,
}

/// Per-phase reports. Phase 2 and 3 are absent when Phase 1 rejects the
/// submission; Phase 3 is also absent when skipped or degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReports {
    pub phase1: Phase1Report,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase2: Option<Phase2Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase3: Option<Phase3Report>,
}

/// Evaluator output, produced once per submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub passed: bool,
    pub cost: f64,
    pub complexity: usize,
    pub score: u32,
    pub feedback: Vec<String>,
    pub errors: Vec<String>,
    pub status: SubmissionStatus,
    pub phases: PhaseReports,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

impl EvaluationResult {
    /// Terminal result for a submission rejected by the Phase 1 gate.
    pub fn rejected(phase1: Phase1Report) -> Self {
        Self {
            passed: false,
            cost: phase1.cost,
            complexity: phase1.complexity,
            score: 0,
            feedback: Vec::new(),
            errors: phase1.errors.clone(),
            status: phase1.status,
            phases: PhaseReports {
                phase1,
                phase2: None,
                phase3: None,
            },
            breakdown: None,
        }
    }

    /// Number of Phase 2 warnings (zero when Phase 2 did not run).
    pub fn warning_count(&self) -> usize {
        self.phases
            .phase2
            .as_ref()
            .map_or(0, |report| report.warnings.len())
    }
}

/// Oracles answer either a JSON list or a single free-text string.
fn text_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrList {
        Text(String),
        List(Vec<String>),
        Null,
    }

    Ok(match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) if text.trim().is_empty() => Vec::new(),
        TextOrList::Text(text) => vec![text],
        TextOrList::List(items) => items,
        TextOrList::Null => Vec::new(),
    })
}
