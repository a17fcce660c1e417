//! Score aggregation and feedback text.
//!
//! ```text
//! score = 1000 - costRatio*500 - min(complexityRatio, 1)*300
//!       + 100 if costRatio < 0.5
//!       + 50  if nodeCount <= optimalComplexity
//!       - 25 per pattern warning
//!       + (llmScore/10 - 7)*20        when the qualitative phase ran (llmScore in 0..200)
//!       - 100 if requirements unmet   when the qualitative phase ran
//! ```

use crate::models::{
    Challenge, Phase1Report, Phase2Report, Phase3Report, QualitativeAssessment, ScoreBreakdown,
};

pub const BASE_SCORE: f64 = 1000.0;
pub const COST_WEIGHT: f64 = 500.0;
pub const COMPLEXITY_WEIGHT: f64 = 300.0;
pub const COST_BONUS: f64 = 100.0;
pub const SIMPLICITY_BONUS: f64 = 50.0;
pub const WARNING_PENALTY: f64 = 25.0;
pub const REQUIREMENTS_PENALTY: f64 = 100.0;

/// Weighted rubric on a 0..200 scale.
pub fn llm_score(assessment: &QualitativeAssessment) -> f64 {
    (f64::from(assessment.functionality_score) * 0.40
        + f64::from(assessment.scalability_score) * 0.25
        + f64::from(assessment.cost_efficiency_score) * 0.20
        + f64::from(assessment.best_practices_score) * 0.15)
        * 20.0
}

/// Rubric adjustment: zero at an llm score of 70, +260 at the top of the scale.
pub fn rubric_adjustment(llm_score: f64) -> f64 {
    (llm_score / 10.0 - 7.0) * 20.0
}

/// Wrap an oracle assessment with its score contribution.
pub fn phase3_report(provider: &str, model: &str, assessment: QualitativeAssessment) -> Phase3Report {
    let llm_score = llm_score(&assessment);
    let mut adjustment = rubric_adjustment(llm_score);
    if !assessment.meets_requirements {
        adjustment -= REQUIREMENTS_PENALTY;
    }

    Phase3Report {
        provider: provider.to_string(),
        model: model.to_string(),
        assessment,
        llm_score,
        adjustment,
    }
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Combine the phase reports into the final score.
    pub fn aggregate(
        challenge: &Challenge,
        phase1: &Phase1Report,
        phase2: &Phase2Report,
        phase3: Option<&Phase3Report>,
    ) -> ScoreBreakdown {
        let max_cost = challenge.constraints.max_cost;
        let node_count = phase1.complexity;

        let cost_ratio = if max_cost > 0.0 {
            phase1.cost / max_cost
        } else {
            0.0
        };

        let optimal_complexity = challenge.optimal_complexity().unwrap_or(node_count);
        let complexity_ratio = if optimal_complexity == 0 {
            0.0
        } else {
            node_count as f64 / (optimal_complexity as f64 * 2.0)
        };

        let cost_penalty = cost_ratio * COST_WEIGHT;
        let complexity_penalty = complexity_ratio.min(1.0) * COMPLEXITY_WEIGHT;
        let cost_bonus = if cost_ratio < 0.5 { COST_BONUS } else { 0.0 };
        let simplicity_bonus = if node_count <= optimal_complexity {
            SIMPLICITY_BONUS
        } else {
            0.0
        };
        let warning_penalty = phase2.warnings.len() as f64 * WARNING_PENALTY;

        let qualitative_adjustment = phase3.map(|report| rubric_adjustment(report.llm_score));
        let requirements_penalty = match phase3 {
            Some(report) if !report.assessment.meets_requirements => REQUIREMENTS_PENALTY,
            _ => 0.0,
        };

        let raw_score = BASE_SCORE - cost_penalty - complexity_penalty + cost_bonus
            + simplicity_bonus
            - warning_penalty
            + qualitative_adjustment.unwrap_or(0.0)
            - requirements_penalty;

        ScoreBreakdown {
            cost_ratio,
            optimal_complexity,
            complexity_ratio,
            cost_penalty,
            complexity_penalty,
            cost_bonus,
            simplicity_bonus,
            warning_penalty,
            qualitative_adjustment,
            requirements_penalty,
            raw_score,
            score: raw_score.round().max(0.0) as u32,
        }
    }

    /// Human-readable feedback for an accepted submission.
    pub fn feedback(
        phase1: &Phase1Report,
        phase2: &Phase2Report,
        phase3: Option<&Phase3Report>,
        breakdown: &ScoreBreakdown,
    ) -> Vec<String> {
        let mut lines = vec![
            format!("Total cost: ${:.2}/month", phase1.cost),
            format!("Architecture complexity: {} components", phase1.complexity),
        ];

        if breakdown.simplicity_bonus > 0.0 {
            lines.push("Great architectural simplicity!".to_string());
        }

        if phase2.warnings.is_empty() {
            lines.push("No pattern warnings: all best practices followed".to_string());
        } else {
            let count = phase2.warnings.len();
            lines.push(format!(
                "{} architecture warning{} (-{} points each):",
                count,
                if count == 1 { "" } else { "s" },
                WARNING_PENALTY
            ));
            for warning in &phase2.warnings {
                lines.push(format!("- {}: {}", warning.rule, warning.message));
            }
        }

        if let Some(report) = phase3 {
            let assessment = &report.assessment;
            lines.push(format!(
                "Qualitative review ({}): {}",
                report.provider,
                if assessment.summary.is_empty() {
                    "no summary provided"
                } else {
                    &assessment.summary
                }
            ));
            if !assessment.strengths.is_empty() {
                lines.push(format!("Strengths: {}", assessment.strengths.join("; ")));
            }
            if !assessment.issues.is_empty() {
                lines.push(format!("Issues: {}", assessment.issues.join("; ")));
            }
            if !assessment.suggestions.is_empty() {
                lines.push(format!("Suggestions: {}", assessment.suggestions.join("; ")));
            }
            if !assessment.meets_requirements {
                lines.push("The reviewer found that not all requirements are met".to_string());
            }
        }

        lines.push(format!("Efficiency score: {}/1000", breakdown.score));

        if breakdown.cost_bonus > 0.0 {
            lines.push("Excellent cost optimization! 🎉".to_string());
        }

        lines
    }
}
