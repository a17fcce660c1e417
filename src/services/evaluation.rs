//! Submission evaluation pipeline.
//!
//! Phase 1 gates everything. Phase 2 always runs for accepted submissions.
//! Phase 3 runs only when the caller supplies an oracle, and its failure only
//! removes it from the result. Evaluations share nothing mutable, so one
//! service can serve any number of concurrent calls.

use std::sync::Arc;

use crate::config::OracleConfig;
use crate::context::{Context, FromRef};
use crate::error::AppError;
use crate::models::{
    Architecture, Challenge, EvaluationResult, Phase3Report, PhaseReports, ServiceCatalog,
    Submission, SubmissionStatus,
};
use crate::oracle::OracleError;
use crate::services::constraints::ConstraintValidator;
use crate::services::patterns::PatternRuleEngine;
use crate::services::pricing::{CostBreakdown, CostCalculator};
use crate::services::qualitative::{self, QualitativeOptions};
use crate::services::resolver::{NodeResolver, ResolvedArchitecture};
use crate::services::scoring::{self, ScoreAggregator};

/// Per-call evaluation settings.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    /// Run Phase 3 with this oracle. `None` skips it.
    pub qualitative: Option<QualitativeOptions>,
}

impl EvaluationOptions {
    pub fn with_qualitative(options: QualitativeOptions) -> Self {
        Self {
            qualitative: Some(options),
        }
    }

    /// Options for a caller that asked for the qualitative review. Without an
    /// enabled oracle and API key, Phase 3 is skipped and scoring still runs.
    pub fn requested(config: &OracleConfig) -> Self {
        match QualitativeOptions::from_config(config) {
            Ok(options) => Self::with_qualitative(options),
            Err(e) => {
                tracing::warn!(error = %e, "Qualitative review unavailable, skipping Phase 3");
                Self::default()
            }
        }
    }
}

/// How the optional qualitative phase ended.
enum Phase3Outcome {
    Skipped,
    Completed(Phase3Report),
    Degraded(OracleError),
}

/// Evaluates submissions against challenges using one catalog snapshot.
#[derive(Clone)]
pub struct EvaluationService {
    catalog: Arc<ServiceCatalog>,
    rules: Arc<PatternRuleEngine>,
}

impl FromRef<Context> for EvaluationService {
    fn from_ref(ctx: &Context) -> Self {
        Self::new(ctx.catalog.clone())
    }
}

impl EvaluationService {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self {
            catalog,
            rules: Arc::new(PatternRuleEngine::default()),
        }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Evaluate one submission.
    ///
    /// Only an unknown provider is an error. Constraint failures come back as
    /// a rejected result and oracle failures as a result without Phase 3.
    pub async fn evaluate(
        &self,
        submission: &Submission,
        challenge: &Challenge,
        options: &EvaluationOptions,
    ) -> Result<EvaluationResult, AppError> {
        let provider = submission.provider.as_str();
        let resolver = NodeResolver::for_provider(&self.catalog, provider)?;
        let resolved = resolver.resolve(&submission.architecture);

        // Phase 1
        let phase1 = ConstraintValidator::check(challenge, &submission.architecture, &resolved);
        if !phase1.passed {
            tracing::info!(
                provider,
                challenge = %challenge.id,
                status = %phase1.status,
                cost = phase1.cost,
                "Submission rejected"
            );
            return Ok(EvaluationResult::rejected(phase1));
        }

        // Phase 2
        let phase2 = self.rules.run(challenge, &resolved);
        tracing::debug!(
            rules_checked = phase2.rules_checked,
            rules_passed = phase2.rules_passed,
            warnings = phase2.warnings.len(),
            "Pattern rules complete"
        );

        // Phase 3
        let phase3 = match self
            .run_qualitative(challenge, provider, &resolved, options)
            .await
        {
            Phase3Outcome::Skipped => None,
            Phase3Outcome::Completed(report) => {
                tracing::debug!(
                    oracle = %report.provider,
                    llm_score = report.llm_score,
                    adjustment = report.adjustment,
                    "Qualitative assessment complete"
                );
                Some(report)
            }
            Phase3Outcome::Degraded(e) => {
                tracing::warn!(error = %e, "Qualitative assessment failed, scoring without it");
                None
            }
        };

        let breakdown = ScoreAggregator::aggregate(challenge, &phase1, &phase2, phase3.as_ref());
        let feedback = ScoreAggregator::feedback(&phase1, &phase2, phase3.as_ref(), &breakdown);

        tracing::info!(
            provider,
            challenge = %challenge.id,
            status = %SubmissionStatus::Accepted,
            score = breakdown.score,
            warnings = phase2.warnings.len(),
            qualitative = phase3.is_some(),
            "Submission evaluated"
        );

        Ok(EvaluationResult {
            passed: true,
            cost: phase1.cost,
            complexity: phase1.complexity,
            score: breakdown.score,
            feedback,
            errors: Vec::new(),
            status: SubmissionStatus::Accepted,
            phases: PhaseReports {
                phase1,
                phase2: Some(phase2),
                phase3,
            },
            breakdown: Some(breakdown),
        })
    }

    async fn run_qualitative(
        &self,
        challenge: &Challenge,
        provider: &str,
        resolved: &ResolvedArchitecture<'_>,
        options: &EvaluationOptions,
    ) -> Phase3Outcome {
        let Some(qualitative) = &options.qualitative else {
            return Phase3Outcome::Skipped;
        };

        let prompt = qualitative::build_prompt(challenge, provider, resolved);
        match qualitative::assess(qualitative, &prompt).await {
            Ok(assessment) => Phase3Outcome::Completed(scoring::phase3_report(
                qualitative.oracle.provider_name(),
                qualitative.oracle.model_name(),
                assessment,
            )),
            Err(e) => Phase3Outcome::Degraded(e),
        }
    }

    /// Per-node monthly costs for an architecture, without any validation.
    pub fn estimate_cost(
        &self,
        provider: &str,
        architecture: &Architecture,
    ) -> Result<CostBreakdown, AppError> {
        let resolver = NodeResolver::for_provider(&self.catalog, provider)?;
        let resolved = resolver.resolve(architecture);
        Ok(CostCalculator::breakdown(provider, &resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchitectureEdge, ArchitectureNode, ChallengeConstraints};
    use crate::oracle::TextOracle;
    use async_trait::async_trait;

    struct ScriptedOracle(&'static str);

    #[async_trait]
    impl TextOracle for ScriptedOracle {
        async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
            Ok(self.0.to_string())
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "scripted-1"
        }
    }

    fn service() -> EvaluationService {
        EvaluationService::new(Arc::new(ServiceCatalog::builtin().unwrap()))
    }

    fn serverless_api() -> (Submission, Challenge) {
        let submission = Submission {
            provider: "AWS".to_string(),
            architecture: Architecture::new(
                vec![
                    ArchitectureNode::new("aws-api-gateway-1"),
                    ArchitectureNode::new("aws-lambda-2"),
                    ArchitectureNode::new("aws-dynamodb-3"),
                ],
                vec![
                    ArchitectureEdge::new("aws-api-gateway-1", "aws-lambda-2"),
                    ArchitectureEdge::new("aws-lambda-2", "aws-dynamodb-3"),
                ],
            ),
        };
        let challenge = Challenge {
            id: "serverless-api".to_string(),
            title: "Serverless REST API".to_string(),
            description: "Build a scalable REST API".to_string(),
            difficulty: Some("Medium".to_string()),
            requirements: vec!["Auto-scale based on demand".to_string()],
            constraints: ChallengeConstraints::new(
                30.0,
                vec!["serverless".to_string(), "database".to_string()],
            ),
            optimal_solution: None,
        };
        (submission, challenge)
    }

    fn with_oracle(reply: &'static str) -> EvaluationOptions {
        EvaluationOptions::with_qualitative(QualitativeOptions::new(Arc::new(ScriptedOracle(
            reply,
        ))))
    }

    #[tokio::test]
    async fn test_evaluate_without_oracle() {
        let (submission, challenge) = serverless_api();
        let result = service()
            .evaluate(&submission, &challenge, &EvaluationOptions::default())
            .await
            .unwrap();

        assert!(result.passed);
        assert_eq!(result.status, SubmissionStatus::Accepted);
        assert_eq!(result.complexity, 3);
        assert!(result.errors.is_empty());
        assert_eq!(result.warning_count(), 0);
        assert!(result.phases.phase3.is_none());
        assert_eq!(result.score, result.breakdown.as_ref().unwrap().score);
    }

    #[tokio::test]
    async fn test_evaluate_with_oracle() {
        let (submission, challenge) = serverless_api();
        let baseline = service()
            .evaluate(&submission, &challenge, &EvaluationOptions::default())
            .await
            .unwrap();

        let options = with_oracle(
            r#"```json
            {"meetsRequirements": true, "functionalityScore": 9, "scalabilityScore": 9,
             "costEfficiencyScore": 9, "bestPracticesScore": 9, "summary": "Good"}
            ```"#,
        );
        let result = service()
            .evaluate(&submission, &challenge, &options)
            .await
            .unwrap();

        let phase3 = result.phases.phase3.as_ref().unwrap();
        assert_eq!(phase3.provider, "scripted");
        assert_eq!(phase3.model, "scripted-1");
        // llmScore 180: (18 - 7) * 20 = 220
        assert_eq!(result.score, baseline.score + 220);
        assert!(result.feedback.iter().any(|l| l == "Qualitative review (scripted): Good"));
    }

    #[tokio::test]
    async fn test_oracle_failure_degrades_to_no_phase3() {
        let (submission, challenge) = serverless_api();
        let baseline = service()
            .evaluate(&submission, &challenge, &EvaluationOptions::default())
            .await
            .unwrap();

        let result = service()
            .evaluate(&submission, &challenge, &with_oracle("not json at all"))
            .await
            .unwrap();

        assert!(result.phases.phase3.is_none());
        assert_eq!(result.score, baseline.score);
        assert_eq!(result.feedback, baseline.feedback);
    }

    #[tokio::test]
    async fn test_rejected_submission_skips_oracle() {
        let (mut submission, challenge) = serverless_api();
        submission.architecture.edges.clear();

        let result = service()
            .evaluate(&submission, &challenge, &with_oracle("unused"))
            .await
            .unwrap();
        assert_eq!(result.status, SubmissionStatus::Incomplete);
        assert_eq!(result.score, 0);
        assert!(result.phases.phase2.is_none());
        assert!(result.breakdown.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_error() {
        let (mut submission, challenge) = serverless_api();
        submission.provider = "IBM".to_string();
        let err = service()
            .evaluate(&submission, &challenge, &EvaluationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedProvider(ref p) if p == "IBM"));
    }

    #[test]
    fn test_estimate_cost() {
        let (submission, _) = serverless_api();
        let breakdown = service()
            .estimate_cost("AWS", &submission.architecture)
            .unwrap();
        assert_eq!(breakdown.nodes.len(), 3);
        // api gateway hourly + 1M lambda invocations + dynamodb writes
        let expected = 0.0000035 * 730.0 + 0.0000002 * 1_000_000.0 + 0.25;
        assert!((breakdown.total - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_requested_without_oracle_skips_phase3() {
        let options = EvaluationOptions::requested(&OracleConfig::default());
        assert!(options.qualitative.is_none());

        let (submission, challenge) = serverless_api();
        let result = service()
            .evaluate(&submission, &challenge, &options)
            .await
            .unwrap();
        assert!(result.passed);
        assert!(result.phases.phase3.is_none());
    }
}
