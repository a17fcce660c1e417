//! End-to-end evaluation scenarios against the built-in catalog.
//!
//! Run with: cargo test --test evaluation_scenarios

use std::sync::Arc;
use std::time::Duration;

use archgrade::error::AppError;
use archgrade::models::{
    Architecture, ArchitectureEdge, ArchitectureNode, Challenge, ServiceCatalog, Submission,
    SubmissionStatus,
};
use archgrade::oracle::{OracleError, TextOracle};
use archgrade::services::{EvaluationOptions, EvaluationService, QualitativeOptions};
use async_trait::async_trait;
use serde_json::json;

// ============================================================================
// Fixtures
// ============================================================================

fn service() -> EvaluationService {
    EvaluationService::new(Arc::new(
        ServiceCatalog::builtin().expect("built-in catalog should load"),
    ))
}

fn challenge(value: serde_json::Value) -> Challenge {
    serde_json::from_value(value).expect("challenge fixture should deserialize")
}

fn aws(nodes: Vec<ArchitectureNode>, edges: Vec<ArchitectureEdge>) -> Submission {
    Submission {
        provider: "AWS".to_string(),
        architecture: Architecture::new(nodes, edges),
    }
}

fn web_app_challenge() -> Challenge {
    challenge(json!({
        "id": "web-app",
        "title": "Simple Web Application",
        "requirements": ["Serve a small internal tool"],
        "constraints": {
            "maxCost": 100,
            "requiredServices": ["compute", "database"],
            "minServices": 1,
            "maxServices": 5
        },
        "optimalSolution": { "complexity": 2 }
    }))
}

/// Oracle that replies with a fixed body after an optional delay.
struct MockOracle {
    reply: String,
    delay: Duration,
}

impl MockOracle {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl TextOracle for MockOracle {
    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-1"
    }
}

fn qualitative(oracle: MockOracle) -> EvaluationOptions {
    EvaluationOptions::with_qualitative(QualitativeOptions::new(Arc::new(oracle)))
}

// ============================================================================
// Phase 1 gate
// ============================================================================

#[tokio::test]
async fn test_single_storage_node_is_accepted() {
    let challenge = challenge(json!({
        "id": "asset-bucket",
        "title": "Asset Bucket",
        "constraints": {
            "maxCost": 50,
            "requiredServices": ["storage"],
            "minServices": 1,
            "maxServices": 5
        }
    }));
    let submission = aws(vec![ArchitectureNode::new("aws-s3-standard-1")], vec![]);

    let result = service()
        .evaluate(&submission, &challenge, &EvaluationOptions::default())
        .await
        .unwrap();

    assert!(result.passed);
    assert_eq!(result.status, SubmissionStatus::Accepted);
    assert_eq!(result.complexity, 1);
    assert!(result.errors.is_empty());
    // 1000 - 2.3 (cost) - 150 (complexity) + 100 (cheap) + 50 (simple)
    assert_eq!(result.score, 998);
}

#[tokio::test]
async fn test_two_unconnected_nodes_are_incomplete() {
    let submission = aws(
        vec![
            ArchitectureNode::new("aws-ec2-t2-micro-1"),
            ArchitectureNode::new("aws-rds-mysql-small-2"),
        ],
        vec![],
    );

    let result = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.status, SubmissionStatus::Incomplete);
    assert_eq!(result.errors, vec!["Components must be connected".to_string()]);
    assert_eq!(result.score, 0);
}

#[tokio::test]
async fn test_over_budget_is_too_expensive() {
    let submission = aws(
        vec![
            ArchitectureNode::new("aws-sagemaker-ml-g5-1"),
            ArchitectureNode::new("aws-rds-mysql-small-2"),
            ArchitectureNode::new("aws-ec2-t2-micro-3"),
        ],
        vec![
            ArchitectureEdge::new("aws-ec2-t2-micro-3", "aws-sagemaker-ml-g5-1"),
            ArchitectureEdge::new("aws-ec2-t2-micro-3", "aws-rds-mysql-small-2"),
        ],
    );

    let result = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.score, 0);
    assert_eq!(result.status, SubmissionStatus::TooExpensive);
    assert!(!result.phases.phase1.errors.is_empty());
    assert!(result.phases.phase1.errors[0].starts_with("Cost ($"));
    assert!(result.phases.phase2.is_none());
    assert!(result.phases.phase3.is_none());
    assert!(result.breakdown.is_none());
}

#[tokio::test]
async fn test_empty_architecture_is_incomplete() {
    let submission = aws(vec![], vec![]);

    let result = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.status, SubmissionStatus::Incomplete);
    assert_eq!(result.cost, 0.0);
    assert_eq!(result.complexity, 0);
}

#[tokio::test]
async fn test_missing_category_is_wrong_architecture() {
    let submission = aws(vec![ArchitectureNode::new("aws-ec2-t2-micro-1")], vec![]);

    let result = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, SubmissionStatus::WrongArchitecture);
    assert_eq!(
        result.errors,
        vec!["Missing required service category: database".to_string()]
    );
}

#[tokio::test]
async fn test_existing_nodes_are_free_and_not_counted() {
    let submission = aws(
        vec![
            ArchitectureNode::new("aws-ec2-t2-micro-1"),
            ArchitectureNode::new("aws-rds-mysql-small-2").existing(),
        ],
        vec![ArchitectureEdge::new("aws-ec2-t2-micro-1", "aws-rds-mysql-small-2")],
    );

    let result = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();

    assert!(result.passed);
    assert_eq!(result.complexity, 1);
    assert!((result.cost - 0.0116 * 730.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unsupported_provider_is_an_error() {
    let submission = Submission {
        provider: "IBM".to_string(),
        architecture: Architecture::new(vec![ArchitectureNode::new("ibm-vsi-1")], vec![]),
    };

    let err = service()
        .evaluate(&submission, &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnsupportedProvider(p) if p == "IBM"));
}

// ============================================================================
// Phase 2 rules and scoring
// ============================================================================

#[tokio::test]
async fn test_each_warning_costs_exactly_25_points() {
    let nodes = || {
        vec![
            ArchitectureNode::new("aws-ec2-t2-micro-1"),
            ArchitectureNode::new("aws-rds-mysql-small-2"),
        ]
    };
    let guarded = aws(
        nodes(),
        vec![ArchitectureEdge::new("aws-ec2-t2-micro-1", "aws-rds-mysql-small-2")],
    );
    let unreachable = aws(
        nodes(),
        vec![ArchitectureEdge::new("aws-rds-mysql-small-2", "aws-ec2-t2-micro-1")],
    );

    let service = service();
    let options = EvaluationOptions::default();
    let good = service
        .evaluate(&guarded, &web_app_challenge(), &options)
        .await
        .unwrap();
    let bad = service
        .evaluate(&unreachable, &web_app_challenge(), &options)
        .await
        .unwrap();

    assert!(good.passed && bad.passed);
    let warnings = &bad.phases.phase2.as_ref().unwrap().warnings;
    assert!(warnings.iter().any(|w| w.rule == "Database exposure"));
    assert_eq!(good.score - bad.score, 25);
}

#[tokio::test]
async fn test_evaluation_is_deterministic() {
    let submission = aws(
        vec![
            ArchitectureNode::new("aws-elb-1"),
            ArchitectureNode::new("aws-ec2-t2-micro-2"),
            ArchitectureNode::new("aws-rds-mysql-small-3"),
        ],
        vec![
            ArchitectureEdge::new("aws-elb-1", "aws-ec2-t2-micro-2"),
            ArchitectureEdge::new("aws-ec2-t2-micro-2", "aws-rds-mysql-small-3"),
        ],
    );

    let service = service();
    let options = EvaluationOptions::default();
    let first = service
        .evaluate(&submission, &web_app_challenge(), &options)
        .await
        .unwrap();
    let second = service
        .evaluate(&submission, &web_app_challenge(), &options)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_compute_priced_at_730_hours() {
    let architecture = Architecture::new(
        vec![
            ArchitectureNode::new("aws-ec2-t2-micro-1"),
            ArchitectureNode::new("aws-unknown-thing-2"),
        ],
        vec![],
    );

    let breakdown = service().estimate_cost("AWS", &architecture).unwrap();

    assert!((breakdown.total - 0.0116 * 730.0).abs() < 1e-9);
    assert_eq!(breakdown.nodes.len(), 2);
    assert_eq!(breakdown.nodes[1].monthly_cost, 0.0);
}

// ============================================================================
// Phase 3 qualitative review
// ============================================================================

const STRONG_REVIEW: &str = r#"Here is my review:
```json
{
  "functionalityScore": 9,
  "scalabilityScore": 9,
  "costEfficiencyScore": 9,
  "bestPracticesScore": 9,
  "meetsRequirements": true,
  "issues": [],
  "strengths": ["Clear separation of tiers"],
  "suggestions": ["Add backups"],
  "summary": "Solid design"
}
```"#;

fn guarded_web_app() -> Submission {
    aws(
        vec![
            ArchitectureNode::new("aws-ec2-t2-micro-1"),
            ArchitectureNode::new("aws-rds-mysql-small-2"),
        ],
        vec![ArchitectureEdge::new("aws-ec2-t2-micro-1", "aws-rds-mysql-small-2")],
    )
}

#[tokio::test]
async fn test_qualitative_review_adjusts_score() {
    let service = service();
    let baseline = service
        .evaluate(&guarded_web_app(), &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();
    let reviewed = service
        .evaluate(
            &guarded_web_app(),
            &web_app_challenge(),
            &qualitative(MockOracle::replying(STRONG_REVIEW)),
        )
        .await
        .unwrap();

    let phase3 = reviewed.phases.phase3.as_ref().unwrap();
    assert_eq!(phase3.provider, "mock");
    // all 9s: llmScore 180, (18 - 7) * 20 = +220
    assert!((phase3.llm_score - 180.0).abs() < 1e-9);
    assert_eq!(reviewed.score, baseline.score + 220);
    assert!(reviewed
        .feedback
        .iter()
        .any(|line| line.contains("Solid design")));
}

#[tokio::test]
async fn test_unusable_oracle_reply_degrades_to_baseline() {
    let service = service();
    let baseline = service
        .evaluate(&guarded_web_app(), &web_app_challenge(), &EvaluationOptions::default())
        .await
        .unwrap();
    let degraded = service
        .evaluate(
            &guarded_web_app(),
            &web_app_challenge(),
            &qualitative(MockOracle::replying("I cannot help with that.")),
        )
        .await
        .unwrap();

    assert!(degraded.phases.phase3.is_none());
    assert_eq!(degraded.score, baseline.score);
    assert_eq!(degraded.feedback, baseline.feedback);
}

#[tokio::test]
async fn test_slow_oracle_times_out_without_failing() {
    let oracle = MockOracle {
        reply: STRONG_REVIEW.to_string(),
        delay: Duration::from_secs(5),
    };
    let options = EvaluationOptions::with_qualitative(
        QualitativeOptions::new(Arc::new(oracle)).with_timeout(Duration::from_millis(20)),
    );

    let result = service()
        .evaluate(&guarded_web_app(), &web_app_challenge(), &options)
        .await
        .unwrap();

    assert!(result.passed);
    assert!(result.phases.phase3.is_none());
}

#[tokio::test]
async fn test_rejected_submission_skips_oracle() {
    let submission = aws(vec![], vec![]);

    let result = service()
        .evaluate(
            &submission,
            &web_app_challenge(),
            &qualitative(MockOracle::replying(STRONG_REVIEW)),
        )
        .await
        .unwrap();

    assert!(!result.passed);
    assert!(result.phases.phase3.is_none());
}
