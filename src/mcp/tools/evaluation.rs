//! Evaluation tools - scoring, cost estimation and connectivity checks.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::mcp::protocol::{OutputFormat, Response};
use crate::mcp::server::McpServer;
use crate::models::{Architecture, Challenge, Submission};
use crate::services::{ConnectivityValidator, EvaluationOptions, EvaluationService};

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for evaluate_submission tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EvaluateSubmissionParams {
    /// Challenge the submission answers (constraints, requirements, optimal solution).
    pub challenge: Challenge,
    /// Provider name and architecture graph.
    pub submission: Submission,
    /// Run the LLM review (Phase 3). Requires a configured oracle.
    #[serde(default)]
    pub qualitative: bool,
    /// Output format: "json" (default) or "toon".
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
}

/// Parameters for estimate_cost tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EstimateCostParams {
    /// Catalog provider name (e.g., "AWS", "GCP").
    pub provider: String,
    /// Architecture graph; only nodes are priced.
    pub architecture: Architecture,
}

/// Parameters for check_connectivity tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckConnectivityParams {
    /// Architecture graph to check.
    pub architecture: Architecture,
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for check_connectivity tool.
#[derive(Debug, Serialize)]
pub struct ConnectivityResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router(router = evaluation_tools, vis = "pub(crate)")]
impl McpServer {
    /// Evaluate a submission against a challenge.
    ///
    /// Constraint failures are not tool errors: they come back as a result
    /// with status and score 0. Without a configured oracle the LLM review is
    /// skipped.
    #[tool(
        description = "Evaluate a cloud-architecture submission against a challenge. Returns status, score (0-1000+), feedback and per-phase reports."
    )]
    pub async fn evaluate_submission(
        &self,
        Parameters(params): Parameters<EvaluateSubmissionParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            challenge = %params.challenge.id,
            provider = %params.submission.provider,
            nodes = params.submission.architecture.nodes.len(),
            qualitative = params.qualitative,
            "Running evaluate_submission tool"
        );

        let options = if params.qualitative {
            EvaluationOptions::requested(&self.ctx.config.oracle)
        } else {
            EvaluationOptions::default()
        };

        let service = self.resolve::<EvaluationService>();
        let result = service
            .evaluate(&params.submission, &params.challenge, &options)
            .await?;

        Response(result, params.output_format).into()
    }

    /// Price every node of an architecture.
    #[tool(
        description = "Estimate the monthly cost of an architecture, per node. Pre-existing nodes cost 0; unknown services cost 0."
    )]
    pub async fn estimate_cost(
        &self,
        Parameters(params): Parameters<EstimateCostParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(provider = %params.provider, "Running estimate_cost tool");

        let service = self.resolve::<EvaluationService>();
        let breakdown = service.estimate_cost(&params.provider, &params.architecture)?;

        Response::json(breakdown).into()
    }

    #[tool(
        description = "Check that an architecture is one connected graph with every node linked."
    )]
    pub async fn check_connectivity(
        &self,
        Parameters(params): Parameters<CheckConnectivityParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            nodes = params.architecture.nodes.len(),
            edges = params.architecture.edges.len(),
            "Running check_connectivity tool"
        );

        let response = match ConnectivityValidator::check(&params.architecture) {
            Ok(()) => ConnectivityResponse {
                connected: true,
                reason: None,
            },
            Err(failure) => ConnectivityResponse {
                connected: false,
                reason: Some(failure.to_string()),
            },
        };

        Response::json(response).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    use crate::config::Config;
    use crate::context::Context;
    use crate::models::{ArchitectureNode, ChallengeConstraints, ServiceCatalog};

    fn server() -> McpServer {
        McpServer::new(Context::new(
            ServiceCatalog::builtin().unwrap(),
            Config::default(),
        ))
    }

    fn storage_only() -> (Challenge, Submission) {
        let challenge = Challenge {
            id: "bucket".to_string(),
            title: "Asset Bucket".to_string(),
            description: String::new(),
            difficulty: None,
            requirements: vec![],
            constraints: ChallengeConstraints::new(50.0, vec!["storage".to_string()]),
            optimal_solution: None,
        };
        let submission = Submission {
            provider: "AWS".to_string(),
            architecture: Architecture::new(vec![ArchitectureNode::new("aws-s3-standard-1")], vec![]),
        };
        (challenge, submission)
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_qualitative_without_oracle_still_scores() {
        let (challenge, submission) = storage_only();
        let params = EvaluateSubmissionParams {
            challenge,
            submission,
            qualitative: true,
            output_format: None,
        };

        let result = server()
            .evaluate_submission(Parameters(params))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        let body: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(body["status"], "Accepted");
        assert!(body["phases"].get("phase3").is_none());
    }
}
