//! Phase 3: qualitative assessment by an external text oracle.
//!
//! The phase is optional and best-effort. Callers decide whether it runs by
//! passing [`QualitativeOptions`]; any failure here is reported as an
//! [`OracleError`] for the evaluator to log before it scores without Phase 3.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::OracleConfig;
use crate::error::AppError;
use crate::models::{Challenge, QualitativeAssessment};
use crate::oracle::{build_oracle, OracleError, TextOracle};
use crate::services::resolver::ResolvedArchitecture;

/// Oracle handle plus per-call limits.
#[derive(Clone)]
pub struct QualitativeOptions {
    pub oracle: Arc<dyn TextOracle>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl QualitativeOptions {
    pub fn new(oracle: Arc<dyn TextOracle>) -> Self {
        Self {
            oracle,
            timeout: None,
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Options from the `[oracle]` config section. Fails when the phase is
    /// disabled or no API key can be found.
    pub fn from_config(config: &OracleConfig) -> Result<Self, AppError> {
        let settings = config.settings().ok_or(AppError::OracleNotConfigured)?;
        let oracle = build_oracle(&settings)?;
        Ok(Self::new(oracle).with_timeout(config.timeout()))
    }
}

impl fmt::Debug for QualitativeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualitativeOptions")
            .field("provider", &self.oracle.provider_name())
            .field("model", &self.oracle.model_name())
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// Prompt
// ============================================================================

/// Reviewer guidance keyed by a phrase in the challenge title.
const GUIDANCE: &[(&str, &str)] = &[
    (
        "static website",
        "A static site needs object storage for the files and a CDN in front of it for global, \
         HTTPS delivery. Servers and databases add cost without adding function.",
    ),
    (
        "serverless",
        "Expect an API gateway in front of functions with a NoSQL store. Provisioned virtual \
         machines or connection-bound relational databases work against the serverless goal.",
    ),
    (
        "high-traffic",
        "Expect a load balancer spreading requests over more than one compute instance, a cache \
         or CDN to absorb reads, and a managed database.",
    ),
    (
        "data processing",
        "Expect a queue or stream decoupling producers from consumers, compute or functions for \
         processing, and durable storage for results.",
    ),
    (
        "disaster recovery",
        "Expect data replicated outside the primary location, backups, and a documented failover \
         path for every stateful component.",
    ),
];

const DEFAULT_GUIDANCE: &str = "Judge whether every requirement is covered by a component, \
    whether data flows through sensible tiers, and whether each service earns its cost.";

const CALIBRATION: &str = r#"Calibration examples:
- Static website as S3 + CloudFront, CloudFront pointing at S3, about $9/month:
  functionality 9, scalability 9, costEfficiency 10, bestPractices 9, meetsRequirements true.
- Serverless REST API as API Gateway + EC2 + RDS MySQL, about $40/month:
  functionality 6, scalability 4, costEfficiency 3, bestPractices 4, meetsRequirements false.
- High-traffic web app as a single EC2 instance with a database and no cache:
  functionality 6, scalability 3, costEfficiency 6, bestPractices 4, meetsRequirements false."#;

fn guidance_for(challenge: &Challenge) -> &'static str {
    GUIDANCE
        .iter()
        .find(|(keyword, _)| challenge.title_mentions(keyword))
        .map_or(DEFAULT_GUIDANCE, |(_, text)| *text)
}

/// Build the single prompt sent to the oracle.
pub fn build_prompt(
    challenge: &Challenge,
    provider: &str,
    architecture: &ResolvedArchitecture<'_>,
) -> String {
    Prompt {
        challenge,
        provider,
        architecture,
    }
    .to_string()
}

const INSTRUCTIONS: &str = r#"Evaluate the architecture: does it meet the functional requirements, what flaws or
security issues does it have, and how could it improve? Rate it from 1 to 10 for
functionality, scalability, cost-efficiency and best practices.

Respond in JSON format only:
{
  "meetsRequirements": boolean,
  "functionalityScore": integer (1-10),
  "scalabilityScore": integer (1-10),
  "costEfficiencyScore": integer (1-10),
  "bestPracticesScore": integer (1-10),
  "issues": [array of strings],
  "strengths": [array of strings],
  "suggestions": [array of strings],
  "summary": "brief summary"
}"#;

struct Prompt<'p, 'a> {
    challenge: &'p Challenge,
    provider: &'p str,
    architecture: &'p ResolvedArchitecture<'a>,
}

impl fmt::Display for Prompt<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Prompt {
            challenge,
            provider,
            architecture,
        } = self;
        let constraints = &challenge.constraints;

        writeln!(f, "You are a cloud architecture expert evaluating a solution to a challenge.\n")?;

        writeln!(f, "Challenge:")?;
        writeln!(f, "Title: {}", challenge.title)?;
        if let Some(difficulty) = &challenge.difficulty {
            writeln!(f, "Difficulty: {}", difficulty)?;
        }
        writeln!(f, "Description: {}\n", challenge.description)?;

        writeln!(f, "Requirements:")?;
        for (i, requirement) in challenge.requirements.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, requirement)?;
        }

        writeln!(f, "\nConstraints:")?;
        writeln!(f, "- Max Cost: ${}/month", constraints.max_cost)?;
        writeln!(
            f,
            "- Required Services: {}",
            constraints.required_services.join(", ")
        )?;
        if !constraints.optional_services.is_empty() {
            writeln!(
                f,
                "- Optional Services: {}",
                constraints.optional_services.join(", ")
            )?;
        }
        writeln!(
            f,
            "- Services: between {} and {}",
            constraints.min_services(),
            constraints.max_services()
        )?;

        writeln!(f, "\nUser's Architecture:")?;
        writeln!(f, "Provider: {}", provider)?;
        writeln!(f, "Components:")?;
        for node in &architecture.nodes {
            let existing = if node.existing { " [existing]" } else { "" };
            match node.service {
                Some(service) => writeln!(
                    f,
                    "- {}: {} ({}, ${} unit cost){}",
                    node.label, service.name, service.category, service.cost, existing
                )?,
                None => writeln!(f, "- {}: unknown service{}", node.label, existing)?,
            }
        }

        writeln!(f, "Connections:")?;
        if architecture.edges.is_empty() {
            writeln!(f, "- none")?;
        }
        let label = |id: &str| {
            architecture
                .node(id)
                .map_or_else(|| id.to_string(), |n| n.label.to_string())
        };
        for edge in architecture.edges {
            writeln!(f, "- {} -> {}", label(&edge.source), label(&edge.target))?;
        }

        writeln!(f, "\nReviewer guidance: {}\n", guidance_for(challenge))?;
        writeln!(f, "{}\n", CALIBRATION)?;
        f.write_str(INSTRUCTIONS)
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// Locate the JSON document in an oracle answer.
///
/// A fenced block (```` ```json ```` or bare ```` ``` ````) wins; otherwise the
/// span from the first `{` to the last `}` is used.
fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```") {
        let body = &text[start + 3..];
        let body = body
            .strip_prefix("json")
            .or_else(|| body.strip_prefix("JSON"))
            .unwrap_or(body);
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    }
}

/// Parse and range-check the oracle's rubric.
pub fn parse_assessment(text: &str) -> Result<QualitativeAssessment, OracleError> {
    let assessment: QualitativeAssessment = serde_json::from_str(extract_json(text))?;

    for (field, value) in [
        ("functionalityScore", assessment.functionality_score),
        ("scalabilityScore", assessment.scalability_score),
        ("costEfficiencyScore", assessment.cost_efficiency_score),
        ("bestPracticesScore", assessment.best_practices_score),
    ] {
        if !(1..=10).contains(&value) {
            return Err(OracleError::ScoreOutOfRange { field, value });
        }
    }

    Ok(assessment)
}

// ============================================================================
// Oracle call
// ============================================================================

/// Ask the oracle once, honoring the caller's timeout and cancellation.
pub async fn assess(
    options: &QualitativeOptions,
    prompt: &str,
) -> Result<QualitativeAssessment, OracleError> {
    let generate = async {
        match options.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, options.oracle.generate(prompt)).await {
                    Ok(result) => result,
                    Err(_) => Err(OracleError::Timeout(limit)),
                }
            }
            None => options.oracle.generate(prompt).await,
        }
    };

    let text = match &options.cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => return Err(OracleError::Cancelled),
            result = generate => result?,
        },
        None => generate.await?,
    };

    parse_assessment(&text)
}
