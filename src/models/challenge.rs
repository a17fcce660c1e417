//! Challenge definitions: the scoring context a submission is evaluated against.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

/// Default lower bound on new services when a challenge leaves it unset.
pub const DEFAULT_MIN_SERVICES: usize = 1;
/// Default upper bound on new services when a challenge leaves it unset.
pub const DEFAULT_MAX_SERVICES: usize = 20;

/// A scored architecture challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Easy, Medium or Hard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Free-text functional requirements.
    #[serde(default)]
    pub requirements: Vec<String>,
    pub constraints: ChallengeConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_solution: Option<OptimalSolution>,
}

/// Hard limits checked by the Phase 1 gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConstraints {
    /// Monthly budget in USD.
    pub max_cost: f64,
    /// Service categories that must appear somewhere in the architecture.
    #[serde(default)]
    pub required_services: Vec<String>,
    /// Categories suggested but not required (informational, shown to the oracle).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_services: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_services: Option<usize>,
}

impl ChallengeConstraints {
    /// Constraints with a budget and required categories, default bounds.
    pub fn new(max_cost: f64, required_services: Vec<String>) -> Self {
        Self {
            max_cost,
            required_services,
            optional_services: Vec::new(),
            min_services: None,
            max_services: None,
        }
    }

    pub fn min_services(&self) -> usize {
        self.min_services.unwrap_or(DEFAULT_MIN_SERVICES)
    }

    pub fn max_services(&self) -> usize {
        self.max_services.unwrap_or(DEFAULT_MAX_SERVICES)
    }
}

/// Reference solution hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptimalSolution {
    /// Number of new services in the reference solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Challenge {
    /// Reference complexity, when the challenge provides a positive one.
    pub fn optimal_complexity(&self) -> Option<usize> {
        self.optimal_solution
            .as_ref()
            .and_then(|s| s.complexity)
            .filter(|&c| c > 0)
    }

    /// Whether any requirement contains one of `needles` (case-insensitive).
    pub fn requirements_mention(&self, needles: &[&str]) -> bool {
        self.requirements.iter().any(|req| {
            let req = req.to_lowercase();
            needles.iter().any(|needle| req.contains(needle))
        })
    }

    /// Whether the title contains `needle` (case-insensitive).
    pub fn title_mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
    }
}
