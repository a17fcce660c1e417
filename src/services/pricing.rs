//! Monthly cost model.
//!
//! Catalog prices are per unit (hour, GB, request, ...). The pricing table maps
//! each category to the usage assumed for one month. Rules are tried in table
//! order and the first rule whose category and condition match wins; a
//! category with no rule is billed at its unit price.

use serde::Serialize;

use crate::models::ServiceDefinition;
use crate::services::resolver::{ResolvedArchitecture, ResolvedNode};

/// Average hours in a month.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Extra condition a pricing rule places on a service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceCondition {
    Always,
    /// Unit cost is exactly zero.
    Free,
    /// Service id contains any of the substrings.
    IdContains(&'static [&'static str]),
    /// Specs text contains any of the substrings.
    SpecsContains(&'static [&'static str]),
}

impl PriceCondition {
    fn matches(&self, service: &ServiceDefinition) -> bool {
        match self {
            PriceCondition::Always => true,
            PriceCondition::Free => service.cost == 0.0,
            PriceCondition::IdContains(needles) => {
                needles.iter().any(|needle| service.id.contains(needle))
            }
            PriceCondition::SpecsContains(needles) => {
                needles.iter().any(|needle| service.specs.contains(needle))
            }
        }
    }
}

/// One row of the pricing table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRule {
    pub category: &'static str,
    pub condition: PriceCondition,
    pub multiplier: f64,
    /// Monthly usage assumption, shown in cost breakdowns.
    pub basis: &'static str,
}

const fn rule(
    category: &'static str,
    condition: PriceCondition,
    multiplier: f64,
    basis: &'static str,
) -> PricingRule {
    PricingRule {
        category,
        condition,
        multiplier,
        basis,
    }
}

pub static PRICING_TABLE: &[PricingRule] = &[
    rule("compute", PriceCondition::Always, HOURS_PER_MONTH, "730 hours"),
    rule("storage", PriceCondition::Always, 10.0, "10 GB"),
    rule("serverless", PriceCondition::Always, 1_000_000.0, "1M invocations"),
    rule("database", PriceCondition::IdContains(&["dynamodb"]), 1.0, "1M writes"),
    rule("database", PriceCondition::Always, HOURS_PER_MONTH, "730 hours"),
    rule("networking", PriceCondition::Free, 0.0, "free"),
    rule(
        "networking",
        PriceCondition::IdContains(&["cdn", "cloudfront"]),
        100.0,
        "100 GB bandwidth",
    ),
    rule("networking", PriceCondition::Always, HOURS_PER_MONTH, "730 hours"),
    rule("messaging", PriceCondition::Always, 1_000_000.0, "1M messages"),
    rule("cache", PriceCondition::Always, HOURS_PER_MONTH, "730 hours"),
    rule(
        "ai",
        PriceCondition::SpecsContains(&["Per request", "Per 1K"]),
        1_000_000.0,
        "1M requests",
    ),
    rule("ai", PriceCondition::SpecsContains(&["Per image"]), 10_000.0, "10K images"),
    rule(
        "ai",
        PriceCondition::SpecsContains(&["Per hour", "VRAM"]),
        HOURS_PER_MONTH,
        "730 hours",
    ),
    rule("ai", PriceCondition::Always, HOURS_PER_MONTH, "730 hours"),
];

/// Monthly cost of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCost {
    pub node_id: String,
    pub label: String,
    pub existing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub unit_cost: f64,
    pub multiplier: f64,
    pub basis: String,
    /// Zero for existing and unresolved nodes.
    pub monthly_cost: f64,
}

/// Per-node costs and the billed total (new nodes only).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub provider: String,
    pub total: f64,
    pub nodes: Vec<NodeCost>,
}

/// Applies [`PRICING_TABLE`] to resolved architectures.
pub struct CostCalculator;

impl CostCalculator {
    /// First pricing rule matching the service, if any.
    pub fn rule_for(service: &ServiceDefinition) -> Option<&'static PricingRule> {
        PRICING_TABLE
            .iter()
            .find(|rule| rule.category == service.category && rule.condition.matches(service))
    }

    /// Monthly cost of one instance of `service`.
    pub fn monthly_cost(service: &ServiceDefinition) -> f64 {
        match Self::rule_for(service) {
            Some(rule) => service.cost * rule.multiplier,
            None => service.cost,
        }
    }

    /// Monthly cost of a node. Existing and unresolved nodes cost nothing.
    pub fn node_cost(node: &ResolvedNode<'_>) -> f64 {
        match node.service {
            Some(service) if !node.existing => Self::monthly_cost(service),
            _ => 0.0,
        }
    }

    /// Total monthly cost of the new nodes.
    pub fn total(architecture: &ResolvedArchitecture<'_>) -> f64 {
        architecture.new_nodes().map(Self::node_cost).sum()
    }

    pub fn breakdown(provider: &str, architecture: &ResolvedArchitecture<'_>) -> CostBreakdown {
        let nodes: Vec<NodeCost> = architecture
            .nodes
            .iter()
            .map(|node| {
                let rule = node.service.and_then(Self::rule_for);
                NodeCost {
                    node_id: node.id.to_string(),
                    label: node.label.to_string(),
                    existing: node.existing,
                    service_id: node.service_id.clone(),
                    category: node.category().map(str::to_string),
                    unit_cost: node.service.map_or(0.0, |s| s.cost),
                    multiplier: rule.map_or(1.0, |r| r.multiplier),
                    basis: rule.map_or("unit price", |r| r.basis).to_string(),
                    monthly_cost: Self::node_cost(node),
                }
            })
            .collect();

        CostBreakdown {
            provider: provider.to_string(),
            total: Self::total(architecture),
            nodes,
        }
    }
}
