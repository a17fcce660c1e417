//! Evaluation services.
//!
//! Leaf-first: node resolution, pricing and connectivity feed the Phase 1
//! constraint gate; the pattern rules (Phase 2) and the qualitative scorer
//! (Phase 3) feed the score aggregator; `EvaluationService` runs the pipeline.

pub mod connectivity;
pub mod constraints;
pub mod evaluation;
pub mod patterns;
pub mod pricing;
pub mod qualitative;
pub mod resolver;
pub mod scoring;

pub use connectivity::{ConnectivityFailure, ConnectivityValidator};
pub use constraints::ConstraintValidator;
pub use evaluation::{EvaluationOptions, EvaluationService};
pub use patterns::{PatternRule, PatternRuleEngine, RuleError};
pub use pricing::{CostBreakdown, CostCalculator, NodeCost, PricingRule, PRICING_TABLE};
pub use qualitative::QualitativeOptions;
pub use resolver::{NodeResolver, ResolvedArchitecture, ResolvedNode};
pub use scoring::ScoreAggregator;
