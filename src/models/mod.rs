//! Domain models for submissions, challenges, the service catalog and results.

mod architecture;
mod catalog;
mod challenge;
mod evaluation;

pub use architecture::{
    Architecture, ArchitectureEdge, ArchitectureNode, NodeData, NodeId, Submission,
};
pub use catalog::{CatalogError, ProviderCatalog, ServiceCatalog, ServiceDefinition};
pub use challenge::{
    Challenge, ChallengeConstraints, OptimalSolution, DEFAULT_MAX_SERVICES, DEFAULT_MIN_SERVICES,
};
pub use evaluation::{
    EvaluationResult, Phase1Report, Phase2Report, Phase3Report, PhaseReports,
    QualitativeAssessment, RuleWarning, ScoreBreakdown, SubmissionStatus,
};
