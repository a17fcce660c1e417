//! Phase 1: the mandatory constraint gate.
//!
//! Checks run in a fixed order and the first failure decides the status:
//! emptiness, cost, required categories, connectivity, then complexity.

use crate::models::{Architecture, Challenge, Phase1Report, SubmissionStatus};
use crate::services::connectivity::{ConnectivityFailure, ConnectivityValidator};
use crate::services::pricing::CostCalculator;
use crate::services::resolver::ResolvedArchitecture;

pub struct ConstraintValidator;

impl ConstraintValidator {
    pub fn check(
        challenge: &Challenge,
        architecture: &Architecture,
        resolved: &ResolvedArchitecture<'_>,
    ) -> Phase1Report {
        let constraints = &challenge.constraints;
        let cost = CostCalculator::total(resolved);
        let complexity = resolved.new_nodes().count();

        let reject = |status: SubmissionStatus, errors: Vec<String>| Phase1Report {
            passed: false,
            status,
            cost,
            complexity,
            errors,
        };

        if architecture.nodes.is_empty() {
            return reject(
                SubmissionStatus::Incomplete,
                vec![ConnectivityFailure::Empty.to_string()],
            );
        }

        if cost > constraints.max_cost {
            return reject(
                SubmissionStatus::TooExpensive,
                vec![format!(
                    "Cost (${:.2}) exceeds maximum budget (${})",
                    cost, constraints.max_cost
                )],
            );
        }

        let used: Vec<&str> = resolved.categories().collect();
        let missing: Vec<String> = constraints
            .required_services
            .iter()
            .filter(|required| !used.contains(&required.as_str()))
            .map(|required| format!("Missing required service category: {}", required))
            .collect();
        if !missing.is_empty() {
            return reject(SubmissionStatus::WrongArchitecture, missing);
        }

        if let Err(failure) = ConnectivityValidator::check(architecture) {
            return reject(SubmissionStatus::Incomplete, vec![failure.to_string()]);
        }

        let (min, max) = (constraints.min_services(), constraints.max_services());
        if complexity < min {
            return reject(
                SubmissionStatus::WrongArchitecture,
                vec![format!(
                    "Too few services: {} new components (minimum {})",
                    complexity, min
                )],
            );
        }
        if complexity > max {
            return reject(
                SubmissionStatus::WrongArchitecture,
                vec![format!(
                    "Too many services: {} new components (maximum {})",
                    complexity, max
                )],
            );
        }

        Phase1Report {
            passed: true,
            status: SubmissionStatus::Accepted,
            cost,
            complexity,
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchitectureEdge, ArchitectureNode, ChallengeConstraints, ServiceCatalog};
    use crate::services::resolver::NodeResolver;

    fn challenge(max_cost: f64, required: &[&str]) -> Challenge {
        Challenge {
            id: "c".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            difficulty: None,
            requirements: vec![],
            constraints: ChallengeConstraints::new(
                max_cost,
                required.iter().map(|s| s.to_string()).collect(),
            ),
            optimal_solution: None,
        }
    }

    fn check(challenge: &Challenge, architecture: &Architecture) -> Phase1Report {
        let catalog = ServiceCatalog::builtin().unwrap();
        let resolver = NodeResolver::for_provider(&catalog, "AWS").unwrap();
        let resolved = resolver.resolve(architecture);
        ConstraintValidator::check(challenge, architecture, &resolved)
    }

    #[test]
    fn test_empty_is_incomplete_regardless_of_constraints() {
        let report = check(&challenge(-1.0, &["storage"]), &Architecture::default());
        assert!(!report.passed);
        assert_eq!(report.status, SubmissionStatus::Incomplete);
        assert!(report.errors[0].contains("empty"));
    }

    #[test]
    fn test_cost_checked_before_categories() {
        let architecture = Architecture::new(vec![ArchitectureNode::new("aws-ec2-t2-medium-1")], vec![]);
        let report = check(&challenge(10.0, &["storage"]), &architecture);
        assert_eq!(report.status, SubmissionStatus::TooExpensive);
        assert_eq!(report.errors, vec!["Cost ($33.87) exceeds maximum budget ($10)"]);
    }

    #[test]
    fn test_missing_categories_listed() {
        let architecture = Architecture::new(vec![ArchitectureNode::new("aws-s3-standard-1")], vec![]);
        let report = check(&challenge(50.0, &["storage", "database", "compute"]), &architecture);
        assert_eq!(report.status, SubmissionStatus::WrongArchitecture);
        assert_eq!(
            report.errors,
            vec![
                "Missing required service category: database",
                "Missing required service category: compute",
            ]
        );
    }

    #[test]
    fn test_existing_nodes_satisfy_categories_but_cost_nothing() {
        let architecture = Architecture::new(
            vec![
                ArchitectureNode::new("aws-rds-mysql-small-1").existing(),
                ArchitectureNode::new("aws-lambda-2"),
            ],
            vec![ArchitectureEdge::new("aws-lambda-2", "aws-rds-mysql-small-1")],
        );
        let report = check(&challenge(1.0, &["database", "serverless"]), &architecture);
        assert!(report.passed, "{:?}", report.errors);
        assert_eq!(report.complexity, 1);
        assert!((report.cost - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_connectivity_failure_is_incomplete() {
        let architecture = Architecture::new(
            vec![
                ArchitectureNode::new("aws-s3-standard-1"),
                ArchitectureNode::new("aws-cloudfront-2"),
            ],
            vec![],
        );
        let report = check(&challenge(50.0, &["storage"]), &architecture);
        assert_eq!(report.status, SubmissionStatus::Incomplete);
        assert_eq!(report.errors, vec!["Components must be connected"]);
    }

    #[test]
    fn test_complexity_bounds() {
        let architecture = Architecture::new(
            vec![
                ArchitectureNode::new("aws-s3-standard-1"),
                ArchitectureNode::new("aws-cloudfront-2"),
            ],
            vec![ArchitectureEdge::new("aws-cloudfront-2", "aws-s3-standard-1")],
        );

        let mut too_many = challenge(50.0, &[]);
        too_many.constraints.max_services = Some(1);
        let report = check(&too_many, &architecture);
        assert_eq!(report.status, SubmissionStatus::WrongArchitecture);
        assert!(report.errors[0].starts_with("Too many services"));

        let mut too_few = challenge(50.0, &[]);
        too_few.constraints.min_services = Some(3);
        let report = check(&too_few, &architecture);
        assert_eq!(report.status, SubmissionStatus::WrongArchitecture);
        assert!(report.errors[0].starts_with("Too few services"));
    }

    #[test]
    fn test_only_existing_nodes_fails_min_services() {
        let architecture = Architecture::new(
            vec![ArchitectureNode::new("aws-s3-standard-1").existing()],
            vec![],
        );
        let report = check(&challenge(50.0, &["storage"]), &architecture);
        assert_eq!(report.status, SubmissionStatus::WrongArchitecture);
        assert_eq!(report.complexity, 0);
    }
}
