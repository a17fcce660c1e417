//! Phase 2: heuristic architecture-pattern rules.
//!
//! Rules never block a submission. Each rule yields at most one warning, and
//! every warning costs points in the final score. A rule that cannot be
//! evaluated (for example, an edge pointing at a node that is not in the
//! diagram) is logged and counted as neither passed nor warned.

use thiserror::Error;

use crate::models::{ArchitectureEdge, Challenge, Phase2Report, RuleWarning};
use crate::services::resolver::{ResolvedArchitecture, ResolvedNode};

/// A rule could not be evaluated against the submitted graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("edge {from} -> {to} references unknown node '{missing}'")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },
}

/// Inputs shared by every rule.
pub struct RuleContext<'r, 'a> {
    pub challenge: &'r Challenge,
    pub architecture: &'r ResolvedArchitecture<'a>,
}

impl<'r, 'a> RuleContext<'r, 'a> {
    /// Node at the far end of `edge`, seen from `from`.
    fn far_end(
        &self,
        edge: &ArchitectureEdge,
        from: &str,
    ) -> Result<&'r ResolvedNode<'a>, RuleError> {
        let id = edge.other_end(from).unwrap_or(&edge.target);
        self.architecture
            .node(id)
            .ok_or_else(|| RuleError::DanglingEdge {
                from: edge.source.clone(),
                to: edge.target.clone(),
                missing: id.to_string(),
            })
    }

    /// Resolved neighbors of `id`, ignoring direction.
    fn neighbors(&self, id: &str) -> Result<Vec<&'r ResolvedNode<'a>>, RuleError> {
        self.architecture
            .edges
            .iter()
            .filter(|edge| edge.touches(id))
            .map(|edge| self.far_end(edge, id))
            .collect()
    }

    fn any(&self, predicate: impl Fn(&ResolvedNode<'a>) -> bool) -> bool {
        self.architecture.any(predicate)
    }
}

/// One non-blocking architecture heuristic.
pub trait PatternRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(Some(message))` warns, `Ok(None)` passes.
    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError>;
}

fn labels(nodes: &[&ResolvedNode<'_>]) -> String {
    nodes
        .iter()
        .map(|n| format!("'{}'", n.label))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Rules
// ============================================================================

/// Databases should sit behind an application tier.
pub struct DatabaseExposure;

impl PatternRule for DatabaseExposure {
    fn name(&self) -> &'static str {
        "Database exposure"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        let mut unreachable = Vec::new();
        let mut exposed = Vec::new();

        for db in ctx.architecture.nodes.iter().filter(|n| n.is_database()) {
            let sources = ctx
                .architecture
                .incoming(db.id)
                .map(|edge| ctx.far_end(edge, db.id))
                .collect::<Result<Vec<_>, _>>()?;

            if sources.is_empty() {
                unreachable.push(db);
            } else if sources.iter().all(|s| s.is_cdn() || s.is_load_balancer()) {
                exposed.push(db);
            }
        }

        let mut problems = Vec::new();
        if !unreachable.is_empty() {
            problems.push(format!(
                "database {} has no incoming connection from the application tier",
                labels(&unreachable)
            ));
        }
        if !exposed.is_empty() {
            problems.push(format!(
                "database {} is fed directly by a CDN or load balancer",
                labels(&exposed)
            ));
        }

        Ok((!problems.is_empty()).then(|| {
            format!(
                "{}. Route database access through compute or serverless services.",
                capitalize(&problems.join("; "))
            )
        }))
    }
}

/// CDNs belong at the edge, in front of the origin.
pub struct CdnPlacement;

impl PatternRule for CdnPlacement {
    fn name(&self) -> &'static str {
        "CDN placement"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        let misplaced: Vec<&ResolvedNode<'_>> = ctx
            .architecture
            .nodes
            .iter()
            .filter(|n| n.is_cdn() && ctx.architecture.incoming(n.id).next().is_some())
            .collect();

        Ok((!misplaced.is_empty()).then(|| {
            format!(
                "CDN {} receives traffic from other components. A CDN should be the entry point, pointing at its origin.",
                labels(&misplaced)
            )
        }))
    }
}

/// Load balancers need compute targets.
pub struct LoadBalancerConnections;

impl PatternRule for LoadBalancerConnections {
    fn name(&self) -> &'static str {
        "Load balancer connections"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        let mut idle = Vec::new();

        for lb in ctx.architecture.nodes.iter().filter(|n| n.is_load_balancer()) {
            let mut targets_compute = false;
            for edge in ctx.architecture.outgoing(lb.id) {
                targets_compute |= ctx.far_end(edge, lb.id)?.is_compute();
            }
            if !targets_compute {
                idle.push(lb);
            }
        }

        Ok((!idle.is_empty()).then(|| {
            format!(
                "Load balancer {} does not distribute traffic to any compute instance.",
                labels(&idle)
            )
        }))
    }
}

/// API gateways pair with functions rather than provisioned VMs.
pub struct ApiGatewayUsage;

impl PatternRule for ApiGatewayUsage {
    fn name(&self) -> &'static str {
        "API gateway usage"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        let mut flagged = Vec::new();

        for gateway in ctx.architecture.nodes.iter().filter(|n| n.is_api_gateway()) {
            let neighbors = ctx.neighbors(gateway.id)?;
            let to_vm = neighbors.iter().any(|n| n.is_vm_like());
            let to_function = neighbors.iter().any(|n| n.is_function());
            if to_vm && !to_function {
                flagged.push(gateway);
            }
        }

        Ok((!flagged.is_empty()).then(|| {
            format!(
                "API gateway {} fronts virtual machines only. Consider serverless functions behind the gateway.",
                labels(&flagged)
            )
        }))
    }
}

/// Serverless compute scales better with a NoSQL store.
pub struct ServerlessDatabaseChoice;

impl PatternRule for ServerlessDatabaseChoice {
    fn name(&self) -> &'static str {
        "Serverless database choice"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        let warn = ctx.any(ResolvedNode::is_serverless)
            && ctx.any(ResolvedNode::is_relational_db)
            && !ctx.any(ResolvedNode::is_nosql_db);

        Ok(warn.then(|| {
            "Serverless functions paired with a relational database can exhaust connections. Consider a NoSQL store such as DynamoDB.".to_string()
        }))
    }
}

/// High-traffic workloads need a cache or CDN.
pub struct HighTrafficCaching;

impl HighTrafficCaching {
    const KEYWORDS: &'static [&'static str] = &["high-traffic", "10,000", "performance", "fast"];
}

impl PatternRule for HighTrafficCaching {
    fn name(&self) -> &'static str {
        "High-traffic caching"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        if !ctx.challenge.requirements_mention(Self::KEYWORDS) {
            return Ok(None);
        }

        let cached = ctx.any(|n| n.is_cache() || n.is_cdn());
        Ok((!cached).then(|| {
            "The requirements call for high traffic or fast responses but there is no cache or CDN.".to_string()
        }))
    }
}

/// High-availability requirements need more than one compute instance.
pub struct RedundancyForHa;

impl RedundancyForHa {
    const KEYWORDS: &'static [&'static str] = &["high availability", "99.9%", "fault-tolerant"];
}

impl PatternRule for RedundancyForHa {
    fn name(&self) -> &'static str {
        "Redundancy for HA"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        if !ctx.challenge.requirements_mention(Self::KEYWORDS) {
            return Ok(None);
        }

        let compute = ctx
            .architecture
            .nodes
            .iter()
            .filter(|n| n.is_compute())
            .count();
        Ok((compute == 1).then(|| {
            "A single compute instance is a single point of failure. Add redundancy for high availability.".to_string()
        }))
    }
}

/// Patterns implied by the challenge title.
pub struct ChallengeSpecificPattern;

impl PatternRule for ChallengeSpecificPattern {
    fn name(&self) -> &'static str {
        "Challenge-specific pattern"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        if ctx.challenge.title_mentions("static website")
            && ctx.any(|n| n.is_compute() || n.is_database())
        {
            return Ok(Some(
                "Static websites do not need servers or databases. Object storage with a CDN is enough.".to_string(),
            ));
        }

        if ctx.challenge.title_mentions("serverless")
            && ctx.any(ResolvedNode::is_vm_like)
            && !ctx.any(ResolvedNode::is_serverless)
        {
            return Ok(Some(
                "This is a serverless challenge but the design uses virtual machines and no serverless compute.".to_string(),
            ));
        }

        Ok(None)
    }
}

/// New services must plug into the infrastructure that already exists.
pub struct ExistingInfrastructureIntegration;

impl PatternRule for ExistingInfrastructureIntegration {
    fn name(&self) -> &'static str {
        "Existing-infrastructure integration"
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Result<Option<String>, RuleError> {
        if ctx.architecture.existing_nodes().next().is_none() {
            return Ok(None);
        }

        for node in ctx.architecture.new_nodes() {
            if ctx.neighbors(node.id)?.iter().any(|n| n.existing) {
                return Ok(None);
            }
        }

        Ok(Some(
            "None of the new services connect to the existing infrastructure.".to_string(),
        ))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Runs every rule once and tallies the outcome.
pub struct PatternRuleEngine {
    rules: Vec<Box<dyn PatternRule>>,
}

impl Default for PatternRuleEngine {
    fn default() -> Self {
        Self::with_rules(vec![
            Box::new(DatabaseExposure),
            Box::new(CdnPlacement),
            Box::new(LoadBalancerConnections),
            Box::new(ApiGatewayUsage),
            Box::new(ServerlessDatabaseChoice),
            Box::new(HighTrafficCaching),
            Box::new(RedundancyForHa),
            Box::new(ChallengeSpecificPattern),
            Box::new(ExistingInfrastructureIntegration),
        ])
    }
}

impl PatternRuleEngine {
    pub fn with_rules(rules: Vec<Box<dyn PatternRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    pub fn run(
        &self,
        challenge: &Challenge,
        architecture: &ResolvedArchitecture<'_>,
    ) -> Phase2Report {
        let ctx = RuleContext {
            challenge,
            architecture,
        };

        let mut rules_passed = 0;
        let mut warnings = Vec::new();

        for rule in &self.rules {
            match rule.check(&ctx) {
                Ok(None) => rules_passed += 1,
                Ok(Some(message)) => {
                    tracing::debug!(rule = rule.name(), %message, "Pattern rule warning");
                    warnings.push(RuleWarning {
                        rule: rule.name().to_string(),
                        message,
                    });
                }
                Err(e) => {
                    tracing::warn!(rule = rule.name(), error = %e, "Pattern rule failed");
                }
            }
        }

        Phase2Report {
            rules_checked: self.rules.len(),
            rules_passed,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Architecture, ArchitectureEdge, ArchitectureNode, ChallengeConstraints, ServiceCatalog,
    };
    use crate::services::resolver::NodeResolver;

    fn challenge(title: &str, requirements: &[&str]) -> Challenge {
        Challenge {
            id: "c".to_string(),
            title: title.to_string(),
            description: String::new(),
            difficulty: None,
            requirements: requirements.iter().map(|r| r.to_string()).collect(),
            constraints: ChallengeConstraints::new(1000.0, vec![]),
            optimal_solution: None,
        }
    }

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Architecture {
        Architecture::new(
            nodes.iter().map(|id| ArchitectureNode::new(*id)).collect(),
            edges
                .iter()
                .map(|(s, t)| ArchitectureEdge::new(*s, *t))
                .collect(),
        )
    }

    fn check_rule(
        rule: &dyn PatternRule,
        challenge: &Challenge,
        architecture: &Architecture,
    ) -> Result<Option<String>, RuleError> {
        let catalog = ServiceCatalog::builtin().unwrap();
        let resolver = NodeResolver::for_provider(&catalog, "AWS").unwrap();
        let resolved = resolver.resolve(architecture);
        rule.check(&RuleContext {
            challenge,
            architecture: &resolved,
        })
    }

    fn warns(rule: &dyn PatternRule, challenge: &Challenge, architecture: &Architecture) -> bool {
        check_rule(rule, challenge, architecture).unwrap().is_some()
    }

    #[test]
    fn test_database_exposure() {
        let c = challenge("App", &[]);
        let unconnected = graph(&["aws-ec2-t2-micro-1", "aws-rds-mysql-small-2"], &[
            ("aws-rds-mysql-small-2", "aws-ec2-t2-micro-1"),
        ]);
        let behind_compute = graph(&["aws-ec2-t2-micro-1", "aws-rds-mysql-small-2"], &[
            ("aws-ec2-t2-micro-1", "aws-rds-mysql-small-2"),
        ]);
        let behind_lb = graph(&["aws-elb-1", "aws-rds-mysql-small-2"], &[
            ("aws-elb-1", "aws-rds-mysql-small-2"),
        ]);

        assert!(warns(&DatabaseExposure, &c, &unconnected));
        assert!(!warns(&DatabaseExposure, &c, &behind_compute));
        let message = check_rule(&DatabaseExposure, &c, &behind_lb).unwrap().unwrap();
        assert!(message.contains("CDN or load balancer"));
    }

    #[test]
    fn test_cdn_placement() {
        let c = challenge("Site", &[]);
        let edge_first = graph(&["aws-cloudfront-1", "aws-s3-standard-2"], &[
            ("aws-cloudfront-1", "aws-s3-standard-2"),
        ]);
        let behind = graph(&["aws-cloudfront-1", "aws-s3-standard-2"], &[
            ("aws-s3-standard-2", "aws-cloudfront-1"),
        ]);
        assert!(!warns(&CdnPlacement, &c, &edge_first));
        assert!(warns(&CdnPlacement, &c, &behind));
    }

    #[test]
    fn test_load_balancer_connections() {
        let c = challenge("App", &[]);
        let good = graph(&["aws-elb-1", "aws-ec2-t2-micro-2"], &[("aws-elb-1", "aws-ec2-t2-micro-2")]);
        let to_lambda = graph(&["aws-elb-1", "aws-lambda-2"], &[("aws-elb-1", "aws-lambda-2")]);
        assert!(!warns(&LoadBalancerConnections, &c, &good));
        assert!(warns(&LoadBalancerConnections, &c, &to_lambda));
    }

    #[test]
    fn test_api_gateway_usage() {
        let c = challenge("API", &[]);
        let vm_only = graph(&["aws-api-gateway-1", "aws-ec2-t2-micro-2"], &[
            ("aws-api-gateway-1", "aws-ec2-t2-micro-2"),
        ]);
        let with_lambda = graph(&["aws-api-gateway-1", "aws-ec2-t2-micro-2", "aws-lambda-3"], &[
            ("aws-api-gateway-1", "aws-ec2-t2-micro-2"),
            ("aws-api-gateway-1", "aws-lambda-3"),
        ]);
        assert!(warns(&ApiGatewayUsage, &c, &vm_only));
        assert!(!warns(&ApiGatewayUsage, &c, &with_lambda));
    }

    #[test]
    fn test_serverless_database_choice() {
        let c = challenge("API", &[]);
        let relational = graph(&["aws-lambda-1", "aws-rds-mysql-small-2"], &[]);
        let mixed = graph(&["aws-lambda-1", "aws-rds-mysql-small-2", "aws-dynamodb-3"], &[]);
        assert!(warns(&ServerlessDatabaseChoice, &c, &relational));
        assert!(!warns(&ServerlessDatabaseChoice, &c, &mixed));
    }

    #[test]
    fn test_high_traffic_caching_needs_keyword() {
        let plain = challenge("App", &["Store files"]);
        let busy = challenge("App", &["Serve 10,000 concurrent users"]);
        let architecture = graph(&["aws-ec2-t2-micro-1"], &[]);
        let cached = graph(&["aws-ec2-t2-micro-1", "aws-elasticache-redis-2"], &[]);

        assert!(!warns(&HighTrafficCaching, &plain, &architecture));
        assert!(warns(&HighTrafficCaching, &busy, &architecture));
        assert!(!warns(&HighTrafficCaching, &busy, &cached));
    }

    #[test]
    fn test_redundancy_for_ha() {
        let ha = challenge("App", &["Must be Fault-Tolerant"]);
        let single = graph(&["aws-ec2-t2-micro-1"], &[]);
        let pair = graph(&["aws-ec2-t2-micro-1", "aws-ec2-t2-micro-2"], &[]);
        assert!(warns(&RedundancyForHa, &ha, &single));
        assert!(!warns(&RedundancyForHa, &ha, &pair));
    }

    #[test]
    fn test_challenge_specific_pattern() {
        let static_site = challenge("Simple Static Website Hosting", &[]);
        let serverless = challenge("Serverless REST API", &[]);

        assert!(warns(&ChallengeSpecificPattern, &static_site, &graph(&["aws-ec2-t2-micro-1"], &[])));
        assert!(!warns(&ChallengeSpecificPattern, &static_site, &graph(&["aws-s3-standard-1"], &[])));
        assert!(warns(&ChallengeSpecificPattern, &serverless, &graph(&["aws-ec2-t2-micro-1"], &[])));
        assert!(!warns(
            &ChallengeSpecificPattern,
            &serverless,
            &graph(&["aws-ec2-t2-micro-1", "aws-lambda-2"], &[])
        ));
    }

    #[test]
    fn test_existing_infrastructure_integration() {
        let c = challenge("Migration", &[]);
        let mut linked = graph(&["aws-rds-mysql-small-1", "aws-lambda-2"], &[
            ("aws-lambda-2", "aws-rds-mysql-small-1"),
        ]);
        linked.nodes[0].is_existing = true;
        let mut isolated = graph(&["aws-rds-mysql-small-1", "aws-lambda-2", "aws-dynamodb-3"], &[
            ("aws-lambda-2", "aws-dynamodb-3"),
        ]);
        isolated.nodes[0].is_existing = true;

        assert!(!warns(&ExistingInfrastructureIntegration, &c, &linked));
        assert!(warns(&ExistingInfrastructureIntegration, &c, &isolated));
        assert!(!warns(&ExistingInfrastructureIntegration, &c, &graph(&["aws-lambda-1"], &[])));
    }

    #[test]
    fn test_dangling_edge_is_rule_error() {
        let c = challenge("App", &[]);
        let architecture = graph(&["aws-elb-1"], &[("aws-elb-1", "aws-ec2-t2-micro-9")]);
        let err = check_rule(&LoadBalancerConnections, &c, &architecture).unwrap_err();
        assert_eq!(
            err,
            RuleError::DanglingEdge {
                from: "aws-elb-1".to_string(),
                to: "aws-ec2-t2-micro-9".to_string(),
                missing: "aws-ec2-t2-micro-9".to_string(),
            }
        );
    }

    #[test]
    fn test_engine_counts_failures_as_neither() {
        let catalog = ServiceCatalog::builtin().unwrap();
        let resolver = NodeResolver::for_provider(&catalog, "AWS").unwrap();
        let architecture = graph(&["aws-elb-1", "aws-lambda-2"], &[
            ("aws-elb-1", "aws-lambda-2"),
            ("aws-elb-1", "aws-ghost-3"),
        ]);
        let resolved = resolver.resolve(&architecture);

        let report = PatternRuleEngine::default().run(&challenge("App", &[]), &resolved);
        assert_eq!(report.rules_checked, 9);
        // Load balancer rule fails on the dangling edge; nothing else warns.
        assert_eq!(report.rules_passed, 8);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_engine_runs_nine_rules() {
        let names: Vec<&str> = PatternRuleEngine::default().rule_names().collect();
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], "Database exposure");
        assert_eq!(names[8], "Existing-infrastructure integration");
    }
}
