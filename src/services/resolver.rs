//! Node resolution: composite node ids to catalog services.
//!
//! Ids are parsed once here. Everything downstream (pricing, constraints,
//! pattern rules, prompt building) works on [`ResolvedNode`] values and never
//! looks at the hyphen encoding again.

use std::collections::HashMap;

use crate::error::AppError;
use crate::models::{
    Architecture, ArchitectureEdge, ArchitectureNode, NodeId, ProviderCatalog, ServiceCatalog,
    ServiceDefinition,
};

/// A submitted node paired with its catalog service, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub existing: bool,
    /// Middle segments of the node id; `None` when the id is malformed.
    pub service_id: Option<String>,
    /// Catalog entry; `None` when the service id is not in the provider's catalog.
    pub service: Option<&'a ServiceDefinition>,
}

impl<'a> ResolvedNode<'a> {
    /// Catalog category, for resolved nodes only.
    pub fn category(&self) -> Option<&'a str> {
        self.service.map(|s| s.category.as_str())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category() == Some(category)
    }

    /// Whether the parsed service id contains any of `needles`.
    fn service_id_matches(&self, needles: &[&str]) -> bool {
        self.service_id
            .as_deref()
            .is_some_and(|id| needles.iter().any(|needle| id.contains(needle)))
    }

    fn service_id_starts_with(&self, prefixes: &[&str]) -> bool {
        self.service_id
            .as_deref()
            .is_some_and(|id| prefixes.iter().any(|prefix| id.starts_with(prefix)))
    }

    pub fn is_compute(&self) -> bool {
        self.has_category("compute")
    }

    pub fn is_database(&self) -> bool {
        self.has_category("database")
    }

    pub fn is_serverless(&self) -> bool {
        self.has_category("serverless")
    }

    pub fn is_cache(&self) -> bool {
        self.has_category("cache")
    }

    /// Content delivery network (CloudFront, Azure CDN, Cloud CDN).
    pub fn is_cdn(&self) -> bool {
        self.service_id_matches(&["cdn", "cloudfront"])
    }

    pub fn is_load_balancer(&self) -> bool {
        self.service_id_matches(&["elb", "load-balanc"])
    }

    pub fn is_api_gateway(&self) -> bool {
        self.service_id_matches(&["api-gateway", "apigateway", "api-management"])
    }

    /// Provisioned virtual machine (EC2, Azure VM, GCE e2).
    pub fn is_vm_like(&self) -> bool {
        self.service_id_matches(&["ec2"]) || self.service_id_starts_with(&["vm-", "e2-"])
    }

    /// Function-as-a-service (Lambda, Azure Functions, Cloud Functions).
    pub fn is_function(&self) -> bool {
        self.service_id_matches(&["lambda", "functions"])
    }

    pub fn is_relational_db(&self) -> bool {
        self.is_database()
            && !self.is_nosql_db()
            && self.service_id_matches(&["rds", "sql", "aurora", "mysql", "postgres", "mariadb"])
    }

    pub fn is_nosql_db(&self) -> bool {
        self.service_id_matches(&["dynamo", "cosmos", "firestore", "mongo", "nosql", "bigtable"])
    }
}

/// An architecture whose nodes have been resolved against one provider.
#[derive(Debug, Clone)]
pub struct ResolvedArchitecture<'a> {
    pub nodes: Vec<ResolvedNode<'a>>,
    pub edges: &'a [ArchitectureEdge],
    index: HashMap<&'a str, usize>,
}

impl<'a> ResolvedArchitecture<'a> {
    /// Node by id. With duplicate ids the first occurrence wins.
    pub fn node(&self, id: &str) -> Option<&ResolvedNode<'a>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn new_nodes(&self) -> impl Iterator<Item = &ResolvedNode<'a>> {
        self.nodes.iter().filter(|n| !n.existing)
    }

    pub fn existing_nodes(&self) -> impl Iterator<Item = &ResolvedNode<'a>> {
        self.nodes.iter().filter(|n| n.existing)
    }

    /// Edges whose target is `id`.
    pub fn incoming<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'a ArchitectureEdge> + 's {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Edges whose source is `id`.
    pub fn outgoing<'s>(&'s self, id: &'s str) -> impl Iterator<Item = &'a ArchitectureEdge> + 's {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Distinct categories across every resolved node (existing and new).
    pub fn categories(&self) -> impl Iterator<Item = &'a str> + '_ {
        let mut seen: Vec<&'a str> = Vec::new();
        for category in self.nodes.iter().filter_map(ResolvedNode::category) {
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
        seen.into_iter()
    }

    pub fn any(&self, predicate: impl Fn(&ResolvedNode<'a>) -> bool) -> bool {
        self.nodes.iter().any(predicate)
    }
}

/// Resolves node ids against a single provider's catalog.
#[derive(Debug, Clone, Copy)]
pub struct NodeResolver<'a> {
    provider: &'a str,
    services: &'a ProviderCatalog,
}

impl<'a> NodeResolver<'a> {
    /// Resolver for `provider`, or `UnsupportedProvider` if the catalog lacks it.
    pub fn for_provider(catalog: &'a ServiceCatalog, provider: &'a str) -> Result<Self, AppError> {
        let services = catalog
            .provider(provider)
            .ok_or_else(|| AppError::UnsupportedProvider(provider.to_string()))?;
        Ok(Self { provider, services })
    }

    pub fn provider(&self) -> &'a str {
        self.provider
    }

    /// Look up a service id across every group of the provider.
    pub fn lookup(&self, service_id: &str) -> Option<&'a ServiceDefinition> {
        self.services
            .values()
            .flatten()
            .find(|service| service.id == service_id)
    }

    pub fn resolve_node(&self, node: &'a ArchitectureNode) -> ResolvedNode<'a> {
        let service_id = NodeId::parse(&node.id).map(|parsed| parsed.service_id);
        let service = service_id.as_deref().and_then(|id| self.lookup(id));

        if service.is_none() {
            tracing::debug!(
                node = %node.id,
                provider = self.provider,
                "Node did not resolve to a catalog service"
            );
        }

        ResolvedNode {
            id: &node.id,
            label: node.display_label(),
            existing: node.is_existing,
            service_id,
            service,
        }
    }

    pub fn resolve(&self, architecture: &'a Architecture) -> ResolvedArchitecture<'a> {
        let nodes: Vec<ResolvedNode<'a>> = architecture
            .nodes
            .iter()
            .map(|node| self.resolve_node(node))
            .collect();

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id).or_insert(i);
        }

        ResolvedArchitecture {
            nodes,
            edges: &architecture.edges,
            index,
        }
    }
}
