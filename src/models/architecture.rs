//! Submitted architecture graphs and the node-id wire format.

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};

/// A placed service instance in a submitted diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureNode {
    /// Composite id: `<provider>-<serviceId>-<suffix>` (see [`NodeId`]).
    pub id: String,
    /// Pre-existing infrastructure; excluded from cost and complexity.
    #[serde(default, deserialize_with = "falsy_bool")]
    #[schemars(with = "bool")]
    pub is_existing: bool,
    /// Display label shown in feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Diagram payload as sent by the editor (may carry the label).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

/// Editor payload attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ArchitectureNode {
    /// Creates a new (non-existing) node with the given composite id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_existing: false,
            label: None,
            data: None,
        }
    }

    /// Marks the node as pre-existing infrastructure.
    pub fn existing(mut self) -> Self {
        self.is_existing = true;
        self
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for user-facing messages: explicit label, editor label, then id.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.label.as_deref()))
            .unwrap_or(&self.id)
    }
}

/// A directed link between two node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArchitectureEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

impl ArchitectureEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether `node_id` is either endpoint.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite `node_id`, if the edge touches it.
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// A submitted service graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Architecture {
    #[serde(default)]
    pub nodes: Vec<ArchitectureNode>,
    #[serde(default)]
    pub edges: Vec<ArchitectureEdge>,
}

impl Architecture {
    pub fn new(nodes: Vec<ArchitectureNode>, edges: Vec<ArchitectureEdge>) -> Self {
        Self { nodes, edges }
    }
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Submission {
    /// Catalog provider name (e.g., "AWS").
    pub provider: String,
    pub architecture: Architecture,
}

/// Parsed form of the node-id wire format.
///
/// `<providerPrefix>-<serviceId, possibly hyphenated>-<opaque suffix>`: the first
/// and last hyphen-delimited segments are discarded and the rest, rejoined with
/// `-`, is the catalog lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeId<'a> {
    pub provider_prefix: &'a str,
    pub service_id: String,
    pub suffix: &'a str,
}

impl<'a> NodeId<'a> {
    /// Parse a composite node id. Returns `None` for fewer than three segments.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let segments: Vec<&str> = raw.split('-').collect();
        if segments.len() < 3 {
            return None;
        }

        let last = segments.len() - 1;
        Some(Self {
            provider_prefix: segments[0],
            service_id: segments[1..last].join("-"),
            suffix: segments[last],
        })
    }
}

/// Accepts `true`/`false`, `null`, `0`/`1` and strings, treating anything falsy as false.
fn falsy_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    })
}
