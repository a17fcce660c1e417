//! Structural graph checks. Edge direction is ignored throughout.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::models::Architecture;

/// Why an architecture is not a single connected graph.
///
/// The messages are shown to the submitter as Phase 1 errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityFailure {
    #[error("Architecture empty: add at least one component")]
    Empty,

    #[error("Components must be connected")]
    NoConnections,

    #[error("Unconnected components: {}", .0.join(", "))]
    Orphans(Vec<String>),

    #[error("Architecture has multiple disconnected groups ({reached} of {total} components reachable)")]
    Disconnected { reached: usize, total: usize },
}

pub struct ConnectivityValidator;

impl ConnectivityValidator {
    /// Check that every node belongs to one connected component.
    pub fn check(architecture: &Architecture) -> Result<(), ConnectivityFailure> {
        let nodes = &architecture.nodes;
        let edges = &architecture.edges;

        let Some(first) = nodes.first() else {
            return Err(ConnectivityFailure::Empty);
        };
        if nodes.len() == 1 {
            return Ok(());
        }
        if edges.is_empty() {
            return Err(ConnectivityFailure::NoConnections);
        }

        let endpoints: HashSet<&str> = edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        let orphans: Vec<String> = nodes
            .iter()
            .filter(|n| !endpoints.contains(n.id.as_str()))
            .map(|n| n.display_label().to_string())
            .collect();
        if !orphans.is_empty() {
            return Err(ConnectivityFailure::Orphans(orphans));
        }

        // Edges to ids outside the diagram do not connect anything.
        let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in edges {
            let (source, target) = (edge.source.as_str(), edge.target.as_str());
            if node_ids.contains(source) && node_ids.contains(target) {
                adjacency.entry(source).or_default().push(target);
                adjacency.entry(target).or_default().push(source);
            }
        }

        let mut visited: HashSet<&str> = HashSet::from([first.id.as_str()]);
        let mut queue = VecDeque::from([first.id.as_str()]);

        while let Some(current) = queue.pop_front() {
            for &next in adjacency.get(current).into_iter().flatten() {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        // Counted against every submitted node, so a repeated id never passes
        // as one reachable component.
        let reached = visited.len();
        if reached < nodes.len() {
            return Err(ConnectivityFailure::Disconnected {
                reached,
                total: nodes.len(),
            });
        }

        Ok(())
    }
}
