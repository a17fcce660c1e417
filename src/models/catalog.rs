//! Service catalog: priced cloud services grouped by provider and category.
//!
//! The catalog is reference data owned outside the evaluator. It is loaded once
//! (from the built-in price list or a JSON file), validated, and then shared
//! read-only between evaluations.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rmcp::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in price list shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Errors raised while loading or validating a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "duplicate service id '{service_id}' for provider {provider} (in '{first}' and '{second}')"
    )]
    DuplicateService {
        provider: String,
        service_id: String,
        first: String,
        second: String,
    },

    #[error("service '{service_id}' for provider {provider} has no category")]
    MissingCategory {
        provider: String,
        service_id: String,
    },
}

/// A priced service offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceDefinition {
    /// Catalog lookup key (e.g., "ec2-t2-micro").
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base unit cost in USD. The unit depends on the category (hour, GB, request...).
    #[serde(alias = "baseCost")]
    pub cost: f64,
    /// Pricing category (compute, storage, serverless, database, ...).
    pub category: String,
    /// Free-text specs; also drives pricing for the `ai` category.
    #[serde(default)]
    pub specs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Services of one provider, keyed by catalog group.
///
/// The group name usually equals the service category but does not have to
/// (AWS lists messaging and cache services under `other`).
pub type ProviderCatalog = BTreeMap<String, Vec<ServiceDefinition>>;

/// Read-only catalog: provider → group → services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    providers: BTreeMap<String, ProviderCatalog>,
}

impl ServiceCatalog {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The built-in AWS / Azure / GCP / RunPod / MongoDB price list.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Check that every service has a category and that service ids are unique
    /// within a provider, so id resolution never depends on group order.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (provider, groups) in &self.providers {
            let mut seen: HashMap<&str, &str> = HashMap::new();
            for (group, services) in groups {
                for service in services {
                    if service.category.trim().is_empty() {
                        return Err(CatalogError::MissingCategory {
                            provider: provider.clone(),
                            service_id: service.id.clone(),
                        });
                    }
                    if let Some(first) = seen.insert(service.id.as_str(), group.as_str()) {
                        return Err(CatalogError::DuplicateService {
                            provider: provider.clone(),
                            service_id: service.id.clone(),
                            first: first.to_string(),
                            second: group.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Services of a provider, or `None` if the provider is not in the catalog.
    pub fn provider(&self, name: &str) -> Option<&ProviderCatalog> {
        self.providers.get(name)
    }

    /// Provider names in sorted order.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Find a service by id across every group of a provider.
    pub fn find(&self, provider: &str, service_id: &str) -> Option<&ServiceDefinition> {
        self.provider(provider)?
            .values()
            .flatten()
            .find(|service| service.id == service_id)
    }

    /// All services of a provider with their group name.
    pub fn services<'a>(
        &'a self,
        provider: &str,
    ) -> impl Iterator<Item = (&'a str, &'a ServiceDefinition)> + 'a {
        self.providers
            .get(provider)
            .into_iter()
            .flat_map(|groups| {
                groups
                    .iter()
                    .flat_map(|(group, services)| services.iter().map(move |s| (group.as_str(), s)))
            })
    }
}
