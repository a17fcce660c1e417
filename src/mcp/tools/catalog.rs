//! Catalog tools - browse priced services per provider.

use rmcp::{
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::mcp::protocol::PaginatedResponse;
use crate::mcp::server::McpServer;
use crate::services::{CostCalculator, EvaluationService};

const DEFAULT_PAGE_SIZE: usize = 50;

/// Parameters for list_services tool.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListServicesParams {
    /// Provider to list (e.g., "AWS"). Omit for every provider.
    #[serde(default)]
    pub provider: Option<String>,
    /// Only services of this category (compute, storage, database, ...).
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Page size (default 50).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One catalog entry with its estimated monthly cost per new instance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListing {
    pub provider: String,
    pub group: String,
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_cost: f64,
    pub monthly_cost: f64,
}

#[tool_router(router = catalog_tools, vis = "pub(crate)")]
impl McpServer {
    #[tool(
        description = "List catalog services with their estimated monthly cost. Use the service id inside node ids: <provider>-<serviceId>-<suffix>."
    )]
    pub async fn list_services(
        &self,
        Parameters(params): Parameters<ListServicesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            provider = ?params.provider,
            category = ?params.category,
            "Running list_services tool"
        );

        let service = self.resolve::<EvaluationService>();
        let listings = list_services(&service, &params)?;

        PaginatedResponse::page(
            listings,
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .into()
    }
}

/// Flatten the catalog into listings, filtered by provider and category.
fn list_services(
    service: &EvaluationService,
    params: &ListServicesParams,
) -> Result<Vec<ServiceListing>, AppError> {
    let catalog = service.catalog();

    let providers: Vec<&str> = match params.provider.as_deref() {
        Some(name) if catalog.provider(name).is_none() => {
            return Err(AppError::UnsupportedProvider(name.to_string()));
        }
        Some(name) => vec![name],
        None => catalog.providers().collect(),
    };

    let listings = providers
        .into_iter()
        .flat_map(|provider| {
            catalog
                .services(provider)
                .map(move |(group, def)| (provider, group, def))
        })
        .filter(|(_, _, def)| {
            params
                .category
                .as_deref()
                .map_or(true, |category| def.category.eq_ignore_ascii_case(category))
        })
        .map(|(provider, group, def)| ServiceListing {
            provider: provider.to_string(),
            group: group.to_string(),
            id: def.id.clone(),
            name: def.name.clone(),
            category: def.category.clone(),
            unit_cost: def.cost,
            monthly_cost: CostCalculator::monthly_cost(def),
        })
        .collect();

    Ok(listings)
}
