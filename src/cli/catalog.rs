//! Catalog command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::error::AppError;
use crate::services::CostCalculator;

use super::App;

impl App {
    /// Print catalog services grouped by provider.
    pub fn run_catalog(&self, provider: Option<&str>) -> Result<()> {
        let ctx = Context::from_config(Config::load()?)?;
        let catalog = &ctx.catalog;

        let providers: Vec<&str> = match provider {
            Some(name) if catalog.provider(name).is_none() => {
                return Err(AppError::UnsupportedProvider(name.to_string()).into());
            }
            Some(name) => vec![name],
            None => catalog.providers().collect(),
        };

        for name in providers {
            println!("{}", name);
            for (group, service) in catalog.services(name) {
                println!(
                    "  {:<28} {:<12} {:<10} ${:>10.2}/month  {}",
                    service.id,
                    group,
                    service.category,
                    CostCalculator::monthly_cost(service),
                    service.name
                );
            }
        }

        Ok(())
    }
}
