//! Evaluate command handler.

use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::context::{Context, FromRef};
use crate::models::{Challenge, EvaluationResult, Submission};
use crate::services::{EvaluationOptions, EvaluationService};

use super::{App, Format};

impl App {
    /// Evaluate a submission file against a challenge file and print the result.
    pub async fn run_evaluate(
        &self,
        challenge_path: &Path,
        submission_path: &Path,
        qualitative: bool,
        format: Format,
    ) -> Result<()> {
        let challenge: Challenge = read_json(challenge_path)?;
        let submission: Submission = read_json(submission_path)?;

        let mut config = Config::load()?;
        if qualitative {
            config.oracle.enabled = true;
        }
        let ctx = Context::from_config(config)?;

        // Ctrl-C abandons a pending oracle call; the result is scored without it.
        let cancel = CancellationToken::new();
        let mut options = if qualitative {
            EvaluationOptions::requested(&ctx.config.oracle)
        } else {
            EvaluationOptions::default()
        };
        if let Some(review) = options.qualitative.take() {
            spawn_interrupt_handler(cancel.clone());
            options = EvaluationOptions::with_qualitative(review.with_cancellation(cancel.clone()));
        }

        let service = EvaluationService::from_ref(&ctx);
        let result = service.evaluate(&submission, &challenge, &options).await?;
        cancel.cancel();

        match format {
            Format::Text => print_summary(&result),
            Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            Format::Toon => println!(
                "{}",
                serde_toon::to_string(&result)
                    .map_err(|e| color_eyre::eyre::eyre!("TOON serialization error: {}", e))?
            ),
        }

        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("Invalid JSON in {}", path.display()))
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    tracing::warn!("Interrupted, abandoning qualitative review");
                    cancel.cancel();
                }
            }
        }
    });
}

fn print_summary(result: &EvaluationResult) {
    println!("Status: {}", result.status);
    println!("Score:  {}", result.score);
    println!("Cost:   ${:.2}/month", result.cost);
    println!("Nodes:  {}", result.complexity);

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            println!("  - {}", error);
        }
    }

    if !result.feedback.is_empty() {
        println!();
        for line in &result.feedback {
            println!("{}", line);
        }
    }
}
