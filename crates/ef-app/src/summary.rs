//! AI summary of the selected simulations.

use std::sync::Arc;

use ef_core::SimulationRecord;

use crate::client::CatalogSource;
use crate::error::AppResult;
use crate::fetch::{FetchSlot, FetchWorker};

/// Shown in place of the summary when the request fails.
pub const SUMMARY_ERROR_TEXT: &str = "Error generating summary.";

/// Text for the summary area. Failures are logged and replaced by
/// [`SUMMARY_ERROR_TEXT`].
pub fn summary_text(result: AppResult<String>) -> String {
    match result {
        Ok(summary) => summary,
        Err(err) => {
            tracing::error!(error = %err, "summary request failed");
            SUMMARY_ERROR_TEXT.to_string()
        }
    }
}

pub fn generate_summary<C: CatalogSource + ?Sized>(
    source: &C,
    simulations: &[SimulationRecord],
) -> String {
    summary_text(source.analyze_simulations(simulations))
}

/// Run the summary request in the background against `slot`.
pub fn spawn_summary<C>(
    source: Arc<C>,
    simulations: Vec<SimulationRecord>,
    slot: &mut FetchSlot<String>,
) -> FetchWorker<String>
where
    C: CatalogSource + Send + Sync + ?Sized + 'static,
{
    let ticket = slot.begin();
    FetchWorker::start(ticket, move || source.analyze_simulations(&simulations))
}
