//! Submitting a new simulation from a JSON or YAML draft.

use std::path::Path;

use ef_core::{DraftReport, SimulationRecord, check_draft, normalize_dates};

use crate::client::CatalogSource;
use crate::error::{AppError, AppResult};

/// Read a draft; `.yaml`/`.yml` files are YAML, anything else JSON.
pub fn load_draft(path: &Path) -> AppResult<SimulationRecord> {
    let content = std::fs::read_to_string(path)?;
    let yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let draft = if yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            AppError::InvalidInput(format!("{}: invalid draft YAML: {e}", path.display()))
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            AppError::InvalidInput(format!("{}: invalid draft JSON: {e}", path.display()))
        })?
    };
    Ok(draft)
}

/// Check a draft and send it. Incomplete drafts and unparseable dates are
/// rejected before anything reaches the server.
pub fn submit_draft<C: CatalogSource + ?Sized>(
    source: &C,
    draft: &SimulationRecord,
) -> AppResult<(SimulationRecord, DraftReport)> {
    let report = check_draft(draft);
    if !report.is_ready() {
        return Err(AppError::InvalidInput(format!(
            "Missing required fields: {}",
            report.blocking().join(", ")
        )));
    }

    let mut draft = draft.clone();
    if !draft.id.is_empty() {
        tracing::debug!(id = %draft.id, "ignoring id on draft; the server assigns one");
        draft.id.clear();
    }
    normalize_dates(&mut draft)?;

    let created = source.create_simulation(&draft)?;
    Ok((created, report))
}
