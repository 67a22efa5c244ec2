//! Catalog data sources.
//!
//! [`CatalogSource`] is the seam between the services and wherever records
//! come from: the REST API ([`HttpCatalogClient`]) or a JSON snapshot on disk
//! ([`FileCatalog`]).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

use ef_core::{SimulationRecord, parse_records};

use crate::config::CatalogConfig;
use crate::error::{AppError, AppResult};

pub trait CatalogSource {
    /// The full record set, consumed wholesale.
    fn fetch_simulations(&self) -> AppResult<Vec<SimulationRecord>>;

    /// One record by id; a missing record is [`AppError::NotFound`].
    fn fetch_simulation(&self, id: &str) -> AppResult<SimulationRecord>;

    /// Ask the backend for a prose comparison of `simulations`.
    fn analyze_simulations(&self, simulations: &[SimulationRecord]) -> AppResult<String>;

    /// Store a new simulation; returns the record as created, id assigned.
    fn create_simulation(&self, draft: &SimulationRecord) -> AppResult<SimulationRecord>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    simulations: &'a [SimulationRecord],
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    summary: Option<String>,
}

/// Blocking REST client.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    agent: ureq::Agent,
    base_url: String,
    disable_cache: bool,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            agent,
            base_url: config.base_url().to_string(),
            disable_cache: config.disable_cache,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `{base}/simulations/{id}` with `id` percent-encoded as one path segment.
    fn record_url(&self, id: &str) -> AppResult<String> {
        let invalid =
            |detail: String| AppError::Config(format!("Bad api_url {}: {detail}", self.base_url));
        let mut url =
            Url::parse(&self.url("simulations")).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot hold a path".to_string()))?
            .push(id);
        Ok(url.into())
    }
}

fn fetch_error(url: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(code, _) => AppError::Fetch(format!("{url} returned HTTP {code}")),
        ureq::Error::Transport(transport) => AppError::Fetch(format!("{url}: {transport}")),
    }
}

fn read_json<T: DeserializeOwned>(url: &str, response: ureq::Response) -> AppResult<T> {
    response.into_json().map_err(|e: io::Error| match e.kind() {
        io::ErrorKind::InvalidData => AppError::Record(format!("{url}: malformed response: {e}")),
        _ => AppError::Fetch(format!("{url}: failed to read body: {e}")),
    })
}

impl CatalogSource for HttpCatalogClient {
    fn fetch_simulations(&self) -> AppResult<Vec<SimulationRecord>> {
        let url = self.url("simulations");
        let mut request = self.agent.get(&url);
        if self.disable_cache {
            request = request.set("Cache-Control", "no-cache");
        }

        let response = request.call().map_err(|e| fetch_error(&url, e))?;
        let records: Vec<SimulationRecord> = read_json(&url, response)?;
        tracing::info!(count = records.len(), "fetched simulations");
        Ok(records)
    }

    fn fetch_simulation(&self, id: &str) -> AppResult<SimulationRecord> {
        let url = self.record_url(id)?;
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => return Err(AppError::NotFound(id.to_string())),
            Err(err) => return Err(fetch_error(&url, err)),
        };
        read_json(&url, response)
    }

    fn analyze_simulations(&self, simulations: &[SimulationRecord]) -> AppResult<String> {
        let url = self.url("ai/analyze-simulations");
        let response = self
            .agent
            .post(&url)
            .send_json(AnalyzeRequest { simulations })
            .map_err(|e| fetch_error(&url, e))?;
        let parsed: AnalyzeResponse = read_json(&url, response)?;
        Ok(parsed.summary.unwrap_or_default())
    }

    fn create_simulation(&self, draft: &SimulationRecord) -> AppResult<SimulationRecord> {
        let url = self.url("simulations");
        let response = self
            .agent
            .post(&url)
            .send_json(draft)
            .map_err(|e| fetch_error(&url, e))?;
        if response.status() != 201 {
            return Err(AppError::Fetch(format!(
                "{url} returned HTTP {} instead of 201 Created",
                response.status()
            )));
        }
        let created: SimulationRecord = read_json(&url, response)?;
        tracing::info!(id = %created.id, name = %created.name, "simulation created");
        Ok(created)
    }
}

/// A JSON snapshot of the record set, as served statically at `/data/simulations.json`.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileCatalog {
    fn fetch_simulations(&self) -> AppResult<Vec<SimulationRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::Fetch(format!("{}: {e}", self.path.display())))?;
        Ok(parse_records(&content)?)
    }

    fn fetch_simulation(&self, id: &str) -> AppResult<SimulationRecord> {
        self.fetch_simulations()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    fn analyze_simulations(&self, _simulations: &[SimulationRecord]) -> AppResult<String> {
        Err(AppError::Fetch(
            "summaries need the catalog API, not a snapshot file".to_string(),
        ))
    }

    fn create_simulation(&self, _draft: &SimulationRecord) -> AppResult<SimulationRecord> {
        Err(AppError::InvalidInput(
            "submitting needs the catalog API, not a snapshot file".to_string(),
        ))
    }
}
