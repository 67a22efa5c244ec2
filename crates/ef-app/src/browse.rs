//! Browsing: the loaded record set, its filter state and derived options.

use ef_core::{SimulationRecord, sanitize_records};
use ef_filter::{
    AvailableOptions, Facet, FacetValue, FilterState, available_options, filter_records,
    merge_query, to_query_string,
};

use crate::client::CatalogSource;
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct BrowseSession {
    records: Vec<SimulationRecord>,
    options: AvailableOptions,
    filters: FilterState,
}

impl BrowseSession {
    /// Repair the record set and derive its filter options. Offending
    /// records are logged and dropped; the rest stay browsable.
    pub fn new(records: Vec<SimulationRecord>) -> Self {
        let (records, violations) = sanitize_records(records);
        for violation in &violations {
            tracing::warn!(%violation, "skipping invalid record data");
        }
        let options = available_options(&records);
        Self {
            records,
            options,
            filters: FilterState::new(),
        }
    }

    pub fn load<C: CatalogSource + ?Sized>(source: &C) -> AppResult<Self> {
        Ok(Self::new(source.fetch_simulations()?))
    }

    pub fn records(&self) -> &[SimulationRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&SimulationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn options(&self) -> &AvailableOptions {
        &self.options
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn apply_filter(&mut self, facet: Facet, value: FacetValue) -> AppResult<()> {
        self.filters.apply_filter(facet, value)?;
        Ok(())
    }

    pub fn toggle_value(&mut self, facet: Facet, value: &str) -> AppResult<bool> {
        Ok(self.filters.toggle_value(facet, value)?)
    }

    pub fn set_name_query(&mut self, query: impl Into<String>) {
        self.filters.set_name_query(query);
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset_filters();
    }

    /// Merge URL query parameters into the current filters.
    pub fn apply_query(&mut self, query: &str) {
        merge_query(&mut self.filters, query);
    }

    pub fn query_string(&self) -> String {
        to_query_string(&self.filters)
    }

    pub fn filtered(&self) -> Vec<&SimulationRecord> {
        filter_records(&self.records, &self.filters)
    }

    /// Records for `ids`, in the order given; unknown ids are skipped.
    pub fn records_for(&self, ids: &[String]) -> Vec<SimulationRecord> {
        ids.iter()
            .filter_map(|id| self.record(id))
            .cloned()
            .collect()
    }
}
