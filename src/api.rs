use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AtencionesError, Result};
use crate::models::VisitRecord;
use crate::range::RangeQuery;

pub const LIST_PATH: &str = "/atencion";
pub const REPORT_PATH: &str = "/atencion/enviar-reporte-excel";

/// The two backend endpoints the dashboard relies on.
pub trait AtencionApi: Send + Sync {
    fn list(&self, query: &RangeQuery) -> Result<Vec<VisitRecord>>;
    fn send_report(&self, query: &RangeQuery) -> Result<()>;
}

/// Blocking HTTP client for the backend. Non-2xx responses surface as
/// `AtencionesError::Network`.
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl AtencionApi for HttpApi {
    fn list(&self, query: &RangeQuery) -> Result<Vec<VisitRecord>> {
        let url = self.url(LIST_PATH);
        debug!(%url, start = %query.start_iso(), end = %query.end_iso(), "listing visits");
        let response = self
            .agent
            .get(&url)
            .query("start", &query.start_iso())
            .query("end", &query.end_iso())
            .call()?;
        let records: Vec<VisitRecord> = response
            .into_json()
            .map_err(|e| AtencionesError::Decode(e.to_string()))?;
        info!(count = records.len(), "visits fetched");
        Ok(records)
    }

    fn send_report(&self, query: &RangeQuery) -> Result<()> {
        let url = self.url(REPORT_PATH);
        debug!(%url, "requesting report email");
        self.agent.post(&url).send_json(serde_json::json!({
            "start": query.start_iso(),
            "end": query.end_iso(),
        }))?;
        info!(start = %query.start_iso(), end = %query.end_iso(), "report email requested");
        Ok(())
    }
}
