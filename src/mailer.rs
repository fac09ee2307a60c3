use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::api::AtencionApi;
use crate::app::Completion;
use crate::error::Result;
use crate::range::DateRange;

/// Asks the backend to build and email the report for a range.
pub struct ReportMailer {
    api: Arc<dyn AtencionApi>,
    tx: Sender<Completion>,
}

impl ReportMailer {
    pub fn new(api: Arc<dyn AtencionApi>, tx: Sender<Completion>) -> Self {
        Self { api, tx }
    }

    /// Validate `range` and send in the background. An incomplete range
    /// returns `InvalidRange` without touching the backend.
    pub fn send(&self, range: &DateRange) -> Result<()> {
        let query = range.query()?;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(start = %query.start_iso(), end = %query.end_iso(), "report send started");
        thread::spawn(move || {
            let result = api.send_report(&query);
            let _ = tx.send(Completion::ReportSent(result));
        });
        Ok(())
    }
}
