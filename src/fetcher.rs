use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::api::AtencionApi;
use crate::app::Completion;
use crate::range::RangeQuery;

/// Issues listing requests on worker threads and tracks which one is
/// current. Every request gets a sequence number; only the newest may be
/// applied.
pub struct RangeFetcher {
    api: Arc<dyn AtencionApi>,
    tx: Sender<Completion>,
    latest: u64,
    in_flight: bool,
}

impl RangeFetcher {
    pub fn new(api: Arc<dyn AtencionApi>, tx: Sender<Completion>) -> Self {
        Self {
            api,
            tx,
            latest: 0,
            in_flight: false,
        }
    }

    /// Start a request for `query`; returns its sequence number.
    pub fn fetch(&mut self, query: RangeQuery) -> u64 {
        self.latest += 1;
        self.in_flight = true;
        let seq = self.latest;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        debug!(seq, start = %query.start_iso(), end = %query.end_iso(), "fetch started");
        thread::spawn(move || {
            let result = api.list(&query);
            // The receiver is gone only when the app is shutting down.
            let _ = tx.send(Completion::Fetched { seq, result });
        });
        seq
    }

    /// True while the newest request has not completed.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Decide whether the completion tagged `seq` should be applied.
    pub fn accept(&mut self, seq: u64) -> bool {
        if seq != self.latest {
            warn!(seq, latest = self.latest, "discarding stale fetch response");
            return false;
        }
        self.in_flight = false;
        true
    }
}
