use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::api::AtencionApi;
use crate::error::Result;
use crate::fetcher::RangeFetcher;
use crate::filter::FilterSet;
use crate::mailer::ReportMailer;
use crate::models::{Column, VisitRecord};
use crate::notifier::Notifier;
use crate::range::DateRange;
use crate::store::RecordStore;

pub const MSG_CONNECTION_ERROR: &str = "Error al conectar con el backend.";
pub const MSG_SELECT_RANGE: &str = "Selecciona un rango válido";
pub const MSG_REPORT_SENT: &str = "📬 Reporte enviado al correo registrado.";
pub const MSG_REPORT_FAILED: &str = "❌ No se pudo enviar el correo.";

/// Result of a background job, delivered to the UI thread.
pub enum Completion {
    Fetched {
        seq: u64,
        result: Result<Vec<VisitRecord>>,
    },
    ReportSent(Result<()>),
}

/// Every user-driven mutation of the dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRange(DateRange),
    Today,
    Yesterday,
    ClearRange,
    SetFilter(Column, String),
    PushFilterChar(Column, char),
    PopFilterChar(Column),
    Export,
    SendReport,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub store: RecordStore,
    pub filters: FilterSet,
    pub range: DateRange,
    pub notifier: Notifier,
    pub loading: bool,
}

pub struct App {
    pub state: AppState,
    fetcher: RangeFetcher,
    mailer: ReportMailer,
    rx: Receiver<Completion>,
    pending: usize,
    #[cfg_attr(not(feature = "xlsx"), allow(dead_code))]
    export_dir: PathBuf,
}

impl App {
    pub fn new(api: Arc<dyn AtencionApi>, export_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state: AppState::default(),
            fetcher: RangeFetcher::new(Arc::clone(&api), tx.clone()),
            mailer: ReportMailer::new(api, tx),
            rx,
            pending: 0,
            export_dir,
        }
    }

    pub fn dispatch(&mut self, cmd: Command) {
        self.dispatch_at(cmd, Instant::now());
    }

    pub fn dispatch_at(&mut self, cmd: Command, now: Instant) {
        match cmd {
            Command::SetRange(range) => self.set_range(range, now),
            Command::Today => self.set_range(DateRange::today(), now),
            Command::Yesterday => self.set_range(DateRange::yesterday(), now),
            Command::ClearRange => self.state.range = DateRange::default(),
            Command::SetFilter(col, pattern) => {
                self.state.filters.set(col, pattern);
                self.refilter();
            }
            Command::PushFilterChar(col, c) => {
                self.state.filters.push_char(col, c);
                self.refilter();
            }
            Command::PopFilterChar(col) => {
                self.state.filters.pop_char(col);
                self.refilter();
            }
            Command::Export => self.export(now),
            Command::SendReport => self.send_report(now),
        }
    }

    /// Apply every finished background job. Returns true if anything changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.rx.try_recv() {
            self.complete(done, Instant::now());
            changed = true;
        }
        changed
    }

    /// Expire the notification. Returns true when the screen must redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.state.notifier.tick(now)
    }

    pub fn notification(&self, now: Instant) -> Option<&str> {
        self.state.notifier.visible(now)
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.state.notifier.notify(message, Instant::now());
    }

    fn refilter(&mut self) {
        self.state.store.recompute(&self.state.filters);
    }

    fn set_range(&mut self, range: DateRange, now: Instant) {
        self.state.range = range;
        if !range.is_complete() {
            return;
        }
        match range.query() {
            Ok(query) => {
                self.fetcher.fetch(query);
                self.pending += 1;
                self.state.loading = self.fetcher.is_loading();
            }
            Err(e) => {
                error!(error = %e, "could not build range query");
                self.state.notifier.notify(e.to_string(), now);
            }
        }
    }

    fn send_report(&mut self, now: Instant) {
        match self.mailer.send(&self.state.range) {
            Ok(()) => self.pending += 1,
            Err(e) if e.is_validation() => {
                self.state.notifier.notify(MSG_SELECT_RANGE, now);
            }
            Err(e) => {
                error!(error = %e, "report request failed");
                self.state.notifier.notify(e.to_string(), now);
            }
        }
    }

    #[cfg(feature = "xlsx")]
    fn export(&mut self, now: Instant) {
        let visible = self.state.store.visible();
        match crate::export::export(visible, &self.state.range, &self.export_dir) {
            Ok(path) => {
                self.state
                    .notifier
                    .notify(format!("📁 Exportado: {}", path.display()), now);
            }
            Err(crate::error::AtencionesError::InvalidRange) => {
                self.state.notifier.notify(MSG_SELECT_RANGE, now);
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.state
                    .notifier
                    .notify(format!("❌ No se pudo exportar: {e}"), now);
            }
        }
    }

    #[cfg(not(feature = "xlsx"))]
    fn export(&mut self, now: Instant) {
        self.state
            .notifier
            .notify("Exportación no disponible (compilado sin xlsx)", now);
    }

    fn complete(&mut self, done: Completion, now: Instant) {
        self.pending = self.pending.saturating_sub(1);
        match done {
            Completion::Fetched { seq, result } => {
                if !self.fetcher.accept(seq) {
                    return;
                }
                self.state.loading = false;
                match result {
                    Ok(records) => {
                        self.state.store.replace(records, &self.state.filters);
                        info!(
                            seq,
                            count = self.state.store.all().len(),
                            visible = self.state.store.visible().len(),
                            "records loaded"
                        );
                    }
                    Err(e) => {
                        error!(seq, error = %e, "fetch failed");
                        self.state.notifier.notify(MSG_CONNECTION_ERROR, now);
                    }
                }
            }
            Completion::ReportSent(Ok(())) => {
                self.state.notifier.notify(MSG_REPORT_SENT, now);
            }
            Completion::ReportSent(Err(e)) => {
                error!(error = %e, "report email failed");
                self.state.notifier.notify(MSG_REPORT_FAILED, now);
            }
        }
    }

    /// Block until every background job has completed.
    #[cfg(test)]
    fn settle(&mut self) {
        while self.pending > 0 {
            let done = self
                .rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .expect("background job did not finish");
            self.complete(done, Instant::now());
        }
    }
}
