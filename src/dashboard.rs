//! What the face shows: loading, an error, or a reading.

use std::sync::Arc;

use crate::atmosphere::{service::ReadingService, Backend, BackendError, Reading};

/// Shown whenever a fetch fails, regardless of why.
pub const ERROR_MESSAGE: &str = "Could not fetch data. Check your internet connection or API key.";

/// The single value that drives rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(&'static str),
    Loaded(Arc<Reading>),
}

/// Permission to resolve the outstanding fetch.
///
/// Only one ticket is outstanding at a time, and it cannot be copied.
#[derive(Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

/// Presentation state machine.
///
/// ```text
/// mount ──> Loading ──ok──> Loaded ─┐
///              ^   └─err──> Error ──┤
///              └────── refresh ─────┘
/// ```
#[derive(Debug)]
pub struct Dashboard {
    state: ViewState,
    issued: u64,
}

impl Dashboard {
    /// Mount the view: start in `Loading` and hand back the ticket for the initial fetch.
    pub fn mount() -> (Self, RefreshTicket) {
        let dashboard = Dashboard {
            state: ViewState::Loading,
            issued: 1,
        };
        (dashboard, RefreshTicket { seq: 1 })
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The current reading, if one is displayed.
    pub fn reading(&self) -> Option<&Reading> {
        match &self.state {
            ViewState::Loaded(r) => Some(r.as_ref()),
            _ => None,
        }
    }

    /// Whether the refresh control is live.
    pub fn refresh_enabled(&self) -> bool {
        !matches!(self.state, ViewState::Loading)
    }

    /// Manual refresh.
    ///
    /// Returns the ticket for a new fetch, or `None` if one is already in flight.
    pub fn request_refresh(&mut self) -> Option<RefreshTicket> {
        if !self.refresh_enabled() {
            tracing::debug!("refresh ignored; already loading");
            return None;
        }
        self.issued += 1;
        self.state = ViewState::Loading;
        tracing::info!(seq = self.issued, "refresh requested");
        Some(RefreshTicket { seq: self.issued })
    }

    /// Apply the outcome of the fetch identified by `ticket`.
    pub fn resolve(&mut self, ticket: RefreshTicket, result: Result<Reading, BackendError>) {
        if ticket.seq != self.issued || self.refresh_enabled() {
            tracing::warn!(seq = ticket.seq, "dropping result for stale refresh");
            return;
        }
        self.state = match result {
            Ok(reading) => ViewState::Loaded(Arc::new(reading)),
            Err(e) => {
                tracing::error!("could not load reading: {e}");
                ViewState::Error(ERROR_MESSAGE)
            }
        };
    }

    /// Request, fetch, and resolve in one go, on the calling thread.
    ///
    /// Returns false if a fetch was already in flight.
    pub fn refresh_with<B: Backend>(&mut self, service: &ReadingService<B>) -> bool {
        match self.request_refresh() {
            Some(ticket) => {
                self.resolve(ticket, service.fetch());
                true
            }
            None => false,
        }
    }
}
