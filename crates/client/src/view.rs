//! View synchronizer
//!
//! Holds the fragments rendered from the last list response to arrive and a
//! per-resource status machine fed by status fetches. Only confirmed backend
//! data ever reaches the view.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Display unit for one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub status_class: String,
    pub details: Vec<String>,
}

impl Fragment {
    pub fn new(id: u64, name: impl Into<String>, status: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            id,
            name: name.into(),
            status_class: status_class(&status),
            status,
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.status_class = status_class(status);
    }
}

fn status_class(status: &str) -> String {
    status.trim().to_lowercase()
}

/// A record that can be shown in a list
pub trait Renderable {
    fn id(&self) -> u64;
    fn fragment(&self) -> Fragment;
}

/// Order-preserving map from records to fragments
pub fn render_list<R: Renderable>(resources: &[R]) -> Vec<Fragment> {
    resources.iter().map(Renderable::fragment).collect()
}

/// Entries whose name contains `term` (case-insensitive) and whose status
/// equals `status` (case-insensitive) or `status` is `"all"`
pub fn filter_entries(entries: &[Fragment], term: &str, status: &str) -> Vec<Fragment> {
    let term = term.trim().to_lowercase();
    let status = status.trim();
    let any_status = status.is_empty() || status.eq_ignore_ascii_case("all");

    entries
        .iter()
        .filter(|e| term.is_empty() || e.name.to_lowercase().contains(&term))
        .filter(|e| any_status || e.status.eq_ignore_ascii_case(status))
        .cloned()
        .collect()
}

/// Displayed status of one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayStatus {
    Unknown,
    /// A fetch is in flight; `previous` keeps showing meanwhile
    Pending { previous: Option<String> },
    Displayed(String),
    Error(String),
}

impl DisplayStatus {
    /// The status text currently on screen
    pub fn shown(&self) -> Option<&str> {
        match self {
            DisplayStatus::Displayed(s) => Some(s),
            DisplayStatus::Pending { previous } => previous.as_deref(),
            DisplayStatus::Unknown | DisplayStatus::Error(_) => None,
        }
    }

    fn begin(self) -> Self {
        match self {
            DisplayStatus::Displayed(s) => DisplayStatus::Pending { previous: Some(s) },
            DisplayStatus::Pending { previous } => DisplayStatus::Pending { previous },
            DisplayStatus::Unknown | DisplayStatus::Error(_) => {
                DisplayStatus::Pending { previous: None }
            }
        }
    }

    fn fail(self, message: String) -> Self {
        match self {
            DisplayStatus::Displayed(s) | DisplayStatus::Pending { previous: Some(s) } => {
                DisplayStatus::Displayed(s)
            }
            DisplayStatus::Pending { previous: None }
            | DisplayStatus::Unknown
            | DisplayStatus::Error(_) => DisplayStatus::Error(message),
        }
    }
}

/// Issuance number of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListTicket(u64);

#[derive(Default)]
struct ViewState {
    entries: Vec<Fragment>,
    statuses: HashMap<u64, DisplayStatus>,
    last_applied: Option<ListTicket>,
    revision: u64,
}

/// Rendered list plus status machines for one resource kind
#[derive(Default)]
pub struct ViewSynchronizer {
    state: RwLock<ViewState>,
    issued: AtomicU64,
}

impl ViewSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number the next list request
    pub fn begin_list(&self) -> ListTicket {
        ListTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replace the displayed list with a completed response
    ///
    /// The last response to arrive wins, even when it was issued before the
    /// one currently displayed.
    pub fn apply_list<R: Renderable>(&self, ticket: ListTicket, resources: &[R]) {
        let entries = render_list(resources);
        let mut state = self.state.write();

        if let Some(last) = state.last_applied {
            if ticket < last {
                debug!(
                    applied = ticket.0,
                    displayed = last.0,
                    "Older list response arrived last and replaces newer one"
                );
            }
        }

        let mut statuses = HashMap::with_capacity(entries.len());
        for entry in &entries {
            statuses.insert(entry.id, DisplayStatus::Displayed(entry.status.clone()));
        }

        state.entries = entries;
        state.statuses = statuses;
        state.last_applied = Some(ticket);
        state.revision += 1;
    }

    pub fn entries(&self) -> Vec<Fragment> {
        self.state.read().entries.clone()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.state.read().entries.iter().map(|e| e.id).collect()
    }

    /// Filter the displayed entries; never touches the network
    pub fn filter(&self, term: &str, status: &str) -> Vec<Fragment> {
        filter_entries(&self.state.read().entries, term, status)
    }

    /// Bumped every time a list response is applied
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn status_of(&self, id: u64) -> DisplayStatus {
        self.state
            .read()
            .statuses
            .get(&id)
            .cloned()
            .unwrap_or(DisplayStatus::Unknown)
    }

    pub fn begin_status(&self, id: u64) {
        let mut state = self.state.write();
        let current = state.statuses.remove(&id).unwrap_or(DisplayStatus::Unknown);
        state.statuses.insert(id, current.begin());
    }

    /// Record a fetched status; updates the matching entry if one is shown
    pub fn status_succeeded(&self, id: u64, status: &str) {
        let mut state = self.state.write();
        state
            .statuses
            .insert(id, DisplayStatus::Displayed(status.to_string()));
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) {
            entry.set_status(status);
        }
    }

    /// Record a failed fetch; the last shown status stays
    pub fn status_failed(&self, id: u64, message: &str) {
        let mut state = self.state.write();
        let current = state.statuses.remove(&id).unwrap_or(DisplayStatus::Unknown);
        state.statuses.insert(id, current.fail(message.to_string()));
    }
}
