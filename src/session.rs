//! Dashboard session.
//!
//! The session is the single owner of the record store and the current
//! filter selection. Reloads and selection changes are applied one at a
//! time through `&mut self`; only the fetches themselves run concurrently.
//!
//! Every fetch is tagged with a request token from a per-channel counter.
//! A completion is applied only if its token is still the latest issued on
//! that channel, so a slow response can never overwrite a newer one.

use crate::analysis::{compute_views, extract_all, views_for_subset, DashboardViews, ViewOptions};
use crate::error::FetchError;
use crate::models::{FilterSelection, Record};
use crate::source::RecordSource;
use crate::store::RecordStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Independent request sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Full record loads into the store.
    Records,
    /// Server-side filtered subsets for the current selection.
    Filtered,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    channel: Channel,
    seq: u64,
}

impl RequestToken {
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result replaced the current data.
    Applied { records: usize },
    /// A newer request was issued; the result was discarded.
    Stale,
    /// The fetch failed; previous data is kept and a notice was recorded.
    Failed,
}

/// Owns the store, the selection and the request sequencing.
#[derive(Debug, Default)]
pub struct Session {
    store: RecordStore,
    selection: FilterSelection,
    options: ViewOptions,
    remote_subset: Option<Arc<Vec<Record>>>,
    records_seq: u64,
    filtered_seq: u64,
    notices: Vec<String>,
}

impl Session {
    pub fn new(options: ViewOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Issue a token for a new fetch on `channel`, superseding earlier ones.
    pub fn issue(&mut self, channel: Channel) -> RequestToken {
        let seq = match channel {
            Channel::Records => {
                self.records_seq += 1;
                self.records_seq
            }
            Channel::Filtered => {
                self.filtered_seq += 1;
                self.filtered_seq
            }
        };

        debug!("Issued {:?} request #{}", channel, seq);
        RequestToken { channel, seq }
    }

    /// Whether `token` is still the latest on its channel.
    pub fn is_current(&self, token: RequestToken) -> bool {
        let latest = match token.channel {
            Channel::Records => self.records_seq,
            Channel::Filtered => self.filtered_seq,
        };
        token.seq == latest
    }

    /// Apply the result of the fetch identified by `token`.
    pub fn complete(
        &mut self,
        token: RequestToken,
        origin: &str,
        result: Result<Vec<Record>, FetchError>,
    ) -> LoadOutcome {
        if !self.is_current(token) {
            info!(
                "Discarding out-of-date {:?} response #{} from {}",
                token.channel, token.seq, origin
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(records) => {
                let count = records.len();
                match token.channel {
                    Channel::Records => self.store.replace(records, origin),
                    Channel::Filtered => self.remote_subset = Some(Arc::new(records)),
                }
                LoadOutcome::Applied { records: count }
            }
            Err(e) => {
                warn!("Fetch from {} failed: {}", origin, e);
                let kept = match token.channel {
                    Channel::Records if self.store.is_loaded() => "keeping the previous records",
                    Channel::Records => "no records loaded",
                    Channel::Filtered => "falling back to local filtering",
                };
                self.notices
                    .push(format!("Could not load data from {} ({}): {}", origin, kept, e));
                if token.channel == Channel::Filtered {
                    self.remote_subset = None;
                }
                LoadOutcome::Failed
            }
        }
    }

    /// Issue, fetch and apply a full reload from `source`.
    pub async fn load<S: RecordSource>(&mut self, source: &S) -> LoadOutcome {
        let token = self.issue(Channel::Records);
        let result = source.fetch_all().await;
        self.complete(token, &source.describe(), result)
    }

    /// Replace the selection.
    ///
    /// A changed selection invalidates any server-filtered subset and any
    /// filtered fetch still in flight.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        if selection == self.selection {
            return;
        }

        debug!("Selection changed: {:?}", selection);
        self.selection = selection;
        self.remote_subset = None;
        self.filtered_seq += 1;
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Non-fatal notices raised so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Whether the current subset came from the server-side filter.
    pub fn uses_remote_subset(&self) -> bool {
        self.remote_subset.is_some()
    }

    /// Recompute every view from the current store and selection.
    pub fn views(&self) -> DashboardViews {
        match &self.remote_subset {
            Some(subset) => {
                let refs: Vec<&Record> = subset.iter().collect();
                views_for_subset(extract_all(self.store.records()), &refs, &self.options)
            }
            None => compute_views(self.store.records(), &self.selection, &self.options),
        }
    }
}
