use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{unhandled_status, PullOutcome, SyncError};
use crate::cache::Cache;
use crate::client::Client;
use crate::domain::{Item, Label, Note, Project, ResourceType};

/// The subset of a sync response this client consumes.
#[derive(Debug, Deserialize)]
struct PullResponse {
    sync_token: String,
    #[serde(default)]
    full_sync: bool,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    pub sync_token: String,
    pub full_sync: bool,
    pub labels: usize,
    pub projects: usize,
    pub items: usize,
    pub notes: usize,
}

fn resource_types_field() -> String {
    let names: Vec<&str> = ResourceType::ALL.iter().map(|kind| kind.as_str()).collect();
    serde_json::Value::from(names).to_string()
}

fn apply(cache: &mut Cache, response: PullResponse) -> PullSummary {
    cache.set_sync_token(response.sync_token.clone());
    PullSummary {
        sync_token: response.sync_token,
        full_sync: response.full_sync,
        labels: cache.upsert_all(response.labels),
        projects: cache.upsert_all(response.projects),
        items: cache.upsert_all(response.items),
        notes: cache.upsert_all(response.notes),
    }
}

impl Client {
    /// Fetches everything changed since the last pull and folds it into the
    /// cache.
    ///
    /// Returns [`PullOutcome::Skipped`] without any request while the last
    /// pull is younger than the cooldown window and nothing was pushed since.
    /// On any failure the cache and sync token are left untouched.
    pub fn pull(&mut self) -> Result<PullOutcome, SyncError> {
        if self.cooldown.is_fresh(self.clock.now()) {
            debug!(op = "pull", "last pull still fresh, skipping");
            return Ok(PullOutcome::Skipped);
        }

        let resource_types = resource_types_field();
        let response = self.transport.post_form(
            &self.endpoint,
            &[
                ("token", self.token.as_str()),
                ("sync_token", self.cache.sync_token()),
                ("resource_types", resource_types.as_str()),
            ],
        )?;
        self.wire_log.response(&response.body);
        if !response.is_success() {
            return Err(unhandled_status("pull", &response));
        }

        let decoded: PullResponse =
            serde_json::from_slice(&response.body).map_err(|source| SyncError::Decode {
                op: "pull",
                source,
            })?;
        let summary = apply(&mut self.cache, decoded);
        self.cooldown.mark(self.clock.now());
        info!(
            op = "pull",
            full_sync = summary.full_sync,
            labels = summary.labels,
            projects = summary.projects,
            items = summary.items,
            notes = summary.notes,
            "pull applied"
        );
        Ok(PullOutcome::Pulled(summary))
    }
}
