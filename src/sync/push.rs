use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{unhandled_status, CommandFailure, SyncError};
use crate::client::Client;
use crate::commands::Command;

/// Per-command outcome: the string `"ok"` or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandStatus {
    Text(String),
    Rejected {
        #[serde(default)]
        error_code: i64,
        #[serde(default)]
        error: String,
    },
}

impl CommandStatus {
    fn rejection(&self) -> Option<(i64, String)> {
        match self {
            CommandStatus::Text(text) if text == "ok" => None,
            CommandStatus::Text(text) => Some((0, text.clone())),
            CommandStatus::Rejected { error_code, error } => Some((*error_code, error.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    sync_status: HashMap<String, CommandStatus>,
    #[serde(default)]
    temp_id_mapping: HashMap<String, i64>,
}

impl PushResponse {
    /// Rejections in queue order, followed by any status for a uuid the
    /// queue does not know.
    fn failures(&self, submitted: &[Command]) -> Vec<CommandFailure> {
        let mut failures: Vec<CommandFailure> = submitted
            .iter()
            .filter_map(|command| {
                let status = self.sync_status.get(command.uuid())?;
                let (code, message) = status.rejection()?;
                Some(CommandFailure {
                    uuid: command.uuid().to_string(),
                    code,
                    message,
                })
            })
            .collect();

        let mut unknown: Vec<CommandFailure> = self
            .sync_status
            .iter()
            .filter(|(uuid, _)| !submitted.iter().any(|command| command.uuid() == *uuid))
            .filter_map(|(uuid, status)| {
                let (code, message) = status.rejection()?;
                Some(CommandFailure {
                    uuid: uuid.clone(),
                    code,
                    message,
                })
            })
            .collect();
        unknown.sort_by(|left, right| left.uuid.cmp(&right.uuid));
        failures.extend(unknown);
        failures
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub submitted: usize,
    pub resolved_temp_ids: usize,
}

impl Client {
    /// Submits every queued command in one request.
    ///
    /// Encoding failures and transport or status failures leave the queue
    /// intact. Once the server has answered, the temp-id mappings it returned
    /// are recorded and the queue is cleared even if some commands were
    /// rejected; the rejections are reported together as
    /// [`SyncError::CommandsFailed`]. Local entities are not updated from the
    /// push; call [`Client::pull`] for that.
    pub fn push(&mut self) -> Result<PushSummary, SyncError> {
        if self.queue.is_empty() {
            return Ok(PushSummary::default());
        }

        let commands = self.queue.encode()?;
        debug!(op = "push", commands = self.queue.len(), "submitting commands");
        self.wire_log.commands(commands.as_bytes());
        let response = self.transport.post_form(
            &self.endpoint,
            &[("token", self.token.as_str()), ("commands", commands.as_str())],
        )?;
        self.wire_log.response(&response.body);
        if !response.is_success() {
            return Err(unhandled_status("push", &response));
        }

        let decoded: PushResponse =
            serde_json::from_slice(&response.body).map_err(|source| SyncError::Decode {
                op: "push",
                source,
            })?;

        let submitted = self.queue.len();
        let failures = decoded.failures(self.queue.commands());
        let resolved_temp_ids = decoded.temp_id_mapping.len();
        self.temp_ids.extend(decoded.temp_id_mapping);
        self.queue.clear();
        self.cooldown.invalidate();

        if !failures.is_empty() {
            for failure in &failures {
                warn!(
                    op = "push",
                    uuid = %failure.uuid,
                    code = failure.code,
                    message = %failure.message,
                    "command rejected"
                );
            }
            return Err(SyncError::CommandsFailed(failures));
        }

        info!(op = "push", submitted, resolved_temp_ids, "push applied");
        Ok(PushSummary {
            submitted,
            resolved_temp_ids,
        })
    }
}
