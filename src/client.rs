use std::collections::HashMap;
use std::time::Duration;

use crate::cache::Cache;
use crate::commands::CommandQueue;
use crate::id::Id;
use crate::sync::{Cooldown, DEFAULT_PULL_COOLDOWN};
use crate::transport::{Clock, HttpTransport, SystemClock, Transport, WireLog};

pub const DEFAULT_ENDPOINT: &str = "https://api.todoist.com/sync/v8/sync";

/// Stateful sync API client.
///
/// Reads go to the in-memory [`Cache`] and never touch the network. Writes
/// are queued as commands, sent in bulk by [`Client::push`], and become
/// visible in the cache after the next [`Client::pull`]. A client is not
/// meant to be shared between threads; callers serialize access.
pub struct Client {
    pub(crate) endpoint: String,
    pub(crate) token: String,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) wire_log: WireLog,
    pub(crate) cache: Cache,
    pub(crate) queue: CommandQueue,
    pub(crate) temp_ids: HashMap<String, i64>,
    pub(crate) cooldown: Cooldown,
}

impl Client {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            transport: Box::new(HttpTransport::new()),
            clock: Box::new(SystemClock),
            wire_log: WireLog::disabled(),
            cache: Cache::new(),
            queue: CommandQueue::new(),
            temp_ids: HashMap::new(),
            cooldown: Cooldown::new(DEFAULT_PULL_COOLDOWN),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_wire_log(mut self, wire_log: WireLog) -> Self {
        self.wire_log = wire_log;
        self
    }

    pub fn with_pull_cooldown(mut self, window: Duration) -> Self {
        self.cooldown = Cooldown::new(window);
        self
    }

    /// Starts from a previously persisted cache so the next pull is
    /// incremental.
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.replace_cache(cache);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn replace_cache(&mut self, cache: Cache) {
        self.cache = cache;
        self.cooldown.invalidate();
    }

    pub fn into_cache(self) -> Cache {
        self.cache
    }

    /// Pending commands, to be sent by the next push.
    pub fn queue(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    pub fn pending(&self) -> &CommandQueue {
        &self.queue
    }

    /// Permanent id the server assigned to a temporary id in an earlier
    /// push during this process lifetime.
    pub fn permanent_id(&self, temporary_id: &str) -> Option<i64> {
        self.temp_ids.get(temporary_id).copied()
    }

    pub fn resolve(&self, id: &Id) -> Option<i64> {
        id.resolve(&self.temp_ids)
    }
}
