use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use tdsync::{
    Cache, Client, ClientConfig, ConfigError, Id, Item, ItemPatch, Label, Project, PullOutcome,
    StateStore, StoreError, SyncError,
};

pub struct App {
    client: Client,
    store: StateStore,
    has_token: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemView {
    pub id: i64,
    pub project_id: i64,
    pub content: String,
    pub priority: i64,
    pub checked: bool,
    pub labels: Vec<String>,
    pub due: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub projects: Vec<i64>,
    pub label: Option<String>,
    pub content: Option<String>,
    pub checked: bool,
    pub due: bool,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub content: String,
    pub project: Option<i64>,
    pub labels: Vec<String>,
    pub due: Option<String>,
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AddedItem {
    pub temp_id: String,
    pub id: Option<i64>,
    pub item: Option<ItemView>,
}

impl App {
    /// Restores the persisted cache, falling back to an empty one (and thus a
    /// full sync) when the state is missing or damaged.
    pub fn open(
        config: &ClientConfig,
        state_dir: Option<PathBuf>,
        token: Option<String>,
    ) -> Result<Self, AppError> {
        let store = match state_dir {
            Some(dir) => StateStore::new(dir),
            None => config.state_store()?,
        };
        let cache = restore(&store)?;
        let has_token = token.as_deref().is_some_and(|token| !token.is_empty());
        let client = config
            .build_client(token.unwrap_or_default())?
            .with_cache(cache);
        Ok(Self::from_parts(client, store, has_token))
    }

    pub fn from_parts(client: Client, store: StateStore, has_token: bool) -> Self {
        Self {
            client,
            store,
            has_token,
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.store.save(self.client.cache())?;
        Ok(())
    }

    pub fn pull(&mut self) -> Result<PullOutcome, AppError> {
        self.require_token()?;
        Ok(self.client.pull()?)
    }

    pub fn items(&self, filter: &ItemFilter) -> Result<Vec<ItemView>, AppError> {
        let cache = self.client.cache();
        let mut scan = cache.scan::<Item>().with_checked(filter.checked);
        if filter.include_deleted {
            scan = scan.include_deleted();
        }
        if !filter.projects.is_empty() {
            scan = scan.with_project_id(&filter.projects);
        }
        if let Some(name) = &filter.label {
            let label = cache
                .label_by_name(name)
                .ok_or_else(|| AppError::UnknownLabel(name.clone()))?;
            scan = scan.with_label(label.id);
        }
        if let Some(needle) = &filter.content {
            scan = scan.with_content(needle);
        }
        if filter.due {
            scan = scan.with_due();
        }

        let mut items = scan.results();
        items.sort_by_key(|item| (item.project_id, item.child_order, item.id));
        Ok(items.into_iter().map(|item| item_view(cache, item)).collect())
    }

    pub fn projects(&self, include_archived: bool) -> Vec<Project> {
        let mut scan = self.client.cache().scan::<Project>();
        if !include_archived {
            scan = scan.with_archived(false);
        }
        let mut projects: Vec<Project> = scan.results().into_iter().cloned().collect();
        projects.sort_by_key(|project| (project.child_order, project.id));
        projects
    }

    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .client
            .cache()
            .scan::<Label>()
            .results()
            .into_iter()
            .cloned()
            .collect();
        labels.sort_by_key(|label| (label.item_order, label.id));
        labels
    }

    pub fn add_item(&mut self, request: NewItem) -> Result<AddedItem, AppError> {
        self.require_token()?;
        let cache = self.client.cache();
        let mut label_ids = Vec::with_capacity(request.labels.len());
        for name in &request.labels {
            let label = cache
                .label_by_name(name)
                .ok_or_else(|| AppError::UnknownLabel(name.clone()))?;
            label_ids.push(Id::Permanent(label.id));
        }

        let mut patch = ItemPatch::new().with_content(request.content);
        if let Some(project) = request.project {
            patch = patch.with_project_id(Id::Permanent(project));
        }
        if !label_ids.is_empty() {
            patch = patch.with_labels(label_ids);
        }
        if let Some(due) = &request.due {
            patch = patch.with_due(due);
        }
        if let Some(priority) = request.priority {
            patch = patch.with_priority(priority);
        }

        let temp_id = self.client.queue().item_add(patch);
        self.client.push()?;
        let id = self.client.permanent_id(&temp_id);
        self.client.pull()?;
        let cache = self.client.cache();
        let item = id
            .and_then(|id| cache.item(id))
            .map(|item| item_view(cache, item));
        Ok(AddedItem { temp_id, id, item })
    }

    pub fn close_item(&mut self, id: i64) -> Result<Option<ItemView>, AppError> {
        self.require_token()?;
        self.client.queue().item_close(Id::Permanent(id));
        self.client.push()?;
        self.client.pull()?;
        let cache = self.client.cache();
        Ok(cache.item(id).map(|item| item_view(cache, item)))
    }

    /// Drops the persisted state; the next pull starts from scratch.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.store.clear()?;
        self.client.replace_cache(Cache::new());
        Ok(())
    }

    fn require_token(&self) -> Result<(), AppError> {
        if self.has_token {
            Ok(())
        } else {
            Err(AppError::MissingToken)
        }
    }
}

fn restore(store: &StateStore) -> Result<Cache, AppError> {
    match store.load() {
        Ok(cache) => Ok(cache),
        Err(err) if err.is_recoverable() => {
            warn!(dir = %store.dir().display(), error = %err, "starting from an empty cache");
            Ok(Cache::new())
        }
        Err(err) => Err(AppError::Store(err)),
    }
}

fn item_view(cache: &Cache, item: &Item) -> ItemView {
    let labels = item
        .labels
        .iter()
        .map(|id| match cache.label(*id) {
            Some(label) => label.name.clone(),
            None => id.to_string(),
        })
        .collect();
    let due = item.due.as_ref().map(|due| {
        if due.string.is_empty() {
            due.date.clone()
        } else {
            due.string.clone()
        }
    });
    ItemView {
        id: item.id,
        project_id: item.project_id,
        content: item.content.clone(),
        priority: item.priority,
        checked: item.checked,
        labels,
        due,
    }
}

#[derive(Debug)]
pub enum AppError {
    Sync(SyncError),
    Store(StoreError),
    Config(ConfigError),
    MissingToken,
    UnknownLabel(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Sync(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::MissingToken => {
                write!(f, "an API token is required; pass --token or set TDSYNC_TOKEN")
            }
            AppError::UnknownLabel(name) => write!(f, "no cached label named '{}'", name),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Sync(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::MissingToken | AppError::UnknownLabel(_) => None,
        }
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        AppError::Sync(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

#[cfg(test)]
mod tests;
