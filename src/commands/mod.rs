use std::error::Error;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::{InvalidPatch, ItemPatch, LabelPatch, NotePatch, ProjectPatch};
use crate::id::{Id, IdError};

mod reorder;

pub use reorder::Reorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ItemAdd,
    ItemUpdate,
    ItemDelete,
    ItemClose,
    ItemMove,
    ItemReorder,
    LabelAdd,
    LabelUpdate,
    LabelDelete,
    ProjectAdd,
    ProjectUpdate,
    ProjectDelete,
    ProjectArchive,
    ProjectReorder,
    NoteAdd,
    NoteUpdate,
    NoteDelete,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::ItemAdd => "item_add",
            CommandKind::ItemUpdate => "item_update",
            CommandKind::ItemDelete => "item_delete",
            CommandKind::ItemClose => "item_close",
            CommandKind::ItemMove => "item_move",
            CommandKind::ItemReorder => "item_reorder",
            CommandKind::LabelAdd => "label_add",
            CommandKind::LabelUpdate => "label_update",
            CommandKind::LabelDelete => "label_delete",
            CommandKind::ProjectAdd => "project_add",
            CommandKind::ProjectUpdate => "project_update",
            CommandKind::ProjectDelete => "project_delete",
            CommandKind::ProjectArchive => "project_archive",
            CommandKind::ProjectReorder => "project_reorder",
            CommandKind::NoteAdd => "note_add",
            CommandKind::NoteUpdate => "note_update",
            CommandKind::NoteDelete => "note_delete",
        }
    }

    pub fn is_update(self) -> bool {
        matches!(
            self,
            CommandKind::ItemUpdate
                | CommandKind::LabelUpdate
                | CommandKind::ProjectUpdate
                | CommandKind::NoteUpdate
        )
    }

    pub fn is_add(self) -> bool {
        matches!(
            self,
            CommandKind::ItemAdd
                | CommandKind::LabelAdd
                | CommandKind::ProjectAdd
                | CommandKind::NoteAdd
        )
    }
}

#[derive(Debug)]
pub enum CommandError {
    InvalidPatch { uuid: String, patch: InvalidPatch },
    ZeroIdentifier { uuid: String, kind: CommandKind },
    Json(serde_json::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidPatch { uuid, patch } => {
                write!(f, "command {}: {}", uuid, patch)
            }
            CommandError::ZeroIdentifier { uuid, kind } => {
                write!(f, "command {} ({}): {}", uuid, kind.as_str(), IdError::ZeroIdentifier)
            }
            CommandError::Json(err) => write!(f, "command encoding failed: {}", err),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CommandError::InvalidPatch { patch, .. } => Some(patch),
            CommandError::ZeroIdentifier { .. } => None,
            CommandError::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(value: serde_json::Error) -> Self {
        CommandError::Json(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CommandArgs {
    Item(ItemPatch),
    Label(LabelPatch),
    Project(ProjectPatch),
    Note(NotePatch),
    Target(Id),
    Move { id: Id, project_id: Id },
    Reorder(Reorder),
}

/// One queued mutation. The uuid is the idempotency token the server uses to
/// deduplicate retries and to key its per-command status.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    uuid: String,
    temp_id: Option<String>,
    args: CommandArgs,
}

#[derive(Serialize)]
struct WireCommand<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temp_id: Option<&'a str>,
    uuid: &'a str,
    args: Value,
}

impl Command {
    fn new(kind: CommandKind, args: CommandArgs) -> Self {
        Self {
            kind,
            uuid: new_token(),
            temp_id: kind.is_add().then(new_token),
            args,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn temp_id(&self) -> Option<&str> {
        self.temp_id.as_deref()
    }

    fn encode_args(&self) -> Result<Value, CommandError> {
        let invalid = |patch| CommandError::InvalidPatch {
            uuid: self.uuid.clone(),
            patch,
        };
        let zero = || CommandError::ZeroIdentifier {
            uuid: self.uuid.clone(),
            kind: self.kind,
        };
        let targeted = |has_id: bool| {
            if self.kind.is_update() && !has_id {
                Err(zero())
            } else {
                Ok(())
            }
        };
        match &self.args {
            CommandArgs::Item(patch) => {
                targeted(patch.has_id())?;
                patch.encode().map_err(invalid)
            }
            CommandArgs::Label(patch) => {
                targeted(patch.has_id())?;
                patch.encode().map_err(invalid)
            }
            CommandArgs::Project(patch) => {
                targeted(patch.has_id())?;
                patch.encode().map_err(invalid)
            }
            CommandArgs::Note(patch) => {
                targeted(patch.has_id())?;
                patch.encode().map_err(invalid)
            }
            CommandArgs::Target(id) => {
                id.validate().map_err(|_| zero())?;
                Ok(json!({ "id": id }))
            }
            CommandArgs::Move { id, project_id } => {
                id.validate().map_err(|_| zero())?;
                project_id.validate().map_err(|_| zero())?;
                Ok(json!({ "id": id, "project_id": project_id }))
            }
            CommandArgs::Reorder(reorder) => {
                let collection = match self.kind {
                    CommandKind::ProjectReorder => "projects",
                    _ => "items",
                };
                reorder.encode(collection).map_err(|_| zero())
            }
        }
    }
}

fn new_token() -> String {
    Uuid::now_v7().to_string()
}

/// Ordered pending commands. Append-only until a push drains it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Queues an `item_add` and returns its temporary id, usable as an
    /// [`Id::Temporary`] reference by later commands in the same batch.
    pub fn item_add(&mut self, item: ItemPatch) -> String {
        self.push_add(CommandKind::ItemAdd, CommandArgs::Item(item))
    }

    pub fn item_update(&mut self, item: ItemPatch) {
        self.push(CommandKind::ItemUpdate, CommandArgs::Item(item));
    }

    pub fn item_delete(&mut self, id: Id) {
        self.push(CommandKind::ItemDelete, CommandArgs::Target(id));
    }

    pub fn item_close(&mut self, id: Id) {
        self.push(CommandKind::ItemClose, CommandArgs::Target(id));
    }

    /// Moves an item to another project. The project cannot be changed
    /// through `item_update`.
    pub fn item_move(&mut self, item: Id, project: Id) {
        self.push(
            CommandKind::ItemMove,
            CommandArgs::Move {
                id: item,
                project_id: project,
            },
        );
    }

    pub fn item_reorder(&mut self, reorder: Reorder) {
        self.push_reorder(CommandKind::ItemReorder, reorder);
    }

    pub fn label_add(&mut self, label: LabelPatch) -> String {
        self.push_add(CommandKind::LabelAdd, CommandArgs::Label(label))
    }

    pub fn label_update(&mut self, label: LabelPatch) {
        self.push(CommandKind::LabelUpdate, CommandArgs::Label(label));
    }

    pub fn label_delete(&mut self, id: Id) {
        self.push(CommandKind::LabelDelete, CommandArgs::Target(id));
    }

    pub fn project_add(&mut self, project: ProjectPatch) -> String {
        self.push_add(CommandKind::ProjectAdd, CommandArgs::Project(project))
    }

    pub fn project_update(&mut self, project: ProjectPatch) {
        self.push(CommandKind::ProjectUpdate, CommandArgs::Project(project));
    }

    pub fn project_delete(&mut self, id: Id) {
        self.push(CommandKind::ProjectDelete, CommandArgs::Target(id));
    }

    pub fn project_archive(&mut self, id: Id) {
        self.push(CommandKind::ProjectArchive, CommandArgs::Target(id));
    }

    pub fn project_reorder(&mut self, reorder: Reorder) {
        self.push_reorder(CommandKind::ProjectReorder, reorder);
    }

    pub fn note_add(&mut self, note: NotePatch) -> String {
        self.push_add(CommandKind::NoteAdd, CommandArgs::Note(note))
    }

    pub fn note_update(&mut self, note: NotePatch) {
        self.push(CommandKind::NoteUpdate, CommandArgs::Note(note));
    }

    pub fn note_delete(&mut self, id: Id) {
        self.push(CommandKind::NoteDelete, CommandArgs::Target(id));
    }

    /// Encodes the whole queue as the `commands` form field. Any invalid
    /// command fails the whole batch.
    pub fn encode(&self) -> Result<String, CommandError> {
        let mut wire = Vec::with_capacity(self.commands.len());
        for command in &self.commands {
            wire.push(WireCommand {
                kind: command.kind.as_str(),
                temp_id: command.temp_id.as_deref(),
                uuid: &command.uuid,
                args: command.encode_args()?,
            });
        }
        Ok(serde_json::to_string(&wire)?)
    }

    pub(crate) fn clear(&mut self) {
        self.commands.clear();
    }

    fn push(&mut self, kind: CommandKind, args: CommandArgs) {
        self.commands.push(Command::new(kind, args));
    }

    fn push_add(&mut self, kind: CommandKind, args: CommandArgs) -> String {
        let command = Command::new(kind, args);
        let temp_id = command.temp_id.clone().unwrap_or_default();
        self.commands.push(command);
        temp_id
    }

    fn push_reorder(&mut self, kind: CommandKind, reorder: Reorder) {
        self.push(kind, CommandArgs::Reorder(reorder));
    }
}
