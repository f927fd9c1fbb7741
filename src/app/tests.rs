use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use serde_json::{json, Value};
use tdsync::{Cache, Client, StateStore, Transport, TransportError, TransportResponse};
use uuid::Uuid;

use super::{App, AppError, ItemFilter, NewItem};

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("tdsync-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("workspace should be creatable");
    root
}

fn seeded_cache() -> Cache {
    serde_json::from_value(json!({
        "sync_token": "seed",
        "labels": {
            "10": {"id": 10, "name": "home", "item_order": 1, "is_deleted": false},
            "11": {"id": 11, "name": "work", "item_order": 0, "is_deleted": false}
        },
        "projects": {
            "1": {"id": 1, "name": "Inbox", "color": 0, "child_order": 0, "is_deleted": false, "is_archived": false},
            "2": {"id": 2, "name": "Old", "color": 0, "child_order": 1, "is_deleted": false, "is_archived": true}
        },
        "items": {
            "100": {"id": 100, "project_id": 1, "labels": [10], "content": "fix sink", "priority": 2, "child_order": 2, "checked": false, "is_deleted": false, "due": {"date": "2024-06-01", "string": "jun 1"}},
            "101": {"id": 101, "project_id": 1, "labels": [11], "content": "file report", "priority": 1, "child_order": 1, "checked": false, "is_deleted": false, "due": null},
            "102": {"id": 102, "project_id": 2, "labels": [], "content": "old thing", "priority": 1, "child_order": 0, "checked": true, "is_deleted": false, "due": null},
            "103": {"id": 103, "project_id": 1, "labels": [10], "content": "gone", "priority": 1, "child_order": 3, "checked": false, "is_deleted": true, "due": null}
        },
        "notes": {}
    }))
    .expect("seed cache should decode")
}

/// Acknowledges every pushed command and assigns permanent ids from 555
/// upwards; pulls are answered from the scripted queue.
#[derive(Clone, Default)]
struct ScriptedTransport {
    responses: Rc<RefCell<VecDeque<Value>>>,
    commands: Rc<RefCell<Vec<Value>>>,
}

impl Transport for ScriptedTransport {
    fn post_form(
        &self,
        _endpoint: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let body = match fields.iter().find(|(key, _)| *key == "commands") {
            Some((_, commands)) => {
                let parsed: Value =
                    serde_json::from_str(commands).expect("commands should be JSON");
                let mut statuses = serde_json::Map::new();
                let mut mapping = serde_json::Map::new();
                let mut next_id = 555;
                for command in parsed.as_array().expect("commands should be an array") {
                    let uuid = command["uuid"].as_str().expect("uuid should be a string");
                    statuses.insert(uuid.to_string(), json!("ok"));
                    if let Some(temp_id) = command["temp_id"].as_str() {
                        mapping.insert(temp_id.to_string(), json!(next_id));
                        next_id += 1;
                    }
                }
                self.commands.borrow_mut().push(parsed);
                json!({"sync_status": statuses, "temp_id_mapping": mapping})
            }
            None => self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("a pull response should be scripted"),
        };
        Ok(TransportResponse {
            status: 200,
            body: body.to_string().into_bytes(),
        })
    }
}

fn app_with(transport: ScriptedTransport, store: StateStore, has_token: bool) -> App {
    let client = Client::new("token")
        .with_transport(transport)
        .with_cache(seeded_cache());
    App::from_parts(client, store, has_token)
}

fn offline_app(root: &std::path::Path) -> App {
    app_with(ScriptedTransport::default(), StateStore::new(root), false)
}

#[test]
fn items_lists_open_items_in_project_order() {
    let root = unique_workspace();
    let app = offline_app(&root);
    let items = app.items(&ItemFilter::default()).expect("items should list");
    let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![101, 100]);
    assert_eq!(items[1].labels, vec!["home".to_string()]);
    assert_eq!(items[1].due.as_deref(), Some("jun 1"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn items_filters_combine() {
    let root = unique_workspace();
    let app = offline_app(&root);

    let by_label = app
        .items(&ItemFilter {
            label: Some("home".to_string()),
            ..ItemFilter::default()
        })
        .expect("label filter should work");
    assert_eq!(by_label.len(), 1);
    assert_eq!(by_label[0].content, "fix sink");

    let with_deleted = app
        .items(&ItemFilter {
            label: Some("home".to_string()),
            include_deleted: true,
            ..ItemFilter::default()
        })
        .expect("include_deleted should work");
    assert_eq!(with_deleted.len(), 2);

    let done = app
        .items(&ItemFilter {
            checked: true,
            projects: vec![2],
            ..ItemFilter::default()
        })
        .expect("checked filter should work");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, 102);

    let due = app
        .items(&ItemFilter {
            due: true,
            content: Some("sink".to_string()),
            ..ItemFilter::default()
        })
        .expect("due filter should work");
    assert_eq!(due.len(), 1);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn unknown_label_filter_is_an_error() {
    let root = unique_workspace();
    let app = offline_app(&root);
    let err = app
        .items(&ItemFilter {
            label: Some("garden".to_string()),
            ..ItemFilter::default()
        })
        .expect_err("unknown label should fail");
    assert!(matches!(err, AppError::UnknownLabel(ref name) if name == "garden"));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn projects_hide_archived_and_labels_sort_by_order() {
    let root = unique_workspace();
    let app = offline_app(&root);
    let names: Vec<String> = app
        .projects(false)
        .into_iter()
        .map(|project| project.name)
        .collect();
    assert_eq!(names, vec!["Inbox".to_string()]);
    assert_eq!(app.projects(true).len(), 2);
    let labels: Vec<String> = app.labels().into_iter().map(|label| label.name).collect();
    assert_eq!(labels, vec!["work".to_string(), "home".to_string()]);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn network_commands_require_token() {
    let root = unique_workspace();
    let mut app = offline_app(&root);
    assert!(matches!(app.pull(), Err(AppError::MissingToken)));
    assert!(matches!(app.close_item(100), Err(AppError::MissingToken)));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn add_item_resolves_label_names_and_reports_pulled_item() {
    let root = unique_workspace();
    let transport = ScriptedTransport::default();
    let mut app = app_with(transport.clone(), StateStore::new(&root), true);

    transport.responses.borrow_mut().push_back(json!({
        "sync_token": "after-add",
        "items": [{"id": 555, "project_id": 1, "labels": [10], "content": "buy milk", "priority": 3, "child_order": 4}]
    }));

    let added = app
        .add_item(NewItem {
            content: "buy milk".to_string(),
            project: Some(1),
            labels: vec!["home".to_string()],
            priority: Some(3),
            ..NewItem::default()
        })
        .expect("add should succeed");

    let sent = transport.commands.borrow();
    assert_eq!(sent.len(), 1);
    let args = &sent[0][0]["args"];
    assert_eq!(sent[0][0]["type"], "item_add");
    assert_eq!(args["content"], "buy milk");
    assert_eq!(args["project_id"], 1);
    assert_eq!(args["labels"], json!([10]));
    assert_eq!(args["priority"], 3);
    assert_eq!(sent[0][0]["temp_id"], added.temp_id.as_str());

    drop(sent);
    assert_eq!(added.id, Some(555));
    let item = added.item.expect("pulled item should be reported");
    assert_eq!(item.labels, vec!["home".to_string()]);
    assert_eq!(item.priority, 3);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn close_item_pushes_close_and_pulls_checked_item() {
    let root = unique_workspace();
    let transport = ScriptedTransport::default();
    let mut app = app_with(transport.clone(), StateStore::new(&root), true);
    transport.responses.borrow_mut().push_back(json!({
        "sync_token": "after-close",
        "items": [{"id": 101, "project_id": 1, "labels": [11], "content": "file report", "checked": 1}]
    }));

    let closed = app
        .close_item(101)
        .expect("close should succeed")
        .expect("item should still be cached");
    assert!(closed.checked);
    let sent = transport.commands.borrow();
    assert_eq!(sent[0][0]["type"], "item_close");
    assert_eq!(sent[0][0]["args"], json!({"id": 101}));
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn add_item_with_unknown_label_sends_nothing() {
    let root = unique_workspace();
    let transport = ScriptedTransport::default();
    let mut app = app_with(transport.clone(), StateStore::new(&root), true);
    let err = app
        .add_item(NewItem {
            content: "x".to_string(),
            labels: vec!["nope".to_string()],
            ..NewItem::default()
        })
        .expect_err("unknown label should fail");
    assert!(matches!(err, AppError::UnknownLabel(_)));
    assert!(transport.commands.borrow().is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn invalid_priority_fails_before_any_request() {
    let root = unique_workspace();
    let transport = ScriptedTransport::default();
    let mut app = app_with(transport.clone(), StateStore::new(&root), true);
    let err = app
        .add_item(NewItem {
            content: "x".to_string(),
            priority: Some(7),
            ..NewItem::default()
        })
        .expect_err("priority 7 should fail");
    assert!(matches!(err, AppError::Sync(_)));
    assert!(transport.commands.borrow().is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn open_falls_back_to_empty_cache_on_corruption() {
    let root = unique_workspace();
    let store = StateStore::new(&root);
    store.save(&seeded_cache()).expect("save should succeed");
    std::fs::write(store.digest_path(), b"short").expect("digest should be writable");

    let app = App::open(&tdsync::ClientConfig::default(), Some(root.clone()), None)
        .expect("open should recover");
    assert!(app
        .items(&ItemFilter::default())
        .expect("items should list")
        .is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn save_then_open_restores_cache_and_reset_clears_it() {
    let root = unique_workspace();
    let app = offline_app(&root);
    app.save().expect("save should succeed");

    let mut reopened = App::open(&tdsync::ClientConfig::default(), Some(root.clone()), None)
        .expect("open should succeed");
    assert_eq!(
        reopened
            .items(&ItemFilter::default())
            .expect("items should list")
            .len(),
        2
    );

    reopened.reset().expect("reset should succeed");
    assert!(reopened.labels().is_empty());
    assert!(!StateStore::new(&root).data_path().exists());
    let _ = std::fs::remove_dir_all(root);
}
