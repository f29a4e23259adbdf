//! In-memory platform used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use podex::adapters::platform::{ByteStream, Method, PlatformApi, StreamFault};
use podex::config::{
    secret_string, ApplicationConfig, ExportConfig, LoggingConfig, PlatformConfig, PodexConfig,
};
use podex::domain::{PodexError, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

pub const USERNAME: &str = "jane@example.com";
pub const ACCOUNT_DIR: &str = "jane_at_example.com";

/// A tiny platform: every collection is a list of JSON records sliced by
/// `offset` / `limit`
#[derive(Default)]
pub struct FakePlatform {
    orgs: Vec<Value>,
    spaces: HashMap<u64, Vec<Value>>,
    apps: HashMap<u64, Vec<Value>>,
    items: HashMap<u64, Vec<Value>>,
    files: HashMap<u64, Vec<Value>>,
    tasks: HashMap<u64, Vec<Value>>,
    contacts: Vec<Value>,
    bodies: HashMap<String, Vec<std::result::Result<Bytes, StreamFault>>>,
    overstated: HashMap<u64, u64>,
    drifting: HashSet<u64>,
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, org_id: u64, name: &str) -> Self {
        self.orgs.push(json!({
            "org_id": org_id,
            "name": name,
            "url": format!("https://example.com/{name}"),
        }));
        self
    }

    pub fn with_space(mut self, org_id: u64, space_id: u64, name: &str) -> Self {
        self.spaces
            .entry(org_id)
            .or_default()
            .push(json!({ "space_id": space_id, "name": name }));
        self
    }

    pub fn with_app(mut self, space_id: u64, app_id: u64, name: &str) -> Self {
        self.apps
            .entry(space_id)
            .or_default()
            .push(json!({ "app_id": app_id, "config": { "name": name, "item_name": "Item" } }));
        self
    }

    pub fn with_items(mut self, app_id: u64, count: u64) -> Self {
        let items = (1..=count)
            .map(|n| json!({ "item_id": app_id * 1000 + n, "title": format!("Item {n}") }))
            .collect();
        self.items.insert(app_id, items);
        self
    }

    /// Files named `<app_id * 100 + n>` with a small text body each
    pub fn with_files(mut self, app_id: u64, count: u64) -> Self {
        let mut files = Vec::new();
        for n in 1..=count {
            let file_id = app_id * 100 + n;
            let link = format!("https://files.example.com/{file_id}");
            files.push(json!({
                "file_id": file_id,
                "name": format!("doc-{n}.txt"),
                "mimetype": "text/plain",
                "link": link,
            }));
            self.bodies
                .insert(link, vec![Ok(Bytes::from(format!("file {file_id}")))]);
        }
        self.files.insert(app_id, files);
        self
    }

    pub fn with_tasks(mut self, org_id: u64, count: u64) -> Self {
        let tasks = (1..=count).map(|n| json!({ "task_id": n })).collect();
        self.tasks.insert(org_id, tasks);
        self
    }

    pub fn with_contacts(mut self, count: u64) -> Self {
        self.contacts = (1..=count).map(|n| json!({ "profile_id": n })).collect();
        self
    }

    /// Report `extra` more items than the app actually has
    pub fn overstating_total(mut self, app_id: u64, extra: u64) -> Self {
        self.overstated.insert(app_id, extra);
        self
    }

    /// Every item page after the first reports one more item
    pub fn drifting_total(mut self, app_id: u64) -> Self {
        self.drifting.insert(app_id);
        self
    }

    /// Replace the body of a file link
    pub fn with_body(
        mut self,
        link: &str,
        chunks: Vec<std::result::Result<&'static str, StreamFault>>,
    ) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|c| c.map(|s| Bytes::from_static(s.as_bytes())))
            .collect();
        self.bodies.insert(link.to_string(), chunks);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn page(records: &[Value], params: &Option<Value>) -> Vec<Value> {
        let param = |key: &str| {
            params
                .as_ref()
                .and_then(|p| p.get(key))
                .and_then(Value::as_u64)
        };
        let offset = param("offset").unwrap_or(0) as usize;
        let limit = param("limit").unwrap_or(u64::MAX) as usize;
        records.iter().skip(offset).take(limit).cloned().collect()
    }
}

fn id_in(path: &str, prefix: &str) -> Option<u64> {
    path.strip_prefix(prefix)?
        .trim_end_matches('/')
        .trim_end_matches("/filter")
        .parse()
        .ok()
}

fn not_found(path: &str) -> PodexError {
    PodexError::Api {
        status: 404,
        message: format!("no route for {path}"),
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn request(&self, method: Method, path: &str, params: Option<Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(format!("{method} {path}"));
        tokio::task::yield_now().await;

        let empty = Vec::new();
        match (method, path) {
            (Method::Get, "/org/") => Ok(Value::Array(self.orgs.clone())),
            (Method::Get, "/contact/") => Ok(Value::Array(Self::page(&self.contacts, &params))),
            (Method::Get, "/task/") => {
                let org = params
                    .as_ref()
                    .and_then(|p| p.get("org"))
                    .and_then(Value::as_u64)
                    .ok_or_else(|| not_found(path))?;
                let tasks = self.tasks.get(&org).unwrap_or(&empty);
                Ok(Value::Array(Self::page(tasks, &params)))
            }
            (Method::Get, p) if p.starts_with("/space/org/") => {
                let id = id_in(p, "/space/org/").ok_or_else(|| not_found(p))?;
                Ok(Value::Array(self.spaces.get(&id).cloned().unwrap_or_default()))
            }
            (Method::Get, p) if p.starts_with("/app/space/") => {
                let id = id_in(p, "/app/space/").ok_or_else(|| not_found(p))?;
                Ok(Value::Array(self.apps.get(&id).cloned().unwrap_or_default()))
            }
            (Method::Get, p) if p.starts_with("/file/app/") => {
                let id = id_in(p, "/file/app/").ok_or_else(|| not_found(p))?;
                let files = self.files.get(&id).unwrap_or(&empty);
                Ok(Value::Array(Self::page(files, &params)))
            }
            (Method::Post, p) if p.starts_with("/item/app/") => {
                let id = id_in(p, "/item/app/").ok_or_else(|| not_found(p))?;
                let items = self.items.get(&id).unwrap_or(&empty);
                let offset = params
                    .as_ref()
                    .and_then(|p| p.get("offset"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let extra = self.overstated.get(&id).copied().unwrap_or(0);
                let mut total = items.len() as u64 + extra;
                if offset > 0 && self.drifting.contains(&id) {
                    total += 1;
                }
                Ok(json!({
                    "total": total,
                    "filtered": total,
                    "items": Self::page(items, &params),
                }))
            }
            _ => Err(not_found(path)),
        }
    }

    async fn open_download(&self, link: &str) -> Result<ByteStream> {
        self.calls.lock().unwrap().push(format!("DOWNLOAD {link}"));
        let chunks = self.bodies.get(link).cloned().ok_or_else(|| not_found(link))?;
        Ok(futures::stream::iter(chunks).boxed())
    }
}

/// Configuration exporting into `output_dir`
pub fn config(output_dir: &Path) -> PodexConfig {
    PodexConfig {
        application: ApplicationConfig::default(),
        platform: PlatformConfig {
            base_url: "https://api.example.com".to_string(),
            auth_type: "password".to_string(),
            client_id: "podex-test".to_string(),
            client_secret: secret_string("client-secret".to_string()),
            username: USERNAME.to_string(),
            password: secret_string("hunter2".to_string()),
            timeout_seconds: 30,
        },
        export: ExportConfig {
            output_dir: output_dir.to_string_lossy().into_owned(),
            ..ExportConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

/// Every regular file below `root`, as slash-separated relative paths
pub fn files_under(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
