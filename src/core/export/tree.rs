//! Hierarchical export walk
//!
//! account -> organizations -> spaces -> applications. At each level the
//! node's own record is persisted, its children are exported with bounded
//! concurrency, and the leaf collections attached to that level run next to
//! them:
//!
//! | level        | leaf collections              |
//! |--------------|-------------------------------|
//! | account      | contacts                      |
//! | organization | tasks                         |
//! | application  | items, file listing and files |
//!
//! Errors are recorded in an [`ErrorScope`] per node rather than returned, so
//! a failing branch never discards the summary of its siblings.

use crate::adapters::platform::{Method, PlatformApi};
use crate::adapters::storage::FsSink;
use crate::config::{ExportConfig, NameCollisionPolicy};
use crate::core::export::download::{FileDownloader, WarningPolicy};
use crate::core::export::fanout::{for_each_bounded, ErrorScope};
use crate::core::export::naming::{assign_names, page_file_name, ReservedNames};
use crate::core::export::pagination::{collect_fan_out, collect_short_pages, Page};
use crate::core::export::summary::{
    CollectionTally, Counter, SummaryNode, DISCOVERED_FILE_COUNT, DOWNLOADED_FILE_COUNT,
    OBSERVED_CONTACT_COUNT, OBSERVED_ITEM_COUNT, OBSERVED_TASK_COUNT, SERVER_REPORTED_TOTAL,
    SUMMARY_FILE,
};
use crate::domain::{
    Application, FileDescriptor, Named, Organization, PodexError, Record, Result, Space,
};
use crate::log_collection_complete;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tuning knobs of the walk, taken from `[export]`
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub max_concurrency: usize,
    pub download_files: bool,
    pub item_page_size: u64,
    pub task_page_size: u64,
    pub file_page_size: u64,
    pub contact_page_size: u64,
    pub name_collision: NameCollisionPolicy,
    pub warning_policy: WarningPolicy,
}

impl From<&ExportConfig> for ExportSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            download_files: config.download_files,
            item_page_size: config.item_page_size,
            task_page_size: config.task_page_size,
            file_page_size: config.file_page_size,
            contact_page_size: config.contact_page_size,
            name_collision: config.name_collision,
            warning_policy: WarningPolicy::new(config.transport_warning_kinds.iter().cloned()),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

/// Summary of a finished walk and the first error it ran into
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub summary: SummaryNode,
    pub error: Option<PodexError>,
}

pub struct TreeExporter {
    api: Arc<dyn PlatformApi>,
    sink: FsSink,
    settings: ExportSettings,
    downloader: FileDownloader,
}

impl TreeExporter {
    pub fn new(api: Arc<dyn PlatformApi>, sink: FsSink, settings: ExportSettings) -> Self {
        let downloader = FileDownloader::new(
            Arc::clone(&api),
            sink.clone(),
            settings.max_concurrency,
            settings.warning_policy.clone(),
        );
        Self {
            api,
            sink,
            settings,
            downloader,
        }
    }

    /// Export everything the account can see into `account_dir`
    pub async fn export_account(&self, account_dir: &Path) -> WalkOutcome {
        let scope = ErrorScope::root();
        let contacts = CollectionTally::default();

        let (orgs, contacts_result) = tokio::join!(
            self.export_orgs(account_dir, &scope),
            self.collect_contacts(account_dir, &scope, &contacts),
        );
        if scope.observe(contacts_result).is_some() {
            log_collection_complete!("contacts", "account", contacts.observed());
        }

        let mut summary =
            SummaryNode::new().with_counter(OBSERVED_CONTACT_COUNT, contacts.observed());
        for (name, node) in orgs {
            summary.insert_child(name, node);
        }

        WalkOutcome {
            summary,
            error: scope.first_error(),
        }
    }

    async fn export_orgs(
        &self,
        dir: &Path,
        scope: &Arc<ErrorScope>,
    ) -> Vec<(String, SummaryNode)> {
        let Some(orgs) = scope.observe(self.list::<Organization>("/org/").await) else {
            return Vec::new();
        };
        let reserved = ReservedNames::new()
            .with_name(SUMMARY_FILE)
            .with_pages("contacts");
        let Some(named) = scope.observe(self.name_children(orgs, &reserved)) else {
            return Vec::new();
        };
        tracing::info!(count = named.len(), "Found organizations");

        for_each_bounded(named, self.settings.max_concurrency, scope, |(name, org)| {
            self.export_org(org, dir.join(&name), name, scope)
        })
        .await
    }

    async fn export_org(
        &self,
        org: Record<Organization>,
        dir: PathBuf,
        name: String,
        parent: &Arc<ErrorScope>,
    ) -> (String, SummaryNode) {
        let scope = parent.child();
        let meta_file = format!("{name}.json");
        let org_id = org.entity.org_id;
        let tasks = CollectionTally::default();

        let (meta, tasks_result, spaces) = tokio::join!(
            self.sink.write_json(&dir, &meta_file, &org.raw),
            self.collect_tasks(org_id, &dir, &scope, &tasks),
            self.export_spaces(org_id, &dir, &meta_file, &scope),
        );
        scope.observe(meta);
        if scope.observe(tasks_result).is_some() {
            log_collection_complete!("tasks", name, tasks.observed());
        }

        let mut node = SummaryNode::new().with_counter(OBSERVED_TASK_COUNT, tasks.observed());
        for (space_name, space) in spaces {
            node.insert_child(space_name, space);
        }
        log_node_failure("organization", &name, &scope);
        (name, node)
    }

    async fn export_spaces(
        &self,
        org_id: u64,
        dir: &Path,
        org_meta_file: &str,
        scope: &Arc<ErrorScope>,
    ) -> Vec<(String, SummaryNode)> {
        let path = format!("/space/org/{org_id}/");
        let Some(spaces) = scope.observe(self.list::<Space>(&path).await) else {
            return Vec::new();
        };
        let reserved = ReservedNames::new()
            .with_name(org_meta_file)
            .with_pages("tasks");
        let Some(named) = scope.observe(self.name_children(spaces, &reserved)) else {
            return Vec::new();
        };

        for_each_bounded(named, self.settings.max_concurrency, scope, |(name, space)| {
            self.export_space(space, dir.join(&name), name, scope)
        })
        .await
    }

    async fn export_space(
        &self,
        space: Record<Space>,
        dir: PathBuf,
        name: String,
        parent: &Arc<ErrorScope>,
    ) -> (String, SummaryNode) {
        let scope = parent.child();
        let meta_file = format!("{name}.json");

        let (meta, apps) = tokio::join!(
            self.sink.write_json(&dir, &meta_file, &space.raw),
            self.export_apps(space.entity.space_id, &dir, &meta_file, &scope),
        );
        scope.observe(meta);

        let mut node = SummaryNode::new();
        for (app_name, app) in apps {
            node.insert_child(app_name, app);
        }
        log_node_failure("space", &name, &scope);
        (name, node)
    }

    async fn export_apps(
        &self,
        space_id: u64,
        dir: &Path,
        space_meta_file: &str,
        scope: &Arc<ErrorScope>,
    ) -> Vec<(String, SummaryNode)> {
        let path = format!("/app/space/{space_id}/");
        let Some(apps) = scope.observe(self.list::<Application>(&path).await) else {
            return Vec::new();
        };
        let reserved = ReservedNames::new().with_name(space_meta_file);
        let Some(named) = scope.observe(self.name_children(apps, &reserved)) else {
            return Vec::new();
        };

        for_each_bounded(named, self.settings.max_concurrency, scope, |(name, app)| {
            self.export_app(app, dir.join(&name), name, scope)
        })
        .await
    }

    async fn export_app(
        &self,
        app: Record<Application>,
        dir: PathBuf,
        name: String,
        parent: &Arc<ErrorScope>,
    ) -> (String, SummaryNode) {
        let scope = parent.child();
        let meta_file = format!("{name}.json");
        let app_id = app.entity.app_id;
        let items = CollectionTally::default();
        let files = CollectionTally::default();
        let downloaded = Counter::default();

        let (meta, items_result, files_result) = tokio::join!(
            self.sink.write_json(&dir, &meta_file, &app.raw),
            self.collect_items(app_id, &name, &dir, &scope, &items),
            self.collect_files(app_id, &dir, &scope, &files, &downloaded),
        );
        scope.observe(meta);
        if scope.observe(items_result).is_some() {
            log_collection_complete!("items", name, items.observed());
        }
        if scope.observe(files_result).is_some() {
            log_collection_complete!("files", name, files.observed());
        }

        let mut node = SummaryNode::new()
            .with_counter(OBSERVED_ITEM_COUNT, items.observed())
            .with_counter(DISCOVERED_FILE_COUNT, files.observed());
        if let Some(total) = items.total() {
            node.set_counter(SERVER_REPORTED_TOTAL, total);
        }
        if self.settings.download_files {
            node.set_counter(DOWNLOADED_FILE_COUNT, downloaded.get());
        }
        log_node_failure("application", &name, &scope);
        (name, node)
    }

    async fn collect_items(
        &self,
        app_id: u64,
        app_name: &str,
        dir: &Path,
        scope: &Arc<ErrorScope>,
        tally: &CollectionTally,
    ) -> Result<u64> {
        let path = format!("/item/app/{app_id}/filter/");
        let label = format!("items of {app_name} ({app_id})");
        let page_size = self.settings.item_page_size;

        collect_fan_out(
            &label,
            page_size,
            self.settings.max_concurrency,
            scope,
            tally,
            |offset| {
                let path = &path;
                async move {
                    let params = json!({ "offset": offset, "limit": page_size });
                    let body = self.api.request(Method::Post, path, Some(params)).await?;
                    Page::from_envelope(body, "items")
                }
            },
            |offset, page| self.persist_page("items", dir, offset, page),
        )
        .await
    }

    async fn collect_files(
        &self,
        app_id: u64,
        dir: &Path,
        scope: &Arc<ErrorScope>,
        tally: &CollectionTally,
        downloaded: &Counter,
    ) -> Result<u64> {
        let path = format!("/file/app/{app_id}/");
        let page_size = self.settings.file_page_size;
        let files_dir = dir.join("files");

        collect_short_pages(
            page_size,
            scope,
            tally,
            |offset| self.fetch_array(&path, json!({ "offset": offset, "limit": page_size })),
            |offset, page| {
                let files_dir = &files_dir;
                async move {
                    if !self.settings.download_files {
                        return self.persist_page("files", dir, offset, page).await;
                    }
                    let descriptors = Record::<FileDescriptor>::list(page.body.clone())?
                        .into_iter()
                        .map(|record| record.entity)
                        .collect::<Vec<_>>();
                    let (listing, batch) = tokio::join!(
                        self.persist_page("files", dir, offset, page),
                        self.downloader.download_all(&descriptors, files_dir, downloaded),
                    );
                    listing?;
                    batch.map(|_| ())
                }
            },
        )
        .await
    }

    async fn collect_tasks(
        &self,
        org_id: u64,
        dir: &Path,
        scope: &Arc<ErrorScope>,
        tally: &CollectionTally,
    ) -> Result<u64> {
        let page_size = self.settings.task_page_size;
        collect_short_pages(
            page_size,
            scope,
            tally,
            |offset| {
                self.fetch_array(
                    "/task/",
                    json!({ "org": org_id, "offset": offset, "limit": page_size }),
                )
            },
            |offset, page| self.persist_page("tasks", dir, offset, page),
        )
        .await
    }

    async fn collect_contacts(
        &self,
        dir: &Path,
        scope: &Arc<ErrorScope>,
        tally: &CollectionTally,
    ) -> Result<u64> {
        let page_size = self.settings.contact_page_size;
        collect_short_pages(
            page_size,
            scope,
            tally,
            |offset| self.fetch_array("/contact/", json!({ "offset": offset, "limit": page_size })),
            |offset, page| self.persist_page("contacts", dir, offset, page),
        )
        .await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<Record<T>>> {
        let body = self.api.request(Method::Get, path, None).await?;
        Record::list(body)
    }

    async fn fetch_array(&self, path: &str, params: Value) -> Result<Page> {
        let body = self.api.request(Method::Get, path, Some(params)).await?;
        Page::from_array(body)
    }

    async fn persist_page(&self, kind: &str, dir: &Path, offset: u64, page: Page) -> Result<()> {
        let file_name = page_file_name(kind, offset, page.count);
        self.sink.write_json(dir, &file_name, &page.body).await?;
        Ok(())
    }

    fn name_children<T: Named>(
        &self,
        records: Vec<Record<T>>,
        reserved: &ReservedNames,
    ) -> Result<Vec<(String, Record<T>)>> {
        let names = assign_names(
            records.iter().map(|r| r.entity.display_name()),
            self.settings.name_collision,
            reserved,
        )?;
        Ok(names.into_iter().zip(records).collect())
    }
}

fn log_node_failure(kind: &str, name: &str, scope: &ErrorScope) {
    if let Some(error) = scope.first_error() {
        tracing::error!(node = kind, name, error = %error, "Export of node failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::platform::ByteStream;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// One org with two apps; the file listing of app 11 always fails
    struct FailingFilesApi {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PlatformApi for FailingFilesApi {
        async fn request(&self, _: Method, path: &str, _: Option<Value>) -> Result<Value> {
            self.calls.lock().unwrap().push(path.to_string());
            match path {
                "/org/" => Ok(json!([{ "org_id": 1, "name": "Acme" }])),
                "/space/org/1/" => Ok(json!([{ "space_id": 2, "name": "Sales" }])),
                "/app/space/2/" => Ok(json!([
                    { "app_id": 10, "config": { "name": "Leads" } },
                    { "app_id": 11, "config": { "name": "Deals" } }
                ])),
                "/item/app/10/filter/" | "/item/app/11/filter/" => {
                    Ok(json!({ "items": [{ "item_id": 1 }], "total": 1 }))
                }
                "/file/app/11/" => Err(PodexError::Api {
                    status: 500,
                    message: "listing failed".to_string(),
                }),
                _ => Ok(json!([])),
            }
        }

        async fn open_download(&self, link: &str) -> Result<ByteStream> {
            Err(PodexError::Network(link.to_string()))
        }
    }

    #[tokio::test]
    async fn test_failing_leaf_keeps_sibling_summary() {
        let tmp = TempDir::new().unwrap();
        let api = Arc::new(FailingFilesApi {
            calls: Mutex::new(Vec::new()),
        });
        let exporter = TreeExporter::new(api, FsSink::new(tmp.path()), ExportSettings::default());

        let outcome = exporter.export_account(tmp.path()).await;

        assert_eq!(
            outcome.error,
            Some(PodexError::Api {
                status: 500,
                message: "listing failed".to_string(),
            })
        );
        let leads = outcome.summary.find("Acme/Sales/Leads").unwrap();
        assert_eq!(leads.counter(OBSERVED_ITEM_COUNT), Some(1));
        assert_eq!(leads.counter(SERVER_REPORTED_TOTAL), Some(1));
        assert!(outcome.summary.find("Acme/Sales/Deals").is_some());
        assert!(tmp.path().join("Acme/Sales/Leads/items_1-1.json").exists());
    }

    #[tokio::test]
    async fn test_duplicate_app_names_get_distinct_dirs() {
        struct Twins;

        #[async_trait]
        impl PlatformApi for Twins {
            async fn request(&self, _: Method, path: &str, _: Option<Value>) -> Result<Value> {
                match path {
                    "/org/" => Ok(json!([{ "org_id": 1, "name": "Acme" }])),
                    "/space/org/1/" => Ok(json!([{ "space_id": 2, "name": "Sales" }])),
                    "/app/space/2/" => Ok(json!([
                        { "app_id": 10, "config": { "name": "Leads" } },
                        { "app_id": 11, "config": { "name": "Leads" } }
                    ])),
                    p if p.starts_with("/item/") => Ok(json!({ "items": [], "total": 0 })),
                    _ => Ok(json!([])),
                }
            }

            async fn open_download(&self, link: &str) -> Result<ByteStream> {
                Err(PodexError::Network(link.to_string()))
            }
        }

        let tmp = TempDir::new().unwrap();
        let exporter =
            TreeExporter::new(Arc::new(Twins), FsSink::new(tmp.path()), ExportSettings::default());

        let outcome = exporter.export_account(tmp.path()).await;

        assert!(outcome.error.is_none());
        assert!(tmp.path().join("Acme/Sales/Leads/Leads.json").exists());
        assert!(tmp.path().join("Acme/Sales/Leads (2)/Leads (2).json").exists());
        let space = outcome.summary.find("Acme/Sales").unwrap();
        assert_eq!(space.children().len(), 2);
    }

    #[tokio::test]
    async fn test_children_never_take_reserved_names() {
        struct Shadowing;

        #[async_trait]
        impl PlatformApi for Shadowing {
            async fn request(&self, _: Method, path: &str, _: Option<Value>) -> Result<Value> {
                match path {
                    "/org/" => Ok(json!([
                        { "org_id": 1, "name": "observed_contact_count" },
                        { "org_id": 3, "name": "contacts_1-2.json" }
                    ])),
                    "/space/org/1/" => Ok(json!([
                        { "space_id": 2, "name": "observed_task_count" },
                        { "space_id": 4, "name": "observed_contact_count (2).json" }
                    ])),
                    "/task/" => Ok(json!([{ "task_id": 1 }])),
                    _ => Ok(json!([])),
                }
            }

            async fn open_download(&self, link: &str) -> Result<ByteStream> {
                Err(PodexError::Network(link.to_string()))
            }
        }

        let tmp = TempDir::new().unwrap();
        let settings = ExportSettings {
            name_collision: NameCollisionPolicy::Error,
            ..ExportSettings::default()
        };
        let exporter = TreeExporter::new(Arc::new(Shadowing), FsSink::new(tmp.path()), settings);

        let outcome = exporter.export_account(tmp.path()).await;

        assert!(outcome.error.is_none());
        let org_dir = tmp.path().join("observed_contact_count (2)");
        assert!(org_dir.join("observed_contact_count (2).json").is_file());
        assert!(org_dir.join("observed_task_count (2)").is_dir());
        assert!(org_dir.join("observed_contact_count (2).json (2)").is_dir());
        assert!(tmp.path().join("contacts_1-2.json (2)").is_dir());

        let summary = &outcome.summary;
        assert_eq!(summary.counter(OBSERVED_CONTACT_COUNT), Some(0));
        let org = summary.find("observed_contact_count (2)").unwrap();
        assert_eq!(org.counter(OBSERVED_TASK_COUNT), Some(1));
        assert!(org.child("observed_task_count (2)").is_some());

        let written = serde_json::to_value(summary).unwrap();
        assert_eq!(SummaryNode::from_json(&written).unwrap(), *summary);
    }

    #[tokio::test]
    async fn test_downloads_disabled_omits_downloaded_count() {
        let tmp = TempDir::new().unwrap();
        let api = Arc::new(FailingFilesApi {
            calls: Mutex::new(Vec::new()),
        });
        let settings = ExportSettings {
            download_files: false,
            ..ExportSettings::default()
        };
        let exporter = TreeExporter::new(api, FsSink::new(tmp.path()), settings);

        let outcome = exporter.export_account(tmp.path()).await;

        let leads = outcome.summary.find("Acme/Sales/Leads").unwrap();
        assert_eq!(leads.counter(DISCOVERED_FILE_COUNT), Some(0));
        assert_eq!(leads.counter(DOWNLOADED_FILE_COUNT), None);
    }
}
