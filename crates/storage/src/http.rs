use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docshelf_core::{ChangeEvent, ChangeList, FOLDER_MIME, FileRecord, SubscriptionChannel};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::provider::{ChannelRequest, ListFilter, StorageProvider};

/// Configuration for the HTTP storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// API base URL (e.g. `https://www.googleapis.com/drive/v3`).
    pub base_url: String,
    /// Bearer access token.
    pub token: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl StorageConfig {
    /// Create a config for the given base URL and access token.
    ///
    /// Default timeout is 30 seconds.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout_seconds: 30,
        }
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Storage provider backed by a Drive-style REST API.
#[derive(Debug)]
pub struct HttpStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

// -- Wire types -------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    /// The API reports sizes as decimal strings.
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    app_properties: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveChange {
    file_id: Option<String>,
    #[serde(default)]
    removed: bool,
    file: Option<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangesPage {
    #[serde(default)]
    changes: Vec<DriveChange>,
    next_page_token: Option<String>,
    new_start_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPageToken {
    start_page_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatchResponse {
    resource_id: Option<String>,
    /// Epoch milliseconds, as a decimal string.
    expiration: Option<String>,
}

const FILE_FIELDS: &str = "id,name,mimeType,size,parents,appProperties";

fn record_from(file: DriveFile) -> FileRecord {
    let organized = file
        .app_properties
        .get("organized")
        .is_some_and(|v| v == "true");
    FileRecord {
        id: file.id,
        name: file.name,
        mime_type: file.mime_type,
        size: file.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        parent_id: file.parents.into_iter().next(),
        organized,
    }
}

fn event_from(change: DriveChange) -> Option<ChangeEvent> {
    let file = change.file.map(record_from);
    let file_id = change
        .file_id
        .or_else(|| file.as_ref().map(|f| f.id.clone()))?;
    Some(ChangeEvent {
        file_id,
        removed: change.removed,
        file,
    })
}

// -- Client -----------------------------------------------------------------

impl HttpStorage {
    /// Create a new HTTP storage client with the given configuration.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        if config.token.is_empty() {
            return Err(StorageError::Configuration("empty access token".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn send_error(&self, e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Timeout(self.config.timeout_seconds)
        } else {
            StorageError::Http(e.to_string())
        }
    }

    /// Convert a non-success response into an error, reading the body for
    /// the message. `subject` names the resource for `NotFound`.
    async fn check_status(
        response: reqwest::Response,
        subject: &str,
    ) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(subject.to_string()));
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), subject, "storage API returned error");
        Err(StorageError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, StorageError> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .query(query)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let response = Self::check_status(response, subject).await?;
        response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))
    }

    async fn current_parents(&self, id: &str) -> Result<Vec<String>, StorageError> {
        #[derive(Deserialize)]
        struct Parents {
            #[serde(default)]
            parents: Vec<String>,
        }
        let parents: Parents = self
            .get_json(&format!("files/{id}"), &[("fields", "parents")], id)
            .await?;
        Ok(parents.parents)
    }
}

#[async_trait]
impl StorageProvider for HttpStorage {
    async fn list(
        &self,
        root: &str,
        filter: &ListFilter,
    ) -> Result<Vec<FileRecord>, StorageError> {
        let query = format!("'{root}' in parents and trashed=false");
        let fields = format!("nextPageToken,files({FILE_FIELDS})");
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", query.as_str()), ("fields", fields.as_str())];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let page: FileListPage = self.get_json("files", &params, root).await?;

            records.extend(
                page.files
                    .into_iter()
                    .map(record_from)
                    .filter(|f| filter.accepts(f)),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(root, count = records.len(), "listed files");
        Ok(records)
    }

    async fn download(&self, file: &FileRecord) -> Result<Bytes, StorageError> {
        let response = match file.export_mime() {
            Some(export_mime) => {
                self.client
                    .get(self.url(&format!("files/{}/export", file.id)))
                    .header("Authorization", format!("Bearer {}", self.config.token))
                    .query(&[("mimeType", export_mime)])
                    .send()
                    .await
            }
            None => {
                self.client
                    .get(self.url(&format!("files/{}", file.id)))
                    .header("Authorization", format!("Bearer {}", self.config.token))
                    .query(&[("alt", "media")])
                    .send()
                    .await
            }
        }
        .map_err(|e| self.send_error(e))?;

        let response = Self::check_status(response, &file.id).await?;
        response
            .bytes()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))
    }

    async fn move_file(&self, id: &str, dest_folder: &str) -> Result<(), StorageError> {
        let previous = self.current_parents(id).await?.join(",");

        let mut params = vec![("addParents", dest_folder), ("fields", "id,parents")];
        if !previous.is_empty() {
            params.push(("removeParents", previous.as_str()));
        }

        let response = self
            .client
            .patch(self.url(&format!("files/{id}")))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .query(&params)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response, id).await?;
        Ok(())
    }

    async fn ensure_folder(&self, name: &str, parent: &str) -> Result<String, StorageError> {
        let query = format!(
            "name='{name}' and mimeType='{FOLDER_MIME}' and '{parent}' in parents and trashed=false"
        );
        let page: FileListPage = self
            .get_json(
                "files",
                &[("q", query.as_str()), ("fields", "files(id)")],
                name,
            )
            .await?;

        if let Some(existing) = page.files.into_iter().next() {
            return Ok(existing.id);
        }

        #[derive(Deserialize)]
        struct Created {
            id: String,
        }
        let response = self
            .client
            .post(self.url("files"))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .query(&[("fields", "id")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent],
            }))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let response = Self::check_status(response, name).await?;
        let created: Created = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        debug!(name, id = %created.id, "created category folder");
        Ok(created.id)
    }

    async fn mark_organized(&self, id: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .patch(self.url(&format!("files/{id}")))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .query(&[("fields", "id")])
            .json(&json!({
                "appProperties": { "organized": "true" },
            }))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response, id).await?;
        Ok(())
    }

    async fn watch(
        &self,
        root: &str,
        request: &ChannelRequest,
    ) -> Result<SubscriptionChannel, StorageError> {
        // The provider's change feed is account-wide; scoping notifications
        // to the watched root happens at resolution time, not here.
        let start: StartPageToken = self
            .get_json("changes/startPageToken", &[], "startPageToken")
            .await?;

        let lease_ms = i64::try_from(request.lease_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        let expiration_ms = Utc::now().timestamp_millis().saturating_add(lease_ms);

        let response = self
            .client
            .post(self.url("changes/watch"))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .query(&[("pageToken", start.start_page_token.as_str())])
            .json(&json!({
                "id": request.id,
                "type": "web_hook",
                "address": request.address,
                "token": request.token,
                "expiration": expiration_ms.to_string(),
            }))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let response = Self::check_status(response, &request.id).await?;
        let watch: WatchResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        let created_at = Utc::now();
        // Prefer the lease the provider actually granted.
        let expires_at = watch
            .expiration
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(chrono::DateTime::from_timestamp_millis)
            .unwrap_or_else(|| {
                created_at
                    + chrono::Duration::seconds(
                        i64::try_from(request.lease_secs).unwrap_or(i64::MAX),
                    )
            });

        debug!(root, channel = %request.id, %expires_at, "established push channel");
        Ok(SubscriptionChannel {
            id: request.id.clone(),
            token: request.token.clone(),
            resource_id: watch.resource_id,
            created_at,
            expires_at,
        })
    }

    async fn cancel_watch(&self, channel: &SubscriptionChannel) -> Result<(), StorageError> {
        let Some(resource_id) = channel.resource_id.as_deref() else {
            // Never registered with the provider; nothing to stop.
            return Ok(());
        };

        let response = self
            .client
            .post(self.url("channels/stop"))
            .header("Authorization", format!("Bearer {}", self.config.token))
            .json(&json!({
                "id": channel.id,
                "resourceId": resource_id,
            }))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        // A channel that already lapsed is gone either way.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response, &channel.id).await?;
        Ok(())
    }

    async fn start_cursor(&self) -> Result<String, StorageError> {
        let start: StartPageToken = self
            .get_json("changes/startPageToken", &[], "startPageToken")
            .await?;
        Ok(start.start_page_token)
    }

    async fn changes_since(&self, cursor: &str) -> Result<ChangeList, StorageError> {
        let fields =
            format!("nextPageToken,newStartPageToken,changes(fileId,removed,file({FILE_FIELDS}))");
        let mut events = Vec::new();
        let mut page_token = cursor.to_string();

        loop {
            let page: ChangesPage = self
                .get_json(
                    "changes",
                    &[
                        ("pageToken", page_token.as_str()),
                        ("fields", fields.as_str()),
                        ("includeRemoved", "true"),
                    ],
                    cursor,
                )
                .await?;

            events.extend(page.changes.into_iter().filter_map(event_from));

            match (page.next_page_token, page.new_start_page_token) {
                (Some(next), _) => page_token = next,
                (None, Some(new_start)) => {
                    return Ok(ChangeList {
                        events,
                        next_cursor: new_start,
                    });
                }
                (None, None) => {
                    return Ok(ChangeList {
                        events,
                        next_cursor: page_token,
                    });
                }
            }
        }
    }
}

// -- Tests ------------------------------------------------------------------
