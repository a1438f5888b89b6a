//! Remote log feed: an optional authoritative log source shared by every
//! device in the house.
//!
//! When the catalog's cloud section is enabled and the feed connects, the
//! session uses [`RemoteBackend`] for the whole run and never touches the
//! local log list. The backend keeps a mirror of the remote collection that
//! the feed replaces wholesale on every change.
//!
//! # Wire format
//!
//! [`HttpLogFeed`] speaks JSON over REST under
//! `{firebaseConfig.databaseURL}/houses/{houseId}/logs`:
//!
//! | Call | Request | Response |
//! |---|---|---|
//! | list | `GET /logs` | array of logs, or an object keyed by id |
//! | add | `POST /logs` with the log plus `createdAt` | `{"id": ...}` (or `{"name": ...}`) |
//! | delete | `DELETE /logs/{id}` | ignored |

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;

use crate::catalog::CloudConfig;
use crate::error::{HearthError, Result};
use crate::model::CompletionLog;
use crate::store::{Backend, LogStore, select_last};

/// Receives the full remote log set whenever it changes.
pub type LogsListener = Box<dyn FnMut(Vec<CompletionLog>)>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Contract for a remote log source.
pub trait RemoteLogFeed {
    /// Connect and deliver the current log set to `on_logs` at least once.
    fn init(&mut self, cloud: &CloudConfig, on_logs: LogsListener) -> Result<()>;

    /// Re-read the remote collection and notify the listener.
    fn refresh(&mut self) -> Result<()>;

    /// Insert `log` (sent without its id) and return the id the store assigned.
    fn add_log(&mut self, log: &CompletionLog) -> Result<String>;

    fn delete_log(&mut self, id: &str) -> Result<()>;
}

/// Whether a cloud section is complete enough to try connecting.
#[must_use]
pub fn is_enabled(cloud: &CloudConfig) -> bool {
    cloud.is_enabled()
}

// ---------------------------------------------------------------------------
// HTTP feed
// ---------------------------------------------------------------------------

pub struct HttpLogFeed {
    agent: ureq::Agent,
    endpoint: Option<String>,
    listener: Option<LogsListener>,
}

impl Default for HttpLogFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpLogFeed {
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            endpoint: None,
            listener: None,
        }
    }

    fn endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| HearthError::RemoteUnavailable("feed not initialized".to_string()))
    }

    fn fetch(&self) -> Result<Vec<CompletionLog>> {
        let url = self.endpoint()?;
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .set("User-Agent", "hearth")
            .call()
            .map_err(|err| HearthError::Remote(format!("GET {url} failed: {err}")))?;
        let body: Value = response
            .into_json()
            .map_err(|err| HearthError::Remote(format!("GET {url} returned bad JSON: {err}")))?;
        Ok(decode_collection(body))
    }
}

impl RemoteLogFeed for HttpLogFeed {
    fn init(&mut self, cloud: &CloudConfig, on_logs: LogsListener) -> Result<()> {
        if !is_enabled(cloud) {
            return Err(HearthError::RemoteUnavailable(
                "cloud disabled or missing config".to_string(),
            ));
        }
        let base = cloud.database_url().ok_or_else(|| {
            HearthError::RemoteUnavailable("firebaseConfig.databaseURL is missing".to_string())
        })?;

        self.endpoint = Some(format!("{base}/houses/{}/logs", cloud.house_id.trim()));
        self.listener = Some(on_logs);
        self.refresh().map_err(|err| match err {
            HearthError::Remote(reason) => HearthError::RemoteUnavailable(reason),
            other => other,
        })?;
        tracing::info!(house = %cloud.house_id, "remote log feed connected");
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        let logs = self.fetch()?;
        tracing::debug!(count = logs.len(), "remote logs fetched");
        if let Some(listener) = self.listener.as_mut() {
            listener(logs);
        }
        Ok(())
    }

    fn add_log(&mut self, log: &CompletionLog) -> Result<String> {
        let url = self.endpoint()?.to_string();
        let mut payload = serde_json::to_value(log.without_id())?;
        if let Value::Object(map) = &mut payload {
            map.insert(
                "createdAt".to_string(),
                Value::from(chrono::Utc::now().timestamp_millis()),
            );
        }

        let response = self
            .agent
            .post(&url)
            .set("User-Agent", "hearth")
            .send_json(payload)
            .map_err(|err| HearthError::Remote(format!("POST {url} failed: {err}")))?;
        let body: Value = response
            .into_json()
            .map_err(|err| HearthError::Remote(format!("POST {url} returned bad JSON: {err}")))?;

        body.get("id")
            .or_else(|| body.get("name"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| HearthError::Remote(format!("POST {url} returned no id")))
    }

    fn delete_log(&mut self, id: &str) -> Result<()> {
        let url = format!("{}/{id}", self.endpoint()?);
        self.agent
            .delete(&url)
            .set("User-Agent", "hearth")
            .call()
            .map_err(|err| HearthError::Remote(format!("DELETE {url} failed: {err}")))?;
        Ok(())
    }
}

/// Decode a list response, skipping documents that are not logs, ordered by
/// `createdAt` ascending.
fn decode_collection(body: Value) -> Vec<CompletionLog> {
    let docs: Vec<(Option<String>, Value)> = match body {
        Value::Array(items) => items.into_iter().map(|doc| (None, doc)).collect(),
        Value::Object(map) => map.into_iter().map(|(id, doc)| (Some(id), doc)).collect(),
        _ => Vec::new(),
    };

    let mut logs: Vec<CompletionLog> = docs
        .into_iter()
        .filter_map(|(key, doc)| match serde_json::from_value::<CompletionLog>(doc) {
            Ok(mut log) => {
                if log.id.is_empty() {
                    log.id = key.unwrap_or_default();
                }
                Some(log)
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed remote log");
                None
            }
        })
        .collect();
    logs.sort_by_key(|log| log.created_at.unwrap_or(i64::MIN));
    logs
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// [`LogStore`] over a connected [`RemoteLogFeed`].
pub struct RemoteBackend {
    feed: Box<dyn RemoteLogFeed>,
    mirror: Rc<RefCell<Vec<CompletionLog>>>,
}

impl RemoteBackend {
    /// Initialise `feed` and start mirroring its logs.
    pub fn connect(mut feed: Box<dyn RemoteLogFeed>, cloud: &CloudConfig) -> Result<Self> {
        let mirror = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&mirror);
        feed.init(
            cloud,
            Box::new(move |logs| {
                *sink.borrow_mut() = logs;
            }),
        )?;
        Ok(Self { feed, mirror })
    }

    fn resync(&mut self) -> bool {
        match self.feed.refresh() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "remote refresh failed, keeping local mirror");
                false
            }
        }
    }
}

impl LogStore for RemoteBackend {
    fn backend(&self) -> Backend {
        Backend::Remote
    }

    fn get_logs(&self) -> Result<Vec<CompletionLog>> {
        Ok(self.mirror.borrow().clone())
    }

    fn add_log(&mut self, log: CompletionLog) -> Result<CompletionLog> {
        let id = self.feed.add_log(&log.without_id())?;
        let mut stored = log;
        stored.id.clone_from(&id);

        if self.resync() {
            if let Some(found) = self.mirror.borrow().iter().find(|l| l.id == id) {
                return Ok(found.clone());
            }
        }
        self.mirror.borrow_mut().push(stored.clone());
        tracing::info!(task = %stored.task_id, id = %stored.id, "remote log added");
        Ok(stored)
    }

    fn remove_last_log(
        &mut self,
        predicate: &dyn Fn(&CompletionLog) -> bool,
    ) -> Result<Option<CompletionLog>> {
        let target = {
            let logs = self.mirror.borrow();
            select_last(&logs, predicate).map(|idx| logs[idx].clone())
        };
        let Some(target) = target else {
            return Ok(None);
        };
        if target.id.is_empty() {
            tracing::warn!(task = %target.task_id, "remote log has no id, cannot delete");
            return Ok(None);
        }

        self.feed.delete_log(&target.id)?;
        if !self.resync() {
            self.mirror.borrow_mut().retain(|l| l.id != target.id);
        }
        tracing::info!(task = %target.task_id, id = %target.id, "remote log deleted");
        Ok(Some(target))
    }
}
