use std::rc::Rc;

use crate::error::Result;
use crate::model::CompletionLog;
use crate::store::kv::{KvStore, keys, write_json};
use crate::store::{Backend, LogStore, select_last};

/// Log list persisted under [`keys::LOGS`].
pub struct LocalLogStore {
    kv: Rc<dyn KvStore>,
}

impl LocalLogStore {
    pub fn new(kv: Rc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Overwrite the whole log list, as a backup import does.
    pub fn replace_all(&self, logs: &[CompletionLog]) -> Result<()> {
        write_json(self.kv.as_ref(), keys::LOGS, logs)?;
        tracing::info!(count = logs.len(), "local logs replaced");
        Ok(())
    }
}

fn decode(raw: Option<&str>) -> Vec<CompletionLog> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };
    serde_json::from_str::<Option<Vec<CompletionLog>>>(raw)
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "stored logs unreadable, starting empty");
            None
        })
        .unwrap_or_default()
}

impl LogStore for LocalLogStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn get_logs(&self) -> Result<Vec<CompletionLog>> {
        Ok(decode(self.kv.get(keys::LOGS)?.as_deref()))
    }

    fn add_log(&mut self, log: CompletionLog) -> Result<CompletionLog> {
        self.kv.update(keys::LOGS, &mut |prev| {
            let mut logs = decode(prev.as_deref());
            logs.push(log.clone());
            Ok(serde_json::to_string(&logs)?)
        })?;
        tracing::info!(task = %log.task_id, date = %log.date_key, "log added");
        Ok(log)
    }

    fn remove_last_log(
        &mut self,
        predicate: &dyn Fn(&CompletionLog) -> bool,
    ) -> Result<Option<CompletionLog>> {
        let mut removed = None;
        self.kv.update(keys::LOGS, &mut |prev| {
            let mut logs = decode(prev.as_deref());
            removed = select_last(&logs, predicate).map(|idx| logs.remove(idx));
            Ok(serde_json::to_string(&logs)?)
        })?;
        if let Some(log) = &removed {
            tracing::info!(task = %log.task_id, id = %log.id, "log removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::{FileKvStore, MemoryKvStore};
    use std::collections::BTreeMap;

    fn log(id: &str, task: &str) -> CompletionLog {
        CompletionLog {
            id: id.to_string(),
            task_id: task.to_string(),
            task_name: task.to_uppercase(),
            user_id: "ana".to_string(),
            at_iso: "2024-03-06T12:00:00.000Z".to_string(),
            date_key: "2024-03-06".to_string(),
            week_key: "2024-W10".to_string(),
            points: 1.0,
            minutes: 5.0,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_store_has_no_logs() {
        let store = LocalLogStore::new(Rc::new(MemoryKvStore::new()));
        assert!(store.get_logs().expect("logs").is_empty());
    }

    #[test]
    fn remove_last_removes_exactly_one() {
        let mut store = LocalLogStore::new(Rc::new(MemoryKvStore::new()));
        store.add_log(log("1", "trash")).expect("add");
        store.add_log(log("2", "dishes")).expect("add");
        store.add_log(log("3", "trash")).expect("add");

        let removed = store
            .remove_last_log(&|l| l.task_id == "trash")
            .expect("remove");
        assert_eq!(removed.map(|l| l.id), Some("3".to_string()));

        let ids: Vec<String> = store.get_logs().expect("logs").into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn remove_without_match_is_a_no_op() {
        let mut store = LocalLogStore::new(Rc::new(MemoryKvStore::new()));
        store.add_log(log("1", "trash")).expect("add");
        let removed = store.remove_last_log(&|l| l.task_id == "mop").expect("remove");
        assert!(removed.is_none());
        assert_eq!(store.get_logs().expect("logs").len(), 1);
    }

    #[test]
    fn logs_survive_reopen_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv: Rc<dyn KvStore> = Rc::new(FileKvStore::new(dir.path()));
        let mut store = LocalLogStore::new(Rc::clone(&kv));
        store.add_log(log("1", "trash")).expect("add");

        let reopened = LocalLogStore::new(Rc::new(FileKvStore::new(dir.path())));
        assert_eq!(reopened.get_logs().expect("logs"), vec![log("1", "trash")]);
    }

    #[test]
    fn replace_all_overwrites() {
        let mut store = LocalLogStore::new(Rc::new(MemoryKvStore::new()));
        store.add_log(log("1", "trash")).expect("add");
        store.replace_all(&[log("9", "mop")]).expect("replace");
        let logs = store.get_logs().expect("logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, "9");
    }
}
