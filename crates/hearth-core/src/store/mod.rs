//! Completion log storage.
//!
//! A [`LogStore`] is an ordered sequence of [`CompletionLog`]s that only
//! grows by appending and only shrinks by removing the most recent log that
//! matches a predicate. Two implementations exist:
//!
//! - [`LocalLogStore`] keeps the list in a [`KvStore`].
//! - [`crate::remote::RemoteBackend`] mirrors an authoritative remote feed.
//!
//! The session picks one at boot and never mixes them.

pub mod kv;
pub mod local;

pub use kv::{FileKvStore, KvStore, MemoryKvStore, keys, read_json, write_json};
pub use local::LocalLogStore;

use crate::error::Result;
use crate::model::CompletionLog;

/// Which implementation backs a [`LogStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Local,
    Remote,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

pub trait LogStore {
    fn backend(&self) -> Backend;

    /// All logs in store order.
    fn get_logs(&self) -> Result<Vec<CompletionLog>>;

    /// Append `log`, returning it as stored (remote stores assign the id).
    fn add_log(&mut self, log: CompletionLog) -> Result<CompletionLog>;

    /// Remove the most recent log matching `predicate`, if any.
    ///
    /// "Most recent" is decided by [`select_last`].
    fn remove_last_log(
        &mut self,
        predicate: &dyn Fn(&CompletionLog) -> bool,
    ) -> Result<Option<CompletionLog>>;
}

/// Index of the most recent log matching `predicate`.
///
/// When any candidate carries `createdAt`, the greatest `createdAt` wins and
/// ties go to the later position. Otherwise the last candidate in store
/// order wins.
pub fn select_last(
    logs: &[CompletionLog],
    predicate: &dyn Fn(&CompletionLog) -> bool,
) -> Option<usize> {
    let candidates = logs
        .iter()
        .enumerate()
        .filter(|(_, log)| predicate(log));

    let mut last_in_order = None;
    let mut newest: Option<(i64, usize)> = None;
    for (idx, log) in candidates {
        last_in_order = Some(idx);
        if let Some(created) = log.created_at {
            if newest.is_none_or(|(best, _)| created >= best) {
                newest = Some((created, idx));
            }
        }
    }

    newest.map(|(_, idx)| idx).or(last_in_order)
}
