pub mod backup;
pub mod done;
pub mod express;
pub mod init;
pub mod summary;
pub mod task;
pub mod timer;
pub mod today;
pub mod user;
pub mod week;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hearth_core::catalog::Catalog;
use hearth_core::config::{EffectiveConfig, HEARTH_DIR};
use hearth_core::error::HearthError;
use hearth_core::remote::HttpLogFeed;
use hearth_core::session::{Clock, FixedClock, Session, SessionBuilder, SystemClock};
use hearth_core::store::{FileKvStore, KvStore};

use crate::output::OutputMode;

/// Everything a command handler needs besides its own args.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_root: PathBuf,
    pub config: EffectiveConfig,
    pub output: OutputMode,
    pub quiet: bool,
    /// Pinned clock from `--now`.
    pub now: Option<DateTime<Utc>>,
}

impl RunContext {
    fn clock(&self) -> Box<dyn Clock> {
        match self.now {
            Some(now) => Box::new(FixedClock::new(now)),
            None => Box::new(SystemClock),
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.config.household.catalog_path(&self.project_root)
    }

    /// Boot a session for the household rooted at `project_root`.
    ///
    /// # Errors
    ///
    /// [`HearthError::NotInitialized`] when `.hearth/` is missing, plus any
    /// catalog or store error from boot.
    pub fn open_session(&self) -> Result<Session> {
        ensure_initialized(&self.project_root)?;

        let catalog = Catalog::load(&self.catalog_path())?;
        let kv: Rc<dyn KvStore> = Rc::new(FileKvStore::new(
            self.config.household.data_dir(&self.project_root),
        ));
        let session = SessionBuilder::new(catalog, kv)
            .feed(Box::new(HttpLogFeed::new()))
            .clock(self.clock())
            .lagging_limit(self.config.household.report.lagging_limit)
            .default_user(self.config.user.user.clone())
            .boot()?;
        Ok(session)
    }
}

fn ensure_initialized(project_root: &Path) -> Result<()> {
    let dir = project_root.join(HEARTH_DIR);
    if dir.is_dir() {
        Ok(())
    } else {
        Err(HearthError::NotInitialized(project_root.to_path_buf()).into())
    }
}
