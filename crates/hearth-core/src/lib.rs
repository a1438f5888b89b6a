//! hearth-core library.
//!
//! Recurrence rules, completion log stores and weekly reports for a
//! single-household chore tracker. [`session::Session`] ties the pieces
//! together; everything under it is usable on its own.

pub mod aggregate;
pub mod backup;
pub mod canon;
pub mod catalog;
pub mod config;
pub mod due;
pub mod error;
pub mod lock;
pub mod model;
pub mod plan;
pub mod prefs;
pub mod remote;
pub mod session;
pub mod store;
pub mod time;
pub mod timer;

/// # Conventions
///
/// - **Errors**: Core operations return [`error::Result`]; config loading uses `anyhow::Result`.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
/// - **Ids**: Compare task ids through [`canon::Canonicalizer`], never with `==`.
pub use error::{HearthError, Notice, NoticeLevel, Result};
pub use session::{Session, SessionBuilder};
