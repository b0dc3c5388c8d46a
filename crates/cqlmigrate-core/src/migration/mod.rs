//! Migration records and the reconciliation engine.
//!
//! Two independently sourced timelines meet here: the scripts a resolver can
//! see and the rows the history table recorded. [`MigrationInfoService`]
//! merges them by version into [`MigrationInfo`] entries and classifies each
//! one with a [`MigrationState`].
//!
//! # States
//!
//! | State | Resolved | Applied | Meaning |
//! |-------|----------|---------|---------|
//! | `Pending` | yes | no | Waiting to run |
//! | `AboveTarget` | yes | no | Newer than the target |
//! | `Ignored` / `OutOfOrder` | yes | no | Older than the latest applied version |
//! | `BelowBaseline` | yes | maybe | Superseded by the baseline |
//! | `Baseline` | - | marker | The baseline itself |
//! | `Success` / `Failed` | yes | yes | Ran, with the recorded outcome |
//! | `MissingSuccess` / `MissingFailed` | no | yes | Script removed locally |
//! | `FutureSuccess` / `FutureFailed` | no | yes | Applied by a newer release |
//!
//! # Example
//!
//! ```ignore
//! use cqlmigrate_core::{FileSystemResolver, MigrationConfig, MigrationInfoService, SledHistoryStore};
//!
//! let resolver = FileSystemResolver::new("migrations");
//! let history = SledHistoryStore::open(&db, &config.keyspace, &config.table)?;
//!
//! let mut service = MigrationInfoService::new(&resolver, &history, &config);
//! service.refresh()?;
//!
//! for info in service.pending() {
//!     println!("{} {}", info.version(), info.description());
//! }
//! ```

pub mod info;
pub mod service;
pub mod state;
pub mod types;
pub mod validate;

pub use info::{classify, ClassifyContext, EntrySource, MigrationInfo};
pub use service::{reconcile, MigrationInfoService};
pub use state::MigrationState;
pub use types::{AppliedMigration, MigrationType, ResolvedMigration};
pub use validate::{ensure_valid, validate_infos, ValidationIssue};
