//! Replay VM for startup programs
//!
//! This crate executes the programs emitted by the recorder:
//! - Chained code units run in order, each with its own register file
//! - Values crossing unit boundaries travel through a write-once slot table
//! - Recorded results are published into the startup context
//! - Recorders, substitutions and static functions come from a runtime registry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod slots;
pub mod vm;

// Re-export main types at crate root
pub use context::{StartupContext, UnitFrame};
pub use dispatch::{Dispatcher, Flow};
pub use error::{ReplayError, ReplayResult};
pub use registry::{RecorderFactory, RecorderHandle, RecorderTarget, RuntimeRegistry, StaticFunction};
pub use slots::SlotTable;
pub use vm::{ReplayStats, Replayer};
