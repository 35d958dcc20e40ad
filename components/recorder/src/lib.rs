//! Startup recorder.
//!
//! Build steps call recorder contracts through recording proxies. The calls
//! are logged, their arguments are decomposed into a deduplicated graph of
//! deferred values, and the whole is emitted as a chain of size-limited
//! code units sharing one slot table. The resulting
//! [`StartupProgram`](bytecode_system::StartupProgram) replays the calls
//! when the application starts.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod contract;
mod decompose;
mod emit;
mod environment;
mod error;
mod graph;
mod instruction;
mod metadata;
mod proxy;
mod registry;
mod resolve;
mod session;

pub use config::{RecorderConfig, DEFAULT_MAX_STEPS_PER_UNIT, DEFAULT_PROGRAM_PREFIX};
pub use contract::{MethodSignature, RecorderContract, ReturnType};
pub use emit::UnitWriter;
pub use environment::RecordingEnvironment;
pub use error::{RecordingError, RecordingResult};
pub use graph::{Construction, DeferredNode, NodeId, NodeKind, NodeState, ObjectStep, ValueGraph};
pub use instruction::RecordedInstruction;
pub use metadata::MetadataLiteralProvider;
pub use proxy::{is_proxiable, KeyGenerator, ProxyPlan, ProxyTypeCache, RecordingProxy, ResultPlan, SessionLog};
pub use registry::{ArgumentsFn, NonDefaultConstructor, ObjectLoader, Registrations, SubstitutionHolder};
pub use session::RecordingSession;
