//! Business logic services.

pub mod access;
pub mod cron;
pub mod outgoing;
pub mod package;
pub mod scheduler;
pub mod storage;
pub mod submit_gate;
pub mod tasks;
pub mod validation;
pub mod validator;

pub use access::{AddonAccess, authorize_addon};
pub use outgoing::OutgoingLinker;
pub use scheduler::start_cron_task;
pub use storage::Storage;
pub use submit_gate::{GateDecision, TrackerState, gate};
pub use tasks::{
    InlineTaskQueue, LoggingIndexer, SearchIndexer, SpawningTaskQueue, Task, TaskQueue, TaskRunner,
};
pub use validator::{PackageValidator, Validator};
