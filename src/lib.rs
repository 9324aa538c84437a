//! SPSA tuning coordinator core: bit-packed flip transport, the classic
//! and schedule-free update engines, the per-run parameter store, and the
//! concurrency guard around one run's live state.
//!
//! The surrounding web stack (HTTP routing, session/auth, the task
//! manager's expiry policy, the worker pool that actually plays games) is
//! out of scope; this crate is the coordinator's numerical and
//! bookkeeping core that such a stack wraps.

pub mod codec;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod param;
pub mod persist;
pub mod run;
pub mod schedule;
pub mod task;
pub mod update;
pub mod variant;
pub mod wire;

pub use coordinator::Coordinator;
pub use coordinator::RunId;
pub use error::RunError;
pub use error::UpdateError;
pub use param::Param;
pub use param::ParamSpec;
pub use run::Run;
pub use run::RunConfig;
pub use task::Dispatch;
pub use task::Task;
pub use variant::Variant;
