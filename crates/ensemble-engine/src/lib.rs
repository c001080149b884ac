//! The rule engine core: action execution (C4), event ingest (C5), and the
//! heartbeat timer (C6), tied together by a single cooperative controller
//! loop (SPEC_FULL.md §5). Grounded throughout on
//! `client-engine/src/engine.rs`'s `EngineRuntime`/`run` shape, generalised
//! from Chia farming-job dispatch to ensemble rule evaluation.
#![deny(unreachable_pub)]
#![deny(missing_docs)]

mod controller;
mod error;
mod executor;
mod flux;
mod handlers;
mod heartbeat;
mod ingest;
mod stop;
mod workload_manager;

pub use controller::Controller;
pub use error::EngineError;
pub use executor::{ActionExecutor, EvalContext};
pub use flux::flux_supported_triggers;
pub use handlers::{ActionDescriptor, CustomContext, CustomHandler, HandlerRegistry};
pub use stop::StopSignal;
pub use workload_manager::{JobEvent, JobRecord, WorkloadManager, SENTINEL_JOB_ID};
