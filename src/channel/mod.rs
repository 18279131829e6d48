//! Execution channel: drives the orchestrator on a separate thread through
//! JSON frames correlated by request id

pub mod client;
pub mod host;
pub mod protocol;

pub use client::{HostState, SimulationClient};
pub use host::{spawn_host, Host};
pub use protocol::{decode_request, Request, RequestId, Response};
