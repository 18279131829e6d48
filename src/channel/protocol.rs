//! Wire protocol between a caller and the simulation host
//!
//! Every frame is a JSON object with a `type` tag. Requests carry a
//! caller-assigned `id`; every response echoes it so the caller can match
//! it to the pending request.

use serde::{Deserialize, Serialize};

use crate::core::config::{ScenarioConfig, ScenarioUpdate};
use crate::core::error::Result;
use crate::core::types::Month;
use crate::simulation::{MonthlySnapshot, PolicyFeasibility, Progress, Summary};

pub type RequestId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Init {
        id: RequestId,
        config: ScenarioConfig,
        #[serde(default)]
        scenario: Option<ScenarioUpdate>,
    },
    RunMonth {
        id: RequestId,
        #[serde(default)]
        month: Option<Month>,
        #[serde(default)]
        scenario: Option<ScenarioUpdate>,
    },
    RunSimulation {
        id: RequestId,
        #[serde(default)]
        scenario: Option<ScenarioUpdate>,
    },
    GetState {
        id: RequestId,
    },
}

impl Request {
    pub fn id(&self) -> RequestId {
        match self {
            Request::Init { id, .. }
            | Request::RunMonth { id, .. }
            | Request::RunSimulation { id, .. }
            | Request::GetState { id } => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    InitComplete {
        id: RequestId,
        worker_count: usize,
        firm_count: usize,
        training_program_count: usize,
        seed: u64,
    },
    MonthComplete {
        id: RequestId,
        snapshot: MonthlySnapshot,
    },
    Progress {
        id: RequestId,
        month: Month,
        total_months: u32,
        progress: f64,
        current_stats: MonthlySnapshot,
    },
    SimulationComplete {
        id: RequestId,
        timeline: Vec<MonthlySnapshot>,
        summary: Summary,
        policy_support: Vec<PolicyFeasibility>,
        seed: u64,
    },
    State {
        id: RequestId,
        is_initialized: bool,
        worker_count: usize,
        firm_count: usize,
        ai_capability_level: f64,
        month: Month,
    },
    /// `id` is absent only when it could not be recovered from the frame
    Error {
        id: Option<RequestId>,
        message: String,
    },
}

impl Response {
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Response::InitComplete { id, .. }
            | Response::MonthComplete { id, .. }
            | Response::Progress { id, .. }
            | Response::SimulationComplete { id, .. }
            | Response::State { id, .. } => Some(*id),
            Response::Error { id, .. } => *id,
        }
    }

    /// Whether this response completes its request
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Response::Progress { .. })
    }

    pub fn progress(id: RequestId, progress: Progress) -> Self {
        Response::Progress {
            id,
            month: progress.month,
            total_months: progress.total_months,
            progress: progress.progress,
            current_stats: progress.current_stats,
        }
    }
}

const REQUEST_TYPES: [&str; 4] = ["init", "runMonth", "runSimulation", "getState"];

/// Best-effort `id` from a frame that may not parse as a request
pub fn recover_id(frame: &str) -> Option<RequestId> {
    let value: serde_json::Value = serde_json::from_str(frame).ok()?;
    value.get("id")?.as_u64()
}

/// Parse a request frame. A frame that is not valid JSON, has an unknown
/// type, or is missing fields becomes the error response to send back.
pub fn decode_request(frame: &str) -> std::result::Result<Request, Response> {
    serde_json::from_str(frame).map_err(|err| {
        let value: Option<serde_json::Value> = serde_json::from_str(frame).ok();
        let kind = value
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(|t| t.as_str())
            .map(str::to_string);
        let message = match (value, kind) {
            (None, _) => format!("malformed frame: {}", err),
            (Some(_), Some(kind)) if !REQUEST_TYPES.contains(&kind.as_str()) => {
                format!("unknown message type: {}", kind)
            }
            (Some(_), _) => format!("invalid request: {}", err),
        };
        Response::Error { id: recover_id(frame), message }
    })
}

pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}
