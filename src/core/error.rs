use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Simulation not initialized: call init first")]
    NotInitialized,

    #[error("Invalid population size for {field}: {value}")]
    InvalidPopulation { field: &'static str, value: i64 },

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Simulation cancelled")]
    Cancelled,

    #[error("Simulation host is not running")]
    HostUnavailable,

    #[error("Agent fault in {kind} {id}: {reason}")]
    AgentFault {
        kind: &'static str,
        id: u32,
        reason: String,
    },

    #[error("Request {id} failed: {message}")]
    Remote { id: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl SimError {
    pub fn worker_fault(id: u32, reason: impl Into<String>) -> Self {
        SimError::AgentFault { kind: "worker", id, reason: reason.into() }
    }

    pub fn firm_fault(id: u32, reason: impl Into<String>) -> Self {
        SimError::AgentFault { kind: "firm", id, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
