//! Caller side of the execution channel
//!
//! `SimulationClient` assigns request ids, records a pending entry per
//! request and lets a dispatcher task route incoming frames back by id.
//! Progress frames are forwarded as they arrive; the first terminal frame
//! completes the request and removes its entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};

use crate::channel::host::spawn_host;
use crate::channel::protocol::{encode, recover_id, Request, RequestId, Response};
use crate::core::config::{ScenarioConfig, ScenarioUpdate};
use crate::core::error::{Result, SimError};
use crate::core::types::Month;
use crate::simulation::{InitInfo, MonthlySnapshot, Progress, SimulationResult};

type PendingTable = Arc<Mutex<AHashMap<RequestId, mpsc::UnboundedSender<Response>>>>;

/// Host state as reported by `getState`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostState {
    pub is_initialized: bool,
    pub worker_count: usize,
    pub firm_count: usize,
    pub ai_capability_level: f64,
    pub month: Month,
}

pub struct SimulationClient {
    requests: mpsc::UnboundedSender<String>,
    pending: PendingTable,
    next_id: AtomicU64,
    cancel: watch::Sender<bool>,
    host: Option<JoinHandle<()>>,
    dispatcher: tokio::task::JoinHandle<()>,
}

impl SimulationClient {
    /// Start a host thread and the dispatcher. Must be called from within a
    /// tokio runtime.
    pub fn spawn() -> Result<Self> {
        let host = spawn_host()?;
        let pending: PendingTable = Arc::new(Mutex::new(AHashMap::new()));
        let dispatcher = tokio::spawn(dispatch(host.responses, Arc::clone(&pending)));

        Ok(Self {
            requests: host.requests,
            pending,
            next_id: AtomicU64::new(1),
            cancel: host.cancel,
            host: Some(host.thread),
            dispatcher,
        })
    }

    pub async fn init(&self, config: ScenarioConfig) -> Result<InitInfo> {
        let (_, rx) = self.submit(|id| Request::Init { id, config, scenario: None }).await?;
        match wait_terminal(rx, |_| {}).await? {
            Response::InitComplete {
                worker_count,
                firm_count,
                training_program_count,
                seed,
                ..
            } => Ok(InitInfo {
                worker_count,
                firm_count,
                training_program_count,
                seed,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn run_month(&self, month: Option<Month>, scenario: Option<ScenarioUpdate>) -> Result<MonthlySnapshot> {
        let (_, rx) = self.submit(|id| Request::RunMonth { id, month, scenario }).await?;
        match wait_terminal(rx, |_| {}).await? {
            Response::MonthComplete { snapshot, .. } => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    /// Run the remaining months, forwarding each progress frame
    pub async fn run_simulation<F>(&self, scenario: Option<ScenarioUpdate>, on_progress: F) -> Result<SimulationResult>
    where
        F: FnMut(Progress),
    {
        let (_, rx) = self.submit(|id| Request::RunSimulation { id, scenario }).await?;
        match wait_terminal(rx, on_progress).await? {
            Response::SimulationComplete {
                timeline,
                summary,
                policy_support,
                seed,
                ..
            } => Ok(SimulationResult {
                timeline,
                summary,
                policy_support,
                seed,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_state(&self) -> Result<HostState> {
        let (_, rx) = self.submit(|id| Request::GetState { id }).await?;
        match wait_terminal(rx, |_| {}).await? {
            Response::State {
                is_initialized,
                worker_count,
                firm_count,
                ai_capability_level,
                month,
                ..
            } => Ok(HostState {
                is_initialized,
                worker_count,
                firm_count,
                ai_capability_level,
                month,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Send a hand-built frame and wait for its terminal response, error
    /// responses included. The frame must carry a numeric `id`.
    pub async fn send_raw(&self, frame: &str) -> Result<Response> {
        let id = recover_id(frame).ok_or_else(|| SimError::Transport("frame has no numeric id".into()))?;
        let rx = self.register(id).await;
        if self.requests.send(frame.to_string()).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(SimError::HostUnavailable);
        }
        let mut rx = rx;
        while let Some(response) = rx.recv().await {
            if response.is_terminal() {
                return Ok(response);
            }
        }
        Err(SimError::HostUnavailable)
    }

    /// Number of requests still waiting for a terminal response
    pub async fn pending_requests(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Stop the host between ticks and discard all in-flight state
    pub async fn terminate(mut self) -> Result<()> {
        self.cancel.send_replace(true);
        self.pending.lock().await.clear();
        if let Some(host) = self.host.take() {
            tokio::task::spawn_blocking(move || host.join())
                .await
                .map_err(|err| SimError::Transport(err.to_string()))?
                .map_err(|_| SimError::Transport("host thread panicked".into()))?;
        }
        tracing::debug!("simulation host terminated");
        Ok(())
    }

    async fn register(&self, id: RequestId) -> mpsc::UnboundedReceiver<Response> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.lock().await.insert(id, tx);
        rx
    }

    async fn submit<B>(&self, build: B) -> Result<(RequestId, mpsc::UnboundedReceiver<Response>)>
    where
        B: FnOnce(RequestId) -> Request,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = encode(&build(id))?;
        let rx = self.register(id).await;
        if self.requests.send(frame).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(SimError::HostUnavailable);
        }
        Ok((id, rx))
    }
}

impl Drop for SimulationClient {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
        self.dispatcher.abort();
    }
}

/// Route response frames to their pending requests until the host hangs up
async fn dispatch(mut frames: mpsc::UnboundedReceiver<String>, pending: PendingTable) {
    while let Some(frame) = frames.recv().await {
        let response: Response = match serde_json::from_str(&frame) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "undecodable response frame");
                continue;
            }
        };
        let Some(id) = response.id() else {
            tracing::warn!(?response, "uncorrelated response from host");
            continue;
        };

        let mut table = pending.lock().await;
        let terminal = response.is_terminal();
        match table.get(&id) {
            Some(tx) => {
                if tx.send(response).is_err() {
                    tracing::warn!(id, "requester gone, response dropped");
                }
            }
            None => tracing::warn!(id, "response for unknown request"),
        }
        if terminal {
            table.remove(&id);
        }
    }

    // Host gone: wake every waiter
    pending.lock().await.clear();
}

async fn wait_terminal<F>(mut rx: mpsc::UnboundedReceiver<Response>, mut on_progress: F) -> Result<Response>
where
    F: FnMut(Progress),
{
    while let Some(response) = rx.recv().await {
        match response {
            Response::Progress {
                month,
                total_months,
                progress,
                current_stats,
                ..
            } => on_progress(Progress {
                month,
                total_months,
                progress,
                current_stats,
            }),
            Response::Error { id, message } => {
                return Err(SimError::Remote {
                    id: id.unwrap_or_default(),
                    message,
                })
            }
            other => return Ok(other),
        }
    }
    Err(SimError::HostUnavailable)
}

fn unexpected(response: Response) -> SimError {
    SimError::Transport(format!("unexpected response: {:?}", response))
}
