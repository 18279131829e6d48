//! Simulation host: owns the orchestrator on a dedicated thread
//!
//! The host thread runs its own current-thread runtime and serves request
//! frames strictly one at a time. Nothing is shared with the caller except
//! the channels carrying JSON frames and the cancellation flag.

use std::thread::JoinHandle;

use tokio::sync::{mpsc, watch};

use crate::channel::protocol::{decode_request, encode, Request, RequestId, Response};
use crate::core::error::{Result, SimError};
use crate::simulation::{Simulation, YIELD_INTERVAL};

/// Caller-side ends of a running host
pub struct Host {
    pub requests: mpsc::UnboundedSender<String>,
    pub responses: mpsc::UnboundedReceiver<String>,
    /// Set to true to stop the host between ticks
    pub cancel: watch::Sender<bool>,
    pub thread: JoinHandle<()>,
}

/// Start a host thread
pub fn spawn_host() -> Result<Host> {
    let (request_tx, request_rx) = mpsc::unbounded_channel::<String>();
    let (response_tx, response_rx) = mpsc::unbounded_channel::<String>();
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let thread = std::thread::Builder::new()
        .name("simulation-host".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(err) => {
                    tracing::error!(error = %err, "failed to start host runtime");
                    return;
                }
            };
            runtime.block_on(serve(request_rx, response_tx, cancel_rx));
        })?;

    Ok(Host {
        requests: request_tx,
        responses: response_rx,
        cancel: cancel_tx,
        thread,
    })
}

/// Request loop. Exits when the request channel closes or cancellation is
/// signalled.
pub async fn serve(
    mut requests: mpsc::UnboundedReceiver<String>,
    responses: mpsc::UnboundedSender<String>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut sim = Simulation::new();
    tracing::debug!("simulation host started");

    loop {
        let frame = tokio::select! {
            frame = requests.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
        };

        let request = match decode_request(&frame) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(?error, "rejected request frame");
                send(&responses, &error);
                continue;
            }
        };

        let id = request.id();
        if let Err(err) = handle(&mut sim, request, &responses, &cancel).await {
            tracing::debug!(id, error = %err, "request failed");
            send(&responses, &Response::Error { id: Some(id), message: err.to_string() });
        }
    }

    tracing::debug!("simulation host stopped");
}

fn send(responses: &mpsc::UnboundedSender<String>, response: &Response) {
    match encode(response) {
        Ok(frame) => {
            if responses.send(frame).is_err() {
                tracing::warn!(id = ?response.id(), "caller gone, response dropped");
            }
        }
        Err(err) => tracing::warn!(id = ?response.id(), error = %err, "failed to encode response"),
    }
}

async fn handle(
    sim: &mut Simulation,
    request: Request,
    responses: &mpsc::UnboundedSender<String>,
    cancel: &watch::Receiver<bool>,
) -> Result<()> {
    match request {
        Request::Init { id, config, scenario } => {
            let info = sim.init(config)?;
            if let Some(update) = scenario {
                sim.apply_update(&update)?;
            }
            send(
                responses,
                &Response::InitComplete {
                    id,
                    worker_count: info.worker_count,
                    firm_count: info.firm_count,
                    training_program_count: info.training_program_count,
                    seed: info.seed,
                },
            );
        }
        Request::RunMonth { id, month, scenario } => {
            let snapshot = sim.run_month_at(month, scenario.as_ref())?;
            send(responses, &Response::MonthComplete { id, snapshot });
        }
        Request::RunSimulation { id, scenario } => {
            run_to_completion(sim, id, scenario.as_ref(), responses, cancel).await?;
        }
        Request::GetState { id } => {
            let ctx = sim.context()?;
            send(
                responses,
                &Response::State {
                    id,
                    is_initialized: true,
                    worker_count: ctx.workers.len(),
                    firm_count: ctx.firms.len(),
                    ai_capability_level: ctx.frontier.level,
                    month: ctx.month,
                },
            );
        }
    }
    Ok(())
}

/// Full run with progress frames, a cooperative yield every
/// `YIELD_INTERVAL` ticks and a cancellation check between ticks
async fn run_to_completion(
    sim: &mut Simulation,
    id: RequestId,
    update: Option<&crate::core::config::ScenarioUpdate>,
    responses: &mpsc::UnboundedSender<String>,
    cancel: &watch::Receiver<bool>,
) -> Result<()> {
    if let Some(update) = update {
        sim.apply_update(update)?;
    }
    sim.context()?;

    let mut ticks = 0u32;
    while !sim.is_complete() {
        let cancelled = *cancel.borrow();
        if cancelled {
            return Err(SimError::Cancelled);
        }

        let snapshot = sim.run_month()?;
        if sim.progress_due(snapshot.month) {
            send(responses, &Response::progress(id, sim.progress()?));
        }

        ticks += 1;
        if ticks % YIELD_INTERVAL == 0 {
            tokio::task::yield_now().await;
        }
    }

    let result = sim.finish()?;
    send(
        responses,
        &Response::SimulationComplete {
            id,
            timeline: result.timeline,
            summary: result.summary,
            policy_support: result.policy_support,
            seed: result.seed,
        },
    );
    Ok(())
}
