//! Timed driver: one task owns the state and serializes ticks and commands.

use crate::commands::{self, Command, CommandError};
use crate::tick::tick;
use sim_core::{Catalogs, GameState, SimConfig, SimRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const REQUEST_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler task has stopped")]
    Closed,
    #[error("scheduler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

enum Request {
    Apply {
        command: Command,
        reply: oneshot::Sender<Result<(), CommandError>>,
    },
    Shutdown,
}

/// Handle to a running scheduler task.
pub struct Scheduler {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<Arc<GameState>>,
    task: JoinHandle<GameState>,
}

impl Scheduler {
    /// Spawn the owning task on the current tokio runtime. The state keeps
    /// its paused flag; call [`Scheduler::resume`] to start the clock.
    pub fn spawn(state: GameState, catalogs: Arc<Catalogs>, config: &SimConfig) -> Self {
        let (requests, rx) = mpsc::channel(REQUEST_QUEUE);
        let (publish, snapshots) = watch::channel(Arc::new(state.clone()));
        let rng = SimRng::seed_from_u64(config.rng_seed);
        let period = config.tick_interval();
        info!(period_ms = period.as_millis() as u64, seed = config.rng_seed, "scheduler started");
        let task = tokio::spawn(run(state, catalogs, rng, period, rx, publish));
        Self {
            requests,
            snapshots,
            task,
        }
    }

    /// Queue a command and wait for its verdict.
    pub async fn apply(&self, command: Command) -> Result<Result<(), CommandError>, SchedulerError> {
        let (reply, verdict) = oneshot::channel();
        self.requests
            .send(Request::Apply { command, reply })
            .await
            .map_err(|_| SchedulerError::Closed)?;
        verdict.await.map_err(|_| SchedulerError::Closed)
    }

    pub async fn pause(&self) -> Result<(), SchedulerError> {
        self.set_paused(true).await
    }

    pub async fn resume(&self) -> Result<(), SchedulerError> {
        self.set_paused(false).await
    }

    async fn set_paused(&self, paused: bool) -> Result<(), SchedulerError> {
        // SetPaused cannot be rejected.
        let _ = self.apply(Command::SetPaused { paused }).await?;
        Ok(())
    }

    /// Latest published state.
    pub fn snapshot(&self) -> Arc<GameState> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot it has time for.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GameState>> {
        self.snapshots.clone()
    }

    /// Stop the task and hand back the final state.
    pub async fn shutdown(self) -> Result<GameState, SchedulerError> {
        // The task may already be gone; the join below reports that.
        let _ = self.requests.send(Request::Shutdown).await;
        let state = self.task.await?;
        info!(day = state.day, "scheduler stopped");
        Ok(state)
    }
}

async fn run(
    mut state: GameState,
    catalogs: Arc<Catalogs>,
    mut rng: SimRng,
    period: Duration,
    mut requests: mpsc::Receiver<Request>,
    publish: watch::Sender<Arc<GameState>>,
) -> GameState {
    let mut clock = tokio::time::interval(period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Apply { command, reply }) => {
                    let was_paused = state.paused;
                    let verdict = match commands::apply(&state, &catalogs, &command, &mut rng) {
                        Ok(next) => {
                            state = next;
                            publish.send_replace(Arc::new(state.clone()));
                            Ok(())
                        }
                        Err(e) => Err(e),
                    };
                    if was_paused && !state.paused {
                        clock.reset();
                    }
                    let _ = reply.send(verdict);
                }
                Some(Request::Shutdown) | None => break,
            },
            _ = clock.tick(), if !state.paused => {
                state = tick(&state, &catalogs, &mut rng);
                debug!(day = state.day, "published snapshot");
                publish.send_replace(Arc::new(state.clone()));
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::HardwareId;
    use tokio::time::{sleep, timeout};

    fn fast_config() -> SimConfig {
        SimConfig {
            tick_interval_ms: 2,
            rng_seed: 7,
        }
    }

    fn start() -> Scheduler {
        let catalogs = Arc::new(Catalogs::standard());
        let state = GameState::new_game(&catalogs);
        Scheduler::spawn(state, catalogs, &fast_config())
    }

    #[tokio::test]
    async fn paused_scheduler_does_not_tick() {
        let s = start();
        sleep(Duration::from_millis(30)).await;
        assert_eq!(s.snapshot().day, 1);
        let state = s.shutdown().await.unwrap();
        assert_eq!(state.day, 1);
    }

    #[tokio::test]
    async fn commands_are_serialized_with_ticks() {
        let s = start();
        let verdict = s
            .apply(Command::PurchaseServer {
                model: HardwareId::from("us-scrap"),
            })
            .await
            .unwrap();
        assert_eq!(verdict, Ok(()));
        assert_eq!(s.snapshot().servers.len(), 2);

        let rejected = s
            .apply(Command::PurchaseServer {
                model: HardwareId::from("starter-kvm"),
            })
            .await
            .unwrap();
        assert!(rejected.is_err());
        assert_eq!(s.snapshot().servers.len(), 2);
        s.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn resume_ticks_and_pause_stops() {
        let s = start();
        let mut rx = s.subscribe();
        s.resume().await.unwrap();
        timeout(Duration::from_secs(5), async {
            while rx.borrow_and_update().day < 4 {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        s.pause().await.unwrap();
        let frozen = s.snapshot().day;
        sleep(Duration::from_millis(30)).await;
        assert_eq!(s.snapshot().day, frozen);

        let state = s.shutdown().await.unwrap();
        assert_eq!(state.day, frozen);
        assert!(state.paused);
    }
}
