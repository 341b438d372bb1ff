//! Single-owner dispatcher for a [`SlotRegistry`].
//!
//! Presence callbacks and scene callbacks may come from different tasks, but
//! the registry's invariants span all of its collections. One tokio task owns
//! the registry and applies requests strictly in the order they arrive.
//!
//! ```text
//! session events ──┐
//!                  ├──► RegistryHandle ── mpsc ──► registry task ──► RenderSink
//! scene events  ───┘          ▲                        │
//!                             └──────── oneshot ───────┘
//! ```

use arlink_core::{ArLinkError, RegistryError, RegistryEvent};
use arlink_renderer::RenderSink;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::registry::{Partition, SlotRegistry};

/// Requests buffered before senders wait.
pub const REQUEST_QUEUE_DEPTH: usize = 64;

// MARK: - Request

enum Request {
    Apply {
        event: RegistryEvent,
        reply: oneshot::Sender<Result<(), RegistryError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Partition>,
    },
}

// MARK: - RegistryHandle

/// Cloneable entry point to a registry owned by its own task.
///
/// The task stops once every handle is dropped and returns the registry.
#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<Request>,
}

impl RegistryHandle {
    /// Apply one event and wait for the registry's verdict.
    pub async fn apply(&self, event: RegistryEvent) -> Result<(), ArLinkError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Apply { event, reply })
            .await
            .map_err(|_| ArLinkError::DispatcherClosed)?;
        rx.await.map_err(|_| ArLinkError::DispatcherClosed)??;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<Partition, ArLinkError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Snapshot { reply })
            .await
            .map_err(|_| ArLinkError::DispatcherClosed)?;
        rx.await.map_err(|_| ArLinkError::DispatcherClosed)
    }
}

/// Move `registry` into a dedicated task and return a handle to it.
pub fn spawn_registry<R>(registry: SlotRegistry<R>) -> (RegistryHandle, JoinHandle<SlotRegistry<R>>)
where
    R: RenderSink + 'static,
{
    let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
    let task = tokio::spawn(run_registry(registry, rx));
    (RegistryHandle { tx }, task)
}

async fn run_registry<R: RenderSink>(
    mut registry: SlotRegistry<R>,
    mut rx: mpsc::Receiver<Request>,
) -> SlotRegistry<R> {
    let mut handled: u64 = 0;
    while let Some(request) = rx.recv().await {
        match request {
            Request::Apply { event, reply } => {
                handled += 1;
                debug!("Registry event #{}: {}", handled, event);
                let result = registry.apply(&event);
                // Caller may have given up waiting; the event still counts.
                let _ = reply.send(result);
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(registry.partition());
            }
        }
    }
    info!(
        "Registry task exiting after {} events ({} participants, {} slots tracked)",
        handled,
        registry.participant_count(),
        registry.slot_count()
    );
    registry
}

// MARK: - EventSource

/// Producer of presence and scene events, already in dispatch order.
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the source is exhausted.
    async fn next_event(&mut self) -> Option<RegistryEvent>;
}

/// Replays a fixed list of events.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    events: std::collections::VecDeque<RegistryEvent>,
}

impl VecSource {
    pub fn new(events: impl IntoIterator<Item = RegistryEvent>) -> Self {
        Self { events: events.into_iter().collect() }
    }
}

#[async_trait]
impl EventSource for VecSource {
    async fn next_event(&mut self) -> Option<RegistryEvent> {
        self.events.pop_front()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub applied: u64,
    pub rejected: u64,
}

/// Feed every event of `source` to the registry behind `handle`.
///
/// Rejected events point at a bug upstream; they are logged and skipped.
/// Only a stopped dispatcher ends the pump early.
pub async fn pump<S>(source: &mut S, handle: &RegistryHandle) -> Result<PumpStats, ArLinkError>
where
    S: EventSource + ?Sized,
{
    let mut stats = PumpStats::default();
    while let Some(event) = source.next_event().await {
        match handle.apply(event).await {
            Ok(()) => stats.applied += 1,
            Err(ArLinkError::Registry(e)) => {
                stats.rejected += 1;
                error!("Rejected event '{}': {}", event, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
