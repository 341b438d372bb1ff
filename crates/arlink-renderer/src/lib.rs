//! arlink-renderer — render collaborator for placed video slots
//!
//! The registry never draws anything itself. Every change of pairing is
//! reported to a [`RenderSink`] as a fire-and-forget `attach` or `detach`:
//!
//! ```text
//! SlotRegistry ── attach(uid, slot) / detach(uid) ──► RenderSink
//!                                                      ├─ RecordingSink  (tests, replay)
//!                                                      └─ ChannelSink ──► render task
//! ```
//!
//! What a slot shows after `detach` (blank screen, placeholder) is up to the
//! sink.

use arlink_core::{ParticipantId, SlotHandle};
use tokio::sync::mpsc;
use tracing::warn;

// MARK: - RenderSink trait

/// Receives pairing changes from the registry.
///
/// Calls must not block: implementations either finish synchronously or
/// queue the work themselves.
pub trait RenderSink: Send {
    /// Start rendering `participant`'s remote video onto `slot`.
    fn attach(&mut self, participant: ParticipantId, slot: SlotHandle);

    /// Stop rendering `participant`'s remote video.
    fn detach(&mut self, participant: ParticipantId);
}

impl<T: RenderSink + ?Sized> RenderSink for Box<T> {
    fn attach(&mut self, participant: ParticipantId, slot: SlotHandle) {
        (**self).attach(participant, slot)
    }

    fn detach(&mut self, participant: ParticipantId) {
        (**self).detach(participant)
    }
}

// MARK: - RenderCommand

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    Attach { participant: ParticipantId, slot: SlotHandle },
    Detach { participant: ParticipantId },
}

impl std::fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attach { participant, slot } => write!(f, "attach {participant} → {slot}"),
            Self::Detach { participant } => write!(f, "detach {participant}"),
        }
    }
}

// MARK: - RecordingSink

/// Keeps every command in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    commands: Vec<RenderCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drain recorded commands, leaving the sink empty.
    pub fn take(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderSink for RecordingSink {
    fn attach(&mut self, participant: ParticipantId, slot: SlotHandle) {
        self.commands.push(RenderCommand::Attach { participant, slot });
    }

    fn detach(&mut self, participant: ParticipantId) {
        self.commands.push(RenderCommand::Detach { participant });
    }
}

// MARK: - ChannelSink

/// Forwards commands to a render task over an unbounded channel.
///
/// Once the receiving task is gone, commands are dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RenderCommand>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RenderCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, command: RenderCommand) {
        if self.tx.send(command).is_err() {
            warn!("Render task gone, dropping '{}'", command);
        }
    }
}

impl RenderSink for ChannelSink {
    fn attach(&mut self, participant: ParticipantId, slot: SlotHandle) {
        self.forward(RenderCommand::Attach { participant, slot });
    }

    fn detach(&mut self, participant: ParticipantId) {
        self.forward(RenderCommand::Detach { participant });
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.attach(ParticipantId(1), SlotHandle(10));
        sink.detach(ParticipantId(1));

        assert_eq!(
            sink.take(),
            vec![
                RenderCommand::Attach { participant: ParticipantId(1), slot: SlotHandle(10) },
                RenderCommand::Detach { participant: ParticipantId(1) },
            ]
        );
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn boxed_sink_delegates() {
        let mut boxed: Box<RecordingSink> = Box::default();
        boxed.attach(ParticipantId(2), SlotHandle(3));
        assert_eq!(boxed.commands().len(), 1);
    }

    #[tokio::test]
    async fn channel_sink_forwards_to_receiver() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.attach(ParticipantId(5), SlotHandle(1));
        sink.detach(ParticipantId(5));

        assert_eq!(
            rx.recv().await,
            Some(RenderCommand::Attach { participant: ParticipantId(5), slot: SlotHandle(1) })
        );
        assert_eq!(rx.recv().await, Some(RenderCommand::Detach { participant: ParticipantId(5) }));
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.attach(ParticipantId(1), SlotHandle(1));
        sink.detach(ParticipantId(1));
    }
}
