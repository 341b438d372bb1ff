use serde::{Deserialize, Serialize};

// MARK: - ParticipantId

/// Remote session member, as reported by the media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

// MARK: - SlotHandle

/// A placed on-screen location able to show one participant's video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotHandle(pub u64);

impl std::fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

// MARK: - TrackedId

/// Subject of a registry error: either kind of identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedId {
    Participant(ParticipantId),
    Slot(SlotHandle),
}

impl std::fmt::Display for TrackedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Participant(id) => write!(f, "participant {id}"),
            Self::Slot(handle) => write!(f, "{handle}"),
        }
    }
}

// MARK: - LeaveReason

/// Why a remote participant went offline. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveReason {
    #[default]
    Quit,
    Dropped,
    /// Switched to audience role in a live broadcast.
    BecameAudience,
}

impl std::fmt::Display for LeaveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quit => write!(f, "quit"),
            Self::Dropped => write!(f, "dropped"),
            Self::BecameAudience => write!(f, "became audience"),
        }
    }
}

// MARK: - RegistryEvent

/// One entry of the serialized presence/scene event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryEvent {
    ParticipantJoined {
        participant: ParticipantId,
    },
    ParticipantLeft {
        participant: ParticipantId,
        #[serde(default)]
        reason: LeaveReason,
    },
    SlotCreated {
        slot: SlotHandle,
    },
    SlotDestroyed {
        slot: SlotHandle,
    },
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParticipantJoined { participant } => write!(f, "{participant} joined"),
            Self::ParticipantLeft { participant, reason } => {
                write!(f, "{participant} left ({reason})")
            }
            Self::SlotCreated { slot } => write!(f, "{slot} created"),
            Self::SlotDestroyed { slot } => write!(f, "{slot} destroyed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_wire_format() {
        let ev = RegistryEvent::ParticipantLeft {
            participant: ParticipantId(42),
            reason: LeaveReason::BecameAudience,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"participant_left","participant":42,"reason":"became_audience"}"#
        );
    }

    #[test]
    fn leave_reason_defaults_to_quit() {
        let ev: RegistryEvent =
            serde_json::from_str(r#"{"kind":"participant_left","participant":7}"#).unwrap();
        assert_eq!(
            ev,
            RegistryEvent::ParticipantLeft { participant: ParticipantId(7), reason: LeaveReason::Quit }
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(ParticipantId(3).to_string(), "uid:3");
        assert_eq!(SlotHandle(9).to_string(), "slot#9");
        assert_eq!(TrackedId::Slot(SlotHandle(1)).to_string(), "slot#1");
        assert_eq!(
            RegistryEvent::SlotCreated { slot: SlotHandle(2) }.to_string(),
            "slot#2 created"
        );
    }
}
