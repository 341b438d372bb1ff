//! Scripted session input: presence callbacks and user taps, one JSON object
//! per line. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"step":"remote_joined","uid":1001}
//! {"step":"plane_detected"}
//! {"step":"tap_plane","pose":{"x":0.0,"y":-0.4,"z":-1.2}}
//! {"step":"tap_node","slot":1,"part":"screen"}
//! {"step":"remote_left","uid":1001,"reason":"dropped"}
//! ```

use std::collections::VecDeque;

use arlink_core::{ArLinkError, LeaveReason, ParticipantId, RegistryEvent, SlotHandle};
use arlink_registry::{EventSource, NodePart, NodeRef, Placement, Pose, TapTarget};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEMO: &str = r#"
# Three remote users arrive before anything is placed.
{"step":"remote_joined","uid":1001}
{"step":"remote_joined","uid":1002}
{"step":"tap_plane","pose":{"x":0.0,"y":-0.5,"z":-1.0}}
{"step":"remote_joined","uid":1003}
{"step":"plane_detected"}
{"step":"tap_plane","pose":{"x":-0.4,"y":-0.5,"z":-1.0,"yaw":0.1}}
{"step":"tap_plane","pose":{"x":0.4,"y":-0.5,"z":-1.0,"yaw":-0.1}}
# 1001 leaves: its canvas goes to 1003 straight away.
{"step":"remote_left","uid":1001,"reason":"quit"}
# Removing 1002's canvas puts it first in line for the next one.
{"step":"tap_node","slot":2,"part":"displayer"}
{"step":"remote_joined","uid":1004}
{"step":"tap_plane","pose":{"x":0.0,"y":-0.5,"z":-1.5}}
{"step":"tap_empty"}
{"step":"remote_left","uid":1004,"reason":"dropped"}
"#;

// MARK: - ScriptStep

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    RemoteJoined {
        uid: u64,
    },
    RemoteLeft {
        uid: u64,
        #[serde(default)]
        reason: LeaveReason,
    },
    PlaneDetected,
    TapPlane {
        pose: Pose,
    },
    TapNode {
        slot: u64,
        #[serde(default = "default_part")]
        part: NodePart,
    },
    TapEmpty,
}

fn default_part() -> NodePart {
    NodePart::Screen
}

pub fn parse(text: &str) -> Result<Vec<ScriptStep>, ArLinkError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line.trim())
                .map_err(|e| ArLinkError::Script { line: index + 1, reason: e.to_string() })
        })
        .collect()
}

// MARK: - ScriptSource

/// Plays script steps through a [`Placement`] and yields registry events.
pub struct ScriptSource {
    steps: VecDeque<ScriptStep>,
    placement: Placement,
}

impl ScriptSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self { steps: steps.into_iter().collect(), placement: Placement::new() }
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    fn translate(&mut self, step: ScriptStep) -> Option<RegistryEvent> {
        match step {
            ScriptStep::RemoteJoined { uid } => {
                Some(RegistryEvent::ParticipantJoined { participant: ParticipantId(uid) })
            }
            ScriptStep::RemoteLeft { uid, reason } => {
                Some(RegistryEvent::ParticipantLeft { participant: ParticipantId(uid), reason })
            }
            ScriptStep::PlaneDetected => {
                self.placement.on_plane_detected();
                None
            }
            ScriptStep::TapPlane { pose } => self.placement.on_tap(TapTarget::Plane(pose)),
            ScriptStep::TapNode { slot, part } => {
                self.placement.on_tap(TapTarget::Node(NodeRef { slot: SlotHandle(slot), part }))
            }
            ScriptStep::TapEmpty => self.placement.on_tap(TapTarget::Empty),
        }
    }
}

#[async_trait]
impl EventSource for ScriptSource {
    async fn next_event(&mut self) -> Option<RegistryEvent> {
        while let Some(step) = self.steps.pop_front() {
            if let Some(event) = self.translate(step) {
                return Some(event);
            }
            debug!("Step {:?} produced no event", step);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arlink_registry::{pump, spawn_registry, SlotRegistry};
    use arlink_renderer::RecordingSink;

    #[test]
    fn parses_demo_script() {
        let steps = parse(DEMO).unwrap();
        assert_eq!(steps.len(), 13);
        assert_eq!(steps[0], ScriptStep::RemoteJoined { uid: 1001 });
        assert_eq!(steps[4], ScriptStep::PlaneDetected);
        assert_eq!(
            steps[8],
            ScriptStep::TapNode { slot: 2, part: NodePart::Displayer }
        );
    }

    #[test]
    fn reports_line_of_bad_step() {
        let err = parse("{\"step\":\"plane_detected\"}\n\n{\"step\":\"teleport\"}").unwrap_err();
        assert!(matches!(err, ArLinkError::Script { line: 3, .. }));
    }

    #[test]
    fn tap_node_part_defaults_to_screen() {
        let steps = parse(r#"{"step":"tap_node","slot":4}"#).unwrap();
        assert_eq!(steps, vec![ScriptStep::TapNode { slot: 4, part: NodePart::Screen }]);
    }

    #[tokio::test]
    async fn demo_script_ends_in_expected_partition() {
        let (handle, task) = spawn_registry(SlotRegistry::new(RecordingSink::new()));
        let mut source = ScriptSource::new(parse(DEMO).unwrap());

        let stats = pump(&mut source, &handle).await.unwrap();
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.applied, 10);

        let partition = handle.snapshot().await.unwrap();
        let assigned: Vec<(u64, u64)> =
            partition.assigned.iter().map(|a| (a.participant.0, a.slot.0)).collect();
        // 1003 inherited slot 1; 1002 was reseated on slot 3; 1004 left while pending.
        assert_eq!(assigned, vec![(1002, 3), (1003, 1)]);
        assert!(partition.pending.is_empty());
        assert!(partition.free.is_empty());
        assert_eq!(source.placement().placed_count(), 2);

        drop(handle);
        task.await.unwrap().verify().unwrap();
    }
}
