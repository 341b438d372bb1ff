//! Scene side of the session: turns user taps into slot events.
//!
//! Nothing can be placed until the world tracker reports a horizontal plane.
//! After that, a tap on empty plane surface places a new video canvas and a
//! tap on an existing canvas removes it. A canvas is a small node tree
//! (root → displayer → screen); a hit on any part of it means the whole
//! canvas.

use std::collections::BTreeMap;

use arlink_core::{RegistryEvent, SlotHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const HINT_FIND_PLANE: &str = "Move camera to find a plane";
pub const HINT_TAP_TO_PLACE: &str = "Tap to place remote video canvas";

// MARK: - Pose

/// World position of a placed canvas and its rotation about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Radians; canvases face the camera heading at placement time.
    #[serde(default)]
    pub yaw: f32,
}

// MARK: - TapTarget

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePart {
    Root,
    Displayer,
    Screen,
}

/// A hit on some node of a placed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub slot: SlotHandle,
    pub part: NodePart,
}

/// What a tap hit, as reported by the scene's hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapTarget {
    Node(NodeRef),
    Plane(Pose),
    Empty,
}

// MARK: - Placement

#[derive(Debug)]
pub struct Placement {
    plane_detected: bool,
    next_handle: u64,
    placed: BTreeMap<SlotHandle, Pose>,
}

impl Default for Placement {
    fn default() -> Self {
        Self { plane_detected: false, next_handle: 1, placed: BTreeMap::new() }
    }
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a plane was found. Returns `true` the first time only.
    pub fn on_plane_detected(&mut self) -> bool {
        if self.plane_detected {
            return false;
        }
        self.plane_detected = true;
        info!("Plane detected: {}", HINT_TAP_TO_PLACE);
        true
    }

    pub fn plane_detected(&self) -> bool {
        self.plane_detected
    }

    /// Instruction to show the user.
    pub fn hint(&self) -> &'static str {
        if self.plane_detected {
            HINT_TAP_TO_PLACE
        } else {
            HINT_FIND_PLANE
        }
    }

    /// Resolve a tap into at most one slot event.
    pub fn on_tap(&mut self, target: TapTarget) -> Option<RegistryEvent> {
        if !self.plane_detected {
            warn!("Tap ignored: plane not yet found");
            return None;
        }

        match target {
            TapTarget::Node(node) => {
                if self.placed.remove(&node.slot).is_none() {
                    debug!("Tap on {:?} of unplaced {} ignored", node.part, node.slot);
                    return None;
                }
                info!("Removing canvas {} (hit {:?})", node.slot, node.part);
                Some(RegistryEvent::SlotDestroyed { slot: node.slot })
            }
            TapTarget::Plane(pose) => {
                let slot = SlotHandle(self.next_handle);
                self.next_handle += 1;
                self.placed.insert(slot, pose);
                info!("Placed canvas {} at ({:.2}, {:.2}, {:.2})", slot, pose.x, pose.y, pose.z);
                Some(RegistryEvent::SlotCreated { slot })
            }
            TapTarget::Empty => None,
        }
    }

    pub fn pose_of(&self, slot: SlotHandle) -> Option<Pose> {
        self.placed.get(&slot).copied()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }
}
