//! arlink-registry — pairs remote participants with placed video slots
//!
//! - [`registry`]: the [`SlotRegistry`] state machine and its reinsertion
//!   policies.
//! - [`dispatch`]: one task per registry, fed by presence and scene sources.
//! - [`placement`]: turns scene taps into slot events.
//!
//! # Example
//! ```rust
//! use arlink_core::{ParticipantId, SlotHandle};
//! use arlink_registry::SlotRegistry;
//! use arlink_renderer::RecordingSink;
//!
//! let mut registry = SlotRegistry::new(RecordingSink::new());
//! registry.on_participant_joined(ParticipantId(1)).unwrap();
//! registry.on_slot_created(SlotHandle(1)).unwrap();
//! assert_eq!(registry.assignment_of(ParticipantId(1)), Some(SlotHandle(1)));
//! ```

pub mod dispatch;
pub mod placement;
pub mod registry;

pub use dispatch::{pump, spawn_registry, EventSource, PumpStats, RegistryHandle, VecSource};
pub use placement::{NodePart, NodeRef, Placement, Pose, TapTarget};
pub use registry::{Assignment, Partition, SlotRegistry};
