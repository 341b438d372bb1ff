pub mod config;
pub mod errors;
pub mod types;

pub use config::{SessionConfig, VideoEncoderConfig};
pub use errors::{ArLinkError, RegistryError};
pub use types::*;
