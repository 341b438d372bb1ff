use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ArLinkError;

/// Longest channel name the media session accepts, in bytes.
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

// MARK: - SessionConfig

/// Settings for one AR video session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(alias = "channelName")]
    pub channel_name: String,
    /// 0 lets the session collaborator pick a uid.
    #[serde(alias = "localUid")]
    pub local_uid: u64,
    pub video: VideoEncoderConfig,
    #[serde(alias = "defaultToSpeakerphone")]
    pub default_to_speakerphone: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_name: String::new(),
            local_uid: 0,
            video: VideoEncoderConfig::default(),
            default_to_speakerphone: true,
        }
    }
}

impl SessionConfig {
    pub fn for_channel(channel_name: impl Into<String>) -> Self {
        Self { channel_name: channel_name.into(), ..Self::default() }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ArLinkError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ArLinkError::ConfigurationInvalid { reason: e.to_string() })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArLinkError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ArLinkError> {
        if self.channel_name.is_empty() {
            return Err(invalid("channel_name must not be empty"));
        }
        if self.channel_name.len() > MAX_CHANNEL_NAME_LEN {
            return Err(invalid(format!(
                "channel_name is {} bytes, limit is {}",
                self.channel_name.len(),
                MAX_CHANNEL_NAME_LEN
            )));
        }
        self.video.validate()
    }
}

// MARK: - VideoEncoderConfig

/// Outgoing camera stream settings handed to the media session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoEncoderConfig {
    pub width: u32,
    pub height: u32,
    #[serde(alias = "frameRate")]
    pub frame_rate: u32,
    /// `None` means the session's standard bitrate for the resolution.
    #[serde(alias = "bitrateKbps")]
    pub bitrate_kbps: Option<u32>,
    pub orientation: OrientationMode,
}

impl Default for VideoEncoderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            frame_rate: 60,
            bitrate_kbps: None,
            orientation: OrientationMode::Adaptive,
        }
    }
}

impl VideoEncoderConfig {
    fn validate(&self) -> Result<(), ArLinkError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!("video resolution {}×{} is empty", self.width, self.height)));
        }
        if !(1..=60).contains(&self.frame_rate) {
            return Err(invalid(format!("frame_rate {} outside 1..=60", self.frame_rate)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    Adaptive,
    FixedLandscape,
    FixedPortrait,
}

fn invalid(reason: impl Into<String>) -> ArLinkError {
    ArLinkError::ConfigurationInvalid { reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "channelName": "living-room",
            "localUid": 1001,
            "video": {"width": 1280, "height": 720, "frameRate": 30, "bitrateKbps": 1200},
            "defaultToSpeakerphone": false
        }"#;

        let cfg = SessionConfig::from_json_str(json).expect("valid camelCase config");
        assert_eq!(cfg.channel_name, "living-room");
        assert_eq!(cfg.local_uid, 1001);
        assert_eq!(cfg.video.frame_rate, 30);
        assert_eq!(cfg.video.bitrate_kbps, Some(1200));
        assert_eq!(cfg.video.orientation, OrientationMode::Adaptive);
        assert!(!cfg.default_to_speakerphone);
    }

    #[test]
    fn deserializes_snake_case_fields_with_defaults() {
        let json = r#"{"channel_name": "desk"}"#;

        let cfg = SessionConfig::from_json_str(json).expect("valid snake_case config");
        assert_eq!(cfg.local_uid, 0);
        assert_eq!(cfg.video, VideoEncoderConfig::default());
        assert!(cfg.default_to_speakerphone);
    }

    #[test]
    fn rejects_missing_channel() {
        let err = SessionConfig::from_json_str("{}").unwrap_err();
        assert!(matches!(err, ArLinkError::ConfigurationInvalid { .. }));
    }

    #[test]
    fn rejects_overlong_channel_and_bad_frame_rate() {
        let long = SessionConfig::for_channel("x".repeat(MAX_CHANNEL_NAME_LEN + 1));
        assert!(long.validate().is_err());

        let mut fast = SessionConfig::for_channel("ok");
        fast.video.frame_rate = 120;
        assert!(fast.validate().is_err());

        assert!(SessionConfig::for_channel("ok").validate().is_ok());
    }
}
