use anyhow::{Context, Result};
use arlink_core::SessionConfig;
use arlink_registry::{pump, spawn_registry, SlotRegistry};
use arlink_renderer::ChannelSink;
use tracing::{info, warn};

use crate::script::{self, ScriptSource};

/// Channel joined when no config file is given.
const DEMO_CHANNEL: &str = "arlink-demo";

/// Runs one scripted AR session end to end.
///
/// # Environment
/// - `ARLINK_CONFIG`: path to a JSON [`SessionConfig`] (default: demo channel)
/// - `ARLINK_SCRIPT`: path to a JSON-lines script of presence and tap steps
///   (default: built-in demo)
///
/// # Flow
/// 1. Load and validate the session config
/// 2. Spawn the render task behind a `ChannelSink`
/// 3. Spawn the registry task
/// 4. Pump script steps → placement → registry
/// 5. Log the final partition, shut down in dependency order
pub async fn run() -> Result<()> {
    let config = load_config()?;
    let video = &config.video;
    info!(
        "Joining channel '{}' as uid {} (speakerphone={})",
        config.channel_name, config.local_uid, config.default_to_speakerphone
    );
    info!(
        "Camera stream: {}×{} @ {}fps bitrate={} orientation={:?}",
        video.width,
        video.height,
        video.frame_rate,
        video.bitrate_kbps.map_or_else(|| "standard".to_string(), |k| format!("{k}kbps")),
        video.orientation
    );

    let steps = load_script()?;
    info!("Script loaded: {} steps", steps.len());

    // ── Render task ───────────────────────────────────────────────────────────
    let (sink, mut render_rx) = ChannelSink::new();
    let render_task = tokio::spawn(async move {
        let mut rendered: u64 = 0;
        while let Some(command) = render_rx.recv().await {
            rendered += 1;
            info!("Render[{}] {}", rendered, command);
        }
        rendered
    });

    // ── Registry task + event pump ────────────────────────────────────────────
    let (handle, registry_task) = spawn_registry(SlotRegistry::new(sink));
    let mut source = ScriptSource::new(steps);
    let stats = pump(&mut source, &handle).await?;
    if stats.rejected > 0 {
        warn!("{} events were rejected, check the event source", stats.rejected);
    }

    let partition = handle.snapshot().await?;
    info!(
        "Session done: applied={} rejected={} placed canvases={}",
        stats.applied,
        stats.rejected,
        source.placement().placed_count()
    );
    info!("Final partition: {}", serde_json::to_string(&partition)?);

    // Dropping the last handle stops the registry; dropping the registry
    // closes the render channel.
    drop(handle);
    let registry = registry_task.await.context("registry task panicked")?;
    registry.verify()?;
    drop(registry);

    let rendered = render_task.await.context("render task panicked")?;
    info!("Render commands issued: {}", rendered);
    Ok(())
}

fn load_config() -> Result<SessionConfig> {
    match std::env::var("ARLINK_CONFIG") {
        Ok(path) => SessionConfig::load(&path).with_context(|| format!("loading config {path}")),
        Err(_) => {
            let cfg = SessionConfig::for_channel(DEMO_CHANNEL);
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

fn load_script() -> Result<Vec<script::ScriptStep>> {
    match std::env::var("ARLINK_SCRIPT") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading script {path}"))?;
            Ok(script::parse(&text)?)
        }
        Err(_) => {
            info!("ARLINK_SCRIPT not set, running built-in demo");
            Ok(script::parse(script::DEMO)?)
        }
    }
}
