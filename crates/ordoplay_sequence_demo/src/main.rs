// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` sequence demo - headless host for the sequence runtime
//!
//! Builds a small cutscene template and plays it on two players:
//! - one with the authored values
//! - one with per-player overrides and a skipped intro
//!
//! Usage: `ordoplay_sequence_demo [settings.ron]`

use ordoplay_sequence::nodes::{
    LogLevel, LogMessage, LoopCount, NestedSequence, ParallelNext, SetParameter, SkipIfParameter,
    Wait, WaitUntilParameter,
};
use ordoplay_sequence::{
    BindingError, NestedId, PlayerSettings, Sequence, SequencePlayer, SettingsError, Value,
};
use std::path::Path;
use std::sync::Arc;

/// Host frame time
const FRAME_TIME: f64 = 1.0 / 60.0;

/// Frames after which the demo gives up on a player
const MAX_FRAMES: u32 = 60 * 30;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("ordoplay_sequence=debug".parse().unwrap())
        .add_directive("ordoplay_sequence_demo=info".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting OrdoPlay sequence demo v{}", env!("CARGO_PKG_VERSION"));

    let settings = match load_settings(std::env::args().nth(1)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    let (cutscene, sparkle) = build_cutscene();
    tracing::info!(
        "Cutscene '{}' has {} nodes and {} overridable fields",
        cutscene.name,
        cutscene.len(),
        cutscene.overrides().len()
    );

    // Authored values
    let mut authored = SequencePlayer::new(Arc::clone(&cutscene)).with_settings(settings.clone());
    run(&mut authored, "authored");

    // Overridden values, intro skipped
    let mut custom = SequencePlayer::new(Arc::clone(&cutscene)).with_settings(settings);
    custom.set_parameter("skip_intro", true);
    if let Err(e) = apply_overrides(&mut custom, &cutscene, sparkle) {
        tracing::error!("Failed to bind overrides: {e}");
        std::process::exit(1);
    }
    run(&mut custom, "custom");

    match custom.bindings().to_ron() {
        Ok(ron) => tracing::debug!("Custom bindings:\n{ron}"),
        Err(e) => tracing::warn!("Could not export bindings: {e}"),
    }
}

fn load_settings(path: Option<String>) -> Result<PlayerSettings, SettingsError> {
    match path {
        Some(path) => PlayerSettings::load(Path::new(&path)),
        None => Ok(PlayerSettings::fixed(FRAME_TIME)),
    }
}

/// Build the cutscene template; also returns the identity of the nested
/// sparkle occurrence
fn build_cutscene() -> (Arc<Sequence>, NestedId) {
    let sparkle = Sequence::new("Sparkle")
        .with_node(LogMessage::new("*sparkle*").with_level(LogLevel::Debug))
        .with_node(Wait::new(0.1))
        .into_shared();
    let sparkle_node = NestedSequence::new(sparkle, LoopCount::times(5).unwrap_or_default());
    let sparkle_id = sparkle_node.identity();

    let finale = Sequence::new("Finale")
        .with_parallel(true)
        .with_node(LogMessage::new("Curtain falls"))
        .with_node(Wait::new(0.5))
        .into_shared();

    let cutscene = Sequence::new("Cutscene")
        .with_node(SkipIfParameter::new("skip_intro", true, 2))
        .with_node(LogMessage::new("Once upon a time..."))
        .with_node(Wait::new(1.0))
        .with_node(ParallelNext::new(3))
        .with_node(LogMessage::new("The hero arrives"))
        .with_node(Wait::new(0.75))
        .with_node(NestedSequence::new(
            Sequence::new("Door")
                .with_node(Wait::new(0.25))
                .with_node(SetParameter::new("door_open", true))
                .into_shared(),
            LoopCount::ONCE,
        ))
        .with_node(WaitUntilParameter::new("door_open", true))
        .with_node(ParallelNext::new(2))
        .with_node(sparkle_node)
        .with_node(NestedSequence::new(finale, LoopCount::times(2).unwrap_or_default()))
        .with_node(LogMessage::new("The end"))
        .into_shared();

    (cutscene, sparkle_id)
}

/// Bind per-player values: slower hero entrance and a custom sparkle text
fn apply_overrides(
    player: &mut SequencePlayer,
    cutscene: &Sequence,
    sparkle: NestedId,
) -> Result<(), BindingError> {
    for descriptor in cutscene.overrides() {
        if descriptor.label == "Seconds" && descriptor.default_value == Value::Float(0.75) {
            player.set_override(cutscene.id, NestedId::ROOT, descriptor.index, 1.5f32)?;
        }
        if descriptor.label == "Message" && descriptor.default_value == Value::from("The hero arrives") {
            player.set_override(cutscene.id, NestedId::ROOT, descriptor.index, "A stranger arrives")?;
        }
    }

    let group = player
        .bindings()
        .groups()
        .iter()
        .find(|g| g.nested == sparkle)
        .map(|g| (g.sequence, g.slots().first().map(|s| s.index)));
    if let Some((sequence, Some(index))) = group {
        player.set_override(sequence, sparkle, index, "*twinkle*")?;
    }
    Ok(())
}

/// Play until finished, or stop after `MAX_FRAMES`
fn run(player: &mut SequencePlayer, label: &str) {
    tracing::info!("--- {label} ---");
    player.on_finish(|| tracing::info!("Finished"));
    player.on_stop(|player| {
        tracing::info!("Stopped at {:.2}s", player.clock().elapsed);
    });

    player.play();
    let mut frames = 0;
    while player.is_playing() {
        player.update(FRAME_TIME);
        frames += 1;
        if frames >= MAX_FRAMES {
            player.stop();
        }
    }
}
