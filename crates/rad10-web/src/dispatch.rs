//! Query parameters → at most one player action.

use rad10_proto::protocol::{
    names_control, PlaybackCommand, Preset, TOGGLE_BUTTON, VOL_DOWN_BUTTON, VOL_UP_BUTTON,
};
use tracing::{info, warn};

use crate::controller::{Controller, ControllerError};

/// True if `name` or one of its click-coordinate variants is a query key.
/// Values are never looked at.
pub fn is_present(params: &[(String, String)], name: &str) -> bool {
    params.iter().any(|(key, _)| names_control(key, name))
}

/// Pick the highest-priority command present: toggle, volume down,
/// volume up, then presets in declaration order.
pub fn resolve(params: &[(String, String)], presets: &[Preset]) -> Option<PlaybackCommand> {
    let controls = [
        (TOGGLE_BUTTON, PlaybackCommand::Toggle),
        (VOL_DOWN_BUTTON, PlaybackCommand::VolumeDown),
        (VOL_UP_BUTTON, PlaybackCommand::VolumeUp),
    ];
    if let Some((_, command)) = controls
        .into_iter()
        .find(|(name, _)| is_present(params, name))
    {
        return Some(command);
    }

    presets
        .iter()
        .find(|preset| is_present(params, &preset.id))
        .cloned()
        .map(PlaybackCommand::SelectPreset)
}

/// Execute one command.  Failures are logged and the first one is returned,
/// but a preset's clear/add/play sequence always runs to the end.
pub async fn dispatch(
    controller: &dyn Controller,
    command: &PlaybackCommand,
    volume_step: u8,
) -> Result<(), ControllerError> {
    let step = i32::from(volume_step);
    match command {
        PlaybackCommand::Toggle => logged("toggle", controller.toggle().await),
        PlaybackCommand::VolumeDown => {
            logged("volume down", controller.adjust_volume(-step).await)
        }
        PlaybackCommand::VolumeUp => logged("volume up", controller.adjust_volume(step).await),
        PlaybackCommand::SelectPreset(preset) => {
            info!("Switching to preset {} ({})", preset.id, preset.url);
            let cleared = logged("clear", controller.clear().await);
            let added = logged("add", controller.enqueue(&preset.url).await);
            let played = logged("play", controller.play().await);
            cleared.and(added).and(played)
        }
    }
}

fn logged(step: &str, result: Result<(), ControllerError>) -> Result<(), ControllerError> {
    if let Err(ref e) = result {
        warn!("{} failed: {}", step, e);
    }
    result
}
