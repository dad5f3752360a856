use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Form field names of the fixed controls, in dispatch priority order.
pub const TOGGLE_BUTTON: &str = "toggle_button";
pub const VOL_DOWN_BUTTON: &str = "vol_down_button";
pub const VOL_UP_BUTTON: &str = "vol_up_button";

pub const CONTROL_NAMES: [&str; 3] = [TOGGLE_BUTTON, VOL_DOWN_BUTTON, VOL_UP_BUTTON];

/// Suffixes an image input adds to its name when clicked.  Browsers send
/// `name.x`/`name.y`; PHP-era links used `name_x`/`name_y`.
pub const CLICK_SUFFIXES: [&str; 4] = ["_x", "_y", ".x", ".y"];

/// True if `key` is `name` itself or `name` plus a click suffix.
pub fn names_control(key: &str, name: &str) -> bool {
    key == name
        || key
            .strip_prefix(name)
            .is_some_and(|suffix| CLICK_SUFFIXES.contains(&suffix))
}

/// A named internet radio stream, selectable with one button.
///
/// `id` doubles as the form field name and the button label, so it is
/// restricted to characters that are safe in both places.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preset {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("preset id must not be empty")]
    EmptyId,
    #[error("preset id {0:?} may only contain ASCII letters, digits, '_' and '-'")]
    InvalidId(String),
    #[error("preset id {0:?} clashes with a control button")]
    ReservedId(String),
    #[error("preset id {0:?} is defined more than once")]
    DuplicateId(String),
    #[error("preset id {id:?} would be submitted as preset {by:?}")]
    ShadowedId { id: String, by: String },
    #[error("preset {id:?}: url {url:?} must be an http(s) url without whitespace")]
    InvalidUrl { id: String, url: String },
}

impl Preset {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    pub fn validate(&self) -> Result<(), PresetError> {
        if self.id.is_empty() {
            return Err(PresetError::EmptyId);
        }
        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(PresetError::InvalidId(self.id.clone()));
        }
        if CONTROL_NAMES
            .iter()
            .any(|control| names_control(&self.id, control))
        {
            return Err(PresetError::ReservedId(self.id.clone()));
        }
        let has_scheme = self.url.starts_with("http://") || self.url.starts_with("https://");
        let clean = !self
            .url
            .chars()
            .any(|c| c.is_whitespace() || c.is_control());
        if !has_scheme || !clean {
            return Err(PresetError::InvalidUrl {
                id: self.id.clone(),
                url: self.url.clone(),
            });
        }
        Ok(())
    }
}

/// Validate a whole preset list: every entry on its own, plus ids that the
/// dispatcher can tell apart (`jazz` would swallow a `jazz_x` button).
pub fn validate_presets(presets: &[Preset]) -> Result<(), PresetError> {
    for (i, preset) in presets.iter().enumerate() {
        preset.validate()?;
        for earlier in &presets[..i] {
            if earlier.id == preset.id {
                return Err(PresetError::DuplicateId(preset.id.clone()));
            }
            let (long, short) = if earlier.id.len() > preset.id.len() {
                (earlier, preset)
            } else {
                (preset, earlier)
            };
            if names_control(&long.id, &short.id) {
                return Err(PresetError::ShadowedId {
                    id: long.id.clone(),
                    by: short.id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// One control action, derived from a request and thrown away after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    Toggle,
    VolumeDown,
    VolumeUp,
    SelectPreset(Preset),
}

/// Play/pause/stop state as reported by the controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportStatus {
    Playing,
    Paused,
    Stopped,
}

impl TransportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TransportStatus::Playing => "playing",
            TransportStatus::Paused => "paused",
            TransportStatus::Stopped => "stopped",
        }
    }

    /// Map MPD's `state:` value (`play`, `pause`, `stop`).
    pub fn from_mpd_state(state: &str) -> Option<Self> {
        match state {
            "play" => Some(TransportStatus::Playing),
            "pause" => Some(TransportStatus::Paused),
            "stop" => Some(TransportStatus::Stopped),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The three status strings shown on the page, fetched fresh per request.
///
/// Fields are plain text as produced by the controller; escaping is the
/// renderer's job.  `unavailable` is set when at least one query failed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub now_playing: String,
    pub transport: String,
    pub volume: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
}

impl StatusSnapshot {
    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    /// Record a failed query.  The first reason is kept.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        if self.unavailable.is_none() {
            self.unavailable = Some(reason.into());
        }
    }
}
