// Preferences Model
// The recorder's durable preference record and its key-value layout

use serde::{Deserialize, Serialize};

/// Keys in the flat preference namespace
pub const PREF_IS_CURRENTLY_RECORDING: &str = "is_currently_recording";
pub const PREF_TAG_WITH_LOCATION: &str = "tag_with_location";
pub const PREF_RECORDING_QUALITY: &str = "recording_quality";
pub const PREF_CIRCULAR_RECORDING: &str = "circular_recording";
pub const PREF_CIRCULAR_RECORDING_PERIOD: &str = "circular_recording_period";
pub const PREF_CIRCULAR_RECORDING_NUMBER: &str = "circular_recording_number";
pub const PREF_ONBOARD_SETTINGS_COUNTER: &str = "onboard_settings";
pub const PREF_ONBOARD_SOUND_LIST_COUNTER: &str = "onboard_list";
pub const PREF_LAST_SOUND: &str = "sound_last_path";

pub const DEFAULT_CIRCULAR_PERIOD_SECS: i64 = 3600;
pub const DEFAULT_CIRCULAR_CLIP_COUNT: i64 = 3;

fn default_circular_recording() -> bool {
    true
}

fn default_circular_period_secs() -> i64 {
    DEFAULT_CIRCULAR_PERIOD_SECS
}

fn default_circular_clip_count() -> i64 {
    DEFAULT_CIRCULAR_CLIP_COUNT
}

/// Snapshot of every recorder preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderPreferences {
    #[serde(default)]
    pub tag_with_location: bool,
    #[serde(default)]
    pub high_quality: bool,
    #[serde(default = "default_circular_recording")]
    pub circular_recording: bool,
    #[serde(default = "default_circular_period_secs")]
    pub circular_period_secs: i64,
    #[serde(default = "default_circular_clip_count")]
    pub circular_clip_count: i64,
    #[serde(default)]
    pub last_item_uri: Option<String>,

    // Recording service bookkeeping
    #[serde(default)]
    pub is_currently_recording: bool,
    #[serde(default)]
    pub onboard_settings_counter: i64,
    #[serde(default)]
    pub onboard_list_counter: i64,
}

impl Default for RecorderPreferences {
    fn default() -> Self {
        Self {
            tag_with_location: false,
            high_quality: false,
            circular_recording: default_circular_recording(),
            circular_period_secs: default_circular_period_secs(),
            circular_clip_count: default_circular_clip_count(),
            last_item_uri: None,
            is_currently_recording: false,
            onboard_settings_counter: 0,
            onboard_list_counter: 0,
        }
    }
}

/// How a boolean preference is written to the key-value store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagEncoding {
    /// Stored as a JSON boolean
    Bool,
    /// Stored as an integer, 1 for on and 0 for off
    Int,
}

/// The boolean preferences the settings dialog exposes as switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoolPreference {
    TagWithLocation,
    HighQuality,
    CircularRecording,
}

impl BoolPreference {
    pub fn key(&self) -> &'static str {
        match self {
            BoolPreference::TagWithLocation => PREF_TAG_WITH_LOCATION,
            BoolPreference::HighQuality => PREF_RECORDING_QUALITY,
            BoolPreference::CircularRecording => PREF_CIRCULAR_RECORDING,
        }
    }

    pub fn default_value(&self) -> bool {
        match self {
            BoolPreference::TagWithLocation => false,
            BoolPreference::HighQuality => false,
            BoolPreference::CircularRecording => default_circular_recording(),
        }
    }

    pub fn encoding(&self) -> FlagEncoding {
        match self {
            BoolPreference::HighQuality => FlagEncoding::Int,
            _ => FlagEncoding::Bool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = RecorderPreferences::default();
        assert!(!prefs.tag_with_location);
        assert!(!prefs.high_quality);
        assert!(prefs.circular_recording);
        assert_eq!(prefs.circular_period_secs, 3600);
        assert_eq!(prefs.circular_clip_count, 3);
        assert!(prefs.last_item_uri.is_none());
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let prefs: RecorderPreferences =
            serde_json::from_str(r#"{"tagWithLocation": true}"#).unwrap();
        assert!(prefs.tag_with_location);
        assert!(prefs.circular_recording);
        assert_eq!(prefs.circular_clip_count, 3);
    }

    #[test]
    fn test_bool_preference_layout() {
        assert_eq!(BoolPreference::HighQuality.key(), "recording_quality");
        assert_eq!(BoolPreference::HighQuality.encoding(), FlagEncoding::Int);
        assert_eq!(BoolPreference::TagWithLocation.encoding(), FlagEncoding::Bool);
        assert!(BoolPreference::CircularRecording.default_value());
    }
}
