// PreferencesStore Service
// Handles durable key-value persistence of recorder preferences

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use serde_json::{Map, Value};

use crate::error::{SettingsError, SettingsResult};
use crate::models::*;
use crate::services::events::{emit_event, EventSink, NoopEventSink, PreferenceChanged, EVENT_PREFERENCE_CHANGED};

/// Durable medium behind a `PreferencesStore`
pub trait KeyValueBackend: Send + Sync {
    /// Read the whole namespace. A medium that was never written yields an empty map.
    fn load(&self) -> SettingsResult<Map<String, Value>>;

    /// Replace the whole namespace
    fn save(&self, values: &Map<String, Value>) -> SettingsResult<()>;
}

/// Flat JSON object on disk
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueBackend for JsonFileBackend {
    fn load(&self) -> SettingsResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::InvalidConfig(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn save(&self, values: &Map<String, Value>) -> SettingsResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write a sibling file and swap it in so a torn write never replaces good data
        let tmp = self.tmp_path();
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local backend, used when nothing has to survive a restart
#[derive(Default)]
pub struct MemoryBackend {
    values: RwLock<Map<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn load(&self) -> SettingsResult<Map<String, Value>> {
        Ok(self.values.read().map(|v| v.clone()).unwrap_or_default())
    }

    fn save(&self, values: &Map<String, Value>) -> SettingsResult<()> {
        if let Ok(mut guard) = self.values.write() {
            *guard = values.clone();
        }
        Ok(())
    }
}

/// Typed get/set facade over the preference namespace.
///
/// Values are loaded lazily on first access and cached. Writes go to the
/// cache first and are then persisted; a failed persist is logged and not
/// reported to the caller.
pub struct PreferencesStore {
    backend: Box<dyn KeyValueBackend>,
    cache: RwLock<Option<Map<String, Value>>>,
    events: Arc<dyn EventSink>,
}

impl PreferencesStore {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self::with_events(backend, Arc::new(NoopEventSink))
    }

    pub fn with_events(backend: impl KeyValueBackend + 'static, events: Arc<dyn EventSink>) -> Self {
        Self {
            backend: Box::new(backend),
            cache: RwLock::new(None),
            events,
        }
    }

    /// Store backed by a JSON file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Drop cached values so the next access re-reads the backend
    pub fn reload(&self) {
        if let Ok(mut cache) = self.cache.write() {
            *cache = None;
        }
    }

    fn load_backend(&self) -> Map<String, Value> {
        match self.backend.load() {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Failed to load preferences, using defaults: {}", e);
                Map::new()
            }
        }
    }

    fn with_values<T>(&self, f: impl FnOnce(&Map<String, Value>) -> T) -> T {
        if let Ok(cache) = self.cache.read() {
            if let Some(ref values) = *cache {
                return f(values);
            }
        }

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let values = cache.get_or_insert_with(|| self.load_backend());
        f(values)
    }

    fn write(&self, key: &str, value: Option<Value>) {
        let snapshot = {
            let mut cache = match self.cache.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let values = cache.get_or_insert_with(|| self.load_backend());
            match &value {
                Some(v) => {
                    values.insert(key.to_string(), v.clone());
                }
                None => {
                    values.remove(key);
                }
            }
            values.clone()
        };

        if let Err(e) = self.backend.save(&snapshot) {
            log::warn!("Failed to persist preference '{}': {}", key, e);
        }

        let value = value.unwrap_or(Value::Null);
        log::debug!("Preference '{}' set to {}", key, value);
        emit_event(
            self.events.as_ref(),
            EVENT_PREFERENCE_CHANGED,
            &PreferenceChanged { key, value: &value },
        );
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.with_values(|values| values.get(key).and_then(Value::as_bool).unwrap_or(default))
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.with_values(|values| values.get(key).and_then(Value::as_i64).unwrap_or(default))
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.with_values(|values| values.get(key).and_then(Value::as_str).map(str::to_string))
    }

    /// Read a switch preference, decoding its storage encoding
    pub fn flag(&self, preference: BoolPreference) -> bool {
        let default = preference.default_value();
        match preference.encoding() {
            FlagEncoding::Bool => self.get_bool(preference.key(), default),
            FlagEncoding::Int => self.get_int(preference.key(), default as i64) == 1,
        }
    }

    pub fn set_flag(&self, preference: BoolPreference, on: bool) {
        let value = match preference.encoding() {
            FlagEncoding::Bool => Value::Bool(on),
            FlagEncoding::Int => Value::from(if on { 1 } else { 0 }),
        };
        self.write(preference.key(), Some(value));
    }

    pub fn tag_with_location(&self) -> bool {
        self.flag(BoolPreference::TagWithLocation)
    }

    pub fn set_tag_with_location(&self, on: bool) {
        self.set_flag(BoolPreference::TagWithLocation, on);
    }

    pub fn high_quality(&self) -> bool {
        self.flag(BoolPreference::HighQuality)
    }

    pub fn set_high_quality(&self, on: bool) {
        self.set_flag(BoolPreference::HighQuality, on);
    }

    pub fn circular_recording(&self) -> bool {
        self.flag(BoolPreference::CircularRecording)
    }

    pub fn set_circular_recording(&self, on: bool) {
        self.set_flag(BoolPreference::CircularRecording, on);
    }

    /// Length of one circular clip, in seconds
    pub fn circular_period_secs(&self) -> i64 {
        self.get_int(PREF_CIRCULAR_RECORDING_PERIOD, DEFAULT_CIRCULAR_PERIOD_SECS)
    }

    pub fn set_circular_period_secs(&self, secs: i64) {
        self.write(PREF_CIRCULAR_RECORDING_PERIOD, Some(Value::from(secs)));
    }

    pub fn circular_clip_count(&self) -> i64 {
        self.get_int(PREF_CIRCULAR_RECORDING_NUMBER, DEFAULT_CIRCULAR_CLIP_COUNT)
    }

    pub fn set_circular_clip_count(&self, count: i64) {
        self.write(PREF_CIRCULAR_RECORDING_NUMBER, Some(Value::from(count)));
    }

    pub fn last_item_uri(&self) -> Option<String> {
        self.get_string(PREF_LAST_SOUND)
    }

    pub fn set_last_item_uri(&self, uri: Option<&str>) {
        self.write(PREF_LAST_SOUND, uri.map(Value::from));
    }

    pub fn is_currently_recording(&self) -> bool {
        self.get_bool(PREF_IS_CURRENTLY_RECORDING, false)
    }

    pub fn set_is_currently_recording(&self, recording: bool) {
        self.write(PREF_IS_CURRENTLY_RECORDING, Some(Value::Bool(recording)));
    }

    pub fn onboard_settings_counter(&self) -> i64 {
        self.get_int(PREF_ONBOARD_SETTINGS_COUNTER, 0)
    }

    pub fn set_onboard_settings_counter(&self, value: i64) {
        self.write(PREF_ONBOARD_SETTINGS_COUNTER, Some(Value::from(value)));
    }

    pub fn onboard_list_counter(&self) -> i64 {
        self.get_int(PREF_ONBOARD_SOUND_LIST_COUNTER, 0)
    }

    pub fn set_onboard_list_counter(&self, value: i64) {
        self.write(PREF_ONBOARD_SOUND_LIST_COUNTER, Some(Value::from(value)));
    }

    pub fn mark_recording_started(&self) {
        self.set_is_currently_recording(true);
    }

    /// Record the finished clip as the latest item and clear the recording flag
    pub fn mark_recording_finished(&self, uri: &str) {
        self.set_is_currently_recording(false);
        self.set_last_item_uri(Some(uri));
    }

    /// Read every preference at once
    pub fn snapshot(&self) -> RecorderPreferences {
        RecorderPreferences {
            tag_with_location: self.tag_with_location(),
            high_quality: self.high_quality(),
            circular_recording: self.circular_recording(),
            circular_period_secs: self.circular_period_secs(),
            circular_clip_count: self.circular_clip_count(),
            last_item_uri: self.last_item_uri(),
            is_currently_recording: self.is_currently_recording(),
            onboard_settings_counter: self.onboard_settings_counter(),
            onboard_list_counter: self.onboard_list_counter(),
        }
    }
}
