// SettingsController Service
// Applies permission gates and input validation between the settings dialog and the store

use std::collections::HashSet;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{SettingsError, SettingsResult};
use crate::models::BoolPreference;
use crate::services::events::{EventSink, NoopEventSink, EVENT_PERMISSION_DENIED};
use crate::services::permissions::{Permission, PermissionManager, PermissionStatusReport};
use crate::services::preferences_store::PreferencesStore;

/// Controls on the settings dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    LocationSwitch,
    HighQualitySwitch,
    CircularSwitch,
    PeriodInput,
    NumberInput,
}

/// Rendered state of a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleState {
    pub checked: bool,
    pub editable: bool,
}

/// Initial state of the whole dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogState {
    pub location: ToggleState,
    pub high_quality: ToggleState,
    pub circular: ToggleState,
    pub period_text: String,
    pub number_text: String,
    /// False when a recording is in progress; inputs are read-only then
    pub inputs_editable: bool,
    /// Permissions as they stood when the dialog was rendered
    pub permissions: PermissionStatusReport,
}

/// Raw events delivered by the dialog host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    LocationToggled(bool),
    HighQualityToggled(bool),
    CircularToggled(bool),
    PeriodInputChanged(String),
    NumberInputChanged(String),
    PermissionResult { permission: Permission, granted: bool },
    Closed,
}

/// What the dialog host should reflect after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// The switch shows `checked`, which matches the persisted value
    Toggle { control: Control, checked: bool },
    /// A permission request is in flight; leave the switch alone until the result arrives
    AwaitingPermission { control: Control, permission: Permission },
    /// The permission was refused; the switch must show unchecked
    PermissionDenied { control: Control, permission: Permission },
    /// Input text was parsed and persisted
    InputCommitted { control: Control },
    /// Input text was refused; the persisted value is unchanged
    InputRejected { control: Control, reason: String },
    /// Nothing to reflect
    Unchanged,
    /// A recording is in progress and the controls are read-only
    Locked,
}

/// Outcome of asking a gated toggle to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Committed(bool),
    PermissionRequested,
}

/// A boolean preference that may only be on while a permission is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGatedToggle {
    pub preference: BoolPreference,
    pub permission: Permission,
    pub control: Control,
}

impl PermissionGatedToggle {
    pub const LOCATION: Self = Self {
        preference: BoolPreference::TagWithLocation,
        permission: Permission::Location,
        control: Control::LocationSwitch,
    };

    pub const CIRCULAR: Self = Self {
        preference: BoolPreference::CircularRecording,
        permission: Permission::BatteryOptimizationExemption,
        control: Control::CircularSwitch,
    };

    /// Effective value of the preference, clearing it if the permission was revoked
    pub fn resolve(&self, store: &PreferencesStore, permissions: &dyn PermissionManager) -> bool {
        if !store.flag(self.preference) {
            return false;
        }
        if permissions.has_permission(self.permission) {
            return true;
        }

        // Permission revoked -> disabled feature
        log::info!(
            "{:?} permission revoked, clearing '{}'",
            self.permission,
            self.preference.key()
        );
        store.set_flag(self.preference, false);
        false
    }

    pub fn request_change(
        &self,
        on: bool,
        store: &PreferencesStore,
        permissions: &dyn PermissionManager,
    ) -> GateOutcome {
        if on && !permissions.has_permission(self.permission) {
            log::info!("Requesting {:?} permission to enable '{}'", self.permission, self.preference.key());
            permissions.request_permission(self.permission);
            return GateOutcome::PermissionRequested;
        }

        store.set_flag(self.preference, on);
        GateOutcome::Committed(on)
    }

    /// Apply a permission result; returns whether the switch ends up checked
    pub fn apply_result(
        &self,
        granted: bool,
        store: &PreferencesStore,
        permissions: &dyn PermissionManager,
    ) -> bool {
        if granted {
            store.set_flag(self.preference, true);
        } else {
            log::warn!("{:?} permission denied, '{}' stays off", self.permission, self.preference.key());
            if store.flag(self.preference) {
                store.set_flag(self.preference, false);
            }
            permissions.on_permission_denied(self.permission);
        }
        granted
    }
}

/// Render a period in seconds as minutes with at most one decimal place
pub fn format_period_minutes(secs: i64) -> String {
    let text = format!("{:.1}", secs as f64 / 60.0);
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

/// Parse minutes typed by the user into whole seconds, truncating.
/// Empty text yields `None`.
pub fn parse_period_minutes(text: &str) -> SettingsResult<Option<i64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let minutes: f64 = trimmed
        .parse()
        .map_err(|_| SettingsError::InvalidPeriod(format!("'{}' is not a number of minutes", trimmed)))?;
    if !minutes.is_finite() {
        return Err(SettingsError::InvalidPeriod(format!("'{}' is not a finite number", trimmed)));
    }

    let secs = (minutes * 60.0).floor();
    if secs < 1.0 || secs >= i64::MAX as f64 {
        return Err(SettingsError::InvalidPeriod(format!(
            "'{}' minutes is not a positive whole number of seconds",
            trimmed
        )));
    }

    Ok(Some(secs as i64))
}

/// Parse a clip count typed by the user. Empty text yields `None`.
pub fn parse_clip_count(text: &str) -> SettingsResult<Option<i64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let count: i32 = trimmed
        .parse()
        .map_err(|_| SettingsError::InvalidClipCount(format!("'{}' is not a whole number", trimmed)))?;
    if count < 1 {
        return Err(SettingsError::InvalidClipCount(format!("{} must be at least 1", count)));
    }

    Ok(Some(count as i64))
}

/// Mediates between the settings dialog and the preference store.
///
/// Built once per dialog. Every handler runs on the dialog's thread; the only
/// asynchronous boundary is the permission request, whose result comes back
/// through `on_permission_result`.
pub struct SettingsController {
    store: Arc<PreferencesStore>,
    permissions: Arc<dyn PermissionManager>,
    events: Arc<dyn EventSink>,
    is_recording: bool,
    closed: bool,
    pending: HashSet<Permission>,
}

impl SettingsController {
    pub fn new(
        store: Arc<PreferencesStore>,
        permissions: Arc<dyn PermissionManager>,
        is_recording: bool,
    ) -> Self {
        Self::with_events(store, permissions, Arc::new(NoopEventSink), is_recording)
    }

    pub fn with_events(
        store: Arc<PreferencesStore>,
        permissions: Arc<dyn PermissionManager>,
        events: Arc<dyn EventSink>,
        is_recording: bool,
    ) -> Self {
        Self {
            store,
            permissions,
            events,
            is_recording,
            closed: false,
            pending: HashSet::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a request for `permission` is still waiting for its result
    pub fn is_pending(&self, permission: Permission) -> bool {
        self.pending.contains(&permission)
    }

    /// The dialog is gone; later events, including permission results, are dropped
    pub fn close(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Settings closed with {} permission request(s) outstanding", self.pending.len());
        }
        self.closed = true;
        self.pending.clear();
    }

    fn editable(&self) -> bool {
        !self.is_recording
    }

    fn init_gated(&self, toggle: PermissionGatedToggle) -> ToggleState {
        ToggleState {
            checked: toggle.resolve(&self.store, self.permissions.as_ref()),
            editable: self.editable(),
        }
    }

    fn on_gated_toggle(&mut self, toggle: PermissionGatedToggle, on: bool) -> UiUpdate {
        if self.closed {
            return UiUpdate::Unchanged;
        }
        if self.is_recording {
            return UiUpdate::Locked;
        }

        match toggle.request_change(on, &self.store, self.permissions.as_ref()) {
            GateOutcome::PermissionRequested => {
                self.pending.insert(toggle.permission);
                UiUpdate::AwaitingPermission {
                    control: toggle.control,
                    permission: toggle.permission,
                }
            }
            GateOutcome::Committed(checked) => {
                // A committed value supersedes any request still in flight
                self.pending.remove(&toggle.permission);
                UiUpdate::Toggle { control: toggle.control, checked }
            }
        }
    }

    fn on_gated_result(&mut self, toggle: PermissionGatedToggle, granted: bool) -> UiUpdate {
        if self.closed {
            log::debug!("Dropping {:?} permission result, settings already closed", toggle.permission);
            return UiUpdate::Unchanged;
        }
        if self.is_recording {
            return UiUpdate::Locked;
        }
        if !self.pending.remove(&toggle.permission) {
            log::debug!("Ignoring unsolicited {:?} permission result", toggle.permission);
            return UiUpdate::Unchanged;
        }

        if toggle.apply_result(granted, &self.store, self.permissions.as_ref()) {
            UiUpdate::Toggle { control: toggle.control, checked: true }
        } else {
            self.events.emit(
                EVENT_PERMISSION_DENIED,
                json!({ "permission": toggle.permission, "preference": toggle.preference }),
            );
            UiUpdate::PermissionDenied {
                control: toggle.control,
                permission: toggle.permission,
            }
        }
    }

    pub fn init_location_toggle(&self) -> ToggleState {
        self.init_gated(PermissionGatedToggle::LOCATION)
    }

    pub fn on_location_toggle(&mut self, requested_on: bool) -> UiUpdate {
        self.on_gated_toggle(PermissionGatedToggle::LOCATION, requested_on)
    }

    pub fn on_location_permission_result(&mut self, granted: bool) -> UiUpdate {
        self.on_gated_result(PermissionGatedToggle::LOCATION, granted)
    }

    pub fn init_circular_toggle(&self) -> ToggleState {
        self.init_gated(PermissionGatedToggle::CIRCULAR)
    }

    pub fn on_circular_toggle(&mut self, requested_on: bool) -> UiUpdate {
        self.on_gated_toggle(PermissionGatedToggle::CIRCULAR, requested_on)
    }

    pub fn on_battery_permission_result(&mut self, granted: bool) -> UiUpdate {
        self.on_gated_result(PermissionGatedToggle::CIRCULAR, granted)
    }

    pub fn on_permission_result(&mut self, permission: Permission, granted: bool) -> UiUpdate {
        match permission {
            Permission::Location => self.on_location_permission_result(granted),
            Permission::BatteryOptimizationExemption => self.on_battery_permission_result(granted),
        }
    }

    pub fn init_high_quality_toggle(&self) -> ToggleState {
        ToggleState {
            checked: self.store.high_quality(),
            editable: self.editable(),
        }
    }

    pub fn on_high_quality_toggle(&mut self, on: bool) -> UiUpdate {
        if self.closed {
            return UiUpdate::Unchanged;
        }
        if self.is_recording {
            return UiUpdate::Locked;
        }

        self.store.set_high_quality(on);
        UiUpdate::Toggle { control: Control::HighQualitySwitch, checked: on }
    }

    pub fn init_period_input(&self) -> String {
        format_period_minutes(self.store.circular_period_secs())
    }

    pub fn on_period_input_changed(&mut self, text: &str) -> UiUpdate {
        if self.closed {
            return UiUpdate::Unchanged;
        }
        if self.is_recording {
            return UiUpdate::Locked;
        }

        match parse_period_minutes(text) {
            Ok(Some(secs)) => {
                self.store.set_circular_period_secs(secs);
                UiUpdate::InputCommitted { control: Control::PeriodInput }
            }
            Ok(None) => UiUpdate::Unchanged,
            Err(e) => {
                log::debug!("Rejected period input: {}", e);
                UiUpdate::InputRejected { control: Control::PeriodInput, reason: e.to_string() }
            }
        }
    }

    pub fn init_number_input(&self) -> String {
        self.store.circular_clip_count().to_string()
    }

    pub fn on_number_input_changed(&mut self, text: &str) -> UiUpdate {
        if self.closed {
            return UiUpdate::Unchanged;
        }
        if self.is_recording {
            return UiUpdate::Locked;
        }

        match parse_clip_count(text) {
            Ok(Some(count)) => {
                self.store.set_circular_clip_count(count);
                UiUpdate::InputCommitted { control: Control::NumberInput }
            }
            Ok(None) => UiUpdate::Unchanged,
            Err(e) => {
                log::debug!("Rejected clip count input: {}", e);
                UiUpdate::InputRejected { control: Control::NumberInput, reason: e.to_string() }
            }
        }
    }

    /// Render every control for a freshly opened dialog
    pub fn init_all(&self) -> DialogState {
        DialogState {
            location: self.init_location_toggle(),
            high_quality: self.init_high_quality_toggle(),
            circular: self.init_circular_toggle(),
            period_text: self.init_period_input(),
            number_text: self.init_number_input(),
            inputs_editable: self.editable(),
            permissions: self.permissions.status_report(),
        }
    }

    pub fn handle(&mut self, event: SettingsEvent) -> UiUpdate {
        match event {
            SettingsEvent::LocationToggled(on) => self.on_location_toggle(on),
            SettingsEvent::HighQualityToggled(on) => self.on_high_quality_toggle(on),
            SettingsEvent::CircularToggled(on) => self.on_circular_toggle(on),
            SettingsEvent::PeriodInputChanged(text) => self.on_period_input_changed(&text),
            SettingsEvent::NumberInputChanged(text) => self.on_number_input_changed(&text),
            SettingsEvent::PermissionResult { permission, granted } => {
                self.on_permission_result(permission, granted)
            }
            SettingsEvent::Closed => {
                self.close();
                UiUpdate::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::events::BufferedEventSink;
    use crate::services::permissions::PermissionStatus;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockPermissions {
        location: AtomicBool,
        battery: AtomicBool,
        location_requests: AtomicUsize,
        battery_requests: AtomicUsize,
        location_denials: AtomicUsize,
        battery_denials: AtomicUsize,
    }

    impl MockPermissions {
        fn with(location: bool, battery: bool) -> Arc<Self> {
            let perms = Self::default();
            perms.location.store(location, Ordering::SeqCst);
            perms.battery.store(battery, Ordering::SeqCst);
            Arc::new(perms)
        }
    }

    impl PermissionManager for MockPermissions {
        fn has_location_permission(&self) -> bool {
            self.location.load(Ordering::SeqCst)
        }

        fn request_location_permission(&self) {
            self.location_requests.fetch_add(1, Ordering::SeqCst);
        }

        fn has_battery_permission(&self) -> bool {
            self.battery.load(Ordering::SeqCst)
        }

        fn request_battery_permission(&self) {
            self.battery_requests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_location_permission_denied(&self) {
            self.location_denials.fetch_add(1, Ordering::SeqCst);
        }

        fn on_battery_permission_denied(&self) {
            self.battery_denials.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup(location: bool, battery: bool, recording: bool) -> (Arc<PreferencesStore>, Arc<MockPermissions>, SettingsController) {
        let store = Arc::new(PreferencesStore::in_memory());
        let perms = MockPermissions::with(location, battery);
        let controller = SettingsController::new(store.clone(), perms.clone(), recording);
        (store, perms, controller)
    }

    #[test]
    fn test_location_self_heals_when_permission_revoked() {
        let (store, _perms, controller) = setup(false, true, false);
        store.set_tag_with_location(true);

        let state = controller.init_location_toggle();
        assert_eq!(state, ToggleState { checked: false, editable: true });
        assert!(!store.tag_with_location());
    }

    #[test]
    fn test_circular_self_heals_when_permission_revoked() {
        let (store, _perms, controller) = setup(true, false, false);
        assert!(store.circular_recording());

        let state = controller.init_circular_toggle();
        assert!(!state.checked);
        assert!(!store.circular_recording());
    }

    #[test]
    fn test_init_keeps_value_when_permission_held() {
        let (store, _perms, controller) = setup(true, true, false);
        store.set_tag_with_location(true);

        assert!(controller.init_location_toggle().checked);
        assert!(controller.init_circular_toggle().checked);
        assert!(store.tag_with_location());
        assert!(store.circular_recording());
    }

    #[test]
    fn test_location_on_without_permission_waits_for_grant() {
        let (store, perms, mut controller) = setup(false, true, false);

        let update = controller.on_location_toggle(true);
        assert_eq!(
            update,
            UiUpdate::AwaitingPermission { control: Control::LocationSwitch, permission: Permission::Location }
        );
        assert!(!store.tag_with_location());
        assert_eq!(perms.location_requests.load(Ordering::SeqCst), 1);
        assert!(controller.is_pending(Permission::Location));

        let update = controller.on_location_permission_result(true);
        assert_eq!(update, UiUpdate::Toggle { control: Control::LocationSwitch, checked: true });
        assert!(store.tag_with_location());
        assert!(!controller.is_pending(Permission::Location));
    }

    #[test]
    fn test_location_denied_reverts_and_notifies() {
        let store = Arc::new(PreferencesStore::in_memory());
        let perms = MockPermissions::with(false, true);
        let sink = Arc::new(BufferedEventSink::new());
        let mut controller = SettingsController::with_events(store.clone(), perms.clone(), sink.clone(), false);

        controller.on_location_toggle(true);
        let update = controller.on_location_permission_result(false);

        assert_eq!(
            update,
            UiUpdate::PermissionDenied { control: Control::LocationSwitch, permission: Permission::Location }
        );
        assert!(!store.tag_with_location());
        assert_eq!(perms.location_denials.load(Ordering::SeqCst), 1);

        let events = sink.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, EVENT_PERMISSION_DENIED);
        assert_eq!(events[0].1["permission"], "location");
    }

    #[test]
    fn test_location_on_with_permission_persists() {
        let (store, perms, mut controller) = setup(true, true, false);

        let update = controller.on_location_toggle(true);
        assert_eq!(update, UiUpdate::Toggle { control: Control::LocationSwitch, checked: true });
        assert!(store.tag_with_location());
        assert_eq!(perms.location_requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_toggle_off_persists_without_permission() {
        let (store, _perms, mut controller) = setup(false, false, false);
        store.set_tag_with_location(true);

        controller.on_location_toggle(false);
        controller.on_circular_toggle(false);

        assert!(!store.tag_with_location());
        assert!(!store.circular_recording());
    }

    #[test]
    fn test_circular_uses_battery_permission() {
        let (store, perms, mut controller) = setup(true, false, false);
        store.set_circular_recording(false);

        let update = controller.on_circular_toggle(true);
        assert_eq!(
            update,
            UiUpdate::AwaitingPermission {
                control: Control::CircularSwitch,
                permission: Permission::BatteryOptimizationExemption,
            }
        );
        assert_eq!(perms.battery_requests.load(Ordering::SeqCst), 1);
        assert_eq!(perms.location_requests.load(Ordering::SeqCst), 0);
        assert!(!store.circular_recording());

        controller.on_battery_permission_result(false);
        assert_eq!(perms.battery_denials.load(Ordering::SeqCst), 1);
        assert!(!store.circular_recording());

        controller.on_circular_toggle(true);
        controller.on_battery_permission_result(true);
        assert!(store.circular_recording());
    }

    #[test]
    fn test_high_quality_is_ungated() {
        let (store, _perms, mut controller) = setup(false, false, false);
        assert!(!controller.init_high_quality_toggle().checked);

        controller.on_high_quality_toggle(true);
        assert!(store.high_quality());
        assert!(controller.init_high_quality_toggle().checked);

        controller.on_high_quality_toggle(false);
        assert!(!store.high_quality());
    }

    #[test]
    fn test_format_period_minutes() {
        assert_eq!(format_period_minutes(3600), "60");
        assert_eq!(format_period_minutes(90), "1.5");
        assert_eq!(format_period_minutes(60), "1");
        assert_eq!(format_period_minutes(100), "1.7");
        assert_eq!(format_period_minutes(30), "0.5");
    }

    #[test]
    fn test_parse_period_minutes() {
        assert_eq!(parse_period_minutes("1.5").unwrap(), Some(90));
        assert_eq!(parse_period_minutes("2").unwrap(), Some(120));
        assert_eq!(parse_period_minutes(" 0.1 ").unwrap(), Some(6));
        assert_eq!(parse_period_minutes("").unwrap(), None);
        assert!(parse_period_minutes("abc").is_err());
        assert!(parse_period_minutes("0").is_err());
        assert!(parse_period_minutes("0.01").is_err());
        assert!(parse_period_minutes("-3").is_err());
        assert!(parse_period_minutes("inf").is_err());
    }

    #[test]
    fn test_parse_clip_count() {
        assert_eq!(parse_clip_count("5").unwrap(), Some(5));
        assert_eq!(parse_clip_count("").unwrap(), None);
        assert!(parse_clip_count("2.5").is_err());
        assert!(parse_clip_count("0").is_err());
        assert!(parse_clip_count("-1").is_err());
        assert!(parse_clip_count("many").is_err());
    }

    #[test]
    fn test_period_round_trip_through_controller() {
        let (store, _perms, mut controller) = setup(true, true, false);

        store.set_circular_period_secs(90);
        assert_eq!(controller.init_period_input(), "1.5");

        assert_eq!(
            controller.on_period_input_changed("2"),
            UiUpdate::InputCommitted { control: Control::PeriodInput }
        );
        assert_eq!(store.circular_period_secs(), 120);

        controller.on_period_input_changed("1.5");
        assert_eq!(store.circular_period_secs(), 90);

        store.set_circular_period_secs(60);
        assert_eq!(controller.init_period_input(), "1");
    }

    #[test]
    fn test_empty_and_invalid_input_leave_value_unchanged() {
        let (store, _perms, mut controller) = setup(true, true, false);
        store.set_circular_period_secs(600);
        store.set_circular_clip_count(4);

        assert_eq!(controller.on_period_input_changed(""), UiUpdate::Unchanged);
        assert_eq!(controller.on_number_input_changed(""), UiUpdate::Unchanged);
        assert!(matches!(
            controller.on_period_input_changed("ten"),
            UiUpdate::InputRejected { control: Control::PeriodInput, .. }
        ));
        assert!(matches!(
            controller.on_number_input_changed("0"),
            UiUpdate::InputRejected { control: Control::NumberInput, .. }
        ));

        assert_eq!(store.circular_period_secs(), 600);
        assert_eq!(store.circular_clip_count(), 4);
    }

    #[test]
    fn test_number_input() {
        let (store, _perms, mut controller) = setup(true, true, false);
        assert_eq!(controller.init_number_input(), "3");

        controller.on_number_input_changed("7");
        assert_eq!(store.circular_clip_count(), 7);
        assert_eq!(controller.init_number_input(), "7");
    }

    #[test]
    fn test_recording_locks_every_control() {
        let (store, perms, mut controller) = setup(true, true, true);
        let before = store.snapshot();

        let state = controller.init_all();
        assert!(!state.location.editable);
        assert!(!state.high_quality.editable);
        assert!(!state.circular.editable);
        assert!(!state.inputs_editable);

        for event in [
            SettingsEvent::LocationToggled(true),
            SettingsEvent::HighQualityToggled(true),
            SettingsEvent::CircularToggled(false),
            SettingsEvent::PeriodInputChanged("5".to_string()),
            SettingsEvent::NumberInputChanged("9".to_string()),
            SettingsEvent::PermissionResult { permission: Permission::Location, granted: true },
        ] {
            assert_eq!(controller.handle(event), UiUpdate::Locked);
        }

        assert_eq!(store.snapshot(), before);
        assert_eq!(perms.location_requests.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_late_result_after_close_is_ignored() {
        let (store, _perms, mut controller) = setup(false, true, false);

        controller.on_location_toggle(true);
        controller.handle(SettingsEvent::Closed);
        assert!(controller.is_closed());

        let update = controller.on_location_permission_result(true);
        assert_eq!(update, UiUpdate::Unchanged);
        assert!(!store.tag_with_location());
    }

    #[test]
    fn test_unsolicited_result_is_ignored() {
        let (store, perms, mut controller) = setup(false, true, false);

        assert_eq!(controller.on_location_permission_result(true), UiUpdate::Unchanged);
        assert_eq!(controller.on_location_permission_result(false), UiUpdate::Unchanged);
        assert!(!store.tag_with_location());
        assert_eq!(perms.location_denials.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_switching_off_cancels_pending_request() {
        let (store, _perms, mut controller) = setup(false, true, false);

        controller.on_location_toggle(true);
        controller.on_location_toggle(false);
        assert!(!controller.is_pending(Permission::Location));

        controller.on_location_permission_result(true);
        assert!(!store.tag_with_location());
    }

    #[test]
    fn test_commit_while_request_in_flight_drops_stale_denial() {
        let (store, perms, mut controller) = setup(false, true, false);

        controller.on_location_toggle(true);
        perms.location.store(true, Ordering::SeqCst);

        let update = controller.on_location_toggle(true);
        assert_eq!(update, UiUpdate::Toggle { control: Control::LocationSwitch, checked: true });
        assert!(!controller.is_pending(Permission::Location));

        assert_eq!(controller.on_location_permission_result(false), UiUpdate::Unchanged);
        assert!(store.tag_with_location());
        assert_eq!(perms.location_denials.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_denial_without_init_clears_stored_flag() {
        let (store, perms, mut controller) = setup(true, false, false);
        assert!(store.circular_recording());

        controller.on_circular_toggle(true);
        let update = controller.on_battery_permission_result(false);

        assert_eq!(
            update,
            UiUpdate::PermissionDenied {
                control: Control::CircularSwitch,
                permission: Permission::BatteryOptimizationExemption,
            }
        );
        assert!(!store.circular_recording());
        assert_eq!(perms.battery_denials.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_all_reports_permissions() {
        let (_store, _perms, controller) = setup(false, true, false);

        let state = controller.init_all();
        assert_eq!(state.permissions.location, PermissionStatus::Denied);
        assert_eq!(state.permissions.battery_optimization_exemption, PermissionStatus::Granted);
    }

    #[test]
    fn test_init_all_renders_defaults() {
        let (_store, _perms, controller) = setup(true, true, false);

        let state = controller.init_all();
        assert_eq!(state.location, ToggleState { checked: false, editable: true });
        assert_eq!(state.high_quality, ToggleState { checked: false, editable: true });
        assert_eq!(state.circular, ToggleState { checked: true, editable: true });
        assert_eq!(state.period_text, "60");
        assert_eq!(state.number_text, "3");
        assert!(state.inputs_editable);
    }

    #[test]
    fn test_handle_dispatches_permission_results() {
        let (store, _perms, mut controller) = setup(true, false, false);
        store.set_circular_recording(false);

        controller.handle(SettingsEvent::CircularToggled(true));
        let update = controller.handle(SettingsEvent::PermissionResult {
            permission: Permission::BatteryOptimizationExemption,
            granted: true,
        });

        assert_eq!(update, UiUpdate::Toggle { control: Control::CircularSwitch, checked: true });
        assert!(store.circular_recording());
    }
}
