// Permissions Service
// Runtime permissions that gate recorder preferences

use serde::{Deserialize, Serialize};

/// Permission types that gate a preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Fine/coarse location, needed to tag recordings with where they were made
    Location,
    /// Exemption from battery optimization, needed to keep circular recording alive
    BatteryOptimizationExemption,
}

/// Permission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl From<bool> for PermissionStatus {
    fn from(granted: bool) -> Self {
        if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

/// Status of every permission the settings depend on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatusReport {
    pub location: PermissionStatus,
    pub battery_optimization_exemption: PermissionStatus,
}

/// Platform permission collaborator.
///
/// Requests return immediately; the outcome is delivered later to
/// `SettingsController::on_permission_result`.
pub trait PermissionManager: Send + Sync {
    fn has_location_permission(&self) -> bool;

    fn request_location_permission(&self);

    fn has_battery_permission(&self) -> bool;

    fn request_battery_permission(&self);

    /// Tell the user location tagging was turned off because access was refused
    fn on_location_permission_denied(&self);

    fn on_battery_permission_denied(&self) {}

    fn has_permission(&self, permission: Permission) -> bool {
        match permission {
            Permission::Location => self.has_location_permission(),
            Permission::BatteryOptimizationExemption => self.has_battery_permission(),
        }
    }

    fn request_permission(&self, permission: Permission) {
        match permission {
            Permission::Location => self.request_location_permission(),
            Permission::BatteryOptimizationExemption => self.request_battery_permission(),
        }
    }

    fn on_permission_denied(&self, permission: Permission) {
        match permission {
            Permission::Location => self.on_location_permission_denied(),
            Permission::BatteryOptimizationExemption => self.on_battery_permission_denied(),
        }
    }

    fn status_report(&self) -> PermissionStatusReport {
        PermissionStatusReport {
            location: self.has_location_permission().into(),
            battery_optimization_exemption: self.has_battery_permission().into(),
        }
    }
}

/// Permission manager for platforms without runtime permissions.
///
/// Desktop targets neither restrict location lookups nor kill background
/// recorders for battery reasons, so everything reports as granted.
pub struct DesktopPermissions;

impl PermissionManager for DesktopPermissions {
    fn has_location_permission(&self) -> bool {
        true
    }

    fn request_location_permission(&self) {
        log::info!("Location permission is implicit on this platform");
    }

    fn has_battery_permission(&self) -> bool {
        true
    }

    fn request_battery_permission(&self) {
        log::info!("Battery optimization exemption is implicit on this platform");
    }

    fn on_location_permission_denied(&self) {
        log::warn!("Location permission denied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_status_report() {
        let report = DesktopPermissions.status_report();
        assert_eq!(report.location, PermissionStatus::Granted);
        assert_eq!(report.battery_optimization_exemption, PermissionStatus::Granted);
    }

    #[test]
    fn test_has_permission_dispatch() {
        let perms = DesktopPermissions;
        assert!(perms.has_permission(Permission::Location));
        assert!(perms.has_permission(Permission::BatteryOptimizationExemption));
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let report = PermissionStatusReport {
            location: PermissionStatus::Denied,
            battery_optimization_exemption: PermissionStatus::Granted,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["location"], "denied");
        assert_eq!(value["batteryOptimizationExemption"], "granted");
    }
}
