/// Device registry for the wastewater treatment monitoring service.
///
/// Defines the canonical list of sensor devices monitored by this service,
/// along with their metadata and expected parameters. This is the single
/// source of truth for device ids — all other modules should reference
/// devices from here rather than hardcoding ids.

use crate::model::Parameter;

// ---------------------------------------------------------------------------
// Device metadata
// ---------------------------------------------------------------------------

/// Operational status recorded for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
}

/// Metadata for a single sensor device.
pub struct Device {
    /// Device id as used in the telemetry feed path.
    pub id: &'static str,
    /// Human-readable device name.
    pub name: &'static str,
    /// Physical location within the plant.
    pub location: &'static str,
    /// Device type designation.
    pub kind: &'static str,
    /// Last known operational status.
    pub status: DeviceStatus,
    /// ISO 8601 installation date.
    pub installation_date: &'static str,
    /// ISO 8601 date of last maintenance.
    pub last_maintenance: &'static str,
    /// Manufacturer serial number.
    pub serial_number: &'static str,
    /// Which parameters this device is expected to report.
    /// Older sensor packages omit DO, conductivity, and turbidity.
    pub expected_parameters: &'static [Parameter],
}

/// All sensor devices monitored by this service, ordered by treatment stage.
pub static DEVICE_REGISTRY: &[Device] = &[
    Device {
        id: "RPi001",
        name: "Raspberry Pi Sensor 001",
        location: "Treatment Plant 1 - Primary Tank",
        kind: "Standard Sensor",
        status: DeviceStatus::Online,
        installation_date: "2022-10-01",
        last_maintenance: "2023-05-15",
        serial_number: "RPI-001-2022",
        expected_parameters: &[
            Parameter::Ph,
            Parameter::Temperature,
            Parameter::Tss,
            Parameter::Cod,
            Parameter::Bod,
            Parameter::Hardness,
            Parameter::Flow,
        ],
    },
    Device {
        id: "RPi002",
        name: "Raspberry Pi Sensor 002",
        location: "Treatment Plant 1 - Secondary Tank",
        kind: "Standard Sensor",
        status: DeviceStatus::Online,
        installation_date: "2023-01-15",
        last_maintenance: "2023-06-20",
        serial_number: "RPI-002-2023",
        expected_parameters: &[
            Parameter::Ph,
            Parameter::Temperature,
            Parameter::Tss,
            Parameter::Cod,
            Parameter::Bod,
            Parameter::Hardness,
            Parameter::Flow,
            Parameter::DissolvedOxygen,
            Parameter::Conductivity,
            Parameter::Turbidity,
        ],
    },
];

/// Returns the ids of all registered devices.
pub fn all_device_ids() -> Vec<&'static str> {
    DEVICE_REGISTRY.iter().map(|d| d.id).collect()
}

/// Looks up a device by id. Returns `None` if not found.
pub fn find_device(device_id: &str) -> Option<&'static Device> {
    DEVICE_REGISTRY.iter().find(|d| d.id == device_id)
}

/// Display name for a device, falling back to the raw id for devices that
/// appear in the feed but are not in the registry.
pub fn device_name(device_id: &str) -> String {
    find_device(device_id)
        .map(|d| d.name.to_string())
        .unwrap_or_else(|| device_id.to_string())
}

/// Checks whether a device is expected to report a specific parameter.
pub fn device_has_parameter(device_id: &str, parameter: Parameter) -> bool {
    find_device(device_id)
        .map(|d| d.expected_parameters.contains(&parameter))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_duplicate_device_ids() {
        let mut seen = std::collections::HashSet::new();
        for device in DEVICE_REGISTRY {
            assert!(
                seen.insert(device.id),
                "duplicate device id '{}' found in DEVICE_REGISTRY",
                device.id
            );
        }
    }

    #[test]
    fn test_registry_contains_expected_plant_devices() {
        let ids = all_device_ids();
        assert!(ids.contains(&"RPi001"), "registry missing primary tank sensor");
        assert!(ids.contains(&"RPi002"), "registry missing secondary tank sensor");
    }

    #[test]
    fn test_find_device_returns_correct_entry() {
        let device = find_device("RPi001").expect("RPi001 should be in registry");
        assert_eq!(device.id, "RPi001");
        assert!(device.location.contains("Primary Tank"));
    }

    #[test]
    fn test_find_device_returns_none_for_unknown_id() {
        assert!(find_device("RPi999").is_none());
    }

    #[test]
    fn test_device_name_falls_back_to_raw_id() {
        assert_eq!(device_name("RPi001"), "Raspberry Pi Sensor 001");
        assert_eq!(device_name("unregistered-77"), "unregistered-77");
    }

    #[test]
    fn test_all_devices_report_core_parameters() {
        // Every device must report the six parameters governed by the
        // default threshold table, or threshold rules would never fire.
        let core = [
            Parameter::Ph,
            Parameter::Temperature,
            Parameter::Tss,
            Parameter::Cod,
            Parameter::Bod,
            Parameter::Hardness,
        ];
        for device in DEVICE_REGISTRY {
            for parameter in &core {
                assert!(
                    device.expected_parameters.contains(parameter),
                    "device '{}' missing core parameter {:?}",
                    device.id,
                    parameter
                );
            }
        }
    }

    #[test]
    fn test_device_has_parameter_helper() {
        assert!(device_has_parameter("RPi002", Parameter::Turbidity));
        assert!(!device_has_parameter("RPi001", Parameter::Turbidity));
        assert!(!device_has_parameter("RPi999", Parameter::Ph));
    }

    #[test]
    fn test_serial_numbers_match_id_convention() {
        // Serial numbers follow RPI-<nnn>-<year>; a mismatch between the id
        // suffix and serial suffix has caused mislabeled exports before.
        for device in DEVICE_REGISTRY {
            let id_digits: String = device.id.chars().filter(|c| c.is_ascii_digit()).collect();
            assert!(
                device.serial_number.contains(&id_digits),
                "serial '{}' does not match device id '{}'",
                device.serial_number,
                device.id
            );
        }
    }
}
