//! Output route classification
//!
//! Picks the display name for the active output route from a set of device
//! descriptors, using a fixed priority order: USB beats Bluetooth beats
//! wired headphones; the built-in speaker is only the fallback name.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name used when no prioritized device is present or the device
/// query fails
pub const DEFAULT_DEVICE_NAME: &str = "Speaker";

/// Kind of audio output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// USB audio interface or headset
    Usb,
    /// Bluetooth output (A2DP, LE, SCO)
    Bluetooth,
    /// Wired headphones or headset
    Wired,
    /// Built-in speaker
    BuiltinSpeaker,
}

impl DeviceKind {
    /// Route priority; higher wins. The built-in speaker carries zero so it
    /// never displaces the default name.
    pub fn priority(self) -> u8 {
        match self {
            Self::Usb => 3,
            Self::Bluetooth => 2,
            Self::Wired => 1,
            Self::BuiltinSpeaker => 0,
        }
    }
}

/// One available output device, as reported by the platform collaborator.
/// Transient: supplied per query, never stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device kind, used for prioritization
    pub kind: DeviceKind,
    /// Human-readable device name
    pub name: String,
}

impl DeviceDescriptor {
    /// Create a descriptor
    pub fn new(kind: DeviceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Pick the display name for the current output route.
///
/// Deterministic: the highest-priority device wins; among devices of equal
/// priority the first seen in input order is kept (strict greater-than
/// comparison). An empty set, or a set with nothing above speaker priority,
/// yields [`DEFAULT_DEVICE_NAME`].
pub fn classify(devices: &[DeviceDescriptor]) -> String {
    let mut name = DEFAULT_DEVICE_NAME.to_string();
    let mut priority = 0u8;

    for device in devices {
        let p = device.kind.priority();
        if p > priority {
            name = device.name.clone();
            priority = p;
        }
    }

    name
}

/// Device enumeration errors
#[derive(Debug, Error)]
pub enum RouteError {
    /// Device enumeration was unavailable or failed
    #[error("device enumeration failed: {0}")]
    Enumeration(String),
}

/// Collaborator that enumerates the available output devices
pub trait DeviceQuery: Send {
    /// List the currently available output devices
    fn output_devices(&self) -> std::result::Result<Vec<DeviceDescriptor>, RouteError>;
}

/// Device query backed by the default CPAL host.
///
/// CPAL exposes no transport type, so the kind is inferred from the device
/// name. That is good enough for display-name selection; unknown names fall
/// back to the built-in speaker kind and therefore to the default name.
pub struct CpalDeviceQuery;

impl CpalDeviceQuery {
    /// Infer the device kind from its reported name
    fn kind_from_name(name: &str) -> DeviceKind {
        let lower = name.to_lowercase();
        if lower.contains("usb") {
            DeviceKind::Usb
        } else if lower.contains("bluetooth") || lower.contains("a2dp") {
            DeviceKind::Bluetooth
        } else if lower.contains("headphone") || lower.contains("headset") {
            DeviceKind::Wired
        } else {
            DeviceKind::BuiltinSpeaker
        }
    }
}

impl DeviceQuery for CpalDeviceQuery {
    fn output_devices(&self) -> std::result::Result<Vec<DeviceDescriptor>, RouteError> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| RouteError::Enumeration(e.to_string()))?;

        let mut descriptors = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                descriptors.push(DeviceDescriptor {
                    kind: Self::kind_from_name(&name),
                    name,
                });
            }
        }

        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usb_beats_bluetooth() {
        let devices = vec![
            DeviceDescriptor::new(DeviceKind::Usb, "DAC1"),
            DeviceDescriptor::new(DeviceKind::Bluetooth, "Buds"),
        ];
        assert_eq!(classify(&devices), "DAC1");

        // Order-independent for distinct priorities
        let devices = vec![
            DeviceDescriptor::new(DeviceKind::Bluetooth, "Buds"),
            DeviceDescriptor::new(DeviceKind::Usb, "DAC1"),
        ];
        assert_eq!(classify(&devices), "DAC1");
    }

    #[test]
    fn empty_set_yields_default() {
        assert_eq!(classify(&[]), DEFAULT_DEVICE_NAME);
    }

    #[test]
    fn builtin_speaker_never_displaces_default() {
        let devices = vec![DeviceDescriptor::new(
            DeviceKind::BuiltinSpeaker,
            "Internal Speakers",
        )];
        assert_eq!(classify(&devices), DEFAULT_DEVICE_NAME);
    }

    #[test]
    fn wired_beats_speaker_only() {
        let devices = vec![
            DeviceDescriptor::new(DeviceKind::BuiltinSpeaker, "Internal Speakers"),
            DeviceDescriptor::new(DeviceKind::Wired, "Headphones"),
        ];
        assert_eq!(classify(&devices), "Headphones");
    }

    #[test]
    fn equal_priority_keeps_first_seen() {
        let devices = vec![
            DeviceDescriptor::new(DeviceKind::Bluetooth, "First Buds"),
            DeviceDescriptor::new(DeviceKind::Bluetooth, "Second Buds"),
        ];
        assert_eq!(classify(&devices), "First Buds");
    }

    #[test]
    fn classification_is_deterministic() {
        let devices = vec![
            DeviceDescriptor::new(DeviceKind::Wired, "Jack"),
            DeviceDescriptor::new(DeviceKind::Usb, "Interface"),
            DeviceDescriptor::new(DeviceKind::Bluetooth, "Speaker BT"),
        ];
        let first = classify(&devices);
        for _ in 0..10 {
            assert_eq!(classify(&devices), first);
        }
        assert_eq!(first, "Interface");
    }

    #[test]
    fn kind_inference_from_names() {
        assert_eq!(
            CpalDeviceQuery::kind_from_name("Focusrite USB Audio"),
            DeviceKind::Usb
        );
        assert_eq!(
            CpalDeviceQuery::kind_from_name("WH-1000XM4 (Bluetooth)"),
            DeviceKind::Bluetooth
        );
        assert_eq!(
            CpalDeviceQuery::kind_from_name("Plantronics Headset"),
            DeviceKind::Wired
        );
        assert_eq!(
            CpalDeviceQuery::kind_from_name("Built-in Output"),
            DeviceKind::BuiltinSpeaker
        );
    }
}
