//! Input device discovery.
//!
//! Walks the host's input devices (evdev on Linux) and picks the first one
//! whose name contains a pattern. Finding nothing is the normal state on a
//! host without a chatpad, so every path here returns `Option`, never an
//! error.

use std::path::PathBuf;

use log::{debug, info};

use super::listener::InputDevice;

/// What `--list-devices` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub path: PathBuf,
}

/// Return the first enumerated device whose name contains `pattern`
/// (case-sensitive). `None` when nothing matches or enumeration is not
/// available on this host.
pub fn find_device(pattern: &str) -> Option<InputDevice> {
    let found = select_first(enumerate(), pattern);
    match &found {
        Some(device) => info!("Found input device '{}' for pattern '{}'", device.name(), pattern),
        None => debug!("No input device matches '{}'", pattern),
    }
    found
}

/// Name and path of every enumerable input device.
pub fn list_devices() -> Vec<DeviceInfo> {
    enumerate()
        .map(|(_, device)| DeviceInfo {
            name: device.name().to_string(),
            path: device.path().to_path_buf(),
        })
        .collect()
}

/// First-match-wins substring selection over `(name, item)` pairs, in
/// enumeration order.
pub fn select_first<T>(
    candidates: impl IntoIterator<Item = (String, T)>,
    pattern: &str,
) -> Option<T> {
    candidates
        .into_iter()
        .find(|(name, _)| name.contains(pattern))
        .map(|(_, item)| item)
}

#[cfg(target_os = "linux")]
fn enumerate() -> impl Iterator<Item = (String, InputDevice)> {
    evdev::enumerate().map(|(path, device)| {
        let name = device.name().unwrap_or_default().to_string();
        (name.clone(), InputDevice::from_evdev(name, path, device))
    })
}

#[cfg(not(target_os = "linux"))]
fn enumerate() -> impl Iterator<Item = (String, InputDevice)> {
    debug!("Input device enumeration is not supported on this host");
    std::iter::empty()
}
