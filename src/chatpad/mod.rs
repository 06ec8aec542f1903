//! # Chatpad Input
//!
//! Keypad-style input devices (the Xbox 360 Chatpad in particular) that
//! show up as ordinary evdev devices on Linux.
//!
//! ```text
//! discovery::find_device("Chatpad") ──► InputListener ──► EventSink
//!                                           │
//!                                  keymap: scancode → key
//! ```
//!
//! Everything here degrades quietly: no device, no keymap file or an
//! unmapped scancode are all normal states, not errors.

pub mod discovery;
pub mod keymap;
pub mod listener;

pub use discovery::{DeviceInfo, find_device, list_devices};
pub use keymap::{KeyMapping, KeymapFormat};
pub use listener::{EventSource, InputDevice, InputListener, ListenerState, RawInputEvent};
