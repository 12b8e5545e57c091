//! # Device Bridge
//!
//! The [`Device`] trait is the only way the remote reaches the phone.
//! [`AdbDevice`] implements it by shelling out to `adb`; tests substitute
//! recording fakes.

pub mod adb;
pub mod bridge;
pub mod capture;

pub use adb::{AdbDevice, AttachedDevice};
pub use bridge::{Device, DeviceError, EventLines};
pub use capture::{CaptureError, CapturedKeyEvent, capture_key_press};
