//! adb-remote library exports for testing

pub mod core;
pub mod device;
pub mod tui;

#[cfg(test)]
pub mod test_support;
