//! # Core Remote Logic
//!
//! Pointer geometry, key bindings, keymaps and configuration.
//! It knows nothing about the terminal or the device bridge.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Session (state)      │
//!                    │  • Keymaps (actions)    │
//!                    │  • Geometry (preview)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                   ┌────────────┴────────────┐
//!                   ▼                         ▼
//!            ┌────────────┐            ┌────────────┐
//!            │    TUI     │            │   Device   │
//!            │ Controller │───────────▶│   (adb)    │
//!            │ (ratatui)  │            │            │
//!            └────────────┘            └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `Session` struct, all mutable state in one place
//! - [`action`]: Keys, actions and the per-mode keymaps
//! - [`geometry`]: Preview box sizing and pointer-to-cell mapping
//! - [`pointer`]: The clamped virtual pointer and its drag anchor
//! - [`bindings`]: Custom key slots
//! - [`keycode`]: Android key codes and captured-key resolution
//! - [`config`]: Layered configuration

pub mod action;
pub mod bindings;
pub mod config;
pub mod geometry;
pub mod keycode;
pub mod pointer;
pub mod state;
