//! # Custom Key Bindings
//!
//! Nine slots, `c1` through `c9`, each holding a device key code captured
//! from the phone. Bindings live for the process lifetime only.

use std::collections::BTreeMap;
use std::fmt;

/// A custom-key slot, 1 through 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

impl Slot {
    pub fn new(index: u8) -> Option<Self> {
        (1..=9).contains(&index).then_some(Self(index))
    }

    /// Parses the digit typed at a slot prompt.
    pub fn from_digit(c: char) -> Option<Self> {
        c.to_digit(10).and_then(|d| Self::new(d as u8))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Debug, Default, Clone)]
pub struct KeyBindingRegistry {
    bindings: BTreeMap<Slot, String>,
}

impl KeyBindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `code` to `slot`, returning the code it replaced.
    pub fn bind(&mut self, slot: Slot, code: impl Into<String>) -> Option<String> {
        self.bindings.insert(slot, code.into())
    }

    pub fn lookup(&self, slot: Slot) -> Option<&str> {
        self.bindings.get(&slot).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.bindings.iter().map(|(slot, code)| (*slot, code.as_str()))
    }
}
