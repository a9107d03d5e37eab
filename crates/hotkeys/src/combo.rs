//! Symbolic key combinations.
//!
//! A combination is written as `+`-separated key names, for example
//! `"num 0+num 5"` or `"ctrl+alt+q"`. Names are case-insensitive and
//! surrounding whitespace is ignored. Order does not matter: `"alt+ctrl+q"`
//! and `"ctrl+alt+q"` are the same combination.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HotkeyError;

/// Named keys with their accepted aliases. The first entry is canonical.
const NAMED_KEYS: &[&[&str]] = &[
    &["space", "spacebar"],
    &["enter", "return"],
    &["tab"],
    &["esc", "escape"],
    &["backspace"],
    &["delete", "del"],
    &["insert", "ins"],
    &["home"],
    &["end"],
    &["page up", "pageup", "pgup"],
    &["page down", "pagedown", "pgdn"],
    &["up"],
    &["down"],
    &["left"],
    &["right"],
    &["print screen", "printscreen"],
    &["pause"],
    &["caps lock", "capslock"],
    &["num lock", "numlock"],
    &["scroll lock", "scrolllock"],
];

/// One key in a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Control modifier
    Ctrl,
    /// Alt modifier
    Alt,
    /// Shift modifier
    Shift,
    /// Windows / super modifier
    Win,
    /// Letter or top-row digit, lowercase
    Char(char),
    /// Numpad digit `0..=9`
    Numpad(u8),
    /// Numpad `+`
    Add,
    /// Numpad `-`
    Subtract,
    /// Numpad `*`
    Multiply,
    /// Numpad `/`
    Divide,
    /// Numpad `.`
    Decimal,
    /// Function key `1..=24`
    F(u8),
    /// Other named key, canonical name
    Named(&'static str),
}

impl Key {
    /// Whether this key is a modifier.
    pub fn is_modifier(self) -> bool {
        matches!(self, Self::Ctrl | Self::Alt | Self::Shift | Self::Win)
    }

    /// Parse one normalized (lowercase, single-spaced) key name.
    fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ctrl" | "control" => Self::Ctrl,
            "alt" => Self::Alt,
            "shift" => Self::Shift,
            "win" | "windows" | "super" | "cmd" => Self::Win,
            "add" | "plus" => Self::Add,
            "subtract" | "minus" => Self::Subtract,
            "multiply" => Self::Multiply,
            "divide" => Self::Divide,
            "decimal" => Self::Decimal,
            _ => {
                return Self::numpad(name)
                    .or_else(|| Self::function(name))
                    .or_else(|| Self::single(name))
                    .or_else(|| Self::named(name));
            }
        };
        Some(key)
    }

    fn numpad(name: &str) -> Option<Self> {
        let digit = name
            .strip_prefix("num ")
            .or_else(|| name.strip_prefix("numpad "))?;
        let mut chars = digit.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c
                .to_digit(10)
                .and_then(|d| u8::try_from(d).ok())
                .map(Self::Numpad),
            _ => None,
        }
    }

    fn function(name: &str) -> Option<Self> {
        let n: u8 = name.strip_prefix('f')?.parse().ok()?;
        (1..=24).contains(&n).then_some(Self::F(n))
    }

    fn single(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Some(Self::Char(c)),
            _ => None,
        }
    }

    fn named(name: &str) -> Option<Self> {
        NAMED_KEYS
            .iter()
            .find(|aliases| aliases.contains(&name))
            .and_then(|aliases| aliases.first().copied())
            .map(Self::Named)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ctrl => f.write_str("ctrl"),
            Self::Alt => f.write_str("alt"),
            Self::Shift => f.write_str("shift"),
            Self::Win => f.write_str("win"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Numpad(d) => write!(f, "num {d}"),
            Self::Add => f.write_str("add"),
            Self::Subtract => f.write_str("subtract"),
            Self::Multiply => f.write_str("multiply"),
            Self::Divide => f.write_str("divide"),
            Self::Decimal => f.write_str("decimal"),
            Self::F(n) => write!(f, "f{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A set of keys pressed together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Combo {
    /// Sorted, modifiers first, no duplicates
    keys: Vec<Key>,
}

impl Combo {
    /// Parse a combination string.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::InvalidCombo`] for an empty combination, an empty or
    /// unknown key name, a repeated key, or a combination of modifiers only.
    pub fn parse(text: &str) -> Result<Self, HotkeyError> {
        if text.trim().is_empty() {
            return Err(HotkeyError::invalid_combo(text, "empty combination"));
        }

        let mut keys = Vec::new();
        for part in text.split('+') {
            let name = part
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_ascii_lowercase();
            if name.is_empty() {
                return Err(HotkeyError::invalid_combo(text, "empty key name"));
            }
            let key = Key::from_name(&name)
                .ok_or_else(|| HotkeyError::invalid_combo(text, format!("unknown key {name:?}")))?;
            if keys.contains(&key) {
                return Err(HotkeyError::invalid_combo(text, format!("key {key} repeated")));
            }
            keys.push(key);
        }

        if keys.iter().all(|k| k.is_modifier()) {
            return Err(HotkeyError::invalid_combo(text, "modifiers only"));
        }
        keys.sort_unstable();
        Ok(Self { keys })
    }

    /// Keys in canonical order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl FromStr for Combo {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Combo {
    type Error = HotkeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Combo> for String {
    fn from(combo: Combo) -> Self {
        combo.to_string()
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}
