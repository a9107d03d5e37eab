//! Hotkey to action table.

use firerate_bridge::FeatureSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combo::Combo;
use crate::error::HotkeyError;

/// What a bound hotkey does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Store `value`, clamped
    Set {
        /// Bridge feature name
        feature: String,
        /// Target value
        value: f64,
    },
    /// Add `delta` to the current value, clamped
    Adjust {
        /// Bridge feature name
        feature: String,
        /// Signed step
        delta: f64,
    },
    /// Start or stop random mode
    ToggleRandom,
    /// Shut the override layer down
    Quit,
}

impl Action {
    fn feature(&self) -> Option<(&str, f64)> {
        match self {
            Self::Set { feature, value } => Some((feature.as_str(), *value)),
            Self::Adjust { feature, delta } => Some((feature.as_str(), *delta)),
            Self::ToggleRandom | Self::Quit => None,
        }
    }
}

/// One configured binding, combination still in text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Combination, e.g. `"num 0+num 5"`
    pub combo: String,
    /// Bound action
    #[serde(flatten)]
    pub action: Action,
}

impl BindingConfig {
    /// Binding for `combo` performing `action`.
    pub fn new(combo: impl Into<String>, action: Action) -> Self {
        Self {
            combo: combo.into(),
            action,
        }
    }
}

/// Validated bindings, ready for dispatch.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(Combo, Action)>,
    index: HashMap<Combo, usize>,
}

impl Bindings {
    /// Parse and validate every binding plus the quit combination.
    ///
    /// Nothing is bound unless everything validates.
    ///
    /// # Errors
    ///
    /// [`HotkeyError::InvalidCombo`], [`HotkeyError::UnknownFeature`],
    /// [`HotkeyError::InvalidAmount`] or [`HotkeyError::DuplicateBinding`]
    /// for the first offending entry.
    pub fn from_config(
        bindings: &[BindingConfig],
        quit: &str,
        features: &[FeatureSpec],
    ) -> Result<Self, HotkeyError> {
        let mut table = Self::default();
        for binding in bindings {
            let combo = Combo::parse(&binding.combo)?;
            if let Some((feature, amount)) = binding.action.feature() {
                if !features.iter().any(|f| f.name == feature) {
                    return Err(HotkeyError::UnknownFeature {
                        combo: combo.to_string(),
                        feature: feature.to_string(),
                    });
                }
                if !amount.is_finite() {
                    return Err(HotkeyError::InvalidAmount {
                        combo: combo.to_string(),
                        amount,
                    });
                }
            }
            table.insert(combo, binding.action.clone())?;
        }
        table.insert(Combo::parse(quit)?, Action::Quit)?;
        Ok(table)
    }

    fn insert(&mut self, combo: Combo, action: Action) -> Result<(), HotkeyError> {
        if self.index.contains_key(&combo) {
            return Err(HotkeyError::DuplicateBinding(combo.to_string()));
        }
        self.index.insert(combo.clone(), self.entries.len());
        self.entries.push((combo, action));
        Ok(())
    }

    /// Action bound to `combo`.
    pub fn lookup(&self, combo: &Combo) -> Option<&Action> {
        self.index
            .get(combo)
            .and_then(|&i| self.entries.get(i))
            .map(|(_, action)| action)
    }

    /// Bindings in configuration order, quit last.
    pub fn iter(&self) -> impl Iterator<Item = (&Combo, &Action)> {
        self.entries.iter().map(|(combo, action)| (combo, action))
    }

    /// Number of bindings including quit.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
