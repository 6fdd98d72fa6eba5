//! Temperature threshold configuration.
//!
//! A [`ThresholdConfig`] holds the lower bound of each alert band. It can only
//! be constructed through [`ThresholdConfig::new`] (or deserialization, which
//! goes through the same check), so every value in circulation satisfies
//! `normal <= warning <= danger`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::LocationId;

pub const DEFAULT_NORMAL_FLOOR_C: f64 = 0.0;
pub const DEFAULT_WARNING_C: f64 = 30.0;
pub const DEFAULT_DANGER_C: f64 = 35.0;

/// Lower bounds of the three alert bands, in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdBounds")]
pub struct ThresholdConfig {
    normal: f64,
    warning: f64,
    danger: f64,
}

/// Unvalidated bounds as they arrive from user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    pub normal: f64,
    pub warning: f64,
    pub danger: f64,
}

impl TryFrom<ThresholdBounds> for ThresholdConfig {
    type Error = CoreError;

    fn try_from(raw: ThresholdBounds) -> Result<Self, Self::Error> {
        Self::new(raw.normal, raw.warning, raw.danger)
    }
}

impl From<ThresholdConfig> for ThresholdBounds {
    fn from(config: ThresholdConfig) -> Self {
        Self {
            normal: config.normal,
            warning: config.warning,
            danger: config.danger,
        }
    }
}

impl ThresholdConfig {
    /// Validate and build a configuration.
    ///
    /// Bounds must be finite and non-decreasing by severity. Equal bounds are
    /// allowed and collapse the band between them.
    pub fn new(normal: f64, warning: f64, danger: f64) -> Result<Self, CoreError> {
        for (name, value) in [("normal", normal), ("warning", warning), ("danger", danger)] {
            if !value.is_finite() {
                return Err(CoreError::InvalidThresholds(format!(
                    "{name} bound must be a finite number, got {value}"
                )));
            }
        }
        if normal > warning {
            return Err(CoreError::InvalidThresholds(format!(
                "normal bound {normal} exceeds warning bound {warning}"
            )));
        }
        if warning > danger {
            return Err(CoreError::InvalidThresholds(format!(
                "warning bound {warning} exceeds danger bound {danger}"
            )));
        }
        Ok(Self {
            normal,
            warning,
            danger,
        })
    }

    pub fn normal(&self) -> f64 {
        self.normal
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn danger(&self) -> f64 {
        self.danger
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            normal: DEFAULT_NORMAL_FLOOR_C,
            warning: DEFAULT_WARNING_C,
            danger: DEFAULT_DANGER_C,
        }
    }
}

/// Global thresholds plus optional per-location overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdSet {
    global: ThresholdConfig,
    overrides: HashMap<LocationId, ThresholdConfig>,
}

impl ThresholdSet {
    pub fn new(global: ThresholdConfig) -> Self {
        Self {
            global,
            overrides: HashMap::new(),
        }
    }

    pub fn global(&self) -> ThresholdConfig {
        self.global
    }

    /// Thresholds in effect for `location_id`.
    pub fn for_location(&self, location_id: &LocationId) -> ThresholdConfig {
        self.overrides
            .get(location_id)
            .copied()
            .unwrap_or(self.global)
    }

    pub fn set_global(&mut self, config: ThresholdConfig) {
        self.global = config;
    }

    /// Set or clear (`None`) the override for one location.
    pub fn set_override(&mut self, location_id: LocationId, config: Option<ThresholdConfig>) {
        match config {
            Some(config) => {
                self.overrides.insert(location_id, config);
            }
            None => {
                self.overrides.remove(&location_id);
            }
        }
    }

    pub fn has_override(&self, location_id: &LocationId) -> bool {
        self.overrides.contains_key(location_id)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn accepts_ordered_bounds() {
        let t = ThresholdConfig::new(0.0, 35.0, 45.0).unwrap();
        assert_eq!((t.normal(), t.warning(), t.danger()), (0.0, 35.0, 45.0));
    }

    #[test]
    fn accepts_equal_bounds() {
        assert!(ThresholdConfig::new(30.0, 30.0, 30.0).is_ok());
    }

    #[test]
    fn rejects_warning_above_danger() {
        assert_matches!(
            ThresholdConfig::new(0.0, 46.0, 45.0),
            Err(CoreError::InvalidThresholds(msg)) if msg.contains("warning")
        );
    }

    #[test]
    fn rejects_normal_above_warning() {
        assert_matches!(
            ThresholdConfig::new(40.0, 35.0, 45.0),
            Err(CoreError::InvalidThresholds(_))
        );
    }

    #[test]
    fn rejects_non_finite() {
        assert!(ThresholdConfig::new(f64::NAN, 35.0, 45.0).is_err());
        assert!(ThresholdConfig::new(0.0, 35.0, f64::INFINITY).is_err());
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok: ThresholdConfig =
            serde_json::from_str(r#"{"normal":0,"warning":35,"danger":45}"#).unwrap();
        assert_eq!(ok.danger(), 45.0);

        let bad = serde_json::from_str::<ThresholdConfig>(r#"{"normal":0,"warning":50,"danger":45}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn override_takes_precedence_and_can_be_cleared() {
        let mut set = ThresholdSet::default();
        let id = LocationId::from("amazon");
        let hot = ThresholdConfig::new(10.0, 38.0, 42.0).unwrap();

        set.set_override(id.clone(), Some(hot));
        assert_eq!(set.for_location(&id), hot);
        assert_eq!(set.for_location(&"sherwood".into()), ThresholdConfig::default());

        set.set_override(id.clone(), None);
        assert!(!set.has_override(&id));
        assert_eq!(set.for_location(&id), ThresholdConfig::default());
    }
}
