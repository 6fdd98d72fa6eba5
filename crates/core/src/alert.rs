//! Alert levels and the threshold classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::thresholds::ThresholdConfig;

/// Severity of a temperature reading, ordered `Normal < Warning < Danger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
    Danger,
}

impl AlertLevel {
    /// `true` for any level above [`AlertLevel::Normal`].
    pub fn is_alert(self) -> bool {
        self > AlertLevel::Normal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a temperature onto an alert band.
///
/// A value equal to a bound belongs to the more severe band. Values below the
/// normal floor are still [`AlertLevel::Normal`].
pub fn classify(temperature_celsius: f64, thresholds: &ThresholdConfig) -> AlertLevel {
    if temperature_celsius >= thresholds.danger() {
        AlertLevel::Danger
    } else if temperature_celsius >= thresholds.warning() {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig::new(0.0, 35.0, 45.0).unwrap()
    }

    #[test]
    fn bounds_belong_to_the_more_severe_band() {
        let t = thresholds();
        assert_eq!(classify(35.0, &t), AlertLevel::Warning);
        assert_eq!(classify(45.0, &t), AlertLevel::Danger);
        assert_eq!(classify(34.9, &t), AlertLevel::Normal);
        assert_eq!(classify(44.99, &t), AlertLevel::Warning);
    }

    #[test]
    fn below_floor_is_normal() {
        assert_eq!(classify(-12.0, &thresholds()), AlertLevel::Normal);
    }

    #[test]
    fn classification_is_deterministic() {
        let t = thresholds();
        for temp in [-5.0, 0.0, 20.0, 35.0, 40.0, 45.0, 60.0] {
            assert_eq!(classify(temp, &t), classify(temp, &t));
        }
    }

    #[test]
    fn collapsed_band_skips_warning() {
        let t = ThresholdConfig::new(0.0, 40.0, 40.0).unwrap();
        assert_eq!(classify(40.0, &t), AlertLevel::Danger);
        assert_eq!(classify(39.0, &t), AlertLevel::Normal);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(AlertLevel::Normal < AlertLevel::Warning);
        assert!(AlertLevel::Warning < AlertLevel::Danger);
        assert!(!AlertLevel::Normal.is_alert());
        assert!(AlertLevel::Danger.is_alert());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AlertLevel::Danger).unwrap(), "\"danger\"");
    }
}
