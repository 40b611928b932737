use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for confidence scoring. The 0.6 cutoff is a starting point, not a
/// contract; override with `SKYBOOK_MIN_CONFIDENCE`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub min_confidence: f64,
    pub origin_weight: f64,
    pub destination_weight: f64,
    pub date_weight: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            origin_weight: 0.4,
            destination_weight: 0.4,
            date_weight: 0.2,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let read = |key: &'static str, fallback: f64| -> Result<f64, ConfigError> {
            match lookup(key) {
                Some(raw) if !raw.trim().is_empty() => {
                    raw.trim()
                        .parse::<f64>()
                        .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
                }
                _ => Ok(fallback),
            }
        };

        Self {
            min_confidence: read("SKYBOOK_MIN_CONFIDENCE", defaults.min_confidence)?,
            origin_weight: read("SKYBOOK_ORIGIN_WEIGHT", defaults.origin_weight)?,
            destination_weight: read("SKYBOOK_DESTINATION_WEIGHT", defaults.destination_weight)?,
            date_weight: read("SKYBOOK_DATE_WEIGHT", defaults.date_weight)?,
        }
        .validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::ThresholdOutOfRange(self.min_confidence));
        }

        for (name, weight) in [
            ("origin_weight", self.origin_weight),
            ("destination_weight", self.destination_weight),
            ("date_weight", self.date_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight(name));
            }
        }

        if self.max_weight() <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }

        Ok(self)
    }

    pub fn max_weight(&self) -> f64 {
        self.origin_weight + self.destination_weight + self.date_weight
    }
}
