use std::fmt;

use model::scheme::{Scheme, ServiceType};
use model::service_period::ServicePeriod;
use serde::{Deserialize, Serialize};

/// Malformed configuration: missing field, station count mismatch,
/// scheme-pattern length mismatch (§7 `ConfigError`). Fails the run before
/// any event is scheduled.
#[derive(Debug)]
pub enum ConfigError {
    Malformed(serde_json::Error),
    StationDistanceCountMismatch { stations: usize, distances: usize },
    SchemePatternMissing,
    SchemePatternLengthMismatch { stations: usize, pattern: usize },
    TooFewStations(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(why) => write!(f, "malformed configuration: {why}"),
            Self::StationDistanceCountMismatch { stations, distances } => write!(
                f,
                "expected {} station distances for {} stations, got {}",
                stations.saturating_sub(1),
                stations,
                distances
            ),
            Self::SchemePatternMissing => {
                write!(f, "schemePattern is required for the SKIP-STOP scheme")
            }
            Self::SchemePatternLengthMismatch { stations, pattern } => write!(
                f,
                "schemePattern has {pattern} entries, expected {stations} (one per station)"
            ),
            Self::TooFewStations(count) => {
                write!(f, "a line needs at least 2 stations, got {count}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(why: serde_json::Error) -> Self {
        Self::Malformed(why)
    }
}

/// The configuration input contract consumed by the simulator (§6). Unknown
/// fields are rejected per §9 ("a typed configuration record... Unknown
/// fields are an error").
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    pub dwell_time: u32,
    pub turnaround_time: u32,
    pub acceleration: f64,
    pub deceleration: f64,
    pub max_speed: f64,
    pub max_capacity: u32,
    pub scheme_type: Scheme,
    pub station_names: Vec<String>,
    pub station_distances: Vec<f64>,
    #[serde(default)]
    pub scheme_pattern: Option<Vec<ServiceType>>,
    pub service_periods: Vec<ServicePeriod>,
    #[serde(default = "default_passthrough_speed")]
    pub passthrough_speed: f64,
    #[serde(default = "default_zone_length")]
    pub zone_length: f64,
}

fn default_passthrough_speed() -> f64 {
    20.0
}

fn default_zone_length() -> f64 {
    130.0
}

const KMH_TO_MPS: f64 = 1000.0 / 3600.0;

impl Configuration {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Configuration = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_for_scheme(self.scheme_type)
    }

    /// Validates this configuration for running a specific scheme, which may
    /// differ from `scheme_type` when the same configuration drives both the
    /// REGULAR and SKIP-STOP runs of a line (`scheme_type` then names only
    /// the scheme the file was authored for; `schemePattern`, if present, is
    /// consulted whenever `scheme` is SKIP-STOP regardless).
    pub fn validate_for_scheme(&self, scheme: Scheme) -> Result<(), ConfigError> {
        let stations = self.station_names.len();
        if stations < 2 {
            return Err(ConfigError::TooFewStations(stations));
        }
        if self.station_distances.len() != stations - 1 {
            return Err(ConfigError::StationDistanceCountMismatch {
                stations,
                distances: self.station_distances.len(),
            });
        }
        if scheme == Scheme::SkipStop {
            match &self.scheme_pattern {
                None => return Err(ConfigError::SchemePatternMissing),
                Some(pattern) if pattern.len() != stations => {
                    return Err(ConfigError::SchemePatternLengthMismatch {
                        stations,
                        pattern: pattern.len(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn cruising_speed_mps(&self) -> f64 {
        self.max_speed * KMH_TO_MPS
    }

    pub fn passthrough_speed_mps(&self) -> f64 {
        self.passthrough_speed * KMH_TO_MPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(scheme: &str, pattern: Option<&str>) -> String {
        format!(
            r#"{{
                "dwellTime": 30,
                "turnaroundTime": 60,
                "acceleration": 1.0,
                "deceleration": 1.0,
                "maxSpeed": 60.0,
                "maxCapacity": 100,
                "schemeType": "{scheme}",
                "stationNames": ["A", "B", "C"],
                "stationDistances": [1.0, 1.0],
                {pattern_field}
                "servicePeriods": []
            }}"#,
            scheme = scheme,
            pattern_field = pattern
                .map(|p| format!(r#""schemePattern": {p},"#))
                .unwrap_or_default(),
        )
    }

    #[test]
    fn regular_scheme_does_not_need_a_pattern() {
        let config = Configuration::from_json(&sample_json("REGULAR", None)).unwrap();
        assert_eq!(config.station_names.len(), 3);
    }

    #[test]
    fn skip_stop_without_pattern_is_rejected() {
        let err = Configuration::from_json(&sample_json("SKIP-STOP", None)).unwrap_err();
        assert!(matches!(err, ConfigError::SchemePatternMissing));
    }

    #[test]
    fn skip_stop_with_wrong_length_pattern_is_rejected() {
        let err =
            Configuration::from_json(&sample_json("SKIP-STOP", Some(r#"["AB", "A"]"#)))
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SchemePatternLengthMismatch { .. }
        ));
    }

    #[test]
    fn mismatched_distance_count_is_rejected() {
        let bad = r#"{
            "dwellTime": 30,
            "turnaroundTime": 60,
            "acceleration": 1.0,
            "deceleration": 1.0,
            "maxSpeed": 60.0,
            "maxCapacity": 100,
            "schemeType": "REGULAR",
            "stationNames": ["A", "B", "C"],
            "stationDistances": [1.0],
            "servicePeriods": []
        }"#;
        let err = Configuration::from_json(bad).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::StationDistanceCountMismatch { .. }
        ));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let bad = r#"{
            "dwellTime": 30,
            "turnaroundTime": 60,
            "acceleration": 1.0,
            "deceleration": 1.0,
            "maxSpeed": 60.0,
            "maxCapacity": 100,
            "schemeType": "REGULAR",
            "stationNames": ["A", "B"],
            "stationDistances": [1.0],
            "servicePeriods": [],
            "notAField": true
        }"#;
        assert!(Configuration::from_json(bad).is_err());
    }
}
