use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scheme::Scheme;

/// A service period as configured (§3, §6). `headway_minutes` starts
/// unset and is filled in once per scheme at simulation initialisation
/// (§4.2, §4.4.2): `round_half_to_even(loop_time_minutes / train_count)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServicePeriod {
    pub name: String,
    pub start_hour: u32,
    pub regular_train_count: u32,
    pub skip_stop_train_count: u32,
    #[serde(default)]
    pub headway_minutes: Option<f64>,
}

impl ServicePeriod {
    pub fn train_count(&self, scheme: Scheme) -> u32 {
        match scheme {
            Scheme::Regular => self.regular_train_count,
            Scheme::SkipStop => self.skip_stop_train_count,
        }
    }
}
