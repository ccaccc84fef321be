//! Race records as returned by the games API.
//!
//! The API and the cache files share one flat JSON shape with abbreviated keys:
//!
//! | key   | field               |
//! |-------|---------------------|
//! | `wpm` | `words_per_minute`  |
//! | `ac`  | `accuracy`          |
//! | `r`   | `rank`              |
//! | `t`   | `epoch_timestamp`   |
//! | `sl`  | `speedometer_level` |
//! | `tid` | `text_id`           |
//! | `gn`  | `game_number`       |
//! | `np`  | `number_of_players` |
//! | `pts` | `points`            |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CollectionError, Result};

/// One completed race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    #[serde(rename = "wpm")]
    pub words_per_minute: f64,

    #[serde(rename = "ac")]
    pub accuracy: f64,

    #[serde(rename = "r")]
    pub rank: i64,

    /// Seconds since the Unix epoch, with sub-second precision.
    #[serde(rename = "t")]
    pub epoch_timestamp: f64,

    #[serde(rename = "sl")]
    pub speedometer_level: String,

    #[serde(rename = "tid")]
    pub text_id: i64,

    #[serde(rename = "gn")]
    pub game_number: i64,

    #[serde(rename = "np")]
    pub number_of_players: i64,

    #[serde(rename = "pts")]
    pub points: f64,
}

/// Decode a payload that was written by the API or by the cache.
///
/// A JSON array decodes into its races. A JSON object decodes into no races:
/// that is the placeholder cached for windows whose response was not JSON.
/// Anything else, including an array with a malformed race, is a decode error.
pub fn decode_races(text: &str) -> Result<Vec<Race>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CollectionError::decode_error("race payload", e.to_string()))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| CollectionError::decode_error("race record", e.to_string())),
        Value::Object(_) => Ok(Vec::new()),
        other => Err(CollectionError::decode_error(
            "race payload",
            format!("expected an array of races, found {}", json_kind(&other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
