use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::StructuralError;

/// Body of the subscribe response that carries the energy history.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnergyHistory {
    pub objects: Vec<HistoryObject>,
}

impl EnergyHistory {
    pub fn from_value(value: Value) -> Result<Self, StructuralError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StructuralError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The days of the first object; the service only ever puts one energy object in front.
    pub fn days(&self) -> Result<&[Day], StructuralError> {
        self.objects
            .first()
            .map(|obj| obj.value.days.as_slice())
            .ok_or(StructuralError::NoHistoryObject)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HistoryObject {
    // energy_latest.<serial>
    #[serde(default)]
    pub object_key: String,
    pub value: HistoryValue,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HistoryValue {
    pub days: Vec<Day>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Day {
    // 2015-05-01
    pub day: String,
    pub cycles: Vec<RawCycle>,
    pub events: Vec<RawEvent>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RawCycle {
    // bitmask, see codes::cycle_type
    #[serde(rename = "type", default, deserialize_with = "lenient_code")]
    pub kind: Option<i64>,
    // seconds since midnight
    pub start: i64,
    pub duration: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RawEvent {
    #[serde(rename = "type", default, deserialize_with = "lenient_code")]
    pub kind: Option<i64>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub touched_by: Option<i64>,
    #[serde(default, deserialize_with = "lenient_code")]
    pub touched_where: Option<i64>,

    #[serde(default)]
    pub continuation: bool,

    // celsius
    #[serde(default)]
    pub heat_temp: Option<f64>,
    #[serde(default)]
    pub cool_temp: Option<f64>,

    // seconds since midnight, for events describing a range
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,

    // unix time, for one-off touches
    #[serde(default)]
    pub touched_when: Option<i64>,
}

/// Codes that aren't integers are treated the same as missing ones.
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn odd_codes_become_none() {
        let cycle: RawCycle =
            serde_json::from_value(json!({"type": "heat", "start": 0, "duration": 10})).unwrap();
        assert_eq!(cycle.kind, None);

        let cycle: RawCycle =
            serde_json::from_value(json!({"start": 0, "duration": 10})).unwrap();
        assert_eq!(cycle.kind, None);
    }

    #[test]
    fn event_defaults() {
        let event: RawEvent = serde_json::from_value(json!({"touched_when": 1432216065})).unwrap();
        assert!(!event.continuation);
        assert_eq!(event.heat_temp, None);
        assert_eq!(event.start, None);
        assert_eq!(event.touched_when, Some(1432216065));
    }

    #[test]
    fn day_without_events_is_structural() {
        let err = EnergyHistory::from_value(json!({
            "objects": [{"value": {"days": [{"day": "2015-05-01", "cycles": []}]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, StructuralError::Payload(_)));
    }

    #[test]
    fn day_without_date_is_structural() {
        let err = EnergyHistory::from_value(json!({
            "objects": [{"value": {"days": [{"cycles": [], "events": []}]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, StructuralError::Payload(_)));
    }

    #[test]
    fn day_without_cycles_is_structural() {
        let err = EnergyHistory::from_value(json!({
            "objects": [{"value": {"days": [{"day": "2015-05-01", "events": []}]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, StructuralError::Payload(_)));
    }

    #[test]
    fn empty_object_list() {
        let history = EnergyHistory::from_value(json!({"objects": []})).unwrap();
        assert!(matches!(
            history.days(),
            Err(StructuralError::NoHistoryObject)
        ));
    }
}
