//! Lookups for the small integer codes the thermostat puts on the wire.
//!
//! Every table answers with an empty string for codes it doesn't know;
//! new firmware invents codes faster than we learn them.

/// The "fan" cycle value, which is also the mask applied before any cycle lookup.
pub const CYCLE_TYPE_FAN: i64 = 65535;

/// What kind of setpoint change an event records.
pub fn event_type(code: i64) -> &'static str {
    match code {
        0 => "Heat",
        1 => "Cool",
        2 => "Range",
        3 => "Away",
        4 => "Auto-Away",
        5 => "Off",
        6 => "Emergency Heat",
        7 => "Sunblock",
        _ => "",
    }
}

/// Who (or what) made a change: `touched_by`.
pub fn touched_by(code: i64) -> &'static str {
    match code {
        0 => "No one",
        1 => "Learning",
        2 => "Local",
        3 => "Remote",
        4 => "Web",
        5 => "Android",
        6 => "iOS",
        7 => "Windows Phone",
        8 => "Tune-up",
        9 => "Demand Response",
        10 => "Time-of-Use",
        11 => "Safety Shutoff",
        12 => "Programmer",
        _ => "",
    }
}

/// Where a change came from: `touched_where`.
pub fn touched_where(code: i64) -> &'static str {
    match code {
        0 => "Unknown",
        1 => "Schedule",
        2 => "Ad Hoc",
        _ => "",
    }
}

/// Coarse classification of an actor, as used by the vendor's own reports.
pub fn whodunit(code: i64) -> &'static str {
    match code {
        0 => "user",
        1 => "weather",
        2 => "away",
        3 => "auto",
        4 => "tuneup",
        5 => "auto_dehum",
        6 => "demand_response",
        7 => "time_of_use",
        _ => "",
    }
}

/// Label for a cycle's bitmask. The value is masked with [`CYCLE_TYPE_FAN`] first;
/// combined flags (e.g. heat + fan) have no entry and come back blank.
pub fn cycle_type(type_code: i64) -> &'static str {
    match type_code & CYCLE_TYPE_FAN {
        1 => "Heat (1)",
        2 => "Heat (2)",
        4 => "Auxiliary Heat",
        8 => "Heat (3)",
        16 => "Emergency Heat",
        32 => "Heat Alternate (1)",
        64 => "Heat Alternate (2)",
        256 => "Cool (1)",
        512 => "Cool (2)",
        1024 => "Airwaive",
        16384 => "Humidifier",
        32768 => "Dehumidifier",
        CYCLE_TYPE_FAN => "Fan",
        _ => "",
    }
}

/// Applies a table to a code that may be missing from the record.
#[inline]
pub fn or_blank(table: fn(i64) -> &'static str, code: Option<i64>) -> &'static str {
    code.map(table).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_bits_resolve_directly() {
        for (bit, label) in [
            (1, "Heat (1)"),
            (4, "Auxiliary Heat"),
            (256, "Cool (1)"),
            (1024, "Airwaive"),
            (32768, "Dehumidifier"),
            (CYCLE_TYPE_FAN, "Fan"),
        ] {
            assert_eq!(cycle_type(bit), label);
        }
    }

    #[test]
    fn unknown_cycle_patterns_are_blank() {
        assert_eq!(cycle_type(0), "");
        assert_eq!(cycle_type(128), "");
        // heat stage one running alongside cool stage one
        assert_eq!(cycle_type(1 | 256), "");
        assert_eq!(cycle_type(-1), "Fan");
    }

    #[test]
    fn mask_drops_bits_above_the_fan_range() {
        assert_eq!(cycle_type(65536 | 256), "Cool (1)");
    }

    #[test]
    fn enum_tables() {
        assert_eq!(event_type(7), "Sunblock");
        assert_eq!(event_type(8), "");
        assert_eq!(touched_by(0), "No one");
        assert_eq!(touched_by(12), "Programmer");
        assert_eq!(touched_by(13), "");
        assert_eq!(touched_where(2), "Ad Hoc");
        assert_eq!(touched_where(-1), "");
        assert_eq!(whodunit(5), "auto_dehum");
        assert_eq!(whodunit(99), "");
    }

    #[test]
    fn missing_codes_are_blank() {
        assert_eq!(or_blank(event_type, None), "");
        assert_eq!(or_blank(event_type, Some(0)), "Heat");
    }
}
