//! Turns raw cycles and events into labelled, wall-clock records.
//!
//! Records only carry seconds-since-midnight, so every decoder needs the
//! day they belong to and the offset used to get from UTC to local time.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::codes;
use crate::error::DecodeError;
use crate::history::{RawCycle, RawEvent};

/// Offset applied to every timestamp: US Eastern, standard time, regardless of date.
pub const TZ_OFFSET: i64 = -18000;

const TIME_FORMAT: &str = "%a, %m/%d/%Y %H:%M:%S";

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Seconds since the epoch with the local offset already added, so reading it
/// as UTC gives the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime(i64);

impl LocalTime {
    /// `None` when the sum doesn't fit in an `i64`.
    pub fn from_epoch(epoch: i64, tz_offset: i64) -> Option<Self> {
        epoch.checked_add(tz_offset).map(LocalTime)
    }

    /// Like [`from_epoch`](Self::from_epoch), pinned to the nearest representable second instead.
    pub fn saturating_from_epoch(epoch: i64, tz_offset: i64) -> Self {
        LocalTime(epoch.saturating_add(tz_offset))
    }

    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn wall_clock(self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.0, 0).map(|utc| utc.naive_utc())
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wall_clock() {
            Some(time) => write!(f, "{}", time.format(TIME_FORMAT)),
            // far outside chrono's range; still say something
            None => write!(f, "@{}", self.0),
        }
    }
}

/// Midnight at the start of `date`, read as UTC.
pub fn midnight_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCycle {
    pub label: String,
    pub start: LocalTime,
    pub end: LocalTime,
    pub duration_seconds: i64,
}

impl DecodedCycle {
    pub fn hours(&self) -> f64 {
        self.duration_seconds as f64 / 3600.0
    }
}

impl fmt::Display for DecodedCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {} ({:.2} hours)",
            self.label,
            self.start,
            self.end,
            self.hours()
        )
    }
}

pub fn decode_cycle(cycle: &RawCycle, date: NaiveDate, tz_offset: i64) -> DecodedCycle {
    // garbage offsets clamp rather than fail; a cycle always decodes
    let start = LocalTime::saturating_from_epoch(
        midnight_epoch(date).saturating_add(cycle.start),
        tz_offset,
    );
    DecodedCycle {
        label: codes::or_blank(codes::cycle_type, cycle.kind).to_string(),
        start,
        end: LocalTime(start.0.saturating_add(cycle.duration)),
        duration_seconds: cycle.duration,
    }
}

/// When an event applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Range { start: LocalTime, end: LocalTime },
    At(LocalTime),
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Range { start, end } => write!(f, "from {} - {}", start, end),
            Window::At(time) => write!(f, "at {}", time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    /// The mode description: the event type, i.e. which mode the thermostat was put in.
    pub label: String,
    pub actor: String,
    pub location: String,
    pub continuation: bool,
    pub heat_temp_f: f64,
    pub cool_temp_f: f64,
    pub window: Window,
}

impl fmt::Display for DecodedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the stray quote at the end is part of the established format
        write!(
            f,
            "A(n) '{}' event occurred {} due to '{}' from '{}', \
             changing the temperature range to {:?} (heat) and {:?} (cool)'",
            self.label, self.window, self.actor, self.location, self.heat_temp_f, self.cool_temp_f
        )
    }
}

fn event_window(event: &RawEvent, date: NaiveDate, tz_offset: i64) -> Result<Window, DecodeError> {
    let local = |base: i64, seconds: i64| {
        base.checked_add(seconds)
            .and_then(|epoch| LocalTime::from_epoch(epoch, tz_offset))
            .ok_or(DecodeError::OutOfRange { seconds })
    };
    match (event.start, event.end, event.touched_when) {
        (Some(start), Some(end), _) => {
            let midnight = midnight_epoch(date);
            Ok(Window::Range {
                start: local(midnight, start)?,
                end: local(midnight, end)?,
            })
        }
        (Some(start), None, _) => Err(DecodeError::MissingEnd { start }),
        (None, _, Some(when)) => Ok(Window::At(local(0, when)?)),
        (None, _, None) => Err(DecodeError::MissingTime),
    }
}

pub fn decode_event(
    event: &RawEvent,
    date: NaiveDate,
    tz_offset: i64,
) -> Result<DecodedEvent, DecodeError> {
    Ok(DecodedEvent {
        window: event_window(event, date, tz_offset)?,
        label: codes::or_blank(codes::event_type, event.kind).to_string(),
        actor: codes::or_blank(codes::touched_by, event.touched_by).to_string(),
        location: codes::or_blank(codes::touched_where, event.touched_where).to_string(),
        continuation: event.continuation,
        heat_temp_f: celsius_to_fahrenheit(event.heat_temp.unwrap_or(0.0)),
        cool_temp_f: celsius_to_fahrenheit(event.cool_temp.unwrap_or(0.0)),
    })
}
