//! Per-day processing of a whole history payload.

use std::collections::BTreeMap;
use std::fmt;
use std::thread;

use chrono::{DateTime, NaiveDate};
use log::{info, warn};

use crate::decode::{decode_cycle, decode_event, DecodedCycle, DecodedEvent, TZ_OFFSET};
use crate::error::StructuralError;
use crate::history::{Day, EnergyHistory};

/// Seconds spent in each cycle label over one day. Labels never seen are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyTotals(BTreeMap<String, i64>);

impl DailyTotals {
    pub fn add(&mut self, label: &str, seconds: i64) {
        let total = self.0.entry(label.to_string()).or_default();
        *total = total.saturating_add(seconds);
    }

    pub fn seconds(&self, label: &str) -> Option<i64> {
        self.0.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(label, secs)| (label.as_str(), *secs))
    }

    pub fn hours(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().map(|(label, secs)| (label, secs as f64 / 3600.0))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a DecodedCycle> for DailyTotals {
    fn from_iter<I: IntoIterator<Item = &'a DecodedCycle>>(cycles: I) -> Self {
        let mut totals = DailyTotals::default();
        for cycle in cycles {
            totals.add(&cycle.label, cycle.duration_seconds);
        }
        totals
    }
}

pub fn aggregate(cycles: &[DecodedCycle]) -> DailyTotals {
    cycles.iter().collect()
}

/// Everything decoded for one day of history.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub date: NaiveDate,
    pub cycles: Vec<DecodedCycle>,
    pub events: Vec<DecodedEvent>,
    pub totals: DailyTotals,
    /// Events dropped because they couldn't be placed in time.
    pub skipped_events: usize,
}

impl DayReport {
    /// Cycle lines, then the totals, then event lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines =
            Vec::with_capacity(self.cycles.len() + self.totals.len() + self.events.len());
        lines.extend(self.cycles.iter().map(ToString::to_string));
        lines.extend(
            self.totals
                .hours()
                .map(|(label, hours)| format!("Total time for {}: {:.2} hours", label, hours)),
        );
        lines.extend(self.events.iter().map(ToString::to_string));
        lines
    }
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Accepts a bare date, or a full timestamp whose date part is used.
pub fn parse_day(day: &str) -> Result<NaiveDate, StructuralError> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d").or_else(|source| {
        DateTime::parse_from_rfc3339(day)
            .map(|stamp| stamp.date_naive())
            .map_err(|_| StructuralError::BadDate {
                day: day.to_string(),
                source,
            })
    })
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryProcessor {
    tz_offset: i64,
}

impl Default for HistoryProcessor {
    fn default() -> Self {
        HistoryProcessor {
            tz_offset: TZ_OFFSET,
        }
    }
}

impl HistoryProcessor {
    pub fn with_tz_offset(tz_offset: i64) -> Self {
        HistoryProcessor { tz_offset }
    }

    pub fn tz_offset(&self) -> i64 {
        self.tz_offset
    }

    pub fn process_day(&self, day: &Day) -> Result<DayReport, StructuralError> {
        let date = parse_day(&day.day)?;

        info!("Processing cycles for {}", date.format("%m/%d/%Y"));
        let cycles: Vec<DecodedCycle> = day
            .cycles
            .iter()
            .map(|cycle| decode_cycle(cycle, date, self.tz_offset))
            .collect();
        let totals = aggregate(&cycles);

        info!("Processing events for {}", date.format("%m/%d/%Y"));
        let mut events = Vec::with_capacity(day.events.len());
        let mut skipped_events = 0;
        for (idx, event) in day.events.iter().enumerate() {
            match decode_event(event, date, self.tz_offset) {
                Ok(decoded) => events.push(decoded),
                Err(e) => {
                    warn!("skipping event {} on {}: {}", idx, date, e);
                    skipped_events += 1;
                }
            }
        }

        Ok(DayReport {
            date,
            cycles,
            events,
            totals,
            skipped_events,
        })
    }

    pub fn process_days(&self, days: &[Day]) -> Result<Vec<DayReport>, StructuralError> {
        days.iter().map(|day| self.process_day(day)).collect()
    }

    pub fn process(&self, history: &EnergyHistory) -> Result<Vec<DayReport>, StructuralError> {
        self.process_days(history.days()?)
    }

    /// Same output as [`process`](Self::process), spread over the available cores.
    pub fn process_parallel(
        &self,
        history: &EnergyHistory,
    ) -> Result<Vec<DayReport>, StructuralError> {
        self.process_days_parallel(history.days()?)
    }

    /// Splits `days` into one contiguous chunk per worker; chunks are joined back in order.
    pub fn process_days_parallel(&self, days: &[Day]) -> Result<Vec<DayReport>, StructuralError> {
        if days.is_empty() {
            return Ok(Vec::new());
        }
        let workers = thread::available_parallelism().map_or(1, usize::from);
        let chunk_size = days.len().div_ceil(workers);
        thread::scope(|scope| -> Result<Vec<DayReport>, StructuralError> {
            let handles: Vec<_> = days
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.process_days(chunk)))
                .collect();
            let mut reports = Vec::with_capacity(days.len());
            for handle in handles {
                match handle.join() {
                    Ok(chunk) => reports.extend(chunk?),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(reports)
        })
    }
}

/// All report lines for a run, in day order.
pub fn report_lines(reports: &[DayReport]) -> Vec<String> {
    reports.iter().flat_map(DayReport::lines).collect()
}
