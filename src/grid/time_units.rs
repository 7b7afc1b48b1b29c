//! CF convention time units, e.g. `"seconds since 1970-01-01"` or
//! `"hours since 1900-01-01 00:00:00.0"`.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const REFERENCE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeStep {
    fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "milliseconds" | "millisecond" | "ms" => Some(TimeStep::Milliseconds),
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeStep::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeStep::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeStep::Hours),
            "days" | "day" | "d" => Some(TimeStep::Days),
            _ => None,
        }
    }

    fn micros(self) -> f64 {
        match self {
            TimeStep::Milliseconds => 1e3,
            TimeStep::Seconds => 1e6,
            TimeStep::Minutes => 60e6,
            TimeStep::Hours => 3_600e6,
            TimeStep::Days => 86_400e6,
        }
    }
}

/// Decoder for numeric time coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub step: TimeStep,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    /// Parses `"<step> since <reference>"`. Returns `None` for anything that is not a time unit,
    /// such as `"K"` or `"degrees_north"`.
    pub fn parse(units: &str) -> Option<Self> {
        let (step, reference) = units.trim().split_once(" since ")?;
        let step = TimeStep::parse(step.trim())?;
        let reference = parse_reference(reference)?;
        Some(Self { step, reference })
    }

    /// `None` for NaN and values outside the representable range.
    pub fn decode(&self, value: f64) -> Option<NaiveDateTime> {
        if !value.is_finite() {
            return None;
        }
        let micros = (value * self.step.micros()).round();
        if micros.abs() >= i64::MAX as f64 {
            return None;
        }
        self.reference
            .checked_add_signed(Duration::microseconds(micros as i64))
    }
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let reference = reference.trim();
    let reference = reference
        .strip_suffix(" UTC")
        .or_else(|| reference.strip_suffix('Z'))
        .unwrap_or(reference)
        .trim();

    REFERENCE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(reference, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
