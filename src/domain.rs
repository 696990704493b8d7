//! Domain model for the shift scheduler.
//!
//! Requests are normalized into these types at ingress: clock times become
//! minutes from midnight, `max_hours` is clamped to at least the contracted
//! hours, and unknown rules are dropped.

use std::collections::HashMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScheduleError;

/// Calendar order used by all day-adjacent rules. There is no Sunday ->
/// Monday wrap; weeks are closed intervals.
pub const DAY_ORDER: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const WEEKEND_DAYS: [&str; 2] = ["Saturday", "Sunday"];

/// Parses an `HH:MM` clock time into minutes from midnight, in `[0, 1440)`.
pub fn parse_time(raw: &str) -> Result<i64, ScheduleError> {
    let time = chrono::NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| ScheduleError::BadTime(raw.to_string()))?;
    Ok(i64::from(time.num_seconds_from_midnight()) / 60)
}

/// Formats minutes from midnight back to `HH:MM`.
pub fn format_time(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Starts strictly before noon fall in the AM half-day.
pub fn is_morning_start(start: i64) -> bool {
    start < 12 * 60
}

/// Opening shifts begin at or before 08:00.
pub fn is_opening_start(start: i64) -> bool {
    start <= 8 * 60
}

/// Closing shifts end at or after 22:00; an end before noon is read as
/// wrapping past midnight.
pub fn is_closing_end(end: i64) -> bool {
    let end = if end < 12 * 60 { end + 1440 } else { end };
    end >= 22 * 60
}

/// Staff identifiers pass through to the response exactly as given, whether
/// strings or integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaffId {
    Number(i64),
    Text(String),
}

/// Availability for one weekday, as supplied in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayAvailability {
    /// A single flag covering the whole day.
    Whole(bool),
    /// Separate AM/PM flags. A missing half admits shifts.
    Split {
        #[serde(rename = "AM", default, skip_serializing_if = "Option::is_none")]
        am: Option<bool>,
        #[serde(rename = "PM", default, skip_serializing_if = "Option::is_none")]
        pm: Option<bool>,
    },
    /// Any other shape; admits shifts.
    Other(Value),
}

impl DayAvailability {
    /// Whether the half-day a shift's start falls in admits that shift.
    pub fn allows(&self, morning: bool) -> bool {
        match self {
            Self::Whole(flag) => *flag,
            Self::Split { am, pm } => {
                if morning {
                    am.unwrap_or(true)
                } else {
                    pm.unwrap_or(true)
                }
            }
            Self::Other(_) => true,
        }
    }

    /// Whether any half of the day is explicitly workable. The diagnostics
    /// and the contract reconciler count available days with this, which is
    /// stricter than `allows`: halves left unspecified do not count.
    pub fn any_truthy(&self) -> bool {
        match self {
            Self::Whole(flag) => *flag,
            Self::Split { am, pm } => *am == Some(true) || *pm == Some(true),
            Self::Other(value) => value_truthy(value),
        }
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A staff member after ingress normalization.
#[derive(Debug, Clone)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    /// Weekly contracted hours. Zero disables the lower hour bound.
    pub contracted_hours: i64,
    /// Effective weekly ceiling, never below `contracted_hours`.
    pub max_hours: i64,
    /// Keyed by lowercased weekday name; days without an entry are available.
    pub availability: HashMap<String, DayAvailability>,
}

impl Staff {
    /// Days carrying an explicit, workable availability entry.
    pub fn available_days(&self) -> Vec<&str> {
        self.availability
            .iter()
            .filter(|(_, day)| day.any_truthy())
            .map(|(day, _)| day.as_str())
            .collect()
    }

    /// Whether this member may take a shift on `day` in the given half-day.
    pub fn is_available(&self, day: &str, morning: bool) -> bool {
        self.availability
            .get(&day.to_lowercase())
            .is_none_or(|entry| entry.allows(morning))
    }
}

/// A shift to fill on one weekday. Times are minutes from midnight; an end at
/// or before the start wraps past midnight within the day's 24-hour frame.
#[derive(Debug, Clone)]
pub struct Shift {
    pub day: String,
    pub start: i64,
    pub end: i64,
    /// Original request strings, echoed back in the schedule.
    pub start_time: String,
    pub end_time: String,
    pub staff_required: i64,
    pub name: Option<String>,
}

impl Shift {
    /// Duration in minutes, modulo one day.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).rem_euclid(1440)
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    pub fn is_morning(&self) -> bool {
        is_morning_start(self.start)
    }

    pub fn is_opening(&self) -> bool {
        is_opening_start(self.start)
    }

    pub fn is_closing(&self) -> bool {
        is_closing_end(self.end)
    }

    /// Display name, falling back to the 1-based position in the request.
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Shift {}", index + 1))
    }
}

/// The closed set of recognized optional rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    NoClopening,
    MaxConsecutiveDays,
    FairWeekendDistribution,
    RestBetweenShifts,
    MinimumDaysOff,
}

impl RuleKind {
    /// Maps a request's `type`/`name` tag onto a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "no_clopening" => Some(Self::NoClopening),
            "max_consecutive_days" => Some(Self::MaxConsecutiveDays),
            "fair_weekend_distribution" => Some(Self::FairWeekendDistribution),
            "rest_between_shifts" => Some(Self::RestBetweenShifts),
            "minimum_days_off" => Some(Self::MinimumDaysOff),
            _ => None,
        }
    }
}

/// One parsed rule entry.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub enabled: bool,
    pub value: Option<i64>,
}

/// Lookup over the request's rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// True when any entry of this kind is enabled.
    pub fn enabled(&self, kind: RuleKind) -> bool {
        self.rules.iter().any(|rule| rule.kind == kind && rule.enabled)
    }

    /// The first matching entry's value, or `default`.
    pub fn value(&self, kind: RuleKind, default: i64) -> i64 {
        self.rules
            .iter()
            .find(|rule| rule.kind == kind)
            .and_then(|rule| rule.value)
            .unwrap_or(default)
    }
}

/// A fully normalized scheduling request.
#[derive(Debug, Clone)]
pub struct ScheduleProblem {
    pub staff: Vec<Staff>,
    pub shifts: Vec<Shift>,
    pub rules: RuleSet,
    pub weeks: u32,
}

/// One week's boolean assignment grid, indexed `[shift][staff]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    grid: Vec<Vec<bool>>,
}

impl Assignment {
    pub fn new(grid: Vec<Vec<bool>>) -> Self {
        Self { grid }
    }

    pub fn assigned(&self, shift: usize, staff: usize) -> bool {
        self.grid[shift][staff]
    }

    /// Number of cells where the two grids differ.
    pub fn disagreement(&self, other: &Assignment) -> usize {
        self.grid
            .iter()
            .zip(&other.grid)
            .flat_map(|(ours, theirs)| ours.iter().zip(theirs))
            .filter(|(a, b)| a != b)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(day: &str, start: &str, end: &str) -> Shift {
        Shift {
            day: day.to_string(),
            start: parse_time(start).unwrap(),
            end: parse_time(end).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            staff_required: 1,
            name: None,
        }
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_time("00:00").unwrap(), 0);
        assert_eq!(parse_time("09:30").unwrap(), 570);
        assert_eq!(parse_time("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["9am", "24:00", "12", "12:60", "12:00:30", ""] {
            assert!(
                matches!(parse_time(raw), Err(ScheduleError::BadTime(_))),
                "expected BadTime for {raw:?}"
            );
        }
    }

    #[test]
    fn time_round_trips_through_format() {
        for raw in ["00:00", "08:05", "12:00", "23:59"] {
            assert_eq!(format_time(parse_time(raw).unwrap()), raw);
        }
    }

    #[test]
    fn durations_wrap_past_midnight() {
        assert_eq!(shift("Monday", "09:00", "17:00").duration_minutes(), 480);
        assert_eq!(shift("Monday", "22:00", "00:00").duration_minutes(), 120);
        assert_eq!(shift("Monday", "20:00", "04:00").duration_minutes(), 480);
        // Equal endpoints collapse to an empty shift.
        assert_eq!(shift("Monday", "09:00", "09:00").duration_minutes(), 0);
    }

    #[test]
    fn classifies_opening_and_closing() {
        assert!(shift("Monday", "08:00", "16:00").is_opening());
        assert!(!shift("Monday", "08:01", "16:00").is_opening());
        assert!(shift("Monday", "14:00", "22:00").is_closing());
        assert!(!shift("Monday", "14:00", "21:59").is_closing());
        // Ends before noon are read as next-day ends, hence closing.
        assert!(shift("Monday", "22:00", "02:00").is_closing());
        assert!(!shift("Monday", "06:00", "12:00").is_closing());
        assert!(shift("Monday", "06:00", "11:00").is_morning());
        assert!(!shift("Monday", "12:00", "20:00").is_morning());
    }

    #[test]
    fn availability_variants() {
        assert!(!DayAvailability::Whole(false).allows(true));
        let split = DayAvailability::Split {
            am: Some(false),
            pm: None,
        };
        assert!(!split.allows(true));
        assert!(split.allows(false));

        // An empty mapping admits shifts but does not count as a workable day.
        let empty = DayAvailability::Split { am: None, pm: None };
        assert!(empty.allows(true) && empty.allows(false));
        assert!(!empty.any_truthy());

        let junk = DayAvailability::Other(serde_json::json!("yes"));
        assert!(junk.allows(true));
        assert!(junk.any_truthy());
        assert!(!DayAvailability::Other(serde_json::json!(0)).any_truthy());
    }

    #[test]
    fn availability_lookup_is_lowercase_keyed() {
        let mut availability = HashMap::new();
        availability.insert("monday".to_string(), DayAvailability::Whole(false));
        availability.insert("Tuesday".to_string(), DayAvailability::Whole(false));
        let member = Staff {
            id: StaffId::Number(1),
            name: "Ana".to_string(),
            contracted_hours: 0,
            max_hours: 40,
            availability,
        };
        assert!(!member.is_available("Monday", true));
        // A capitalized key is never matched by the lowercase lookup.
        assert!(member.is_available("Tuesday", true));
        assert!(member.is_available("Friday", false));
    }

    #[test]
    fn rule_lookup_semantics() {
        let rules = RuleSet::new(vec![
            Rule {
                kind: RuleKind::NoClopening,
                enabled: false,
                value: None,
            },
            Rule {
                kind: RuleKind::NoClopening,
                enabled: true,
                value: Some(9),
            },
            Rule {
                kind: RuleKind::MaxConsecutiveDays,
                enabled: true,
                value: Some(4),
            },
        ]);
        // Any enabled entry switches the kind on...
        assert!(rules.enabled(RuleKind::NoClopening));
        // ...but the value always comes from the first matching entry.
        assert_eq!(rules.value(RuleKind::NoClopening, 7), 7);
        assert_eq!(rules.value(RuleKind::MaxConsecutiveDays, 6), 4);
        assert_eq!(rules.value(RuleKind::RestBetweenShifts, 12), 12);
        assert!(!rules.enabled(RuleKind::MinimumDaysOff));
    }

    #[test]
    fn shift_display_name_falls_back_to_position() {
        let mut anonymous = shift("Monday", "09:00", "17:00");
        assert_eq!(anonymous.display_name(2), "Shift 3");
        anonymous.name = Some("Opener".to_string());
        assert_eq!(anonymous.display_name(2), "Opener");
    }

    #[test]
    fn assignment_disagreement_counts_cells() {
        let a = Assignment::new(vec![vec![true, false], vec![false, true]]);
        let b = Assignment::new(vec![vec![false, false], vec![false, false]]);
        assert_eq!(a.disagreement(&b), 2);
        assert_eq!(a.disagreement(&a), 0);
    }
}
