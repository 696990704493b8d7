//! DTOs for REST API requests/responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    parse_time, DayAvailability, Rule, RuleKind, RuleSet, ScheduleProblem, Shift, Staff, StaffId,
};
use crate::error::ScheduleError;

fn default_weeks() -> u32 {
    1
}

fn default_staff_required() -> i64 {
    1
}

fn default_enabled() -> bool {
    true
}

/// The scheduling request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub staff: Vec<StaffDto>,
    #[serde(default)]
    pub shifts: Vec<ShiftDto>,
    #[serde(default)]
    pub rules: Vec<RuleDto>,
    #[serde(default = "default_weeks")]
    pub weeks: u32,
}

impl ScheduleRequest {
    /// Normalizes the request into the typed problem: clock times are parsed,
    /// hour ceilings clamped, unknown rules dropped, and the week count
    /// raised to at least one.
    pub fn to_domain(&self) -> Result<ScheduleProblem, ScheduleError> {
        let staff = self.staff.iter().map(StaffDto::to_staff).collect();
        let shifts = self
            .shifts
            .iter()
            .map(ShiftDto::to_shift)
            .collect::<Result<Vec<_>, _>>()?;
        let rules = RuleSet::new(self.rules.iter().filter_map(RuleDto::to_rule).collect());
        Ok(ScheduleProblem {
            staff,
            shifts,
            rules,
            weeks: self.weeks.max(1),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffDto {
    pub id: StaffId,
    pub name: String,
    #[serde(default)]
    pub contracted_hours: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hours: Option<i64>,
    #[serde(default)]
    pub availability: HashMap<String, DayAvailability>,
}

impl StaffDto {
    fn to_staff(&self) -> Staff {
        let contracted = self.contracted_hours;
        // Absent or zero ceilings fall back to the contract; a ceiling below
        // the contract is meaningless and is raised to it.
        let ceiling = self.max_hours.filter(|&hours| hours != 0).unwrap_or(contracted);
        Staff {
            id: self.id.clone(),
            name: self.name.clone(),
            contracted_hours: contracted,
            max_hours: ceiling.max(contracted),
            availability: self.availability.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftDto {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_staff_required")]
    pub staff_required: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ShiftDto {
    fn to_shift(&self) -> Result<Shift, ScheduleError> {
        Ok(Shift {
            day: self.day.clone(),
            start: parse_time(&self.start_time)?,
            end: parse_time(&self.end_time)?,
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            staff_required: self.staff_required,
            name: self.name.clone(),
        })
    }
}

/// A rule entry, tagged by `type` or `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDto {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl RuleDto {
    fn to_rule(&self) -> Option<Rule> {
        let kind = self
            .kind
            .as_deref()
            .and_then(RuleKind::from_tag)
            .or_else(|| self.name.as_deref().and_then(RuleKind::from_tag))?;
        Some(Rule {
            kind,
            enabled: self.enabled,
            value: self.value,
        })
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// One assigned cell of a weekly grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub week: u32,
    pub day: String,
    pub shift_name: String,
    pub start_time: String,
    pub end_time: String,
    pub staff_id: StaffId,
    pub staff_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub week: u32,
    pub shifts: Vec<ScheduleEntry>,
}

/// Solver statistics aggregated over all weeks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SolveStats {
    /// Seconds spent inside the CP search.
    pub wall_time: f64,
    /// Search nodes explored.
    pub branches: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Followed,
    Compromised,
}

/// A single rule breach in the realized schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub staff: String,
    pub day: String,
    pub week: String,
    pub issue: String,
    pub solution: String,
}

/// Post-solve verdict for one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCompliance {
    pub rule: String,
    pub status: ComplianceStatus,
    pub details: String,
    pub violations: Vec<Violation>,
}

/// A staff member scheduled below their contracted hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractIssue {
    pub staff_name: String,
    pub contracted: i64,
    pub max_hours: i64,
    /// Average weekly hours actually scheduled.
    pub actual: f64,
    pub difference: f64,
    pub reason: String,
}

/// The successful response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub status: String,
    pub schedule: Vec<WeekSchedule>,
    pub contract_issues: Vec<ContractIssue>,
    pub rule_compliance: Vec<RuleCompliance>,
    pub stats: SolveStats,
}

/// The failure response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            success: false,
            error,
        }
    }
}
