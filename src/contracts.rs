//! Contract-hours reconciliation.
//!
//! The solver tolerates a one-hour weekly under-run; this pass reports any
//! staff member whose average scheduled hours fall more than half an hour
//! short of contract, together with the likeliest cause.

use std::collections::HashMap;

use crate::diagnostics::{can_build_hours, distinct_shift_durations, format_hours_value};
use crate::domain::{parse_time, ScheduleProblem, Staff};
use crate::dto::{ContractIssue, ScheduleEntry, WeekSchedule};

/// Compares scheduled hours against contracts and flags shortfalls.
pub fn check_contract_hours(
    problem: &ScheduleProblem,
    schedule: &[WeekSchedule],
) -> Vec<ContractIssue> {
    // Per-staff weekly hour totals, grown up to the last week the member
    // actually appears in.
    let mut weekly_hours: HashMap<&str, Vec<f64>> = HashMap::new();
    for week in schedule {
        for entry in &week.shifts {
            let logged = weekly_hours.entry(entry.staff_name.as_str()).or_default();
            while (logged.len() as u32) < week.week {
                logged.push(0.0);
            }
            logged[week.week as usize - 1] += entry_duration_hours(entry);
        }
    }

    let mut issues = Vec::new();
    for member in &problem.staff {
        if member.contracted_hours == 0 {
            continue;
        }
        let default_weeks = vec![0.0; problem.weeks as usize];
        let logged = weekly_hours
            .get(member.name.as_str())
            .unwrap_or(&default_weeks);
        let average = if logged.is_empty() {
            0.0
        } else {
            logged.iter().sum::<f64>() / logged.len() as f64
        };
        if average < member.contracted_hours as f64 - 0.5 {
            issues.push(ContractIssue {
                staff_name: member.name.clone(),
                contracted: member.contracted_hours,
                max_hours: member.max_hours,
                actual: average,
                difference: member.contracted_hours as f64 - average,
                reason: diagnose_contract_mismatch(problem, member),
            });
        }
    }
    issues
}

fn entry_duration_hours(entry: &ScheduleEntry) -> f64 {
    let start = parse_time(&entry.start_time).unwrap_or(0);
    let end = parse_time(&entry.end_time).unwrap_or(0);
    (end - start).rem_euclid(1440) as f64 / 60.0
}

/// Orders the possible causes by specificity: unreachable contract totals
/// first, then narrow availability, then the catch-all.
fn diagnose_contract_mismatch(problem: &ScheduleProblem, member: &Staff) -> String {
    let durations = distinct_shift_durations(&problem.shifts);
    if !can_build_hours(member.contracted_hours as f64, &durations, 7, 0.5) {
        let listed = durations
            .iter()
            .map(|&d| format_hours_value(d))
            .collect::<Vec<_>>()
            .join(", ");
        return format!(
            "shift lengths are {listed} which can't combine to exactly {}h",
            member.contracted_hours
        );
    }

    let available = member.available_days().len();
    if available < 4 {
        return format!("only available {available} days per week");
    }

    "closest match with current rules and availability".to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::{DayAvailability, RuleSet, Shift, StaffId, DAY_ORDER};

    fn member(name: &str, contracted: i64, max: i64) -> Staff {
        Staff {
            id: StaffId::Text(name.to_lowercase()),
            name: name.to_string(),
            contracted_hours: contracted,
            max_hours: max,
            availability: HashMap::new(),
        }
    }

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

    fn entry(week: u32, day: &str, start: &str, end: &str, staff: &str) -> ScheduleEntry {
        ScheduleEntry {
            week,
            day: day.to_string(),
            shift_name: "Shift".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            staff_id: StaffId::Text(staff.to_lowercase()),
            staff_name: staff.to_string(),
        }
    }

    fn problem(staff: Vec<Staff>, shifts: Vec<Shift>, weeks: u32) -> ScheduleProblem {
        ScheduleProblem {
            staff,
            shifts,
            rules: RuleSet::default(),
            weeks,
        }
    }

    #[test]
    fn shortfall_with_unbuildable_contract() {
        let problem = problem(
            vec![member("Ana", 10, 40)],
            vec![shift("Monday", "09:00", "17:00"), shift("Tuesday", "09:00", "17:00")],
            1,
        );
        let schedule = vec![WeekSchedule {
            week: 1,
            shifts: vec![entry(1, "Monday", "09:00", "17:00", "Ana")],
        }];
        let issues = check_contract_hours(&problem, &schedule);
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.staff_name, "Ana");
        assert_eq!(issue.contracted, 10);
        assert_eq!(issue.actual, 8.0);
        assert_eq!(issue.difference, 2.0);
        assert_eq!(
            issue.reason,
            "shift lengths are 8h which can't combine to exactly 10h"
        );
    }

    #[test]
    fn shortfall_with_narrow_availability() {
        let mut narrow = member("Ana", 16, 40);
        narrow.availability = DAY_ORDER
            .iter()
            .map(|day| {
                (
                    day.to_lowercase(),
                    DayAvailability::Whole(matches!(*day, "Monday" | "Tuesday")),
                )
            })
            .collect();
        let problem = problem(
            vec![narrow],
            vec![shift("Monday", "09:00", "17:00"), shift("Tuesday", "09:00", "17:00")],
            1,
        );
        let schedule = vec![WeekSchedule {
            week: 1,
            shifts: vec![entry(1, "Monday", "09:00", "17:00", "Ana")],
        }];
        let issues = check_contract_hours(&problem, &schedule);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].reason, "only available 2 days per week");
    }

    #[test]
    fn shortfall_falls_back_to_generic_reason() {
        let mut wide_open = member("Ana", 16, 40);
        wide_open.availability = DAY_ORDER
            .iter()
            .map(|day| (day.to_lowercase(), DayAvailability::Whole(true)))
            .collect();
        let problem = problem(
            vec![wide_open],
            vec![shift("Monday", "09:00", "17:00"), shift("Tuesday", "09:00", "17:00")],
            1,
        );
        let schedule = vec![WeekSchedule {
            week: 1,
            shifts: vec![entry(1, "Monday", "09:00", "17:00", "Ana")],
        }];
        let issues = check_contract_hours(&problem, &schedule);
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].reason,
            "closest match with current rules and availability"
        );
    }

    #[test]
    fn near_contract_hours_pass() {
        let problem = problem(
            vec![member("Ana", 8, 8)],
            vec![shift("Monday", "09:00", "16:30")],
            1,
        );
        let schedule = vec![WeekSchedule {
            week: 1,
            shifts: vec![entry(1, "Monday", "09:00", "16:30", "Ana")],
        }];
        // 7.5h against an 8h contract sits inside the half-hour tolerance.
        assert!(check_contract_hours(&problem, &schedule).is_empty());
    }

    #[test]
    fn average_spans_only_recorded_weeks() {
        let problem = problem(
            vec![member("Ana", 8, 8)],
            vec![shift("Monday", "09:00", "17:00")],
            2,
        );
        // Worked week one only: the average divides by the single recorded
        // week, so no shortfall is reported.
        let schedule = vec![
            WeekSchedule {
                week: 1,
                shifts: vec![entry(1, "Monday", "09:00", "17:00", "Ana")],
            },
            WeekSchedule {
                week: 2,
                shifts: Vec::new(),
            },
        ];
        assert!(check_contract_hours(&problem, &schedule).is_empty());

        // Never scheduled at all: averaged over every requested week.
        let empty = vec![
            WeekSchedule {
                week: 1,
                shifts: Vec::new(),
            },
            WeekSchedule {
                week: 2,
                shifts: Vec::new(),
            },
        ];
        let issues = check_contract_hours(&problem, &empty);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].actual, 0.0);
    }
}
