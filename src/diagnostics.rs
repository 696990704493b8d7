//! Infeasibility diagnostics.
//!
//! When a week's model comes back unsatisfiable, these checks turn the bare
//! UNSAT into the likeliest causes and concrete fixes: aggregate hour
//! budgets, per-staff reachable hours, variety exhaustion, and whether each
//! contract is even expressible as a sum of the offered shift lengths.

use std::collections::HashSet;

use crate::domain::{Assignment, ScheduleProblem, Shift};

/// Explains why `week_num` could not be generated.
pub fn diagnose_week_failure(
    problem: &ScheduleProblem,
    week_num: u32,
    previous: &[Assignment],
) -> String {
    let mut problems: Vec<String> = Vec::new();
    let mut actions: Vec<String> = Vec::new();

    // Aggregate hour budget against scheduled demand.
    let total_contracted: i64 = problem.staff.iter().map(|s| s.contracted_hours).sum();
    let total_max: i64 = problem.staff.iter().map(|s| s.max_hours).sum();
    let total_need: f64 = problem
        .shifts
        .iter()
        .map(|s| s.duration_hours() * s.staff_required as f64)
        .sum();

    if (total_max as f64) < total_need - 2.0 {
        let shortage = total_need - total_max as f64;
        problems.push(format!(
            "Your staff can work up to {total_max}h (max) but shifts need {total_need:.0}h"
        ));
        actions.push(format!(
            "Increase max hours for some staff, add more staff, or remove {}h of shifts",
            shortage as i64
        ));
    } else if total_contracted as f64 > total_need + 2.0 {
        let surplus = total_contracted as f64 - total_need;
        problems.push(format!(
            "Your staff need {total_contracted}h (contracted) but you only have {total_need:.0}h of shifts"
        ));
        actions.push(format!(
            "Add {}+ hours of shifts, or reduce contracted hours by {}h total",
            surplus as i64, surplus as i64
        ));
    }

    // Per-staff reachable hours: 8h per distinct scheduled day the member is
    // available on. A loose ceiling, but cheap and direction-giving.
    for member in &problem.staff {
        if member.contracted_hours == 0 {
            continue;
        }
        let available_days = member.available_days();
        let available_lower: Vec<String> =
            available_days.iter().map(|day| day.to_lowercase()).collect();
        let mut days_counted: HashSet<&str> = HashSet::new();
        let mut max_possible: i64 = 0;
        for shift in &problem.shifts {
            if available_lower.contains(&shift.day.to_lowercase())
                && days_counted.insert(shift.day.as_str())
            {
                max_possible += 8;
            }
        }
        if max_possible < member.contracted_hours - 2 {
            problems.push(format!(
                "{} needs {}h but can only work {}h (available {} days)",
                member.name,
                member.contracted_hours,
                max_possible,
                available_days.len()
            ));
            if available_days.len() < 5 {
                actions.push(format!(
                    "Increase {}'s availability to more days",
                    member.name
                ));
            } else {
                actions.push(format!(
                    "Reduce {}'s contracted hours to {}h or less",
                    member.name, max_possible
                ));
            }
        }
    }

    // Variety exhaustion after a few generated weeks.
    if previous.len() >= 3 {
        problems.push(format!(
            "Week {} can't find enough variation from the previous {} weeks",
            week_num,
            previous.len()
        ));
        actions.push(format!(
            "Try generating fewer weeks at once (e.g., 1-2 weeks instead of {week_num})"
        ));
    }

    // Contracts that no combination of shift lengths can reach.
    let durations = distinct_shift_durations(&problem.shifts);
    for member in &problem.staff {
        if member.contracted_hours <= 0 {
            continue;
        }
        if !can_build_hours(member.contracted_hours as f64, &durations, 7, 0.5) {
            let listed = durations
                .iter()
                .map(|&d| format_hours_value(d))
                .collect::<Vec<_>>()
                .join(", ");
            problems.push(format!(
                "{}'s {}h contract can't be built from shift lengths: {listed}",
                member.name, member.contracted_hours
            ));
            let mut candidates: Vec<i64> = Vec::new();
            for test in member.contracted_hours - 5..=member.contracted_hours + 5 {
                if test > 0 && can_build_hours(test as f64, &durations, 7, 0.5) {
                    candidates.push(test);
                }
            }
            if let Some(closest) = candidates
                .iter()
                .copied()
                .min_by_key(|&c| (c - member.contracted_hours).abs())
            {
                actions.push(format!(
                    "Change {}'s contract to {closest}h, or add different shift lengths (e.g., 5h or 9h shifts)",
                    member.name
                ));
            }
        }
    }

    if problems.is_empty() {
        return format!(
            "Week {week_num} couldn't be generated. Try reducing the number of weeks or adjusting availability."
        );
    }

    let mut output = format!("Cannot generate week {week_num}:\n\n");
    for (idx, problem_text) in problems.iter().enumerate() {
        output.push_str(&format!("{}. {problem_text}\n", idx + 1));
    }
    output.push_str("\nTo fix this:\n");
    for action in &actions {
        output.push_str(&format!("- {action}\n"));
    }
    output.trim().to_string()
}

/// True when `target` hours is reachable as a sum of at most `max_shifts`
/// durations, within `tolerance`. Breadth-first over reachable sums, capped
/// at `target + tolerance`.
pub fn can_build_hours(target: f64, durations: &[f64], max_shifts: usize, tolerance: f64) -> bool {
    let mut reachable: Vec<f64> = vec![0.0];
    let mut seen: HashSet<u64> = HashSet::from([0f64.to_bits()]);
    for _ in 0..max_shifts {
        let snapshot = reachable.clone();
        for &value in &snapshot {
            for &duration in durations {
                let next = value + duration;
                if next <= target + tolerance && seen.insert(next.to_bits()) {
                    reachable.push(next);
                }
            }
        }
        if reachable.iter().any(|&v| (v - target).abs() <= tolerance) {
            return true;
        }
    }
    false
}

/// Sorted distinct shift durations in hours.
pub fn distinct_shift_durations(shifts: &[Shift]) -> Vec<f64> {
    let mut seen = HashSet::new();
    let mut durations: Vec<f64> = shifts
        .iter()
        .map(Shift::duration_hours)
        .filter(|d| seen.insert(d.to_bits()))
        .collect();
    durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    durations
}

/// `8h` for whole hours, `7.5h` otherwise.
pub(crate) fn format_hours_value(hours: f64) -> String {
    if hours == hours.trunc() {
        format!("{}h", hours as i64)
    } else {
        format!("{hours}h")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::{
        parse_time, DayAvailability, RuleSet, ScheduleProblem, Staff, StaffId, DAY_ORDER,
    };

    fn member(name: &str, contracted: i64, max: i64) -> Staff {
        Staff {
            id: StaffId::Text(name.to_lowercase()),
            name: name.to_string(),
            contracted_hours: contracted,
            max_hours: max,
            availability: HashMap::new(),
        }
    }

    fn shift(day: &str, start: &str, end: &str, required: i64) -> crate::domain::Shift {
        crate::domain::Shift {
            day: day.to_string(),
            start: parse_time(start).unwrap(),
            end: parse_time(end).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            staff_required: required,
            name: None,
        }
    }

    fn problem(staff: Vec<Staff>, shifts: Vec<crate::domain::Shift>) -> ScheduleProblem {
        ScheduleProblem {
            staff,
            shifts,
            rules: RuleSet::default(),
            weeks: 1,
        }
    }

    #[test]
    fn builds_reachable_hour_sums() {
        assert!(can_build_hours(8.0, &[8.0], 7, 0.5));
        assert!(can_build_hours(16.0, &[8.0], 7, 0.5));
        assert!(!can_build_hours(10.0, &[8.0], 7, 0.5));
        assert!(can_build_hours(12.0, &[4.0, 8.0], 7, 0.5));
        assert!(can_build_hours(12.25, &[4.0, 8.0], 7, 0.5));
        // Seven-shift cap: eight fours never reach 32 with only 4h shifts.
        assert!(can_build_hours(28.0, &[4.0], 7, 0.5));
        assert!(!can_build_hours(32.0, &[4.0], 7, 0.5));
    }

    #[test]
    fn zero_duration_does_not_change_reachability() {
        for target in [7, 10, 13, 24] {
            let base = can_build_hours(target as f64, &[4.0, 8.5], 7, 0.5);
            let padded = can_build_hours(target as f64, &[0.0, 4.0, 8.5], 7, 0.5);
            assert_eq!(base, padded, "target {target}");
        }
    }

    #[test]
    fn durations_deduplicate_and_sort() {
        let shifts = vec![
            shift("Monday", "09:00", "17:00", 1),
            shift("Tuesday", "10:00", "18:00", 1),
            shift("Wednesday", "09:00", "13:30", 1),
        ];
        assert_eq!(distinct_shift_durations(&shifts), vec![4.5, 8.0]);
    }

    #[test]
    fn capacity_shortfall_message() {
        let problem = problem(
            vec![member("Ana", 0, 10)],
            vec![
                shift("Monday", "09:00", "17:00", 2),
                shift("Tuesday", "09:00", "17:00", 2),
            ],
        );
        let text = diagnose_week_failure(&problem, 1, &[]);
        assert!(text.starts_with("Cannot generate week 1:"));
        assert!(text.contains("1. Your staff can work up to 10h (max) but shifts need 32h"));
        assert!(text.contains("- Increase max hours for some staff, add more staff, or remove 22h of shifts"));
    }

    #[test]
    fn contracted_surplus_message() {
        let problem = problem(
            vec![member("Ana", 30, 40)],
            vec![shift("Monday", "09:00", "17:00", 1)],
        );
        let text = diagnose_week_failure(&problem, 2, &[]);
        assert!(text.contains("Your staff need 30h (contracted) but you only have 8h of shifts"));
        assert!(text.contains("Add 22+ hours of shifts, or reduce contracted hours by 22h total"));
    }

    #[test]
    fn limited_availability_is_called_out() {
        let mut narrow = member("Ana", 20, 20);
        narrow.availability = DAY_ORDER
            .iter()
            .map(|day| {
                (
                    day.to_lowercase(),
                    DayAvailability::Whole(*day == "Monday"),
                )
            })
            .collect();
        let problem = problem(
            vec![narrow, member("Ben", 0, 40)],
            vec![
                shift("Monday", "09:00", "17:00", 1),
                shift("Tuesday", "09:00", "17:00", 1),
                shift("Wednesday", "09:00", "17:00", 1),
            ],
        );
        let text = diagnose_week_failure(&problem, 1, &[]);
        assert!(text.contains("Ana needs 20h but can only work 8h (available 1 days)"));
        assert!(text.contains("Increase Ana's availability to more days"));
    }

    #[test]
    fn unbuildable_contract_suggests_nearest() {
        let problem = problem(
            vec![member("Ana", 10, 40)],
            vec![
                shift("Monday", "09:00", "17:00", 1),
                shift("Tuesday", "09:00", "17:00", 1),
                shift("Wednesday", "09:00", "17:00", 1),
            ],
        );
        let text = diagnose_week_failure(&problem, 1, &[]);
        assert!(text.contains("Ana's 10h contract can't be built from shift lengths: 8h"));
        assert!(text.contains("Change Ana's contract to 8h, or add different shift lengths"));
    }

    #[test]
    fn variety_exhaustion_after_three_weeks() {
        let problem = problem(
            vec![member("Ana", 0, 40)],
            vec![shift("Monday", "09:00", "17:00", 1)],
        );
        let previous = vec![
            Assignment::new(vec![vec![true]]),
            Assignment::new(vec![vec![true]]),
            Assignment::new(vec![vec![true]]),
        ];
        let text = diagnose_week_failure(&problem, 4, &previous);
        assert!(text.contains("Week 4 can't find enough variation from the previous 3 weeks"));
        assert!(text.contains("1-2 weeks instead of 4"));
    }

    #[test]
    fn falls_back_to_generic_message() {
        let problem = problem(
            vec![member("Ana", 0, 40)],
            vec![shift("Monday", "09:00", "17:00", 1)],
        );
        assert_eq!(
            diagnose_week_failure(&problem, 2, &[]),
            "Week 2 couldn't be generated. Try reducing the number of weeks or adjusting availability."
        );
    }
}
