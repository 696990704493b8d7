//! Post-solve compliance validation.
//!
//! Every active rule is re-checked against the realized schedule rather than
//! the CP variables, so the verdicts stand on their own even where the model
//! encoding is looser than the rule (consecutive-day windows, weekend
//! fairness). Each rule reports followed/compromised with per-row detail.

use std::collections::{HashMap, HashSet};

use crate::domain::{
    is_closing_end, is_opening_start, parse_time, RuleKind, ScheduleProblem, DAY_ORDER,
    WEEKEND_DAYS,
};
use crate::dto::{ComplianceStatus, RuleCompliance, ScheduleEntry, Violation, WeekSchedule};

/// Checks every potentially applicable rule over the generated schedule.
pub fn validate_rules(problem: &ScheduleProblem, schedule: &[WeekSchedule]) -> Vec<RuleCompliance> {
    let mut compliance = Vec::new();

    let double_shifts = check_no_double_shifts(schedule);
    compliance.push(verdict(
        "No Double Shifts".to_string(),
        "No staff member works more than one shift per day.".to_string(),
        format!("Found {} double shift assignment(s).", double_shifts.len()),
        double_shifts,
    ));

    if problem.rules.enabled(RuleKind::RestBetweenShifts) {
        let min_hours = problem.rules.value(RuleKind::RestBetweenShifts, 12);
        let violations = check_overnight_rest(schedule, min_hours);
        compliance.push(verdict(
            format!("Overnight Rest ({min_hours}+ hours)"),
            format!(
                "All staff have at least {min_hours} hours rest between shifts on consecutive days."
            ),
            format!(
                "Found {} case(s) of insufficient overnight rest.",
                violations.len()
            ),
            violations,
        ));
    }

    if problem.rules.enabled(RuleKind::NoClopening) {
        let violations = check_no_clopening(schedule);
        compliance.push(verdict(
            "No Clopening".to_string(),
            "No staff member works a closing shift followed by an opening shift the next day."
                .to_string(),
            format!("Found {} clopening occurrence(s).", violations.len()),
            violations,
        ));
    }

    if problem.rules.enabled(RuleKind::FairWeekendDistribution) {
        compliance.push(check_fair_weekends(problem, schedule));
    }

    if problem.rules.enabled(RuleKind::MaxConsecutiveDays) {
        let max_days = problem.rules.value(RuleKind::MaxConsecutiveDays, 6);
        let violations = check_max_consecutive(schedule, max_days);
        compliance.push(verdict(
            format!("Maximum {max_days} Consecutive Days"),
            format!("No staff member works more than {max_days} consecutive days."),
            format!(
                "Found {} case(s) of too many consecutive working days.",
                violations.len()
            ),
            violations,
        ));
    }

    if problem.rules.enabled(RuleKind::MinimumDaysOff) {
        let min_days_off = problem.rules.value(RuleKind::MinimumDaysOff, 2);
        let violations = check_minimum_days_off(problem, schedule, min_days_off);
        compliance.push(verdict(
            format!("Minimum {min_days_off} Days Off"),
            format!("All staff have at least {min_days_off} days off per week."),
            format!("Found {} case(s) of insufficient days off.", violations.len()),
            violations,
        ));
    }

    compliance
}

fn verdict(
    rule: String,
    followed_details: String,
    compromised_details: String,
    violations: Vec<Violation>,
) -> RuleCompliance {
    if violations.is_empty() {
        RuleCompliance {
            rule,
            status: ComplianceStatus::Followed,
            details: followed_details,
            violations,
        }
    } else {
        RuleCompliance {
            rule,
            status: ComplianceStatus::Compromised,
            details: compromised_details,
            violations,
        }
    }
}

// Entry times were validated at ingress; a parse failure here means zero.
fn entry_start(entry: &ScheduleEntry) -> i64 {
    parse_time(&entry.start_time).unwrap_or(0)
}

fn entry_end(entry: &ScheduleEntry) -> i64 {
    parse_time(&entry.end_time).unwrap_or(0)
}

fn check_no_double_shifts(schedule: &[WeekSchedule]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for week in schedule {
        // First-seen order keeps the report stable across runs.
        let mut groups: Vec<((&str, &str), Vec<&ScheduleEntry>)> = Vec::new();
        for entry in &week.shifts {
            let key = (entry.staff_name.as_str(), entry.day.as_str());
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, list)) => list.push(entry),
                None => groups.push((key, vec![entry])),
            }
        }
        for ((staff, day), entries) in groups {
            if entries.len() > 1 {
                let names: Vec<&str> = entries.iter().map(|e| e.shift_name.as_str()).collect();
                violations.push(Violation {
                    staff: staff.to_string(),
                    day: day.to_string(),
                    week: format!("Week {}", week.week),
                    issue: format!("Assigned to {} shifts: {}", entries.len(), names.join(", ")),
                    solution: "Remove one shift or assign to different staff".to_string(),
                });
            }
        }
    }
    violations
}

fn check_overnight_rest(schedule: &[WeekSchedule], min_hours: i64) -> Vec<Violation> {
    let mut violations = Vec::new();
    for week in schedule {
        let mut order: Vec<&str> = Vec::new();
        let mut by_staff: HashMap<&str, HashMap<&str, Vec<&ScheduleEntry>>> = HashMap::new();
        for entry in &week.shifts {
            let days = by_staff.entry(entry.staff_name.as_str()).or_insert_with(|| {
                order.push(entry.staff_name.as_str());
                HashMap::new()
            });
            days.entry(entry.day.as_str()).or_default().push(entry);
        }

        for staff in order {
            let Some(days) = by_staff.get(staff) else {
                continue;
            };
            for pair in DAY_ORDER.windows(2) {
                let (Some(current), Some(next)) = (days.get(pair[0]), days.get(pair[1])) else {
                    continue;
                };
                let mut latest_end = current.iter().map(|e| entry_end(e)).max().unwrap_or(0);
                if latest_end < 12 * 60 {
                    latest_end += 1440;
                }
                let earliest_start =
                    next.iter().map(|e| entry_start(e)).min().unwrap_or(0) + 1440;
                let rest_hours = (earliest_start - latest_end) as f64 / 60.0;
                if rest_hours < min_hours as f64 {
                    let mut last_shift = &current[0];
                    for entry in &current[1..] {
                        if entry_end(entry) > entry_end(last_shift) {
                            last_shift = entry;
                        }
                    }
                    let mut first_shift = &next[0];
                    for entry in &next[1..] {
                        if entry_start(entry) < entry_start(first_shift) {
                            first_shift = entry;
                        }
                    }
                    violations.push(Violation {
                        staff: staff.to_string(),
                        day: format!("{}-{}", pair[0], pair[1]),
                        week: format!("Week {}", week.week),
                        issue: format!(
                            "Only {rest_hours:.1}h rest between {} and {}",
                            last_shift.shift_name, first_shift.shift_name
                        ),
                        solution: format!(
                            "Swap {}'s {} with another staff member",
                            pair[1], first_shift.shift_name
                        ),
                    });
                }
            }
        }
    }
    violations
}

fn check_no_clopening(schedule: &[WeekSchedule]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for week in schedule {
        let mut by_day: HashMap<&str, Vec<&ScheduleEntry>> = HashMap::new();
        for entry in &week.shifts {
            by_day.entry(entry.day.as_str()).or_default().push(entry);
        }
        let empty = Vec::new();
        for pair in DAY_ORDER.windows(2) {
            let current = by_day.get(pair[0]).unwrap_or(&empty);
            let next = by_day.get(pair[1]).unwrap_or(&empty);
            for closing in current.iter().filter(|e| is_closing_end(entry_end(e))) {
                for opening in next.iter().filter(|e| is_opening_start(entry_start(e))) {
                    if closing.staff_name == opening.staff_name {
                        violations.push(Violation {
                            staff: closing.staff_name.clone(),
                            day: format!("{}-{}", pair[0], pair[1]),
                            week: format!("Week {}", week.week),
                            issue: format!(
                                "Closing shift ({}) followed by opening shift ({})",
                                closing.shift_name, opening.shift_name
                            ),
                            solution: format!(
                                "Swap {}'s {} with another staff member",
                                pair[1], opening.shift_name
                            ),
                        });
                    }
                }
            }
        }
    }
    violations
}

struct WeekendPattern {
    full_worked: i64,
    partial: i64,
    full_off: i64,
}

/// Full/partial/off weekend counts per staff member, across all weeks.
fn weekend_patterns(
    problem: &ScheduleProblem,
    schedule: &[WeekSchedule],
) -> Vec<(String, WeekendPattern)> {
    let mut patterns: Vec<(String, WeekendPattern)> = problem
        .staff
        .iter()
        .map(|member| {
            (
                member.name.clone(),
                WeekendPattern {
                    full_worked: 0,
                    partial: 0,
                    full_off: 0,
                },
            )
        })
        .collect();

    for week in schedule {
        let mut worked: HashMap<&str, HashSet<&str>> = HashMap::new();
        for entry in &week.shifts {
            if WEEKEND_DAYS.contains(&entry.day.as_str()) {
                worked
                    .entry(entry.staff_name.as_str())
                    .or_default()
                    .insert(entry.day.as_str());
            }
        }
        for (name, pattern) in &mut patterns {
            match worked.get(name.as_str()).map_or(0, HashSet::len) {
                2 => pattern.full_worked += 1,
                1 => pattern.partial += 1,
                _ => pattern.full_off += 1,
            }
        }
    }
    patterns
}

/// Weekend fairness is judged on full weekends worked: a spread of more than
/// one between the most and least burdened staff compromises the rule.
fn check_fair_weekends(problem: &ScheduleProblem, schedule: &[WeekSchedule]) -> RuleCompliance {
    let patterns = weekend_patterns(problem, schedule);
    let min_full = patterns.iter().map(|(_, p)| p.full_worked).min().unwrap_or(0);
    let max_full = patterns.iter().map(|(_, p)| p.full_worked).max().unwrap_or(0);
    let difference = max_full - min_full;

    if difference <= 1 {
        return RuleCompliance {
            rule: "Fair Weekend Distribution".to_string(),
            status: ComplianceStatus::Followed,
            details: format!(
                "Weekend patterns are fairly distributed. Max difference in full weekends worked: {difference}."
            ),
            violations: Vec::new(),
        };
    }

    let mut ranked: Vec<&(String, WeekendPattern)> = patterns.iter().collect();
    ranked.sort_by_key(|(_, pattern)| std::cmp::Reverse(pattern.full_worked));
    let mut violations = Vec::new();
    for (name, pattern) in ranked {
        if pattern.full_worked > min_full + 1 {
            violations.push(Violation {
                staff: name.clone(),
                day: "Weekends".to_string(),
                week: "All weeks".to_string(),
                issue: format!(
                    "{} full weekend{} worked, {} partial, {} completely off",
                    pattern.full_worked,
                    if pattern.full_worked != 1 { "s" } else { "" },
                    pattern.partial,
                    pattern.full_off
                ),
                solution: format!(
                    "Consider rotating full weekends more evenly - aim for {}-{} full weekends per person",
                    min_full,
                    min_full + 1
                ),
            });
        }
    }

    RuleCompliance {
        rule: "Fair Weekend Distribution".to_string(),
        status: ComplianceStatus::Compromised,
        details: format!(
            "Weekend distribution varies by {difference} full weekends. Some staff work more full weekends than others."
        ),
        violations,
    }
}

fn check_max_consecutive(schedule: &[WeekSchedule], max_days: i64) -> Vec<Violation> {
    let mut violations = Vec::new();
    for week in schedule {
        let mut order: Vec<&str> = Vec::new();
        let mut worked: HashMap<&str, HashSet<&str>> = HashMap::new();
        for entry in &week.shifts {
            worked
                .entry(entry.staff_name.as_str())
                .or_insert_with(|| {
                    order.push(entry.staff_name.as_str());
                    HashSet::new()
                })
                .insert(entry.day.as_str());
        }
        for staff in order {
            let Some(days) = worked.get(staff) else {
                continue;
            };
            let mut run: Vec<&str> = Vec::new();
            for day in DAY_ORDER {
                if days.contains(day) {
                    run.push(day);
                } else {
                    flush_run(&mut violations, staff, week.week, &run, max_days);
                    run.clear();
                }
            }
            flush_run(&mut violations, staff, week.week, &run, max_days);
        }
    }
    violations
}

fn flush_run(
    violations: &mut Vec<Violation>,
    staff: &str,
    week: u32,
    run: &[&str],
    max_days: i64,
) {
    if run.is_empty() || run.len() as i64 <= max_days {
        return;
    }
    violations.push(Violation {
        staff: staff.to_string(),
        day: format!("{}-{}", run[0], run[run.len() - 1]),
        week: format!("Week {week}"),
        issue: format!("Worked {} consecutive days", run.len()),
        solution: "Add a day off during this period or reduce shift assignments".to_string(),
    });
}

fn check_minimum_days_off(
    problem: &ScheduleProblem,
    schedule: &[WeekSchedule],
    min_days_off: i64,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for week in schedule {
        let mut worked: HashMap<&str, HashSet<&str>> = HashMap::new();
        for entry in &week.shifts {
            worked
                .entry(entry.staff_name.as_str())
                .or_default()
                .insert(entry.day.as_str());
        }
        for member in &problem.staff {
            let days_off = 7 - worked.get(member.name.as_str()).map_or(0, |d| d.len() as i64);
            if days_off < min_days_off {
                violations.push(Violation {
                    staff: member.name.clone(),
                    day: "Full week".to_string(),
                    week: format!("Week {}", week.week),
                    issue: format!("Only {days_off} day(s) off this week"),
                    solution: format!(
                        "Remove {} shift(s) or reduce contracted hours",
                        min_days_off - days_off
                    ),
                });
            }
        }
    }
    violations
}
