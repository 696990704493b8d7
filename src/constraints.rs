//! CP model construction for a single week.
//!
//! One 0/1 variable per (shift, staff) cell. Hard staffing constraints,
//! availability, hour bounds, the enabled optional rules, and the inter-week
//! variety bound are all posted here; the solve itself happens in `solver`.

use std::collections::HashMap;

use selen::prelude::*;

use crate::domain::{Assignment, RuleKind, ScheduleProblem, DAY_ORDER, WEEKEND_DAYS};

/// Per-week wall-clock budget for the CP search.
pub const SOLVE_TIMEOUT_MS: u64 = 30_000;

/// Minimum number of grid cells a new week must change relative to each
/// previously generated week.
pub fn min_weekly_changes(shift_count: usize) -> usize {
    (shift_count * 9 / 10).max(3)
}

/// A constructed week model plus its variable grid, indexed `[shift][staff]`.
pub struct WeekModel {
    pub model: Model,
    pub vars: Vec<Vec<VarId>>,
}

/// Builds the CP model for one week, with variety constraints against every
/// assignment in `previous`.
pub fn build_week_model(problem: &ScheduleProblem, previous: &[Assignment]) -> WeekModel {
    let staff = &problem.staff;
    let shifts = &problem.shifts;

    let config = SolverConfig::default().with_timeout_ms(SOLVE_TIMEOUT_MS);
    let mut m = Model::with_config(config);

    // x[s][p] = 1 when staff p works shift s. Cells ruled out by availability
    // are pinned to zero up front.
    let mut vars: Vec<Vec<VarId>> = Vec::with_capacity(shifts.len());
    for shift in shifts {
        let mut row = Vec::with_capacity(staff.len());
        for member in staff {
            row.push(if member.is_available(&shift.day, shift.is_morning()) {
                m.int(0, 1)
            } else {
                m.int(0, 0)
            });
        }
        vars.push(row);
    }

    // ========================================================================
    // Exact headcount per shift
    // ========================================================================
    for (shift_idx, shift) in shifts.iter().enumerate() {
        let filled = sum_or_zero(&mut m, &vars[shift_idx]);
        m.c(filled).eq(int(clamp_i32(shift.staff_required)));
    }

    // ========================================================================
    // At most one shift per staff per day
    // ========================================================================
    // Days group by their raw request spelling, matching the availability
    // lookup's tolerance for unrecognized day names.
    let mut shifts_by_day: Vec<(&str, Vec<usize>)> = Vec::new();
    for (idx, shift) in shifts.iter().enumerate() {
        match shifts_by_day.iter_mut().find(|(day, _)| *day == shift.day) {
            Some((_, group)) => group.push(idx),
            None => shifts_by_day.push((shift.day.as_str(), vec![idx])),
        }
    }
    for (_, day_shifts) in &shifts_by_day {
        for staff_idx in 0..staff.len() {
            let cells: Vec<VarId> = day_shifts.iter().map(|&s| vars[s][staff_idx]).collect();
            let worked = m.sum(&cells);
            m.c(worked).le(int(1));
        }
    }

    // ========================================================================
    // Weekly minutes within [contracted - 1h, max]
    // ========================================================================
    let mut duration_consts: HashMap<i32, VarId> = HashMap::new();
    for (staff_idx, member) in staff.iter().enumerate() {
        let mut minutes: Vec<VarId> = Vec::with_capacity(shifts.len());
        for (shift_idx, shift) in shifts.iter().enumerate() {
            let duration = clamp_i32(shift.duration_minutes());
            let constant = match duration_consts.get(&duration) {
                Some(&var) => var,
                None => {
                    let var = m.int(duration, duration);
                    duration_consts.insert(duration, var);
                    var
                }
            };
            minutes.push(m.mul(vars[shift_idx][staff_idx], constant));
        }
        let total = sum_or_zero(&mut m, &minutes);
        if member.contracted_hours > 0 {
            let floor = member.contracted_hours.saturating_mul(60).saturating_sub(60);
            m.c(total).ge(int(clamp_i32(floor)));
        }
        m.c(total).le(int(clamp_i32(member.max_hours.saturating_mul(60))));
    }

    // ========================================================================
    // Optional rules
    // ========================================================================
    if problem.rules.enabled(RuleKind::NoClopening) {
        add_no_clopening(&mut m, problem, &vars);
    }
    if problem.rules.enabled(RuleKind::MaxConsecutiveDays) {
        let max_days = problem.rules.value(RuleKind::MaxConsecutiveDays, 6);
        add_max_consecutive_days(&mut m, problem, &vars, max_days);
    }
    if problem.rules.enabled(RuleKind::FairWeekendDistribution) {
        add_fair_weekends(&mut m, problem, &vars);
    }

    // ========================================================================
    // Variety against previously generated weeks
    // ========================================================================
    if !previous.is_empty() {
        let required = clamp_i32(min_weekly_changes(shifts.len()) as i64);
        for prior in previous {
            let mut changes: Vec<VarId> = Vec::with_capacity(shifts.len() * staff.len());
            for shift_idx in 0..shifts.len() {
                for staff_idx in 0..staff.len() {
                    let cell = vars[shift_idx][staff_idx];
                    // A cell counts as changed when it leaves a previously
                    // set position or fills a previously empty one.
                    changes.push(if prior.assigned(shift_idx, staff_idx) {
                        negation(&mut m, cell)
                    } else {
                        cell
                    });
                }
            }
            let total = sum_or_zero(&mut m, &changes);
            m.c(total).ge(int(required));
        }
    }

    WeekModel { model: m, vars }
}

/// A closing shift may not be followed by an opening shift on the next
/// calendar day for the same staff member.
fn add_no_clopening(m: &mut Model, problem: &ScheduleProblem, vars: &[Vec<VarId>]) {
    for staff_idx in 0..problem.staff.len() {
        for pair in DAY_ORDER.windows(2) {
            let closing: Vec<usize> = problem
                .shifts
                .iter()
                .enumerate()
                .filter(|(_, s)| s.day == pair[0] && s.is_closing())
                .map(|(idx, _)| idx)
                .collect();
            let opening: Vec<usize> = problem
                .shifts
                .iter()
                .enumerate()
                .filter(|(_, s)| s.day == pair[1] && s.is_opening())
                .map(|(idx, _)| idx)
                .collect();
            for &close_idx in &closing {
                for &open_idx in &opening {
                    let both = m.sum(&[vars[close_idx][staff_idx], vars[open_idx][staff_idx]]);
                    m.c(both).le(int(1));
                }
            }
        }
    }
}

/// At most `max_days` worked days inside each (max_days + 1)-wide window of
/// the Monday..Sunday order. Windows never start past index 7 - max_days - 1.
fn add_max_consecutive_days(
    m: &mut Model,
    problem: &ScheduleProblem,
    vars: &[Vec<VarId>],
    max_days: i64,
) {
    if !(0..7).contains(&max_days) {
        return;
    }
    let max_days = max_days as usize;
    for staff_idx in 0..problem.staff.len() {
        for start in 0..(7 - max_days) {
            let mut worked_days: Vec<VarId> = Vec::new();
            for day in &DAY_ORDER[start..start + max_days + 1] {
                let day_cells: Vec<VarId> = problem
                    .shifts
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.day == *day)
                    .map(|(idx, _)| vars[idx][staff_idx])
                    .collect();
                if day_cells.is_empty() {
                    continue;
                }
                // worked >= every cell of the day, so any taken shift forces
                // the day to count against the window.
                let worked = m.int(0, 1);
                let rest = negation(m, worked);
                for cell in day_cells {
                    let pinned = m.sum(&[cell, rest]);
                    m.c(pinned).le(int(1));
                }
                worked_days.push(worked);
            }
            if !worked_days.is_empty() {
                let total = m.sum(&worked_days);
                m.c(total).le(int(clamp_i32(max_days as i64)));
            }
        }
    }
}

/// Weekend shifts per staff stay within [fair - 1, fair + 2], where fair is
/// the floor of weekend shifts over headcount.
fn add_fair_weekends(m: &mut Model, problem: &ScheduleProblem, vars: &[Vec<VarId>]) {
    if problem.staff.is_empty() {
        return;
    }
    let weekend: Vec<usize> = problem
        .shifts
        .iter()
        .enumerate()
        .filter(|(_, s)| WEEKEND_DAYS.contains(&s.day.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    if weekend.is_empty() {
        return;
    }
    let fair = (weekend.len() / problem.staff.len()) as i64;
    for staff_idx in 0..problem.staff.len() {
        let cells: Vec<VarId> = weekend.iter().map(|&s| vars[s][staff_idx]).collect();
        let total = m.sum(&cells);
        m.c(total).ge(int(clamp_i32((fair - 1).max(0))));
        m.c(total).le(int(clamp_i32(fair + 2)));
    }
}

/// 1 - `var` for a 0/1 variable.
fn negation(m: &mut Model, var: VarId) -> VarId {
    let flipped = m.int(0, 1);
    let both = m.sum(&[flipped, var]);
    m.c(both).eq(int(1));
    flipped
}

fn sum_or_zero(m: &mut Model, vars: &[VarId]) -> VarId {
    if vars.is_empty() {
        m.int(0, 0)
    } else {
        m.sum(vars)
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
