//! Per-week solve driver and the multi-week orchestration loop.
//!
//! Each week is an independent CP model; previously solved weeks feed the
//! variety bound. The first infeasible week aborts the run with a diagnostic
//! and no partial schedule.

use std::time::Instant;

use tracing::info;

use crate::constraints::{build_week_model, WeekModel};
use crate::contracts::check_contract_hours;
use crate::diagnostics::diagnose_week_failure;
use crate::domain::{Assignment, ScheduleProblem};
use crate::dto::{ScheduleEntry, ScheduleResponse, SolveStats, WeekSchedule};
use crate::error::ScheduleError;
use crate::validation::validate_rules;

/// Result of one week's CP solve.
pub struct WeekSolve {
    pub assignment: Assignment,
    /// Seconds spent in the search.
    pub wall_time: f64,
    /// Search nodes explored.
    pub branches: u64,
}

/// Solves a single week, honoring variety against `previous` weeks. An
/// unsatisfiable or timed-out model surfaces as `Infeasible` carrying the
/// diagnostic text.
pub fn solve_week(
    problem: &ScheduleProblem,
    week_num: u32,
    previous: &[Assignment],
) -> Result<WeekSolve, ScheduleError> {
    let WeekModel { model, vars } = build_week_model(problem, previous);
    let started = Instant::now();
    match model.solve() {
        Ok(solution) => {
            let grid = vars
                .iter()
                .map(|row| row.iter().map(|&cell| solution.get::<i32>(cell) == 1).collect())
                .collect();
            Ok(WeekSolve {
                assignment: Assignment::new(grid),
                wall_time: started.elapsed().as_secs_f64(),
                branches: solution.stats.node_count as u64,
            })
        }
        Err(_) => Err(ScheduleError::Infeasible(diagnose_week_failure(
            problem, week_num, previous,
        ))),
    }
}

/// Generates the full multi-week schedule plus its companion reports: the
/// rule-compliance verdicts and the contract reconciliation.
pub fn generate_schedule(problem: &ScheduleProblem) -> Result<ScheduleResponse, ScheduleError> {
    let mut assignments: Vec<Assignment> = Vec::new();
    let mut stats = SolveStats::default();

    for week in 1..=problem.weeks {
        info!(week, "solving week");
        let solved = solve_week(problem, week, &assignments)?;
        stats.wall_time += solved.wall_time;
        stats.branches += solved.branches;
        assignments.push(solved.assignment);
    }

    let schedule = format_schedule(problem, &assignments);
    let contract_issues = check_contract_hours(problem, &schedule);
    let rule_compliance = validate_rules(problem, &schedule);

    Ok(ScheduleResponse {
        success: true,
        status: "FEASIBLE".to_string(),
        schedule,
        contract_issues,
        rule_compliance,
        stats,
    })
}

/// Expands assignment grids into response records, iterating shifts and then
/// staff in request order.
pub fn format_schedule(problem: &ScheduleProblem, assignments: &[Assignment]) -> Vec<WeekSchedule> {
    assignments
        .iter()
        .enumerate()
        .map(|(week_idx, assignment)| {
            let week = week_idx as u32 + 1;
            let mut entries = Vec::new();
            for (shift_idx, shift) in problem.shifts.iter().enumerate() {
                for (staff_idx, member) in problem.staff.iter().enumerate() {
                    if assignment.assigned(shift_idx, staff_idx) {
                        entries.push(ScheduleEntry {
                            week,
                            day: shift.day.clone(),
                            shift_name: shift.display_name(shift_idx),
                            start_time: shift.start_time.clone(),
                            end_time: shift.end_time.clone(),
                            staff_id: member.id.clone(),
                            staff_name: member.name.clone(),
                        });
                    }
                }
            }
            WeekSchedule {
                week,
                shifts: entries,
            }
        })
        .collect()
}
