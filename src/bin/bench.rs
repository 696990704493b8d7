//! Benchmark for the multi-week solve path.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;

use shift_scheduling::demo_data::{self, DemoData};
use shift_scheduling::solver;

fn main() {
    let request = demo_data::generate(DemoData::Large);
    let problem = request.to_domain().expect("demo request is well formed");

    println!("Benchmark: multi-week schedule generation");
    println!("  Staff: {}", problem.staff.len());
    println!("  Shifts: {}", problem.shifts.len());
    println!("  Weeks: {}", problem.weeks);
    println!();

    let started = Instant::now();
    match solver::generate_schedule(&problem) {
        Ok(response) => {
            let entries: usize = response.schedule.iter().map(|week| week.shifts.len()).sum();
            let compromised = response
                .rule_compliance
                .iter()
                .filter(|rule| {
                    rule.status == shift_scheduling::dto::ComplianceStatus::Compromised
                })
                .count();
            println!("Results:");
            println!("  Entries: {entries}");
            println!("  Contract issues: {}", response.contract_issues.len());
            println!("  Compromised rules: {compromised}");
            println!("  Solver wall time: {:.3}s", response.stats.wall_time);
            println!("  Branches: {}", response.stats.branches);
            println!("  Total time: {:.2?}", started.elapsed());
        }
        Err(error) => println!("Schedule generation failed: {error}"),
    }
}
