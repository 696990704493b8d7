//! Demo request generators.
//!
//! Seeded, deterministic, and feasible by construction: the bench binary and
//! the HTTP demo routes both rely on these solving cleanly.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::domain::{DayAvailability, StaffId, DAY_ORDER};
use crate::dto::{RuleDto, ScheduleRequest, ShiftDto, StaffDto};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                staff_count: 4,
                contracted_staff: 2,
                contracted_hours: 16,
                days: &DAY_ORDER[..5],
                shift_templates: &[("Morning", "08:00", "16:00"), ("Evening", "14:00", "22:00")],
                weeks: 1,
                unavailable_half_days: 1,
            },
            DemoData::Large => DemoDataParameters {
                staff_count: 8,
                contracted_staff: 4,
                contracted_hours: 16,
                days: &DAY_ORDER,
                shift_templates: &[
                    ("Morning", "06:00", "14:00"),
                    ("Afternoon", "14:00", "22:00"),
                    ("Night", "22:00", "06:00"),
                ],
                weeks: 2,
                unavailable_half_days: 3,
            },
        }
    }
}

struct DemoDataParameters {
    staff_count: usize,
    /// How many of the staff carry a contract; the rest are flexible.
    contracted_staff: usize,
    contracted_hours: i64,
    days: &'static [&'static str],
    shift_templates: &'static [(&'static str, &'static str, &'static str)],
    weeks: u32,
    unavailable_half_days: usize,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec![DemoData::Small.as_str(), DemoData::Large.as_str()]
}

/// Generates a demo scheduling request for the given size.
pub fn generate(demo: DemoData) -> ScheduleRequest {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let names = generate_name_permutations(&mut rng);
    let mut staff: Vec<StaffDto> = (0..params.staff_count)
        .map(|idx| {
            let contracted = if idx < params.contracted_staff {
                params.contracted_hours
            } else {
                0
            };
            StaffDto {
                id: StaffId::Number(idx as i64 + 1),
                name: names[idx % names.len()].clone(),
                contracted_hours: contracted,
                max_hours: Some(40),
                availability: Default::default(),
            }
        })
        .collect();

    // Sprinkle a few half-day gaps over the flexible staff; the contracted
    // members keep open availability so the demo always solves.
    for _ in 0..params.unavailable_half_days {
        let member = rng.gen_range(params.contracted_staff..params.staff_count);
        let day = params.days.choose(&mut rng).copied().unwrap_or("Monday");
        let morning_off = rng.gen_bool(0.5);
        staff[member].availability.insert(
            day.to_lowercase(),
            DayAvailability::Split {
                am: Some(!morning_off),
                pm: Some(morning_off),
            },
        );
    }

    let shifts: Vec<ShiftDto> = params
        .days
        .iter()
        .flat_map(|day| {
            params.shift_templates.iter().map(move |(name, start, end)| ShiftDto {
                day: day.to_string(),
                start_time: start.to_string(),
                end_time: end.to_string(),
                staff_required: 1,
                name: Some(format!("{day} {name}")),
            })
        })
        .collect();

    let rules = vec![
        RuleDto {
            kind: Some("no_clopening".to_string()),
            name: None,
            enabled: true,
            value: None,
        },
        RuleDto {
            kind: Some("max_consecutive_days".to_string()),
            name: None,
            enabled: true,
            value: Some(6),
        },
        RuleDto {
            kind: Some("rest_between_shifts".to_string()),
            name: None,
            enabled: true,
            value: Some(10),
        },
    ];

    ScheduleRequest {
        staff,
        shifts,
        rules,
        weeks: params.weeks,
    }
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{first} {last}"));
        }
    }
    names.shuffle(rng);
    names
}
