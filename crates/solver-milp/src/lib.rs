#[cfg(feature = "with-milp")]
mod milp_core;

mod fallback;

use serde_json::json;
use tracing::info;
use ttable_core::{scoring, Solver};
use types::{
    Assignment, Catalog, ClassId, Course, PhaseReport, SolveParams, TimetableResult,
};

/// Per-course weight for the coverage objective. Exceeds the catalog's total
/// credit mass, so scheduling one more course always beats any redistribution
/// of credits among fewer courses.
pub(crate) fn coverage_base(courses: &[FlatCourse<'_>]) -> i64 {
    courses.iter().map(|fc| fc.course.credit as i64).sum::<i64>() + 1
}

pub struct TwoPhaseSolver;

impl TwoPhaseSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TwoPhaseSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for TwoPhaseSolver {
    fn solve(&self, catalog: &Catalog, params: &SolveParams) -> anyhow::Result<TimetableResult> {
        ttable_core::validate(catalog, params)?;
        info!(
            courses = catalog.course_count(),
            classes = catalog.classes.len(),
            rooms = catalog.rooms.len(),
            slots = params.slot_count(),
            "building timetable"
        );
        #[cfg(feature = "with-milp")]
        {
            match milp_core::solve_two_phase(catalog, params) {
                Ok(r) => return Ok(r),
                Err(e) => {
                    tracing::warn!(error = %e, "milp backend failed, falling back to seeded search")
                }
            }
        }
        Ok(fallback::solve_two_phase(catalog, params))
    }
}

pub(crate) struct FlatCourse<'a> {
    pub class_idx: usize,
    pub class: &'a ClassId,
    pub course: &'a Course,
}

pub(crate) fn flatten(catalog: &Catalog) -> Vec<FlatCourse<'_>> {
    let mut out = Vec::with_capacity(catalog.course_count());
    for (class_idx, class) in catalog.classes.iter().enumerate() {
        for course in &class.courses {
            out.push(FlatCourse {
                class_idx,
                class: &class.id,
                course,
            });
        }
    }
    out
}

/// Slot indices ordered best-first by morning weight, index as tie-break.
pub(crate) fn slot_preference(params: &SolveParams) -> Vec<u32> {
    let mut order: Vec<u32> = (0..params.slot_count()).collect();
    order.sort_by_key(|&k| {
        let period = (k % params.periods) as usize;
        (std::cmp::Reverse(params.morning_weights[period]), k)
    });
    order
}

/// (course index, slot index, room index) as chosen by a search backend.
pub(crate) type Placement = (usize, u32, usize);

pub(crate) fn placements_to_assignments(
    courses: &[FlatCourse<'_>],
    catalog: &Catalog,
    params: &SolveParams,
    placements: &[Placement],
) -> Vec<Assignment> {
    placements
        .iter()
        .map(|&(i, k, r)| {
            let fc = &courses[i];
            Assignment {
                class: fc.class.clone(),
                course: fc.course.code.clone(),
                slot: types::Slot::from_index(k, params.periods),
                room: catalog.rooms[r].number.clone(),
                teacher: fc.course.teacher.clone(),
            }
        })
        .collect()
}

pub(crate) fn assemble(
    catalog: &Catalog,
    params: &SolveParams,
    assignments: Vec<Assignment>,
    phase1: PhaseReport,
    phase2: Option<PhaseReport>,
    method: &str,
) -> TimetableResult {
    let assignments = scoring::sorted_for_display(params, &assignments);
    debug_assert!(scoring::verify(catalog, params, &assignments).is_empty());
    let unscheduled = scoring::unscheduled_report(catalog, params, &assignments);
    let usage = scoring::slot_usage(params, &assignments);
    let morning_score = scoring::morning_score(params, &assignments);
    let stats = json!({
        "method": method,
        "courses": catalog.course_count(),
        "rooms": catalog.rooms.len(),
        "slots": params.slot_count(),
        "seed": params.seed,
    });
    TimetableResult {
        phase1,
        phase2,
        assignments,
        unscheduled,
        usage,
        morning_score,
        stats,
    }
}
