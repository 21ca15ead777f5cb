//! Two-phase MILP model over `good_lp`.
//!
//! One binary `occupies` variable per (course, slot, room) triple plus one
//! derived binary `scheduled` per course, tied together by an equality. Phase
//! 1 maximizes credit-weighted coverage; phase 2 re-solves with every
//! `scheduled` value pinned and maximizes the morning-preference score.

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, Solution, SolverModel, Variable,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::info;
use types::{Catalog, PhaseReport, SolveParams, SolveStatus, TimetableResult};

use crate::{assemble, coverage_base, flatten, placements_to_assignments, FlatCourse, Placement};

struct Prep<'a> {
    catalog: &'a Catalog,
    params: &'a SolveParams,
    courses: Vec<FlatCourse<'a>>,
    teacher_groups: Vec<(&'a str, Vec<usize>)>,
    slots: u32,
    rooms: usize,
}

#[derive(Clone, Copy)]
struct OccVar {
    ci: usize,
    k: u32,
    r: usize,
    var: Variable,
}

enum Phase {
    Coverage,
    Quality(Vec<bool>),
}

fn build_prep<'a>(catalog: &'a Catalog, params: &'a SolveParams) -> Prep<'a> {
    let courses = flatten(catalog);
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, fc) in courses.iter().enumerate() {
        if let Some(t) = fc.course.teacher.name() {
            groups.entry(t).or_default().push(i);
        }
    }
    let mut teacher_groups: Vec<(&str, Vec<usize>)> = groups.into_iter().collect();
    teacher_groups.sort_by_key(|(t, _)| *t);
    Prep {
        catalog,
        params,
        courses,
        teacher_groups,
        slots: params.slot_count(),
        rooms: catalog.rooms.len(),
    }
}

fn declare_vars(prep: &Prep, vars: &mut ProblemVariables) -> (Vec<OccVar>, Vec<Variable>) {
    let mut occ = Vec::with_capacity(prep.courses.len() * prep.slots as usize * prep.rooms);
    for ci in 0..prep.courses.len() {
        for k in 0..prep.slots {
            for r in 0..prep.rooms {
                occ.push(OccVar {
                    ci,
                    k,
                    r,
                    var: vars.add(variable().binary()),
                });
            }
        }
    }
    let scheduled = (0..prep.courses.len())
        .map(|_| vars.add(variable().binary()))
        .collect();
    (occ, scheduled)
}

/// Sum of a course's occupancy flags equals its scheduled flag, so a course
/// is placed exactly once or not at all, never partially.
fn add_linking_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    occ: &[OccVar],
    scheduled: &[Variable],
) -> M {
    for ci in 0..prep.courses.len() {
        let mut sum = Expression::from(0.0);
        for o in occ.iter().filter(|o| o.ci == ci) {
            sum = sum + o.var;
        }
        model = model.with(sum.eq(scheduled[ci]));
    }
    model
}

fn add_class_exclusivity<M: SolverModel>(mut model: M, prep: &Prep, occ: &[OccVar]) -> M {
    for class_idx in 0..prep.catalog.classes.len() {
        if prep.catalog.classes[class_idx].courses.len() < 2 {
            continue;
        }
        for k in 0..prep.slots {
            let mut sum = Expression::from(0.0);
            for o in occ
                .iter()
                .filter(|o| prep.courses[o.ci].class_idx == class_idx && o.k == k)
            {
                sum = sum + o.var;
            }
            model = model.with(sum.leq(1.0));
        }
    }
    model
}

fn add_teacher_exclusivity<M: SolverModel>(mut model: M, prep: &Prep, occ: &[OccVar]) -> M {
    for (_, members) in &prep.teacher_groups {
        if members.len() < 2 {
            continue;
        }
        for k in 0..prep.slots {
            let mut sum = Expression::from(0.0);
            for o in occ.iter().filter(|o| members.contains(&o.ci) && o.k == k) {
                sum = sum + o.var;
            }
            model = model.with(sum.leq(1.0));
        }
    }
    model
}

fn add_room_exclusivity<M: SolverModel>(mut model: M, prep: &Prep, occ: &[OccVar]) -> M {
    if prep.courses.len() < 2 {
        return model;
    }
    for r in 0..prep.rooms {
        for k in 0..prep.slots {
            let mut sum = Expression::from(0.0);
            for o in occ.iter().filter(|o| o.r == r && o.k == k) {
                sum = sum + o.var;
            }
            model = model.with(sum.leq(1.0));
        }
    }
    model
}

fn coverage_objective(prep: &Prep, scheduled: &[Variable]) -> Expression {
    let base = coverage_base(&prep.courses);
    let mut obj = Expression::from(0.0);
    for (ci, fc) in prep.courses.iter().enumerate() {
        obj = obj + ((base + fc.course.credit as i64) as f64) * scheduled[ci];
    }
    obj
}

fn quality_objective(prep: &Prep, occ: &[OccVar]) -> Expression {
    let mut obj = Expression::from(0.0);
    for o in occ {
        let w = prep.params.morning_weights[(o.k % prep.params.periods) as usize];
        if w != 0 {
            obj = obj + (w as f64) * o.var;
        }
    }
    obj
}

fn run_phase(
    prep: &Prep,
    phase: Phase,
) -> anyhow::Result<(Vec<Placement>, f64, SolveStatus, Duration)> {
    let started = Instant::now();
    let budget = Duration::from_secs(prep.params.time_limit_secs);

    let mut pvars = ProblemVariables::new();
    let (occ, scheduled) = declare_vars(prep, &mut pvars);
    let objective = match &phase {
        Phase::Coverage => coverage_objective(prep, &scheduled),
        Phase::Quality(_) => quality_objective(prep, &occ),
    };

    let mut model = pvars.maximise(objective.clone()).using(default_solver);
    model.set_parameter("log", "0");
    model.set_parameter("sec", &prep.params.time_limit_secs.to_string());
    model.set_parameter("threads", &prep.params.threads.to_string());
    model.set_parameter("randomCbcSeed", &prep.params.seed.to_string());

    model = add_linking_constraints(model, prep, &occ, &scheduled);
    model = add_class_exclusivity(model, prep, &occ);
    model = add_teacher_exclusivity(model, prep, &occ);
    model = add_room_exclusivity(model, prep, &occ);

    if let Phase::Quality(fixed) = &phase {
        for (ci, &on) in fixed.iter().enumerate() {
            let rhs = if on { 1.0 } else { 0.0 };
            model = model.with(Expression::from(scheduled[ci]).eq(rhs));
        }
    }

    let sol = model
        .solve()
        .map_err(|e| anyhow::anyhow!("milp solve failed: {e}"))?;

    let placements: Vec<Placement> = occ
        .iter()
        .filter(|o| sol.value(o.var) > 0.5)
        .map(|o| (o.ci, o.k, o.r))
        .collect();
    let objective_value = sol.eval(objective.clone());
    let elapsed = started.elapsed();
    let status = if elapsed >= budget {
        SolveStatus::Feasible
    } else {
        SolveStatus::Optimal
    };
    Ok((placements, objective_value, status, elapsed))
}

pub(crate) fn solve_two_phase(
    catalog: &Catalog,
    params: &SolveParams,
) -> anyhow::Result<TimetableResult> {
    let prep = build_prep(catalog, params);
    let total = prep.courses.len();

    if total == 0 {
        let phase1 = PhaseReport {
            status: SolveStatus::Optimal,
            elapsed: Duration::ZERO,
            objective: 0.0,
            scheduled: 0,
            total,
        };
        return Ok(assemble(catalog, params, Vec::new(), phase1, None, "milp"));
    }

    info!(
        occupancy_vars = total * prep.slots as usize * prep.rooms,
        "phase 1: maximizing coverage"
    );
    let (phase1_placements, objective, status, elapsed) = run_phase(&prep, Phase::Coverage)?;
    let scheduled = phase1_placements.len();
    let phase1 = PhaseReport {
        status,
        elapsed,
        objective,
        scheduled,
        total,
    };

    if scheduled == 0 {
        return Ok(assemble(catalog, params, Vec::new(), phase1, None, "milp"));
    }

    let mut frozen = vec![false; total];
    for &(ci, _, _) in &phase1_placements {
        frozen[ci] = true;
    }

    info!(scheduled, "phase 2: maximizing morning preference with coverage frozen");
    let (phase2_placements, objective, status, elapsed) = run_phase(&prep, Phase::Quality(frozen))?;
    let phase2 = PhaseReport {
        status,
        elapsed,
        objective,
        scheduled: phase2_placements.len(),
        total,
    };

    let assignments = placements_to_assignments(&prep.courses, catalog, params, &phase2_placements);
    Ok(assemble(catalog, params, assignments, phase1, Some(phase2), "milp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ClassId, ClassLevel, Course, CourseCode, Room, RoomNumber, TeacherId, TeacherRef};

    fn catalog() -> Catalog {
        let course = |code: &str, teacher: &str| Course {
            code: CourseCode(code.into()),
            name: format!("Course {code}"),
            credit: 3,
            teacher: TeacherRef::Named(TeacherId(teacher.into())),
        };
        Catalog {
            rooms: vec![
                Room {
                    number: RoomNumber("A100".into()),
                },
                Room {
                    number: RoomNumber("B200".into()),
                },
            ],
            classes: vec![
                ClassLevel {
                    id: ClassId("1".into()),
                    courses: vec![course("INF111", "ATSA"), course("INF121", "KOUOKAM")],
                },
                ClassLevel {
                    id: ClassId("2".into()),
                    courses: vec![course("MAT111", "ATSA")],
                },
            ],
        }
    }

    #[test]
    fn prep_groups_courses_by_named_teacher() {
        let cat = catalog();
        let params = SolveParams::default();
        let prep = build_prep(&cat, &params);
        assert_eq!(prep.courses.len(), 3);
        assert_eq!(prep.teacher_groups.len(), 2);
        let atsa = prep
            .teacher_groups
            .iter()
            .find(|(t, _)| *t == "ATSA")
            .unwrap();
        assert_eq!(atsa.1, vec![0, 2]);
    }

    #[test]
    fn declares_one_occupancy_var_per_course_slot_room() {
        let cat = catalog();
        let params = SolveParams::default();
        let prep = build_prep(&cat, &params);
        let mut pvars = ProblemVariables::new();
        let (occ, scheduled) = declare_vars(&prep, &mut pvars);
        assert_eq!(occ.len(), 3 * 30 * 2);
        assert_eq!(scheduled.len(), 3);
    }
}
