//! Seeded construction search used when the MILP backend is unavailable.
//!
//! Same two-phase semantics as the MILP path: restarts maximize coverage
//! first, then an improvement pass moves scheduled courses toward earlier
//! periods without touching the scheduled set.

use rand::seq::SliceRandom;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;
use types::{Catalog, PhaseReport, SolveParams, SolveStatus, TimetableResult};

use crate::{
    assemble, coverage_base, flatten, placements_to_assignments, slot_preference, FlatCourse,
    Placement,
};

const RESTARTS: usize = 24;

struct Candidate {
    placements: Vec<Placement>,
    coverage: i64,
    morning: i64,
}

pub(crate) fn solve_two_phase(catalog: &Catalog, params: &SolveParams) -> TimetableResult {
    let started = Instant::now();
    let courses = flatten(catalog);
    let total = courses.len();
    let pref = slot_preference(params);
    let budget = Duration::from_secs(params.time_limit_secs);

    if total == 0 {
        let phase1 = PhaseReport {
            status: SolveStatus::Optimal,
            elapsed: started.elapsed(),
            objective: 0.0,
            scheduled: 0,
            total,
        };
        return assemble(catalog, params, Vec::new(), phase1, None, "seeded-greedy");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let base = coverage_base(&courses);

    // Phase 1: restart the construction with shuffled course orders, keep the
    // lexicographically best (coverage, morning score) candidate.
    let mut order: Vec<usize> = (0..total).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(courses[i].course.credit));
    let mut best = construct(&courses, catalog.rooms.len(), params, &pref, &order, base);
    for restart in 0..RESTARTS {
        if started.elapsed() >= budget {
            debug!(restart, "phase 1 budget exhausted");
            break;
        }
        order.shuffle(&mut rng);
        let cand = construct(&courses, catalog.rooms.len(), params, &pref, &order, base);
        if (cand.coverage, cand.morning) > (best.coverage, best.morning) {
            best = cand;
        }
    }

    let scheduled = best.placements.len();
    let phase1 = PhaseReport {
        status: if scheduled == total {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        },
        elapsed: started.elapsed(),
        objective: best.coverage as f64,
        scheduled,
        total,
    };

    if scheduled == 0 {
        return assemble(catalog, params, Vec::new(), phase1, None, "seeded-greedy");
    }

    // Phase 2: relocate scheduled courses toward higher-weight slots. The
    // scheduled set is untouched by construction.
    let phase2_started = Instant::now();
    let morning = improve_quality(
        &courses,
        catalog.rooms.len(),
        params,
        &pref,
        &mut best.placements,
        phase2_started,
        budget,
    );
    let phase2 = PhaseReport {
        status: SolveStatus::Feasible,
        elapsed: phase2_started.elapsed(),
        objective: morning as f64,
        scheduled,
        total,
    };

    let assignments = placements_to_assignments(&courses, catalog, params, &best.placements);
    assemble(catalog, params, assignments, phase1, Some(phase2), "seeded-greedy")
}

fn construct(
    courses: &[FlatCourse<'_>],
    rooms: usize,
    params: &SolveParams,
    pref: &[u32],
    order: &[usize],
    base: i64,
) -> Candidate {
    let mut class_at: HashSet<(usize, u32)> = HashSet::new();
    let mut teacher_at: HashSet<(&str, u32)> = HashSet::new();
    let mut room_at: HashSet<(usize, u32)> = HashSet::new();

    let mut placements = Vec::new();
    let mut coverage = 0i64;
    let mut morning = 0i64;

    for &i in order {
        let fc = &courses[i];
        let teacher = fc.course.teacher.name();
        for &k in pref {
            if class_at.contains(&(fc.class_idx, k)) {
                continue;
            }
            if let Some(t) = teacher {
                if teacher_at.contains(&(t, k)) {
                    continue;
                }
            }
            let Some(r) = (0..rooms).find(|&r| !room_at.contains(&(r, k))) else {
                continue;
            };

            class_at.insert((fc.class_idx, k));
            if let Some(t) = teacher {
                teacher_at.insert((t, k));
            }
            room_at.insert((r, k));
            placements.push((i, k, r));
            coverage += base + fc.course.credit as i64;
            morning += params.morning_weights[(k % params.periods) as usize];
            break;
        }
    }

    Candidate {
        placements,
        coverage,
        morning,
    }
}

fn improve_quality(
    courses: &[FlatCourse<'_>],
    rooms: usize,
    params: &SolveParams,
    pref: &[u32],
    placements: &mut [Placement],
    started: Instant,
    budget: Duration,
) -> i64 {
    let weight = |k: u32| params.morning_weights[(k % params.periods) as usize];

    let mut class_at: HashSet<(usize, u32)> = HashSet::new();
    let mut teacher_at: HashSet<(&str, u32)> = HashSet::new();
    let mut room_at: HashSet<(usize, u32)> = HashSet::new();
    for &(i, k, r) in placements.iter() {
        class_at.insert((courses[i].class_idx, k));
        if let Some(t) = courses[i].course.teacher.name() {
            teacher_at.insert((t, k));
        }
        room_at.insert((r, k));
    }

    let mut changed = true;
    while changed && started.elapsed() < budget {
        changed = false;
        for idx in 0..placements.len() {
            let (i, k0, r0) = placements[idx];
            let fc = &courses[i];
            let teacher = fc.course.teacher.name();

            class_at.remove(&(fc.class_idx, k0));
            if let Some(t) = teacher {
                teacher_at.remove(&(t, k0));
            }
            room_at.remove(&(r0, k0));

            let mut chosen = (k0, r0);
            for &k in pref {
                // Preference order is weight-descending, so no later slot can
                // improve on the current one.
                if weight(k) <= weight(k0) {
                    break;
                }
                if class_at.contains(&(fc.class_idx, k)) {
                    continue;
                }
                if let Some(t) = teacher {
                    if teacher_at.contains(&(t, k)) {
                        continue;
                    }
                }
                if let Some(r) = (0..rooms).find(|&r| !room_at.contains(&(r, k))) {
                    chosen = (k, r);
                    changed = true;
                    break;
                }
            }

            class_at.insert((fc.class_idx, chosen.0));
            if let Some(t) = teacher {
                teacher_at.insert((t, chosen.0));
            }
            room_at.insert((chosen.1, chosen.0));
            placements[idx] = (i, chosen.0, chosen.1);
        }
    }

    placements.iter().map(|&(_, k, _)| weight(k)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ClassId, ClassLevel, Course, CourseCode, Room, RoomNumber, TeacherId, TeacherRef};

    fn catalog(courses: usize, teachers: usize, rooms: usize) -> Catalog {
        Catalog {
            rooms: (0..rooms)
                .map(|r| Room {
                    number: RoomNumber(format!("R{r}")),
                })
                .collect(),
            classes: vec![ClassLevel {
                id: ClassId("1".into()),
                courses: (0..courses)
                    .map(|i| Course {
                        code: CourseCode(format!("C{i}")),
                        name: format!("Course {i}"),
                        credit: (i % 5) as u32,
                        teacher: TeacherRef::Named(TeacherId(format!("T{}", i % teachers))),
                    })
                    .collect(),
            }],
        }
    }

    fn small_params() -> SolveParams {
        SolveParams {
            days: 2,
            periods: 3,
            day_names: vec!["Day 0".into(), "Day 1".into()],
            period_labels: vec!["P0".into(), "P1".into(), "P2".into()],
            morning_weights: vec![3, 2, 1],
            ..SolveParams::default()
        }
    }

    #[test]
    fn construction_respects_all_three_exclusivity_dimensions() {
        let cat = catalog(6, 2, 2);
        let result = solve_two_phase(&cat, &small_params());
        assert!(ttable_core::scoring::verify(&cat, &small_params(), &result.assignments).is_empty());
    }

    #[test]
    fn quality_pass_fills_early_periods() {
        // Three courses, three distinct teachers, one room, one day: the only
        // conflict-free layout uses periods 0..3, so the morning score is the
        // maximum achievable.
        let cat = Catalog {
            rooms: vec![Room {
                number: RoomNumber("R0".into()),
            }],
            classes: vec![ClassLevel {
                id: ClassId("1".into()),
                courses: (0..3)
                    .map(|i| Course {
                        code: CourseCode(format!("C{i}")),
                        name: format!("Course {i}"),
                        credit: 0,
                        teacher: TeacherRef::Named(TeacherId(format!("T{i}"))),
                    })
                    .collect(),
            }],
        };
        let params = SolveParams {
            days: 1,
            periods: 3,
            day_names: vec!["Day 0".into()],
            period_labels: vec!["P0".into(), "P1".into(), "P2".into()],
            morning_weights: vec![3, 2, 1],
            ..SolveParams::default()
        };
        let result = solve_two_phase(&cat, &params);
        assert_eq!(result.assignments.len(), 3);
        assert_eq!(result.morning_score, 6);
        assert_eq!(result.phase2.unwrap().objective, 6.0);
    }

    #[test]
    fn phase_two_objective_never_undercuts_phase_one_layout() {
        let cat = catalog(5, 3, 2);
        let params = small_params();
        let result = solve_two_phase(&cat, &params);
        let phase2 = result.phase2.unwrap();
        assert_eq!(phase2.scheduled, result.phase1.scheduled);
        assert_eq!(result.morning_score as f64, phase2.objective);
    }

    #[test]
    fn full_coverage_is_reported_optimal() {
        let cat = catalog(4, 4, 2);
        let result = solve_two_phase(&cat, &small_params());
        assert_eq!(result.phase1.status, SolveStatus::Optimal);
        assert_eq!(result.phase1.scheduled, 4);
    }
}
