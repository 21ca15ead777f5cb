use serde_json::json;
use std::collections::{HashMap, HashSet};
use types::{
    Assignment, Catalog, SlotUsage, SolveParams, Unscheduled, UnscheduledReason, Violation,
};

/// Aggregate time-of-day preference score of a solution.
pub fn morning_score(params: &SolveParams, assignments: &[Assignment]) -> i64 {
    assignments
        .iter()
        .filter_map(|a| params.morning_weights.get(a.slot.period as usize))
        .sum()
}

/// Assignments ordered for display: by class, then day, then period.
pub fn sorted_for_display(params: &SolveParams, assignments: &[Assignment]) -> Vec<Assignment> {
    let mut out = assignments.to_vec();
    out.sort_by(|a, b| {
        (&a.class, a.slot.index(params.periods)).cmp(&(&b.class, b.slot.index(params.periods)))
    });
    out
}

/// Per-slot activity summary, restricted to slots with at least one class.
pub fn slot_usage(params: &SolveParams, assignments: &[Assignment]) -> Vec<SlotUsage> {
    let mut by_slot: HashMap<u32, (HashSet<&str>, Vec<&str>)> = HashMap::new();
    for a in assignments {
        let entry = by_slot.entry(a.slot.index(params.periods)).or_default();
        entry.0.insert(a.class.0.as_str());
        entry.1.push(a.room.0.as_str());
    }

    let mut keys: Vec<u32> = by_slot.keys().copied().collect();
    keys.sort_unstable();
    keys.into_iter()
        .map(|k| {
            let (classes, mut rooms) = by_slot.remove(&k).unwrap_or_default();
            rooms.sort_unstable();
            SlotUsage {
                slot: types::Slot::from_index(k, params.periods),
                classes_active: classes.len(),
                rooms: rooms
                    .into_iter()
                    .map(|r| types::RoomNumber(r.to_string()))
                    .collect(),
            }
        })
        .collect()
}

/// Courses left out of the solution, with a post-hoc reason.
///
/// A course is reported as teacher-overloaded when its named teacher carries
/// more courses than there are slots in the week, or when every slot its
/// class leaves free is already taken by that teacher. Everything else is a
/// generic capacity/conflict outcome.
pub fn unscheduled_report(
    catalog: &Catalog,
    params: &SolveParams,
    assignments: &[Assignment],
) -> Vec<Unscheduled> {
    let slots = params.slot_count();

    let scheduled: HashSet<(&str, &str)> = assignments
        .iter()
        .map(|a| (a.class.0.as_str(), a.course.0.as_str()))
        .collect();
    let mut class_busy: HashSet<(&str, u32)> = HashSet::new();
    let mut teacher_busy: HashSet<(&str, u32)> = HashSet::new();
    for a in assignments {
        let k = a.slot.index(params.periods);
        class_busy.insert((a.class.0.as_str(), k));
        if let Some(t) = a.teacher.name() {
            teacher_busy.insert((t, k));
        }
    }

    let mut teacher_total: HashMap<&str, u32> = HashMap::new();
    for (_, course) in catalog.courses() {
        if let Some(t) = course.teacher.name() {
            *teacher_total.entry(t).or_default() += 1;
        }
    }

    let mut out = Vec::new();
    for class in &catalog.classes {
        for course in &class.courses {
            if scheduled.contains(&(class.id.0.as_str(), course.code.0.as_str())) {
                continue;
            }
            let reason = match course.teacher.name() {
                Some(t) => {
                    let total = teacher_total.get(t).copied().unwrap_or(0);
                    let class_free: Vec<u32> = (0..slots)
                        .filter(|&k| !class_busy.contains(&(class.id.0.as_str(), k)))
                        .collect();
                    let blocked = !class_free.is_empty()
                        && class_free.iter().all(|&k| teacher_busy.contains(&(t, k)));
                    if total > slots || blocked {
                        UnscheduledReason::TeacherOverloaded
                    } else {
                        UnscheduledReason::NoFreeSlot
                    }
                }
                None => UnscheduledReason::NoFreeSlot,
            };
            out.push(Unscheduled {
                class: class.id.clone(),
                course: course.code.clone(),
                name: course.name.clone(),
                teacher: course.teacher.clone(),
                reason,
            });
        }
    }
    out
}

/// Exclusivity audit of a solution. An empty result means the timetable is
/// conflict-free and every assignment refers to known catalog entities.
pub fn verify(catalog: &Catalog, params: &SolveParams, assignments: &[Assignment]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let known_courses: HashSet<(&str, &str)> = catalog
        .courses()
        .map(|(class, course)| (class.0.as_str(), course.code.0.as_str()))
        .collect();
    let known_rooms: HashSet<&str> = catalog.rooms.iter().map(|r| r.number.0.as_str()).collect();

    let mut seen_course: HashSet<(&str, &str)> = HashSet::new();
    let mut class_at: HashSet<(&str, u32)> = HashSet::new();
    let mut teacher_at: HashSet<(&str, u32)> = HashSet::new();
    let mut room_at: HashSet<(&str, u32)> = HashSet::new();

    for a in assignments {
        let key = (a.class.0.as_str(), a.course.0.as_str());
        if !known_courses.contains(&key) {
            violations.push(Violation {
                kind: "unknown_course".into(),
                details: json!({ "class": a.class.0, "course": a.course.0 }),
            });
        }
        if !known_rooms.contains(a.room.0.as_str()) {
            violations.push(Violation {
                kind: "unknown_room".into(),
                details: json!({ "room": a.room.0 }),
            });
        }
        if a.slot.day >= params.days || a.slot.period >= params.periods {
            violations.push(Violation {
                kind: "slot_out_of_range".into(),
                details: json!({ "day": a.slot.day, "period": a.slot.period }),
            });
        }
        if !seen_course.insert(key) {
            violations.push(Violation {
                kind: "course_assigned_twice".into(),
                details: json!({ "class": a.class.0, "course": a.course.0 }),
            });
        }

        let k = a.slot.index(params.periods);
        if !class_at.insert((a.class.0.as_str(), k)) {
            violations.push(Violation {
                kind: "class_clash".into(),
                details: json!({ "class": a.class.0, "day": a.slot.day, "period": a.slot.period }),
            });
        }
        if let Some(t) = a.teacher.name() {
            if !teacher_at.insert((t, k)) {
                violations.push(Violation {
                    kind: "teacher_clash".into(),
                    details: json!({ "teacher": t, "day": a.slot.day, "period": a.slot.period }),
                });
            }
        }
        if !room_at.insert((a.room.0.as_str(), k)) {
            violations.push(Violation {
                kind: "room_clash".into(),
                details: json!({ "room": a.room.0, "day": a.slot.day, "period": a.slot.period }),
            });
        }
    }

    violations
}
