pub mod catalog;
pub mod scoring;

use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub use types::{
    Assignment, Catalog, ClassId, ClassLevel, Course, CourseCode, Diagnostics, PhaseReport, Room,
    RoomNumber, Slot, SolveParams, SolveStatus, TeacherId, TeacherRef, TimetableResult,
    Unscheduled, UnscheduledReason,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid catalog: {0}")]
    Msg(String),
}

/// Structural contract checks that must pass before any search starts.
/// Inability to place a course is never an error; these are.
pub fn validate(catalog: &Catalog, params: &SolveParams) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if catalog.rooms.is_empty() {
        errors.push("room collection is empty".into());
    }
    if params.days == 0 {
        errors.push("day count is zero".into());
    }
    if params.periods == 0 {
        errors.push("period count is zero".into());
    }
    if params.day_names.len() != params.days as usize {
        errors.push(format!(
            "expected {} day names, got {}",
            params.days,
            params.day_names.len()
        ));
    }
    if params.period_labels.len() != params.periods as usize {
        errors.push(format!(
            "expected {} period labels, got {}",
            params.periods,
            params.period_labels.len()
        ));
    }
    if params.morning_weights.len() != params.periods as usize {
        errors.push(format!(
            "expected {} morning weights, got {}",
            params.periods,
            params.morning_weights.len()
        ));
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name}: {s}"));
            }
        }
    }
    chk_unique(
        "room number",
        catalog.rooms.iter().map(|r| &r.number.0),
        &mut errors,
    );
    chk_unique(
        "class id",
        catalog.classes.iter().map(|c| &c.id.0),
        &mut errors,
    );
    for class in &catalog.classes {
        chk_unique(
            &format!("course code in class {}", class.id),
            class.courses.iter().map(|s| &s.code.0),
            &mut errors,
        );
        for course in &class.courses {
            if course.code.0.trim().is_empty() || course.name.trim().is_empty() {
                errors.push(format!(
                    "class {} has a course with blank code or name",
                    class.id
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

pub fn diagnostics(catalog: &Catalog, params: &SolveParams) -> Diagnostics {
    let total = catalog.course_count();
    let slots = params.slot_count();

    let per_class = catalog
        .classes
        .iter()
        .map(|c| (c.id.clone(), c.courses.len()))
        .collect();

    let mut load: HashMap<&str, usize> = HashMap::new();
    for (_, course) in catalog.courses() {
        if let Some(name) = course.teacher.name() {
            *load.entry(name).or_default() += 1;
        }
    }
    let mut busy_teachers: Vec<(TeacherId, usize)> = load
        .into_iter()
        .filter(|&(_, n)| n > 1)
        .map(|(name, n)| (TeacherId(name.to_string()), n))
        .collect();
    busy_teachers.sort();

    Diagnostics {
        total_courses: total,
        capped_courses: total.min(slots as usize),
        slot_count: slots,
        room_count: catalog.rooms.len(),
        per_class,
        busy_teachers,
    }
}

pub trait Solver: Send + Sync {
    fn solve(&self, catalog: &Catalog, params: &SolveParams) -> anyhow::Result<TimetableResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(code: &str, teacher: &str) -> Course {
        Course {
            code: CourseCode(code.into()),
            name: format!("Course {code}"),
            credit: 0,
            teacher: TeacherRef::Named(TeacherId(teacher.into())),
        }
    }

    fn catalog_with(rooms: &[&str], courses: Vec<Course>) -> Catalog {
        Catalog {
            rooms: rooms
                .iter()
                .map(|n| Room {
                    number: RoomNumber(n.to_string()),
                })
                .collect(),
            classes: vec![ClassLevel {
                id: ClassId("1".into()),
                courses,
            }],
        }
    }

    #[test]
    fn empty_room_set_is_fatal() {
        let catalog = catalog_with(&[], vec![course("INF111", "ATSA")]);
        let err = validate(&catalog, &SolveParams::default()).unwrap_err();
        assert!(err.to_string().contains("room collection is empty"));
    }

    #[test]
    fn weight_table_must_cover_every_period() {
        let catalog = catalog_with(&["A100"], vec![]);
        let params = SolveParams {
            morning_weights: vec![5, 4],
            ..SolveParams::default()
        };
        assert!(validate(&catalog, &params).is_err());
    }

    #[test]
    fn duplicate_room_numbers_are_rejected() {
        let catalog = catalog_with(&["A100", "A100"], vec![]);
        let err = validate(&catalog, &SolveParams::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate room number"));
    }

    #[test]
    fn valid_catalog_passes() {
        let catalog = catalog_with(
            &["A100", "B200"],
            vec![course("INF111", "ATSA"), course("INF121", "KOUOKAM")],
        );
        assert!(validate(&catalog, &SolveParams::default()).is_ok());
    }

    #[test]
    fn diagnostics_counts_and_caps() {
        let courses: Vec<Course> = (0..35).map(|i| course(&format!("C{i:02}"), "ATSA")).collect();
        let catalog = catalog_with(&["A100"], courses);
        let d = diagnostics(&catalog, &SolveParams::default());
        assert_eq!(d.total_courses, 35);
        assert_eq!(d.slot_count, 30);
        assert_eq!(d.capped_courses, 30);
        assert_eq!(d.room_count, 1);
        assert_eq!(d.per_class, vec![(ClassId("1".into()), 35)]);
        assert_eq!(d.busy_teachers, vec![(TeacherId("ATSA".into()), 35)]);
    }

    #[test]
    fn single_course_teachers_are_not_flagged() {
        let catalog = catalog_with(
            &["A100"],
            vec![course("INF111", "ATSA"), course("INF121", "KOUOKAM")],
        );
        let d = diagnostics(&catalog, &SolveParams::default());
        assert!(d.busy_teachers.is_empty());
    }
}
