use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use types::{ClassId, ClassLevel, Course, CourseCode, TeacherId, TeacherRef};

/// Raw subject entry as supplied by the catalog loader, one per course per
/// semester.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubjectRecord {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credit: u32,
    #[serde(default)]
    pub lecturers: Vec<String>,
}

/// Builds one class level from raw subject records, in record order.
///
/// Entries with a blank code or name are dropped outright (not modeled, not
/// reported as unscheduled). Duplicate codes within the class keep only the
/// first occurrence. A course with no lecturer on record is tagged
/// [`TeacherRef::Untracked`] so that missing data never merges conflict sets
/// across unrelated courses.
pub fn build_class_level(
    id: ClassId,
    records: impl IntoIterator<Item = SubjectRecord>,
) -> ClassLevel {
    let mut seen: HashSet<String> = HashSet::new();
    let mut courses = Vec::new();
    for rec in records {
        let code = rec.code.trim();
        let name = rec.name.trim();
        if code.is_empty() || name.is_empty() {
            continue;
        }
        if !seen.insert(code.to_string()) {
            continue;
        }
        let teacher = rec
            .lecturers
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
            .map(|l| TeacherRef::Named(TeacherId(l.to_string())))
            .unwrap_or(TeacherRef::Untracked);
        courses.push(Course {
            code: CourseCode(code.to_string()),
            name: name.to_string(),
            credit: rec.credit,
            teacher,
        });
    }
    ClassLevel { id, courses }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(code: &str, name: &str, lecturers: &[&str]) -> SubjectRecord {
        SubjectRecord {
            code: code.into(),
            name: name.into(),
            credit: 3,
            lecturers: lecturers.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn blank_code_or_name_is_dropped() {
        let class = build_class_level(
            ClassId("1".into()),
            vec![
                rec("", "Algorithms", &["ATSA"]),
                rec("INF121", "  ", &["KOUOKAM"]),
                rec("INF111", "Algorithms", &["ATSA"]),
            ],
        );
        assert_eq!(class.courses.len(), 1);
        assert_eq!(class.courses[0].code.0, "INF111");
    }

    #[test]
    fn duplicate_codes_keep_first_occurrence() {
        let class = build_class_level(
            ClassId("1".into()),
            vec![
                rec("INF111", "Algorithms I", &["ATSA"]),
                rec("INF111", "Algorithms I (repeat)", &["KOUOKAM"]),
            ],
        );
        assert_eq!(class.courses.len(), 1);
        assert_eq!(class.courses[0].name, "Algorithms I");
        assert_eq!(class.courses[0].teacher.name(), Some("ATSA"));
    }

    #[test]
    fn missing_lecturer_becomes_untracked() {
        let class = build_class_level(
            ClassId("1".into()),
            vec![rec("INF111", "Algorithms", &[]), rec("INF121", "Logic", &["  "])],
        );
        assert!(class
            .courses
            .iter()
            .all(|c| c.teacher == TeacherRef::Untracked));
    }

    #[test]
    fn first_nonblank_lecturer_wins() {
        let class = build_class_level(
            ClassId("1".into()),
            vec![rec("INF111", "Algorithms", &["", "ATSA", "KOUOKAM"])],
        );
        assert_eq!(class.courses[0].teacher.name(), Some("ATSA"));
    }

    #[test]
    fn credit_defaults_to_zero_when_absent() {
        let json = r#"{ "code": "INF111", "name": "Algorithms" }"#;
        let rec: SubjectRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.credit, 0);
        assert!(rec.lecturers.is_empty());
    }
}
