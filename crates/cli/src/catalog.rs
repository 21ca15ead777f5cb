use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use ttable_core::catalog::{build_class_level, SubjectRecord};
use types::{Catalog, ClassId, ClassLevel, Room, RoomNumber};

/// Room numbers appear both as bare integers and as strings in catalog files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(u64),
    Str(String),
}

impl NumOrStr {
    fn into_string(self) -> String {
        match self {
            NumOrStr::Num(n) => n.to_string(),
            NumOrStr::Str(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoomRecord {
    num: NumOrStr,
}

/// `rooms.json`: department name mapped to its room list. Departments are
/// merged in name order; an empty merged set is a contract violation that
/// must surface before any modeling starts.
pub fn load_rooms(path: &Path) -> anyhow::Result<Vec<Room>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading room catalog {}", path.display()))?;
    let by_department: BTreeMap<String, Vec<RoomRecord>> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing room catalog {}", path.display()))?;

    let rooms: Vec<Room> = by_department
        .into_values()
        .flatten()
        .map(|r| Room {
            number: RoomNumber(r.num.into_string()),
        })
        .collect();
    if rooms.is_empty() {
        bail!("room catalog {} contains no rooms", path.display());
    }
    Ok(rooms)
}

/// `subjects.json`: class level mapped to per-semester course lists. Semesters
/// are merged in key order; blank entries and duplicate codes are handled by
/// catalog normalization.
pub fn load_subjects(path: &Path) -> anyhow::Result<Vec<ClassLevel>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading subject catalog {}", path.display()))?;
    let by_class: BTreeMap<String, BTreeMap<String, Vec<SubjectRecord>>> =
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing subject catalog {}", path.display()))?;

    Ok(by_class
        .into_iter()
        .map(|(class, semesters)| {
            build_class_level(ClassId(class), semesters.into_values().flatten())
        })
        .collect())
}

pub fn load(rooms_path: &Path, subjects_path: &Path) -> anyhow::Result<Catalog> {
    Ok(Catalog {
        rooms: load_rooms(rooms_path)?,
        classes: load_subjects(subjects_path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("ttable-test-{name}-{}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn rooms_merge_departments_and_accept_numeric_ids() {
        let path = write_temp(
            "rooms",
            r#"{
                "Informatique": [{ "num": 101 }, { "num": "A102" }],
                "Biologie": [{ "num": 201 }]
            }"#,
        );
        let rooms = load_rooms(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let numbers: Vec<&str> = rooms.iter().map(|r| r.number.0.as_str()).collect();
        assert_eq!(numbers, vec!["201", "101", "A102"]);
    }

    #[test]
    fn empty_room_catalog_is_an_error() {
        let path = write_temp("rooms-empty", r#"{ "Informatique": [] }"#);
        let err = load_rooms(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("no rooms"));
    }

    #[test]
    fn subjects_merge_semesters_keeping_first_duplicate() {
        let path = write_temp(
            "subjects",
            r#"{
                "1": {
                    "semester1": [
                        { "code": "INF111", "name": "Algorithms I", "credit": 6, "lecturers": ["ATSA"] },
                        { "code": "", "name": "Dropped" }
                    ],
                    "semester2": [
                        { "code": "INF111", "name": "Algorithms I bis", "credit": 4 },
                        { "code": "INF121", "name": "Logic", "credit": 4, "lecturers": ["KOUOKAM"] }
                    ]
                }
            }"#,
        );
        let classes = load_subjects(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(classes.len(), 1);
        let courses = &classes[0].courses;
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].code.0, "INF111");
        assert_eq!(courses[0].name, "Algorithms I");
        assert_eq!(courses[0].credit, 6);
    }
}
