use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(ClassId);
id_newtype!(CourseCode);
id_newtype!(TeacherId);
id_newtype!(RoomNumber);

/// Who teaches a course. Courses with no lecturer on record carry `Untracked`
/// and are skipped by teacher exclusivity constraints.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeacherRef {
    Named(TeacherId),
    Untracked,
}

impl TeacherRef {
    pub fn name(&self) -> Option<&str> {
        match self {
            TeacherRef::Named(id) => Some(id.0.as_str()),
            TeacherRef::Untracked => None,
        }
    }
}

impl fmt::Display for TeacherRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeacherRef::Named(id) => id.fmt(f),
            TeacherRef::Untracked => f.write_str("(no lecturer)"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    pub name: String,
    #[serde(default)]
    pub credit: u32,
    pub teacher: TeacherRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassLevel {
    pub id: ClassId,
    pub courses: Vec<Course>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub number: RoomNumber,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pub rooms: Vec<Room>,
    pub classes: Vec<ClassLevel>,
}

impl Catalog {
    pub fn course_count(&self) -> usize {
        self.classes.iter().map(|c| c.courses.len()).sum()
    }

    pub fn courses(&self) -> impl Iterator<Item = (&ClassId, &Course)> {
        self.classes
            .iter()
            .flat_map(|c| c.courses.iter().map(move |s| (&c.id, s)))
    }
}

/// A (day, period) pair. The flattened index `day * P + period` spans the
/// whole week.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub day: u32,
    pub period: u32,
}

impl Slot {
    pub fn index(&self, periods: u32) -> u32 {
        self.day * periods + self.period
    }

    pub fn from_index(idx: u32, periods: u32) -> Self {
        Slot {
            day: idx / periods,
            period: idx % periods,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveParams {
    pub days: u32,
    pub periods: u32,
    pub day_names: Vec<String>,
    pub period_labels: Vec<String>,
    /// Per-period preference weight, first period highest.
    pub morning_weights: Vec<i64>,
    pub time_limit_secs: u64,
    pub threads: u32,
    pub seed: u64,
}

impl SolveParams {
    pub fn slot_count(&self) -> u32 {
        self.days * self.periods
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> {
        let periods = self.periods;
        (0..self.slot_count()).map(move |i| Slot::from_index(i, periods))
    }
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams {
            days: 6,
            periods: 5,
            day_names: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"]
                .into_iter()
                .map(String::from)
                .collect(),
            period_labels: [
                "7:00am-9:55am",
                "10:05am-12:55pm",
                "1:05pm-3:55pm",
                "4:05pm-6:55pm",
                "7:05pm-9:55pm",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            morning_weights: vec![5, 4, 3, 2, 1],
            time_limit_secs: 300,
            threads: 1,
            seed: 42,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// A solution was found but the time budget ran out before it was proven
    /// optimal.
    Feasible,
    NoSolution,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => f.write_str("optimal"),
            SolveStatus::Feasible => f.write_str("feasible"),
            SolveStatus::NoSolution => f.write_str("no solution"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseReport {
    pub status: SolveStatus,
    pub elapsed: Duration,
    pub objective: f64,
    pub scheduled: usize,
    pub total: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
    pub class: ClassId,
    pub course: CourseCode,
    pub slot: Slot,
    pub room: RoomNumber,
    pub teacher: TeacherRef,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    TeacherOverloaded,
    NoFreeSlot,
}

impl fmt::Display for UnscheduledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnscheduledReason::TeacherOverloaded => f.write_str("teacher overloaded"),
            UnscheduledReason::NoFreeSlot => f.write_str("no conflict-free slot available"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unscheduled {
    pub class: ClassId,
    pub course: CourseCode,
    pub name: String,
    pub teacher: TeacherRef,
    pub reason: UnscheduledReason,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotUsage {
    pub slot: Slot,
    pub classes_active: usize,
    pub rooms: Vec<RoomNumber>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Violation {
    pub kind: String,
    pub details: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimetableResult {
    pub phase1: PhaseReport,
    pub phase2: Option<PhaseReport>,
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<Unscheduled>,
    pub usage: Vec<SlotUsage>,
    pub morning_score: i64,
    pub stats: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total_courses: usize,
    /// min(total, slot count); a single class can never use more than one
    /// course per slot.
    pub capped_courses: usize,
    pub slot_count: u32,
    pub room_count: usize,
    pub per_class: Vec<(ClassId, usize)>,
    pub busy_teachers: Vec<(TeacherId, usize)>,
}
