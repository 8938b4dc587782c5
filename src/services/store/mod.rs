/// Entity Store
///
/// Indexed, read-only views over the three input relations: per-student
/// skill sets, per-course skill sets, and the deduplicated enrollment
/// history. Built once per snapshot; never mutated while serving.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::config::FallbackConfig;
use crate::error::{AppError, Result};
use crate::models::{CourseId, Enrollment, StudentId};

static EMPTY_SKILLS: Lazy<HashSet<String>> = Lazy::new(HashSet::new);
static EMPTY_COURSES: Lazy<HashSet<CourseId>> = Lazy::new(HashSet::new);

pub struct EntityStore {
    student_skills: HashMap<StudentId, HashSet<String>>,
    course_skills: HashMap<CourseId, HashSet<String>>,
    enrollments: Vec<Enrollment>,
    enrolled: HashMap<StudentId, HashSet<CourseId>>,
    /// Sorted union of students seen in enrollments or student_skills.
    student_ids: Vec<StudentId>,
    /// Sorted union of courses seen in enrollments or course_skills.
    course_ids: Vec<CourseId>,
}

impl EntityStore {
    /// Load the three CSV tables from a data directory.
    pub fn load_dir(data_dir: &Path, fallback: &FallbackConfig) -> Result<Self> {
        let enrollments = read_enrollments(open(data_dir, "enrollments.csv")?, fallback)?;
        let student_skills = read_student_skills(open(data_dir, "student_skills.csv")?)?;
        let course_skills = read_course_skills(open(data_dir, "course_skills.csv")?)?;
        Ok(Self::from_tables(enrollments, student_skills, course_skills))
    }

    pub fn from_tables(
        enrollments: Vec<Enrollment>,
        student_skills: Vec<(StudentId, String)>,
        course_skills: Vec<(CourseId, String)>,
    ) -> Self {
        let enrollments = dedup_enrollments(enrollments);

        let mut student_skill_map: HashMap<StudentId, HashSet<String>> = HashMap::new();
        for (student_id, skill) in student_skills {
            student_skill_map.entry(student_id).or_default().insert(skill);
        }

        let mut course_skill_map: HashMap<CourseId, HashSet<String>> = HashMap::new();
        for (course_id, skill) in course_skills {
            course_skill_map.entry(course_id).or_default().insert(skill);
        }

        let mut enrolled: HashMap<StudentId, HashSet<CourseId>> = HashMap::new();
        let mut student_ids: BTreeSet<StudentId> = student_skill_map.keys().copied().collect();
        let mut course_ids: BTreeSet<CourseId> = course_skill_map.keys().copied().collect();
        for e in &enrollments {
            enrolled.entry(e.student_id).or_default().insert(e.course_id);
            student_ids.insert(e.student_id);
            course_ids.insert(e.course_id);
        }

        Self {
            student_skills: student_skill_map,
            course_skills: course_skill_map,
            enrollments,
            enrolled,
            student_ids: student_ids.into_iter().collect(),
            course_ids: course_ids.into_iter().collect(),
        }
    }

    /// Skills a student holds; empty set for an unknown student.
    pub fn skills_of_student(&self, student_id: StudentId) -> &HashSet<String> {
        self.student_skills.get(&student_id).unwrap_or(&EMPTY_SKILLS)
    }

    /// Skills a course requires; empty set for an unknown course.
    pub fn skills_of_course(&self, course_id: CourseId) -> &HashSet<String> {
        self.course_skills.get(&course_id).unwrap_or(&EMPTY_SKILLS)
    }

    /// Courses a student has any enrollment record for, completed or not.
    pub fn enrolled_courses(&self, student_id: StudentId) -> &HashSet<CourseId> {
        self.enrolled.get(&student_id).unwrap_or(&EMPTY_COURSES)
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    pub fn student_ids(&self) -> &[StudentId] {
        &self.student_ids
    }

    pub fn course_ids(&self) -> &[CourseId] {
        &self.course_ids
    }

    /// Distinct skill names across the student_skills relation.
    pub fn unique_student_skill_count(&self) -> usize {
        self.student_skills
            .values()
            .flatten()
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Last-write-wins dedup by (student_id, course_id). Duplicates are a
/// data-quality defect; they are collapsed so aggregate counts stay
/// well-defined, and the collapse is logged.
fn dedup_enrollments(rows: Vec<Enrollment>) -> Vec<Enrollment> {
    let mut index: HashMap<(StudentId, CourseId), usize> = HashMap::new();
    let mut out: Vec<Enrollment> = Vec::with_capacity(rows.len());
    let mut duplicates = 0usize;

    for row in rows {
        match index.get(&(row.student_id, row.course_id)) {
            Some(&pos) => {
                out[pos] = row;
                duplicates += 1;
            }
            None => {
                index.insert((row.student_id, row.course_id), out.len());
                out.push(row);
            }
        }
    }

    if duplicates > 0 {
        warn!(
            duplicates,
            kept = out.len(),
            "duplicate enrollment rows collapsed (last write wins)"
        );
    }

    out
}

fn open(dir: &Path, name: &str) -> Result<std::fs::File> {
    std::fs::File::open(dir.join(name)).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", dir.join(name).display(), e),
        ))
    })
}

#[derive(Debug, Deserialize)]
struct EnrollmentRow {
    student_id: Option<String>,
    course_id: Option<String>,
    #[serde(default)]
    progress_percentage: Option<String>,
    #[serde(default)]
    completed_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StudentSkillRow {
    student_id: Option<String>,
    skill_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CourseSkillRow {
    course_id: Option<String>,
    skill_name: Option<String>,
}

/// Parse the enrollments table. A missing or unparseable identifier aborts
/// the load; a malformed progress cell falls back to the configured
/// default; an empty completed_at means not completed.
pub fn read_enrollments<R: Read>(reader: R, fallback: &FallbackConfig) -> Result<Vec<Enrollment>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (i, record) in csv_reader.deserialize::<EnrollmentRow>().enumerate() {
        let row = record?;
        let student_id = require_id(row.student_id.as_deref(), "enrollments", i, "student_id")?;
        let course_id = require_id(row.course_id.as_deref(), "enrollments", i, "course_id")?;

        let progress_percentage = row
            .progress_percentage
            .as_deref()
            .and_then(|v| v.trim().parse::<f32>().ok())
            .unwrap_or(fallback.avg_progress);

        let completed_at_raw = row
            .completed_at
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let completed = completed_at_raw.is_some();
        let completed_at = completed_at_raw.and_then(parse_timestamp);

        out.push(Enrollment {
            student_id,
            course_id,
            progress_percentage,
            completed,
            completed_at,
        });
    }

    Ok(out)
}

pub fn read_student_skills<R: Read>(reader: R) -> Result<Vec<(StudentId, String)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (i, record) in csv_reader.deserialize::<StudentSkillRow>().enumerate() {
        let row = record?;
        let student_id = require_id(row.student_id.as_deref(), "student_skills", i, "student_id")?;
        // Malformed skill cells are tolerated; blank names carry no signal.
        let Some(skill) = normalize_skill(row.skill_name) else {
            continue;
        };
        out.push((student_id, skill));
    }

    Ok(out)
}

pub fn read_course_skills<R: Read>(reader: R) -> Result<Vec<(CourseId, String)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = Vec::new();

    for (i, record) in csv_reader.deserialize::<CourseSkillRow>().enumerate() {
        let row = record?;
        let course_id = require_id(row.course_id.as_deref(), "course_skills", i, "course_id")?;
        let Some(skill) = normalize_skill(row.skill_name) else {
            continue;
        };
        out.push((course_id, skill));
    }

    Ok(out)
}

fn require_id(value: Option<&str>, table: &str, row: usize, field: &str) -> Result<u32> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| {
            AppError::DataIntegrity(format!("{table} row {}: missing or invalid {field}", row + 1))
        })
}

fn normalize_skill(value: Option<String>) -> Option<String> {
    let skill = value?.trim().to_string();
    if skill.is_empty() {
        None
    } else {
        Some(skill)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
