//! In-memory backing store.
//!
//! Holds students, groups, subjects and marks behind one lock so that
//! cross-table updates (group membership, enrollment, cascading mark
//! deletion) are applied together. The services put the cache in front of
//! every read here.
//!
//! Group names and subject names are unique.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{
    Group, Mark, NewMark, NewStudent, SortOrder, SpecificMarkQuery, Student, Subject,
};

#[derive(Debug, Default)]
struct Tables {
    students: HashMap<i64, Student>,
    groups: HashMap<i64, Group>,
    subjects: HashMap<i64, Subject>,
    marks: HashMap<i64, Mark>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn sorted_by_id<T: Clone>(rows: impl Iterator<Item = T>, id: impl Fn(&T) -> i64) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| id(row));
    rows
}

/// Drops repeated ids, keeping first occurrences in order.
fn dedup_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn sort_students_by_name(students: &mut [Student], order: SortOrder) {
    students.sort_by(|a, b| match order {
        SortOrder::Asc => a.name.cmp(&b.name),
        SortOrder::Desc => b.name.cmp(&a.name),
    });
}

fn average(values: impl Iterator<Item = i32>) -> Option<f64> {
    let (sum, count) = values.fold((0i64, 0u32), |(sum, count), v| (sum + v as i64, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Thread-safe in-memory store. Ids are allocated from one shared sequence.
#[derive(Debug, Default)]
pub struct Repository {
    tables: RwLock<Tables>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    // == Students ==

    pub fn find_student(&self, id: i64) -> Option<Student> {
        self.tables.read().students.get(&id).cloned()
    }

    /// Students filtered by age and/or sorted by name; unsorted listings are in id order.
    pub fn find_students(&self, age: Option<u32>, sort: Option<SortOrder>) -> Vec<Student> {
        let tables = self.tables.read();
        let mut students = sorted_by_id(
            tables
                .students
                .values()
                .filter(|s| age.map_or(true, |age| s.age == age))
                .cloned(),
            |s| s.id,
        );
        if let Some(order) = sort {
            sort_students_by_name(&mut students, order);
        }
        students
    }

    pub fn find_students_by_group(&self, group_id: i64) -> Vec<Student> {
        let tables = self.tables.read();
        sorted_by_id(
            tables
                .students
                .values()
                .filter(|s| s.group_id == Some(group_id))
                .cloned(),
            |s| s.id,
        )
    }

    /// Inserts a student, joining the group and subjects that exist.
    pub fn insert_student(&self, new: NewStudent) -> Student {
        let mut tables = self.tables.write();
        let id = tables.next_id();

        let group_id = new.group_id.filter(|gid| tables.groups.contains_key(gid));
        if let Some(gid) = group_id {
            if let Some(group) = tables.groups.get_mut(&gid) {
                group.student_ids.push(id);
            }
        }
        let subject_ids: Vec<i64> = dedup_ids(new.subject_ids)
            .into_iter()
            .filter(|sid| tables.subjects.contains_key(sid))
            .collect();

        let student = Student {
            id,
            name: new.name,
            age: new.age,
            group_id,
            subject_ids,
        };
        tables.students.insert(id, student.clone());
        debug!("Inserted student {}", id);
        student
    }

    /// Returns false if no such student exists.
    pub fn update_student(&self, id: i64, name: String, age: u32) -> bool {
        let mut tables = self.tables.write();
        match tables.students.get_mut(&id) {
            Some(student) => {
                student.name = name;
                student.age = age;
                true
            }
            None => false,
        }
    }

    /// Deletes a student together with their marks and group membership.
    pub fn delete_student(&self, id: i64) -> Option<Student> {
        let mut tables = self.tables.write();
        let student = tables.students.remove(&id)?;
        tables.marks.retain(|_, mark| mark.student_id != id);
        if let Some(gid) = student.group_id {
            if let Some(group) = tables.groups.get_mut(&gid) {
                group.student_ids.retain(|sid| *sid != id);
            }
        }
        Some(student)
    }

    // == Groups ==

    pub fn find_group(&self, id: i64) -> Option<Group> {
        self.tables.read().groups.get(&id).cloned()
    }

    pub fn find_group_by_name(&self, name: &str) -> Option<Group> {
        self.tables
            .read()
            .groups
            .values()
            .find(|g| g.name == name)
            .cloned()
    }

    /// All groups, or those whose name contains `pattern`; `Asc` orders by name.
    pub fn find_groups(&self, pattern: Option<&str>, sort: Option<SortOrder>) -> Vec<Group> {
        let tables = self.tables.read();
        let mut groups = sorted_by_id(
            tables
                .groups
                .values()
                .filter(|g| pattern.map_or(true, |p| g.name.contains(p)))
                .cloned(),
            |g| g.id,
        );
        if pattern.is_none() && sort == Some(SortOrder::Asc) {
            groups.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Creates a group and moves the listed students into it.
    ///
    /// Fails without changes if the name is taken or any student id is unknown.
    /// Repeated ids are listed once.
    pub fn insert_group(&self, name: String, student_ids: &[i64]) -> Result<Group> {
        let mut tables = self.tables.write();
        if tables.groups.values().any(|g| g.name == name) {
            return Err(AppError::Conflict(format!(
                "Group with name {} already exists",
                name
            )));
        }
        let student_ids = dedup_ids(student_ids.iter().copied());
        let missing: Vec<i64> = student_ids
            .iter()
            .copied()
            .filter(|id| !tables.students.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Students with ids {:?} not found",
                missing
            )));
        }

        let id = tables.next_id();
        for sid in &student_ids {
            let previous = tables.students.get_mut(sid).and_then(|s| s.group_id.replace(id));
            if let Some(old) = previous {
                if let Some(group) = tables.groups.get_mut(&old) {
                    group.student_ids.retain(|member| member != sid);
                }
            }
        }
        let group = Group {
            id,
            name,
            student_ids,
        };
        tables.groups.insert(id, group.clone());
        debug!("Inserted group {}", id);
        Ok(group)
    }

    /// Deletes a group; its students become ungrouped.
    pub fn delete_group(&self, id: i64) -> Option<Group> {
        let mut tables = self.tables.write();
        let group = tables.groups.remove(&id)?;
        for student in tables.students.values_mut() {
            if student.group_id == Some(id) {
                student.group_id = None;
            }
        }
        Some(group)
    }

    // == Subjects ==

    pub fn find_subject(&self, id: i64) -> Option<Subject> {
        self.tables.read().subjects.get(&id).cloned()
    }

    pub fn find_subject_by_name(&self, name: &str) -> Option<Subject> {
        self.tables
            .read()
            .subjects
            .values()
            .find(|s| s.name == name)
            .cloned()
    }

    pub fn subject_name_exists(&self, name: &str) -> bool {
        self.tables.read().subjects.values().any(|s| s.name == name)
    }

    /// All subjects, or those whose name contains `pattern`; `Asc` orders by name.
    pub fn find_subjects(&self, pattern: Option<&str>, sort: Option<SortOrder>) -> Vec<Subject> {
        let tables = self.tables.read();
        let mut subjects = sorted_by_id(
            tables
                .subjects
                .values()
                .filter(|s| pattern.map_or(true, |p| s.name.contains(p)))
                .cloned(),
            |s| s.id,
        );
        if pattern.is_none() && sort == Some(SortOrder::Asc) {
            subjects.sort_by(|a, b| a.name.cmp(&b.name));
        }
        subjects
    }

    pub fn insert_subject(&self, name: String) -> Result<Subject> {
        let mut tables = self.tables.write();
        if tables.subjects.values().any(|s| s.name == name) {
            return Err(AppError::Conflict(format!(
                "Subject with name {} already exists",
                name
            )));
        }
        let id = tables.next_id();
        let subject = Subject { id, name };
        tables.subjects.insert(id, subject.clone());
        debug!("Inserted subject {}", id);
        Ok(subject)
    }

    /// Deletes a subject together with its marks and enrollments.
    pub fn delete_subject(&self, id: i64) -> Option<Subject> {
        let mut tables = self.tables.write();
        let subject = tables.subjects.remove(&id)?;
        tables.marks.retain(|_, mark| mark.subject_id != id);
        for student in tables.students.values_mut() {
            student.subject_ids.retain(|sid| *sid != id);
        }
        Some(subject)
    }

    pub fn delete_subject_by_name(&self, name: &str) -> Option<Subject> {
        let id = self.find_subject_by_name(name)?.id;
        self.delete_subject(id)
    }

    // == Enrollment ==

    /// Enrolls a student in a subject. Returns false if already enrolled.
    ///
    /// Callers check that both exist.
    pub fn enroll(&self, student_id: i64, subject_id: i64) -> bool {
        let mut tables = self.tables.write();
        match tables.students.get_mut(&student_id) {
            Some(student) if !student.subject_ids.contains(&subject_id) => {
                student.subject_ids.push(subject_id);
                true
            }
            _ => false,
        }
    }

    /// Returns false if the student was not enrolled.
    pub fn unenroll(&self, student_id: i64, subject_id: i64) -> bool {
        let mut tables = self.tables.write();
        match tables.students.get_mut(&student_id) {
            Some(student) => {
                let before = student.subject_ids.len();
                student.subject_ids.retain(|sid| *sid != subject_id);
                student.subject_ids.len() != before
            }
            None => false,
        }
    }

    /// Subjects of a student in id order, None if the student is unknown.
    pub fn subjects_of_student(&self, student_id: i64) -> Option<Vec<Subject>> {
        let tables = self.tables.read();
        let student = tables.students.get(&student_id)?;
        Some(sorted_by_id(
            student
                .subject_ids
                .iter()
                .filter_map(|sid| tables.subjects.get(sid).cloned()),
            |s| s.id,
        ))
    }

    /// Students enrolled in a subject in id order, None if the subject is unknown.
    pub fn students_of_subject(&self, subject_id: i64) -> Option<Vec<Student>> {
        let tables = self.tables.read();
        if !tables.subjects.contains_key(&subject_id) {
            return None;
        }
        Some(sorted_by_id(
            tables
                .students
                .values()
                .filter(|s| s.subject_ids.contains(&subject_id))
                .cloned(),
            |s| s.id,
        ))
    }

    // == Marks ==

    pub fn find_marks(&self, student_id: Option<i64>, subject_id: Option<i64>) -> Vec<Mark> {
        let tables = self.tables.read();
        sorted_by_id(
            tables
                .marks
                .values()
                .filter(|m| student_id.map_or(true, |id| m.student_id == id))
                .filter(|m| subject_id.map_or(true, |id| m.subject_id == id))
                .cloned(),
            |m| m.id,
        )
    }

    pub fn find_marks_by_value(&self, value: i32) -> Vec<Mark> {
        let tables = self.tables.read();
        sorted_by_id(
            tables.marks.values().filter(|m| m.value == value).cloned(),
            |m| m.id,
        )
    }

    /// Mean mark of a student, None if they have no marks.
    pub fn average_by_student(&self, student_id: i64) -> Option<f64> {
        let tables = self.tables.read();
        average(
            tables
                .marks
                .values()
                .filter(|m| m.student_id == student_id)
                .map(|m| m.value),
        )
    }

    /// Mean mark in a subject, None if it has no marks.
    pub fn average_by_subject(&self, subject_id: i64) -> Option<f64> {
        let tables = self.tables.read();
        average(
            tables
                .marks
                .values()
                .filter(|m| m.subject_id == subject_id)
                .map(|m| m.value),
        )
    }

    pub fn insert_mark(&self, new: NewMark) -> Mark {
        let mut tables = self.tables.write();
        let id = tables.next_id();
        let mark = Mark {
            id,
            value: new.value,
            student_id: new.student_id,
            subject_id: new.subject_id,
        };
        tables.marks.insert(id, mark.clone());
        mark
    }

    pub fn delete_mark(&self, id: i64) -> Option<Mark> {
        self.tables.write().marks.remove(&id)
    }

    /// Deletes the student's marks with the given value in the named subject,
    /// only the one with `query.id` when set. Returns what was deleted.
    pub fn delete_marks_matching(&self, query: &SpecificMarkQuery) -> Vec<Mark> {
        let mut tables = self.tables.write();
        let Some(subject_id) = tables
            .subjects
            .values()
            .find(|s| s.name == query.subject_name)
            .map(|s| s.id)
        else {
            return Vec::new();
        };

        let matching: Vec<i64> = tables
            .marks
            .values()
            .filter(|m| {
                m.student_id == query.student_id
                    && m.subject_id == subject_id
                    && m.value == query.value
                    && query.id.map_or(true, |id| m.id == id)
            })
            .map(|m| m.id)
            .collect();
        sorted_by_id(
            matching.iter().filter_map(|id| tables.marks.remove(id)),
            |m| m.id,
        )
    }
}
