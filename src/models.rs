//! Domain models that mirror the persisted JSON document and get passed
//! throughout the TUI. These types stay light-weight data holders so the
//! repository can focus on validation and the UI on presentation. Field names
//! on disk are the human-facing labels ("Roll No", "Department / Role"), so
//! every struct carries explicit serde renames.

use std::fmt;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Gender choice offered by both registration forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn name(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Names the two collections of the dataset. Doubles as the tag attached to
/// search hits and as the key used in the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Students,
    Staff,
}

impl Collection {
    /// Key of the collection inside the JSON document.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Staff => "staff",
        }
    }

    /// Singular label used when listing search results ("Student", "Staff").
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Students => "Student",
            Collection::Staff => "Staff",
        }
    }

    /// Name of the unique key field inside this collection.
    pub fn key_field(&self) -> &'static str {
        match self {
            Collection::Students => "Roll No",
            Collection::Staff => "Staff ID",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A registered student. The serde names are the exact keys written by the
/// registration form, so existing data files keep loading.
pub struct Student {
    /// Full name as typed on the form. Shown in tables, search hits and on the
    /// result card.
    #[serde(rename = "Name")]
    pub name: String,
    /// Unique across students. Kept as an integer so lookups by roll number
    /// compare numerically (`05` typed on the result tab finds roll 5).
    #[serde(rename = "Roll No")]
    pub roll_no: i64,
    /// Free-text department, e.g. `CS`. Not validated against a list.
    #[serde(rename = "Department")]
    pub department: String,
    /// Stored as raw text; leading zeros and `+` prefixes must survive.
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    /// Written to disk as `"Male"` / `"Female"`.
    #[serde(rename = "Gender")]
    pub gender: Gender,
    /// Day the registration was submitted. Serialized as `YYYY-MM-DD`, the
    /// same text the date field accepts.
    #[serde(rename = "Submission Date")]
    pub submission_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A staff member. Mirrors [`Student`] with its own key and date field.
pub struct Staff {
    /// Full name as typed on the staff form.
    #[serde(rename = "Name")]
    pub name: String,
    /// Unique across staff only; a staff member may share the number of a
    /// student roll without conflict.
    #[serde(rename = "Staff ID")]
    pub staff_id: i64,
    /// Department and role in one field (`Physics / Teacher`). The slash is
    /// part of the key name on disk.
    #[serde(rename = "Department / Role")]
    pub department_role: String,
    /// Raw text, like [`Student::phone_number`].
    #[serde(rename = "Phone Number")]
    pub phone_number: String,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    /// First working day, serialized as `YYYY-MM-DD`.
    #[serde(rename = "Joining Date")]
    pub joining_date: NaiveDate,
}

/// Raw student form input. Gender stays optional until the repository has
/// checked that a choice was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDraft {
    pub name: String,
    /// Already parsed by the form; uniqueness is checked on insert.
    pub roll_no: i64,
    pub department: String,
    pub phone_number: String,
    /// `None` while the form still shows "Select Gender". Rejected on insert
    /// before any other check so the user fixes the choice first.
    pub gender: Option<Gender>,
    pub submission_date: NaiveDate,
}

impl StudentDraft {
    /// Finish the draft once the gender choice has been confirmed.
    pub(crate) fn into_student(self, gender: Gender) -> Student {
        Student {
            name: self.name,
            roll_no: self.roll_no,
            department: self.department,
            phone_number: self.phone_number,
            gender,
            submission_date: self.submission_date,
        }
    }
}

/// Raw staff form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDraft {
    pub name: String,
    pub staff_id: i64,
    pub department_role: String,
    pub phone_number: String,
    pub gender: Option<Gender>,
    pub joining_date: NaiveDate,
}

impl StaffDraft {
    pub(crate) fn into_staff(self, gender: Gender) -> Staff {
        Staff {
            name: self.name,
            staff_id: self.staff_id,
            department_role: self.department_role,
            phone_number: self.phone_number,
            gender,
            joining_date: self.joining_date,
        }
    }
}

/// The whole persisted document: both collections in insertion order.
///
/// A document missing one of the collection keys loads that collection as
/// empty rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub staff: Vec<Staff>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.students.is_empty() && self.staff.is_empty()
    }
}

/// Behaviour shared by both record variants. The repository is generic over
/// this trait so insert, bulk replace and search run the same code for
/// students and staff.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Collection this record type lives in.
    const COLLECTION: Collection;

    /// Unique key within the collection (Roll No or Staff ID).
    fn key(&self) -> i64;

    /// Every field as `(label, display value)` in document order. Search
    /// matches against the values and the table view renders them.
    fn fields(&self) -> Vec<(&'static str, String)>;

    /// First required text field that is blank, if any.
    fn missing_field(&self) -> Option<&'static str>;

    fn collection(dataset: &Dataset) -> &Vec<Self>;

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self>;
}

/// Returns the first label whose value is empty after trimming.
fn first_blank(fields: &[(&'static str, &str)]) -> Option<&'static str> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
}

impl Record for Student {
    const COLLECTION: Collection = Collection::Students;

    fn key(&self) -> i64 {
        self.roll_no
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Roll No", self.roll_no.to_string()),
            ("Department", self.department.clone()),
            ("Phone Number", self.phone_number.clone()),
            ("Gender", self.gender.to_string()),
            ("Submission Date", self.submission_date.to_string()),
        ]
    }

    fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("Name", &self.name),
            ("Department", &self.department),
            ("Phone Number", &self.phone_number),
        ])
    }

    fn collection(dataset: &Dataset) -> &Vec<Self> {
        &dataset.students
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.students
    }
}

impl Record for Staff {
    const COLLECTION: Collection = Collection::Staff;

    fn key(&self) -> i64 {
        self.staff_id
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Staff ID", self.staff_id.to_string()),
            ("Department / Role", self.department_role.clone()),
            ("Phone Number", self.phone_number.clone()),
            ("Gender", self.gender.to_string()),
            ("Joining Date", self.joining_date.to_string()),
        ]
    }

    fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("Name", &self.name),
            ("Department / Role", &self.department_role),
            ("Phone Number", &self.phone_number),
        ])
    }

    fn collection(dataset: &Dataset) -> &Vec<Self> {
        &dataset.staff
    }

    fn collection_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
        &mut dataset.staff
    }
}

/// A borrowed record of either variant, as returned by search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef<'a> {
    Student(&'a Student),
    Staff(&'a Staff),
}

impl RecordRef<'_> {
    pub fn collection(&self) -> Collection {
        match self {
            RecordRef::Student(_) => Collection::Students,
            RecordRef::Staff(_) => Collection::Staff,
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            RecordRef::Student(student) => student.fields(),
            RecordRef::Staff(member) => member.fields(),
        }
    }

    /// `Name: Bob, Roll No: 5, ...` summary used by the search tab.
    pub fn summary(&self) -> String {
        self.fields()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_student() -> Student {
        Student {
            name: "Bob".to_string(),
            roll_no: 5,
            department: "CS".to_string(),
            phone_number: "111".to_string(),
            gender: Gender::Male,
            submission_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn student_serializes_with_form_labels() {
        let value = serde_json::to_value(sample_student()).unwrap();
        assert_eq!(value["Name"], "Bob");
        assert_eq!(value["Roll No"], 5);
        assert_eq!(value["Phone Number"], "111");
        assert_eq!(value["Gender"], "Male");
        assert_eq!(value["Submission Date"], "2025-01-01");
    }

    #[test]
    fn staff_uses_slashed_role_key() {
        let staff: Staff = serde_json::from_str(
            r#"{"Name":"Ada","Staff ID":7,"Department / Role":"Math","Phone Number":"222",
                "Gender":"Female","Joining Date":"2024-09-01"}"#,
        )
        .unwrap();
        assert_eq!(staff.department_role, "Math");
        assert_eq!(staff.gender, Gender::Female);
    }

    #[test]
    fn missing_field_reports_first_blank_in_form_order() {
        let mut student = sample_student();
        student.department = "  ".to_string();
        student.phone_number.clear();
        assert_eq!(student.missing_field(), Some("Department"));
    }

    #[test]
    fn dataset_without_staff_key_defaults_to_empty() {
        let dataset: Dataset = serde_json::from_str(r#"{"students": []}"#).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn summary_joins_labels_and_values() {
        let student = sample_student();
        let summary = RecordRef::Student(&student).summary();
        assert!(summary.starts_with("Name: Bob, Roll No: 5"));
    }
}
