//! Mock annual result card. There is no grading engine: every student gets
//! the same marks and grade.

use crate::models::Student;

/// Heading printed above the marks.
pub const RESULT_TITLE: &str = "Mock Annual Result 2025";

/// Subject marks shown on every card, in display order.
pub const MOCK_MARKS: [(&str, u32); 5] = [
    ("Math", 92),
    ("Physics", 88),
    ("Chemistry", 90),
    ("English", 85),
    ("Urdu", 89),
];

pub const MOCK_GRADE: &str = "A+";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub name: String,
    pub roll_no: i64,
    pub department: String,
    pub marks: Vec<(&'static str, u32)>,
    pub grade: &'static str,
}

impl ResultCard {
    pub fn for_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            roll_no: student.roll_no,
            department: student.department.clone(),
            marks: MOCK_MARKS.to_vec(),
            grade: MOCK_GRADE,
        }
    }

    /// Mean of the subject marks.
    pub fn percentage(&self) -> f64 {
        if self.marks.is_empty() {
            return 0.0;
        }
        let total: u32 = self.marks.iter().map(|(_, mark)| mark).sum();
        f64::from(total) / self.marks.len() as f64
    }

    /// `Math: 92 | Physics: 88 | ...`
    pub fn marks_line(&self) -> String {
        self.marks
            .iter()
            .map(|(subject, mark)| format!("{subject}: {mark}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// `Grade: A+ (88.8%)`
    pub fn grade_line(&self) -> String {
        format!("Grade: {} ({:.1}%)", self.grade, self.percentage())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::Gender;

    #[test]
    fn card_uses_fixed_marks_and_grade() {
        let student = Student {
            name: "Bob".to_string(),
            roll_no: 5,
            department: "CS".to_string(),
            phone_number: "111".to_string(),
            gender: Gender::Male,
            submission_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        let card = ResultCard::for_student(&student);

        assert_eq!(
            card.marks_line(),
            "Math: 92 | Physics: 88 | Chemistry: 90 | English: 85 | Urdu: 89"
        );
        assert_eq!(card.grade_line(), "Grade: A+ (88.8%)");
        assert_eq!(card.roll_no, 5);
    }
}
