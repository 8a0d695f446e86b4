use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Collection, Gender, Record, Staff, StaffDraft, Student, StudentDraft};

use super::app::Tab;

/// Date format accepted and shown by the date fields.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields of the registration/edit form. Students and staff share the same
/// shape; only the labels differ.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum FormField {
    #[default]
    Name,
    Key,
    Department,
    Phone,
    Gender,
    Date,
}

impl FormField {
    pub(crate) const ALL: [FormField; 6] = [
        FormField::Name,
        FormField::Key,
        FormField::Department,
        FormField::Phone,
        FormField::Gender,
        FormField::Date,
    ];

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    /// Label as shown on the form for the given collection.
    pub(crate) fn label(self, collection: Collection) -> &'static str {
        match (self, collection) {
            (FormField::Name, _) => "Name",
            (FormField::Key, Collection::Students) => "Roll No",
            (FormField::Key, Collection::Staff) => "Staff ID",
            (FormField::Department, Collection::Students) => "Department",
            (FormField::Department, Collection::Staff) => "Department / Role",
            (FormField::Phone, _) => "Phone Number",
            (FormField::Gender, _) => "Gender",
            (FormField::Date, Collection::Students) => "Submission Date",
            (FormField::Date, Collection::Staff) => "Joining Date",
        }
    }
}

/// Internal representation of a student or staff form. Every value is kept
/// as typed text and only parsed on submit.
#[derive(Clone, Debug)]
pub(crate) struct RecordForm {
    /// Decides labels and whether the form builds a student or a staff row.
    pub(crate) collection: Collection,
    pub(crate) name: String,
    /// Roll No or Staff ID as typed. Only digits are accepted, so the text
    /// can only fail to parse when blank or too large.
    pub(crate) key: String,
    /// Department, or Department / Role for staff.
    pub(crate) department: String,
    pub(crate) phone: String,
    /// `None` renders as the "Select Gender" placeholder.
    pub(crate) gender: Option<Gender>,
    /// Submission or joining date as `YYYY-MM-DD` text. Starts at today.
    pub(crate) date: String,
    /// Field receiving keystrokes; also where the cursor is drawn.
    pub(crate) active: FormField,
    /// Last submit error, shown under the fields until the next edit.
    pub(crate) error: Option<String>,
}

impl RecordForm {
    /// Blank form with the date preset to `today`.
    pub(crate) fn new(collection: Collection, today: NaiveDate) -> Self {
        Self {
            collection,
            name: String::new(),
            key: String::new(),
            department: String::new(),
            phone: String::new(),
            gender: None,
            date: today.format(DATE_FORMAT).to_string(),
            active: FormField::Name,
            error: None,
        }
    }

    /// Blank form whose key is preset to `key` (used when appending rows).
    pub(crate) fn with_key(collection: Collection, today: NaiveDate, key: i64) -> Self {
        let mut form = Self::new(collection, today);
        if key > 0 {
            form.key = key.to_string();
        }
        form
    }

    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            collection: Collection::Students,
            name: student.name.clone(),
            key: student.roll_no.to_string(),
            department: student.department.clone(),
            phone: student.phone_number.clone(),
            gender: Some(student.gender),
            date: student.submission_date.format(DATE_FORMAT).to_string(),
            active: FormField::Name,
            error: None,
        }
    }

    pub(crate) fn from_staff(member: &Staff) -> Self {
        Self {
            collection: Collection::Staff,
            name: member.name.clone(),
            key: member.staff_id.to_string(),
            department: member.department_role.clone(),
            phone: member.phone_number.clone(),
            gender: Some(member.gender),
            date: member.joining_date.format(DATE_FORMAT).to_string(),
            active: FormField::Name,
            error: None,
        }
    }

    /// Reset every field, keeping the collection.
    pub(crate) fn clear(&mut self, today: NaiveDate) {
        *self = Self::new(self.collection, today);
    }

    pub(crate) fn focus(&mut self, field: FormField) {
        self.active = field;
    }

    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % FormField::ALL.len();
        self.active = FormField::ALL[next];
    }

    pub(crate) fn previous_field(&mut self) {
        let len = FormField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.active = FormField::ALL[previous];
    }

    /// Step through Select → Male → Female and around.
    pub(crate) fn cycle_gender(&mut self, forward: bool) {
        let order = [None, Some(Gender::Male), Some(Gender::Female)];
        let current = order
            .iter()
            .position(|choice| *choice == self.gender)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.gender = order[next];
    }

    /// Append a character to the active field, validating allowed input.
    /// Returns whether the character was accepted.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            FormField::Name => self.name.push(ch),
            FormField::Department => self.department.push(ch),
            FormField::Phone => self.phone.push(ch),
            FormField::Key => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.key.push(ch);
            }
            FormField::Date => {
                if !(ch.is_ascii_digit() || ch == '-') {
                    return false;
                }
                self.date.push(ch);
            }
            FormField::Gender => match ch {
                ' ' => self.cycle_gender(true),
                'm' | 'M' => self.gender = Some(Gender::Male),
                'f' | 'F' => self.gender = Some(Gender::Female),
                _ => return false,
            },
        }
        true
    }

    /// Remove the last character from the active field. On the gender field
    /// this resets the choice.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Key => {
                self.key.pop();
            }
            FormField::Department => {
                self.department.pop();
            }
            FormField::Phone => {
                self.phone.pop();
            }
            FormField::Gender => self.gender = None,
            FormField::Date => {
                self.date.pop();
            }
        }
    }

    fn parse_key(&self) -> Result<i64> {
        let label = FormField::Key.label(self.collection);
        let raw = self.key.trim();
        if raw.is_empty() {
            return Err(anyhow!("{label} is required."));
        }
        match raw.parse::<i64>() {
            Ok(key) if key >= 1 => Ok(key),
            _ => Err(anyhow!("{label} must be a positive whole number.")),
        }
    }

    fn parse_date(&self) -> Result<NaiveDate> {
        let label = FormField::Date.label(self.collection);
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map_err(|_| anyhow!("{label} must be a date like 2025-01-31."))
    }

    /// Typed student input for registration. Blank text and a missing gender
    /// are left for the repository to reject.
    pub(crate) fn student_draft(&self) -> Result<StudentDraft> {
        Ok(StudentDraft {
            name: self.name.trim().to_string(),
            roll_no: self.parse_key()?,
            department: self.department.trim().to_string(),
            phone_number: self.phone.trim().to_string(),
            gender: self.gender,
            submission_date: self.parse_date()?,
        })
    }

    pub(crate) fn staff_draft(&self) -> Result<StaffDraft> {
        Ok(StaffDraft {
            name: self.name.trim().to_string(),
            staff_id: self.parse_key()?,
            department_role: self.department.trim().to_string(),
            phone_number: self.phone.trim().to_string(),
            gender: self.gender,
            joining_date: self.parse_date()?,
        })
    }

    /// Complete student row for the table editor.
    pub(crate) fn student(&self) -> Result<Student> {
        let draft = self.student_draft()?;
        let gender = self.require_gender()?;
        let student = draft.into_student(gender);
        require_filled(&student)?;
        Ok(student)
    }

    /// Complete staff row for the table editor.
    pub(crate) fn staff(&self) -> Result<Staff> {
        let draft = self.staff_draft()?;
        let gender = self.require_gender()?;
        let member = draft.into_staff(gender);
        require_filled(&member)?;
        Ok(member)
    }

    fn require_gender(&self) -> Result<Gender> {
        self.gender.ok_or_else(|| anyhow!("Please select gender."))
    }

    /// Text currently shown for `field`.
    pub(crate) fn value(&self, field: FormField) -> String {
        match field {
            FormField::Name => self.name.clone(),
            FormField::Key => self.key.clone(),
            FormField::Department => self.department.clone(),
            FormField::Phone => self.phone.clone(),
            FormField::Gender => self
                .gender
                .map(|gender| gender.to_string())
                .unwrap_or_default(),
            FormField::Date => self.date.clone(),
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: FormField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            match field {
                FormField::Gender => "< Select Gender >".to_string(),
                _ => "<required>".to_string(),
            }
        } else if field == FormField::Gender {
            format!("< {value} >")
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label(self.collection))),
            Span::styled(display, style),
        ])
    }

    /// Character count of the active field's value, for cursor placement.
    pub(crate) fn value_len(&self, field: FormField) -> usize {
        self.value(field).chars().count()
    }
}

/// Table rows skip the repository's insert checks, so blank text is caught
/// here before the row is staged.
fn require_filled<R: Record>(record: &R) -> Result<()> {
    match record.missing_field() {
        Some(field) => Err(anyhow!("{field} is required.")),
        None => Ok(()),
    }
}

/// State for confirming removal of a staged table row.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmRowDelete {
    pub(crate) collection: Collection,
    /// Row position in the staged table at the time the dialog opened.
    pub(crate) index: usize,
    /// Name and key are copied so the dialog can describe the row without
    /// borrowing the table.
    pub(crate) name: String,
    pub(crate) key: i64,
}

/// Where the user was heading when the staged-edits dialog opened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LeaveTarget {
    /// Exit the application once the edits are saved or dropped.
    Quit,
    /// Switch to another tab once the edits are saved or dropped.
    Tab(Tab),
}

/// Tracks the user's choice when leaving the records table with staged
/// edits.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmLeaveRecords {
    /// Where to go after Apply or Discard. Cancel stays on the records tab.
    pub(crate) target: LeaveTarget,
    /// Highlighted button; Enter acts on it.
    pub(crate) selection: ConfirmChoice,
}

impl ConfirmLeaveRecords {
    /// Create a confirmation dialog with the initial selection on "Apply".
    pub(crate) fn new(target: LeaveTarget) -> Self {
        Self {
            target,
            selection: ConfirmChoice::Apply,
        }
    }

    /// Move the selection forward (Apply → Discard → Cancel).
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            ConfirmChoice::Apply => ConfirmChoice::Discard,
            ConfirmChoice::Discard => ConfirmChoice::Cancel,
            ConfirmChoice::Cancel => ConfirmChoice::Apply,
        };
    }

    /// Move the selection backward (Apply ← Discard ← Cancel).
    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            ConfirmChoice::Apply => ConfirmChoice::Cancel,
            ConfirmChoice::Discard => ConfirmChoice::Apply,
            ConfirmChoice::Cancel => ConfirmChoice::Discard,
        };
    }

    /// Labels rendered on the dialog buttons.
    pub(crate) fn labels(&self) -> [&'static str; 3] {
        match self.target {
            LeaveTarget::Quit => ["Save & Quit", "Discard & Quit", "Cancel"],
            LeaveTarget::Tab(_) => ["Save & Leave", "Discard & Leave", "Cancel"],
        }
    }

    /// Index of the currently highlighted choice.
    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            ConfirmChoice::Apply => 0,
            ConfirmChoice::Discard => 1,
            ConfirmChoice::Cancel => 2,
        }
    }
}

/// Options presented in the staged-edits dialog.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ConfirmChoice {
    Apply,
    Discard,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn typed(form: &mut RecordForm, field: FormField, text: &str) {
        form.focus(field);
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn key_field_only_accepts_digits() {
        let mut form = RecordForm::new(Collection::Students, today());
        form.focus(FormField::Key);
        assert!(form.push_char('4'));
        assert!(!form.push_char('x'));
        assert_eq!(form.key, "4");
    }

    #[test]
    fn gender_cycles_through_unselected() {
        let mut form = RecordForm::new(Collection::Staff, today());
        form.cycle_gender(true);
        assert_eq!(form.gender, Some(Gender::Male));
        form.cycle_gender(true);
        assert_eq!(form.gender, Some(Gender::Female));
        form.cycle_gender(true);
        assert_eq!(form.gender, None);
        form.cycle_gender(false);
        assert_eq!(form.gender, Some(Gender::Female));
    }

    #[test]
    fn field_focus_wraps_around() {
        let mut form = RecordForm::new(Collection::Students, today());
        form.previous_field();
        assert_eq!(form.active, FormField::Date);
        form.next_field();
        assert_eq!(form.active, FormField::Name);
    }

    #[test]
    fn draft_keeps_unselected_gender_for_repository() {
        let mut form = RecordForm::new(Collection::Students, today());
        typed(&mut form, FormField::Name, "Bob");
        typed(&mut form, FormField::Key, "5");
        let draft = form.student_draft().unwrap();
        assert_eq!(draft.gender, None);
        assert_eq!(draft.roll_no, 5);
        assert_eq!(draft.submission_date, today());
    }

    #[test]
    fn zero_key_is_rejected() {
        let mut form = RecordForm::new(Collection::Staff, today());
        typed(&mut form, FormField::Key, "0");
        let err = form.staff_draft().unwrap_err();
        assert_eq!(err.to_string(), "Staff ID must be a positive whole number.");
    }

    #[test]
    fn bad_date_names_the_field() {
        let mut form = RecordForm::new(Collection::Staff, today());
        typed(&mut form, FormField::Key, "3");
        form.date = "2025-13-40".to_string();
        let err = form.staff_draft().unwrap_err();
        assert!(err.to_string().starts_with("Joining Date"));
    }

    #[test]
    fn table_row_requires_gender_and_text() {
        let mut form = RecordForm::with_key(Collection::Students, today(), 9);
        typed(&mut form, FormField::Name, "Eve");
        assert_eq!(form.student().unwrap_err().to_string(), "Please select gender.");

        form.gender = Some(Gender::Female);
        assert_eq!(
            form.student().unwrap_err().to_string(),
            "Department is required."
        );
    }

    #[test]
    fn edit_form_round_trips_existing_row() {
        let member = Staff {
            name: "Ada".to_string(),
            staff_id: 2,
            department_role: "Math / Head".to_string(),
            phone_number: "0300".to_string(),
            gender: Gender::Female,
            joining_date: today(),
        };
        let form = RecordForm::from_staff(&member);
        assert_eq!(form.staff().unwrap(), member);
    }

    #[test]
    fn confirm_dialog_cycles_choices() {
        let mut confirm = ConfirmLeaveRecords::new(LeaveTarget::Quit);
        confirm.previous();
        assert_eq!(confirm.selection, ConfirmChoice::Cancel);
        confirm.next();
        assert_eq!(confirm.selected_index(), 0);
        assert_eq!(confirm.labels()[0], "Save & Quit");
    }
}
