//! In-memory owner of the dataset. Every mutation validates, applies, then
//! persists the whole document through the [`Store`] before returning. A
//! failed save rolls the in-memory change back so memory and disk agree.

use std::collections::HashSet;

use log::{info, warn};

use crate::error::{RepoError, RepoResult, ValidationError};
use crate::models::{
    Collection, Dataset, Gender, Record, RecordRef, Staff, StaffDraft, Student, StudentDraft,
};
use crate::report::ResultCard;
use crate::store::Store;

/// A record matched by [`Repository::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub collection: Collection,
    pub record: RecordRef<'a>,
}

pub struct Repository<S: Store> {
    store: S,
    dataset: Dataset,
}

impl<S: Store> Repository<S> {
    /// Load the dataset from `store` and take ownership of both.
    pub fn open(store: S) -> RepoResult<Self> {
        let dataset = store.load()?;
        Ok(Self { store, dataset })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn students(&self) -> &[Student] {
        &self.dataset.students
    }

    pub fn staff(&self) -> &[Staff] {
        &self.dataset.staff
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a student. Checks run in form order: gender chosen, roll
    /// number free, required text filled in.
    pub fn insert_student(&mut self, draft: StudentDraft) -> RepoResult<&Student> {
        let gender = require_choice(draft.gender)?;
        self.insert(draft.into_student(gender))
    }

    /// Register a staff member; same checks as [`Repository::insert_student`].
    pub fn insert_staff(&mut self, draft: StaffDraft) -> RepoResult<&Staff> {
        let gender = require_choice(draft.gender)?;
        self.insert(draft.into_staff(gender))
    }

    fn insert<R: Record>(&mut self, record: R) -> RepoResult<&R> {
        let key = record.key();
        if R::collection(&self.dataset)
            .iter()
            .any(|existing| existing.key() == key)
        {
            return Err(ValidationError::DuplicateKey {
                collection: R::COLLECTION,
                key,
            }
            .into());
        }
        if let Some(field) = record.missing_field() {
            return Err(ValidationError::MissingField(field).into());
        }

        R::collection_mut(&mut self.dataset).push(record);
        if let Err(err) = self.store.save(&self.dataset) {
            R::collection_mut(&mut self.dataset).pop();
            warn!(
                "event=record_insert status=rolled_back collection={} key={key}",
                R::COLLECTION.key()
            );
            return Err(err.into());
        }

        info!(
            "event=record_insert status=ok collection={} key={key}",
            R::COLLECTION.key()
        );
        let records = R::collection(&self.dataset);
        Ok(&records[records.len() - 1])
    }

    /// Replace one collection wholesale, as the table editor does on save.
    ///
    /// Every row is checked for blank required fields and for keys repeated
    /// within `records`; nothing changes unless all rows pass.
    pub fn replace_all<R: Record>(&mut self, records: Vec<R>) -> RepoResult<()> {
        validate_rows(&records)?;

        let count = records.len();
        let previous = std::mem::replace(R::collection_mut(&mut self.dataset), records);
        if let Err(err) = self.store.save(&self.dataset) {
            *R::collection_mut(&mut self.dataset) = previous;
            warn!(
                "event=collection_replace status=rolled_back collection={}",
                R::COLLECTION.key()
            );
            return Err(err.into());
        }

        info!(
            "event=collection_replace status=ok collection={} rows={count}",
            R::COLLECTION.key()
        );
        Ok(())
    }

    /// First student with this roll number, in insertion order.
    pub fn find_by_roll(&self, roll: i64) -> Option<&Student> {
        self.dataset
            .students
            .iter()
            .find(|student| student.roll_no == roll)
    }

    pub fn find_by_staff_id(&self, staff_id: i64) -> Option<&Staff> {
        self.dataset
            .staff
            .iter()
            .find(|member| member.staff_id == staff_id)
    }

    /// Case-insensitive substring search over every field of every record,
    /// students first. An empty query matches nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let students = self
            .dataset
            .students
            .iter()
            .filter(|student| matches_record(*student, &needle))
            .map(RecordRef::Student);
        let staff = self
            .dataset
            .staff
            .iter()
            .filter(|member| matches_record(*member, &needle))
            .map(RecordRef::Staff);

        students
            .chain(staff)
            .map(|record| SearchHit {
                collection: record.collection(),
                record,
            })
            .collect()
    }

    /// Mock result card for the student with this roll number.
    pub fn result_card(&self, roll: i64) -> Option<ResultCard> {
        self.find_by_roll(roll).map(ResultCard::for_student)
    }
}

fn require_choice(gender: Option<Gender>) -> Result<Gender, ValidationError> {
    gender.ok_or(ValidationError::UnselectedChoice("Gender"))
}

fn matches_record<R: Record>(record: &R, needle: &str) -> bool {
    record
        .fields()
        .iter()
        .any(|(_, value)| value.to_lowercase().contains(needle))
}

fn validate_rows<R: Record>(records: &[R]) -> RepoResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        if let Some(field) = record.missing_field() {
            return Err(RepoError::InvalidRow {
                row,
                source: ValidationError::MissingField(field),
            });
        }
        if !seen.insert(record.key()) {
            return Err(RepoError::InvalidRow {
                row,
                source: ValidationError::DuplicateKey {
                    collection: R::COLLECTION,
                    key: record.key(),
                },
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::NaiveDate;

    use super::*;
    use crate::error::StoreError;

    /// Keeps the "disk" in memory and counts saves. Saves fail while
    /// `fail_saves` is set.
    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<Option<Dataset>>,
        saves: Cell<usize>,
        fail_saves: Cell<bool>,
    }

    impl Store for MemoryStore {
        fn load(&self) -> Result<Dataset, StoreError> {
            Ok(self.saved.borrow().clone().unwrap_or_default())
        }

        fn save(&self, dataset: &Dataset) -> Result<(), StoreError> {
            if self.fail_saves.get() {
                return Err(StoreError::Io {
                    path: "memory".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.saves.set(self.saves.get() + 1);
            *self.saved.borrow_mut() = Some(dataset.clone());
            Ok(())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn student(name: &str, roll_no: i64) -> StudentDraft {
        StudentDraft {
            name: name.to_string(),
            roll_no,
            department: "CS".to_string(),
            phone_number: "111".to_string(),
            gender: Some(Gender::Male),
            submission_date: date(),
        }
    }

    fn staff(name: &str, staff_id: i64) -> StaffDraft {
        StaffDraft {
            name: name.to_string(),
            staff_id,
            department_role: "Physics / Teacher".to_string(),
            phone_number: "222".to_string(),
            gender: Some(Gender::Female),
            joining_date: date(),
        }
    }

    fn open() -> Repository<MemoryStore> {
        Repository::open(MemoryStore::default()).unwrap()
    }

    #[test]
    fn unselected_gender_is_checked_before_duplicates() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();

        let mut draft = student("", 5);
        draft.gender = None;
        let err = repo.insert_student(draft).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::UnselectedChoice("Gender"))
        );
    }

    #[test]
    fn duplicate_is_checked_before_missing_fields() {
        let mut repo = open();
        repo.insert_staff(staff("Ada", 1)).unwrap();

        let err = repo.insert_staff(staff("", 1)).unwrap_err();
        assert_eq!(
            err.validation(),
            Some(&ValidationError::DuplicateKey {
                collection: Collection::Staff,
                key: 1
            })
        );
    }

    #[test]
    fn rejected_insert_does_not_save() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();
        assert_eq!(repo.store().saves.get(), 1);

        assert!(repo.insert_student(student("Bobby", 5)).is_err());
        let mut blank = student("Carol", 6);
        blank.phone_number = " ".to_string();
        assert!(repo.insert_student(blank).is_err());

        assert_eq!(repo.students().len(), 1);
        assert_eq!(repo.store().saves.get(), 1);
    }

    #[test]
    fn failed_save_rolls_back_insert() {
        let mut repo = open();
        repo.store().fail_saves.set(true);

        let err = repo.insert_student(student("Bob", 5)).unwrap_err();
        assert!(matches!(err, RepoError::Store(_)));
        assert!(repo.students().is_empty());
        assert!(repo.find_by_roll(5).is_none());
    }

    #[test]
    fn failed_save_rolls_back_replace() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();
        repo.store().fail_saves.set(true);

        assert!(repo.replace_all::<Student>(Vec::new()).is_err());
        assert_eq!(repo.students().len(), 1);
    }

    #[test]
    fn replace_all_rejects_repeated_keys() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();
        let rows = vec![
            student("A", 1).into_student(Gender::Male),
            student("B", 1).into_student(Gender::Female),
        ];

        let err = repo.replace_all(rows).unwrap_err();
        assert!(matches!(err, RepoError::InvalidRow { row: 1, .. }));
        assert_eq!(repo.students()[0].name, "Bob");
        assert_eq!(repo.store().saves.get(), 1);
    }

    #[test]
    fn replace_all_only_touches_its_collection() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();
        repo.insert_staff(staff("Ada", 1)).unwrap();

        repo.replace_all::<Staff>(Vec::new()).unwrap();
        assert!(repo.staff().is_empty());
        assert_eq!(repo.students().len(), 1);
        assert_eq!(repo.store().load().unwrap(), *repo.dataset());
    }

    #[test]
    fn search_lists_students_before_staff() {
        let mut repo = open();
        repo.insert_staff(staff("Alice Brown", 1)).unwrap();
        repo.insert_student(student("alice smith", 5)).unwrap();

        let hits = repo.search("ALICE");
        let tags: Vec<_> = hits.iter().map(|hit| hit.collection).collect();
        assert_eq!(tags, vec![Collection::Students, Collection::Staff]);
    }

    #[test]
    fn search_matches_numbers_and_dates_as_text() {
        let mut repo = open();
        repo.insert_student(student("Bob", 1234)).unwrap();

        assert_eq!(repo.search("23").len(), 1);
        assert_eq!(repo.search("2025-01").len(), 1);
        assert_eq!(repo.search("female").len(), 0);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let mut repo = open();
        repo.insert_student(student("Bob", 5)).unwrap();
        assert!(repo.search("").is_empty());
    }

    #[test]
    fn find_by_staff_id_returns_member() {
        let mut repo = open();
        repo.insert_staff(staff("Ada", 9)).unwrap();
        assert_eq!(repo.find_by_staff_id(9).map(|m| m.name.as_str()), Some("Ada"));
        assert!(repo.find_by_staff_id(10).is_none());
    }
}
