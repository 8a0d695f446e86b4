use crate::models::{Collection, Record, Staff, Student};
use crate::report::ResultCard;
use crate::repository::Repository;
use crate::store::Store;

/// Working copy of one collection on the records tab. Edits stay here until
/// saved through the repository.
pub(crate) struct StagedTable<R> {
    pub(crate) rows: Vec<R>,
    pub(crate) selected: usize,
    pub(crate) dirty: bool,
}

impl<R: Record> StagedTable<R> {
    pub(crate) fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            selected: 0,
            dirty: false,
        }
    }

    /// Drop staged edits and take a fresh copy of `rows`.
    pub(crate) fn reset(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.dirty = false;
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&R> {
        self.rows.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }

    /// Overwrite the row at `index`.
    pub(crate) fn replace(&mut self, index: usize, record: R) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = record;
            self.dirty = true;
        }
    }

    /// Append a row and select it.
    pub(crate) fn push(&mut self, record: R) {
        self.rows.push(record);
        self.selected = self.rows.len() - 1;
        self.dirty = true;
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<R> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        self.dirty = true;
        self.ensure_in_bounds();
        Some(removed)
    }

    /// One past the largest key, suggested for new rows. Zero (no
    /// suggestion) when the largest key is already `i64::MAX`.
    pub(crate) fn next_key(&self) -> i64 {
        let largest = self.rows.iter().map(|row| row.key()).max().unwrap_or(0);
        largest.checked_add(1).unwrap_or(0)
    }

    fn ensure_in_bounds(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.rows.len() {
            self.selected = self.rows.len() - 1;
        }
    }
}

/// "View All Records" tab: staged copies of both collections.
pub(crate) struct RecordsScreen {
    pub(crate) collection: Collection,
    pub(crate) students: StagedTable<Student>,
    pub(crate) staff: StagedTable<Staff>,
}

impl RecordsScreen {
    pub(crate) fn new<S: Store>(repository: &Repository<S>) -> Self {
        Self {
            collection: Collection::Students,
            students: StagedTable::new(repository.students().to_vec()),
            staff: StagedTable::new(repository.staff().to_vec()),
        }
    }

    /// Reload both tables from the repository, dropping staged edits.
    pub(crate) fn reload<S: Store>(&mut self, repository: &Repository<S>) {
        self.students.reset(repository.students().to_vec());
        self.staff.reset(repository.staff().to_vec());
    }

    pub(crate) fn toggle_collection(&mut self) {
        self.collection = match self.collection {
            Collection::Students => Collection::Staff,
            Collection::Staff => Collection::Students,
        };
    }

    pub(crate) fn has_pending_changes(&self) -> bool {
        self.students.dirty || self.staff.dirty
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        match self.collection {
            Collection::Students => self.students.move_selection(offset),
            Collection::Staff => self.staff.move_selection(offset),
        }
    }

    pub(crate) fn select_first(&mut self) {
        match self.collection {
            Collection::Students => self.students.select_first(),
            Collection::Staff => self.staff.select_first(),
        }
    }

    pub(crate) fn select_last(&mut self) {
        match self.collection {
            Collection::Students => self.students.select_last(),
            Collection::Staff => self.staff.select_last(),
        }
    }

    pub(crate) fn selected(&self) -> usize {
        match self.collection {
            Collection::Students => self.students.selected,
            Collection::Staff => self.staff.selected,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self.collection {
            Collection::Students => self.students.rows.len(),
            Collection::Staff => self.staff.rows.len(),
        }
    }

    /// `(name, key)` of the selected row in the active table.
    pub(crate) fn current_summary(&self) -> Option<(String, i64)> {
        match self.collection {
            Collection::Students => self
                .students
                .current()
                .map(|row| (row.name.clone(), row.roll_no)),
            Collection::Staff => self
                .staff
                .current()
                .map(|row| (row.name.clone(), row.staff_id)),
        }
    }

    /// Column headers and cell text for the active table.
    pub(crate) fn table(&self) -> (Vec<&'static str>, Vec<Vec<String>>) {
        match self.collection {
            Collection::Students => table_cells(&self.students.rows),
            Collection::Staff => table_cells(&self.staff.rows),
        }
    }
}

fn table_cells<R: Record>(rows: &[R]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let mut headers = Vec::new();
    let mut cells = Vec::with_capacity(rows.len());
    for row in rows {
        let fields = row.fields();
        if headers.is_empty() {
            headers = fields.iter().map(|(label, _)| *label).collect();
        }
        cells.push(fields.into_iter().map(|(_, value)| value).collect());
    }
    (headers, cells)
}

/// One line of the search results list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SearchLine {
    pub(crate) collection: Collection,
    pub(crate) summary: String,
}

/// "Search Records" tab state. Results are recomputed on every keystroke.
#[derive(Default)]
pub(crate) struct SearchScreen {
    pub(crate) query: String,
    pub(crate) results: Vec<SearchLine>,
}

impl SearchScreen {
    pub(crate) fn refresh<S: Store>(&mut self, repository: &Repository<S>) {
        self.results = repository
            .search(&self.query)
            .into_iter()
            .map(|hit| SearchLine {
                collection: hit.collection,
                summary: hit.record.summary(),
            })
            .collect();
    }
}

/// Outcome of the last result card lookup.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Lookup {
    Found(ResultCard),
    NotFound(i64),
}

/// "Result Card" tab state.
#[derive(Default)]
pub(crate) struct ResultScreen {
    pub(crate) roll: String,
    pub(crate) lookup: Option<Lookup>,
}

impl ResultScreen {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() {
            self.roll.push(ch);
            true
        } else {
            false
        }
    }
}
