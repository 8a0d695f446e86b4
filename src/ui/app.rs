use std::mem;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use log::debug;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;

use crate::error::{RepoError, ValidationError};
use crate::models::Collection;
use crate::report::RESULT_TITLE;
use crate::repository::Repository;
use crate::store::{JsonStore, Store};

use super::forms::{
    ConfirmChoice, ConfirmLeaveRecords, ConfirmRowDelete, FormField, LeaveTarget, RecordForm,
};
use super::helpers::{button_row, centered_rect, cursor_column, key_hints, surface_error};
use super::screens::{Lookup, RecordsScreen, ResultScreen, SearchScreen};

/// Height of the tab bar across the top.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows moved by PageUp/PageDown in the records table.
const PAGE_STEP: isize = 5;
/// Column widths of the records table, in field order.
const TABLE_WIDTHS: [Constraint; 6] = [
    Constraint::Percentage(22),
    Constraint::Percentage(9),
    Constraint::Percentage(22),
    Constraint::Percentage(16),
    Constraint::Percentage(9),
    Constraint::Percentage(22),
];

/// Top-level tabs, reachable with F1 through F5.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tab {
    StudentRegistration,
    StaffManagement,
    ViewRecords,
    Search,
    ResultCard,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::StudentRegistration,
        Tab::StaffManagement,
        Tab::ViewRecords,
        Tab::Search,
        Tab::ResultCard,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::StudentRegistration => "Student Registration",
            Tab::StaffManagement => "Staff Management",
            Tab::ViewRecords => "View All Records",
            Tab::Search => "Search Records",
            Tab::ResultCard => "Result Card",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    /// Tab bound to function key `F<number>`.
    fn from_function_key(number: u8) -> Option<Tab> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }
}

/// Modal states layered over the current tab.
enum Mode {
    Normal,
    /// Editing a staged table row; `index` is `None` for a new row.
    EditingRow {
        index: Option<usize>,
        form: RecordForm,
    },
    ConfirmRowDelete(ConfirmRowDelete),
    ConfirmLeave(ConfirmLeaveRecords),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. Owns the repository for
/// the lifetime of the session.
pub struct App<S: Store = JsonStore> {
    repository: Repository<S>,
    today: NaiveDate,
    tab: Tab,
    mode: Mode,
    status: Option<StatusMessage>,
    student_form: RecordForm,
    staff_form: RecordForm,
    records: RecordsScreen,
    search: SearchScreen,
    result: ResultScreen,
}

impl<S: Store> App<S> {
    pub fn new(repository: Repository<S>) -> Self {
        Self::with_today(repository, Local::now().date_naive())
    }

    /// Build the app with a fixed "today", which presets the date fields.
    pub fn with_today(repository: Repository<S>, today: NaiveDate) -> Self {
        let records = RecordsScreen::new(&repository);
        Self {
            repository,
            today,
            tab: Tab::StudentRegistration,
            mode: Mode::Normal,
            status: None,
            student_form: RecordForm::new(Collection::Students, today),
            staff_form: RecordForm::new(Collection::Staff, today),
            records,
            search: SearchScreen::default(),
            result: ResultScreen::default(),
        }
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repository
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Text of the footer status message, if one is showing.
    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    /// Whether the records tab holds edits that are not saved yet.
    pub fn has_pending_changes(&self) -> bool {
        self.records.has_pending_changes()
    }

    /// Process one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::EditingRow { index, form } => self.handle_edit_row(code, index, form)?,
            Mode::ConfirmRowDelete(confirm) => self.handle_confirm_row_delete(code, confirm)?,
            Mode::ConfirmLeave(confirm) => self.handle_confirm_leave(code, confirm, &mut exit)?,
        };

        Ok(exit)
    }

    /// Ctrl+C/Ctrl+Q quit, Ctrl+R clears the active form, Ctrl+S saves
    /// staged table edits. Returns `true` when the app should exit.
    pub fn handle_ctrl(&mut self, ch: char) -> Result<bool> {
        match ch {
            'c' | 'q' => {
                if self.records.has_pending_changes() {
                    if !matches!(self.mode, Mode::ConfirmLeave(_)) {
                        self.mode = Mode::ConfirmLeave(ConfirmLeaveRecords::new(LeaveTarget::Quit));
                    }
                    return Ok(false);
                }
                return Ok(true);
            }
            'r' if matches!(self.mode, Mode::Normal) => {
                let today = self.today;
                match self.tab {
                    Tab::StudentRegistration => self.student_form.clear(today),
                    Tab::StaffManagement => self.staff_form.clear(today),
                    _ => return Ok(false),
                }
                self.set_status("Fields cleared.", StatusKind::Info);
            }
            's' if matches!(self.mode, Mode::Normal) && self.tab == Tab::ViewRecords => {
                self.save_records_with_status();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if let KeyCode::F(number) = code {
            if let Some(tab) = Tab::from_function_key(number) {
                return Ok(self.switch_tab(tab));
            }
        }

        match self.tab {
            Tab::StudentRegistration => {
                self.handle_form_key(Collection::Students, code);
                Ok(Mode::Normal)
            }
            Tab::StaffManagement => {
                self.handle_form_key(Collection::Staff, code);
                Ok(Mode::Normal)
            }
            Tab::ViewRecords => self.handle_records_key(code, exit),
            Tab::Search => {
                self.handle_search_key(code);
                Ok(Mode::Normal)
            }
            Tab::ResultCard => {
                self.handle_result_key(code);
                Ok(Mode::Normal)
            }
        }
    }

    /// Move to `tab`, asking first when the records tab has staged edits.
    fn switch_tab(&mut self, tab: Tab) -> Mode {
        if tab == self.tab {
            return Mode::Normal;
        }
        if self.tab == Tab::ViewRecords && self.records.has_pending_changes() {
            return Mode::ConfirmLeave(ConfirmLeaveRecords::new(LeaveTarget::Tab(tab)));
        }
        self.enter_tab(tab);
        Mode::Normal
    }

    fn enter_tab(&mut self, tab: Tab) {
        debug!("event=tab_switch from={:?} to={:?}", self.tab, tab);
        self.tab = tab;
        self.clear_status();
        match tab {
            Tab::ViewRecords => self.records.reload(&self.repository),
            Tab::Search => self.search.refresh(&self.repository),
            _ => {}
        }
    }

    fn form_mut(&mut self, collection: Collection) -> &mut RecordForm {
        match collection {
            Collection::Students => &mut self.student_form,
            Collection::Staff => &mut self.staff_form,
        }
    }

    fn handle_form_key(&mut self, collection: Collection, code: KeyCode) {
        let form = self.form_mut(collection);
        if !edit_form(form, code) {
            match code {
                KeyCode::Enter => self.register(collection),
                KeyCode::Esc => self.clear_status(),
                _ => {}
            }
        }
    }

    /// Submit the registration form for `collection`. The form is cleared on
    /// success and keeps its input on failure.
    fn register(&mut self, collection: Collection) {
        let outcome = match collection {
            Collection::Students => self.register_student(),
            Collection::Staff => self.register_staff(),
        };

        let today = self.today;
        match outcome {
            Ok(message) => {
                self.form_mut(collection).clear(today);
                self.set_status(message, StatusKind::Info);
            }
            Err(err) => {
                let message = surface_error(&err);
                let form = self.form_mut(collection);
                if let Some(field) = offending_field(&err, collection) {
                    form.focus(field);
                }
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn register_student(&mut self) -> Result<String> {
        let draft = self.student_form.student_draft()?;
        self.repository.insert_student(draft)?;
        Ok("Student Registered Successfully!".to_string())
    }

    fn register_staff(&mut self) -> Result<String> {
        let draft = self.staff_form.staff_draft()?;
        self.repository.insert_staff(draft)?;
        Ok("Staff Registered Successfully!".to_string())
    }

    fn handle_records_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                if self.records.has_pending_changes() {
                    return Ok(Mode::ConfirmLeave(ConfirmLeaveRecords::new(
                        LeaveTarget::Quit,
                    )));
                }
                *exit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.records.toggle_collection();
                self.clear_status();
            }
            KeyCode::Up => self.records.move_selection(-1),
            KeyCode::Down => self.records.move_selection(1),
            KeyCode::PageUp => self.records.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.records.move_selection(PAGE_STEP),
            KeyCode::Home => self.records.select_first(),
            KeyCode::End => self.records.select_last(),
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                let index = self.records.selected();
                let form = match self.records.collection {
                    Collection::Students => self.records.students.current().map(RecordForm::from_student),
                    Collection::Staff => self.records.staff.current().map(RecordForm::from_staff),
                };
                match form {
                    Some(form) => {
                        self.clear_status();
                        return Ok(Mode::EditingRow {
                            index: Some(index),
                            form,
                        });
                    }
                    None => self.set_status("No row selected to edit.", StatusKind::Error),
                }
            }
            KeyCode::Char('+') => {
                let collection = self.records.collection;
                let next_key = match collection {
                    Collection::Students => self.records.students.next_key(),
                    Collection::Staff => self.records.staff.next_key(),
                };
                self.clear_status();
                return Ok(Mode::EditingRow {
                    index: None,
                    form: RecordForm::with_key(collection, self.today, next_key),
                });
            }
            KeyCode::Char('-') => match self.records.current_summary() {
                Some((name, key)) => {
                    self.clear_status();
                    return Ok(Mode::ConfirmRowDelete(ConfirmRowDelete {
                        collection: self.records.collection,
                        index: self.records.selected(),
                        name,
                        key,
                    }));
                }
                None => self.set_status("No row selected to remove.", StatusKind::Error),
            },
            KeyCode::Char('s') | KeyCode::Char('S') => self.save_records_with_status(),
            KeyCode::Char('u') | KeyCode::Char('U') => {
                if self.records.has_pending_changes() {
                    self.records.reload(&self.repository);
                    self.set_status("Discarded staged edits.", StatusKind::Info);
                } else {
                    self.set_status("Nothing to discard.", StatusKind::Info);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_edit_row(
        &mut self,
        code: KeyCode,
        index: Option<usize>,
        mut form: RecordForm,
    ) -> Result<Mode> {
        if edit_form(&mut form, code) {
            return Ok(Mode::EditingRow { index, form });
        }

        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter => match self.stage_row(index, &form) {
                Ok(()) => {
                    self.set_status(
                        "Row staged. Press s to save changes.",
                        StatusKind::Info,
                    );
                    Ok(Mode::Normal)
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::EditingRow { index, form })
                }
            },
            _ => Ok(Mode::EditingRow { index, form }),
        }
    }

    /// Write the edit form into the staged table, replacing row `index` or
    /// appending when there is none.
    fn stage_row(&mut self, index: Option<usize>, form: &RecordForm) -> Result<()> {
        match form.collection {
            Collection::Students => {
                let row = form.student()?;
                match index {
                    Some(index) => self.records.students.replace(index, row),
                    None => self.records.students.push(row),
                }
            }
            Collection::Staff => {
                let row = form.staff()?;
                match index {
                    Some(index) => self.records.staff.replace(index, row),
                    None => self.records.staff.push(row),
                }
            }
        }
        Ok(())
    }

    fn handle_confirm_row_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmRowDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let removed = match confirm.collection {
                    Collection::Students => self.records.students.remove(confirm.index).is_some(),
                    Collection::Staff => self.records.staff.remove(confirm.index).is_some(),
                };
                if removed {
                    self.set_status(
                        format!("Removed {}. Press s to save changes.", confirm.name),
                        StatusKind::Info,
                    );
                } else {
                    self.set_status("Row no longer exists.", StatusKind::Error);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmRowDelete(confirm)),
        }
    }

    fn handle_confirm_leave(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmLeaveRecords,
        exit: &mut bool,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                confirm.previous();
                Ok(Mode::ConfirmLeave(confirm))
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                confirm.next();
                Ok(Mode::ConfirmLeave(confirm))
            }
            KeyCode::Enter => match confirm.selection {
                ConfirmChoice::Apply => {
                    if let Err(err) = self.save_records() {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        return Ok(Mode::ConfirmLeave(confirm));
                    }
                    self.finish_leave(confirm.target, exit);
                    Ok(Mode::Normal)
                }
                ConfirmChoice::Discard => {
                    self.records.reload(&self.repository);
                    self.finish_leave(confirm.target, exit);
                    Ok(Mode::Normal)
                }
                ConfirmChoice::Cancel => Ok(Mode::Normal),
            },
            _ => Ok(Mode::ConfirmLeave(confirm)),
        }
    }

    fn finish_leave(&mut self, target: LeaveTarget, exit: &mut bool) {
        match target {
            LeaveTarget::Quit => *exit = true,
            LeaveTarget::Tab(tab) => self.enter_tab(tab),
        }
    }

    /// Push every dirty staged table through `replace_all`. Returns whether
    /// anything was written.
    fn save_records(&mut self) -> Result<bool> {
        let mut saved = false;
        if self.records.students.dirty {
            self.repository
                .replace_all(self.records.students.rows.clone())?;
            self.records
                .students
                .reset(self.repository.students().to_vec());
            saved = true;
        }
        if self.records.staff.dirty {
            self.repository.replace_all(self.records.staff.rows.clone())?;
            self.records.staff.reset(self.repository.staff().to_vec());
            saved = true;
        }
        Ok(saved)
    }

    fn save_records_with_status(&mut self) {
        match self.save_records() {
            Ok(true) => self.set_status("Updated!", StatusKind::Info),
            Ok(false) => self.set_status("No changes to save.", StatusKind::Info),
            Err(err) => {
                let message = surface_error(&err);
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(ch) if !ch.is_control() => self.search.query.push(ch),
            KeyCode::Backspace => {
                self.search.query.pop();
            }
            KeyCode::Esc => self.search.query.clear(),
            _ => return,
        }
        self.search.refresh(&self.repository);
    }

    fn handle_result_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(ch) => {
                self.result.push_char(ch);
            }
            KeyCode::Backspace => {
                self.result.roll.pop();
            }
            KeyCode::Esc => {
                self.result.roll.clear();
                self.result.lookup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.lookup_result(),
            _ => {}
        }
    }

    fn lookup_result(&mut self) {
        let raw = self.result.roll.trim();
        if raw.is_empty() {
            self.set_status("Enter a roll number.", StatusKind::Error);
            return;
        }
        // Input is digits only, so parsing can only fail on overflow.
        let Ok(roll) = raw.parse::<i64>() else {
            self.set_status("Roll No is out of range.", StatusKind::Error);
            return;
        };

        match self.repository.result_card(roll) {
            Some(card) => {
                self.result.lookup = Some(Lookup::Found(card));
                self.set_status("Result Found!", StatusKind::Info);
            }
            None => {
                self.result.lookup = Some(Lookup::NotFound(roll));
                self.set_status("Student not found!", StatusKind::Error);
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::StudentRegistration => {
                self.draw_registration(frame, chunks[1], "Student Registration Form", &self.student_form)
            }
            Tab::StaffManagement => {
                self.draw_registration(frame, chunks[1], "Staff Management Form", &self.staff_form)
            }
            Tab::ViewRecords => self.draw_records(frame, chunks[1]),
            Tab::Search => self.draw_search(frame, chunks[1]),
            Tab::ResultCard => self.draw_result(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::EditingRow { index, form } => {
                let title = if index.is_some() { "Edit Row" } else { "Add Row" };
                self.draw_row_form(frame, area, title, form);
            }
            Mode::ConfirmRowDelete(confirm) => self.draw_confirm_row_delete(frame, area, confirm),
            Mode::ConfirmLeave(confirm) => self.draw_confirm_leave(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = Tab::ALL
            .iter()
            .enumerate()
            .map(|(index, tab)| format!("F{} {}", index + 1, tab.title()));
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("School Management System"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_registration(&self, frame: &mut Frame, area: Rect, title: &str, form: &RecordForm) {
        let card = centered_rect(70, 80, area);
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), card);
        let inner = block.inner(card);

        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form, "Enter to register • Ctrl+R to clear"));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if matches!(self.mode, Mode::Normal) {
            place_form_cursor(frame, inner, form);
        }
    }

    fn draw_records(&self, frame: &mut Frame, area: Rect) {
        let collection = self.records.collection;
        let (dirty, count) = match collection {
            Collection::Students => (self.records.students.dirty, self.records.students.rows.len()),
            Collection::Staff => (self.records.staff.dirty, self.records.staff.rows.len()),
        };
        let heading = match collection {
            Collection::Students => "Students",
            Collection::Staff => "Staff",
        };
        let title = if dirty {
            format!("{heading} ({count}) • unsaved edits")
        } else {
            format!("{heading} ({count})")
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.records.len() == 0 {
            let message = Paragraph::new("No records yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let (headers, cells) = self.records.table();
        let header = Row::new(headers.into_iter().map(Cell::from))
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1);
        let rows = cells
            .into_iter()
            .map(|row| Row::new(row.into_iter().map(Cell::from)));

        let table = Table::new(rows, TABLE_WIDTHS)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(Some(self.records.selected()));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .title("Search by Name, Roll/ID, Phone, etc.");
        let input = Paragraph::new(self.search.query.clone()).block(input_block.clone());
        frame.render_widget(input, chunks[0]);

        let results_block = Block::default().borders(Borders::ALL).title("Results");
        if self.search.query.is_empty() {
            let hint = Paragraph::new("Type to search students and staff.")
                .style(Style::default().fg(Color::Gray))
                .block(results_block);
            frame.render_widget(hint, chunks[1]);
        } else if self.search.results.is_empty() {
            let empty = Paragraph::new("No results found")
                .style(Style::default().fg(Color::Yellow))
                .block(results_block);
            frame.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = self
                .search
                .results
                .iter()
                .map(|line| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            line.collection.label(),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(format!(" → {}", line.summary)),
                    ]))
                })
                .collect();
            frame.render_widget(List::new(items).block(results_block), chunks[1]);
        }

        let inner = input_block.inner(chunks[0]);
        let cursor_x = cursor_column(inner, self.search.query.chars().count());
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_result(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .title("Enter Student Roll No");
        frame.render_widget(
            Paragraph::new(self.result.roll.clone()).block(input_block.clone()),
            chunks[0],
        );

        let card_block = Block::default()
            .borders(Borders::ALL)
            .title("Student Result Card");
        let lines = match &self.result.lookup {
            None => vec![Line::from(Span::styled(
                "Press Enter to view the result.",
                Style::default().fg(Color::Gray),
            ))],
            Some(Lookup::NotFound(_)) => vec![Line::from(Span::styled(
                "Student not found!",
                Style::default().fg(Color::Red),
            ))],
            Some(Lookup::Found(card)) => {
                let bold = Style::default().add_modifier(Modifier::BOLD);
                vec![
                    Line::from(Span::styled(
                        "Result Found!",
                        Style::default().fg(Color::Green),
                    )),
                    Line::from(vec![Span::styled("Name: ", bold), Span::raw(card.name.clone())]),
                    Line::from(vec![
                        Span::styled("Roll No: ", bold),
                        Span::raw(card.roll_no.to_string()),
                    ]),
                    Line::from(vec![
                        Span::styled("Department: ", bold),
                        Span::raw(card.department.clone()),
                    ]),
                    Line::from(""),
                    Line::from(Span::styled(RESULT_TITLE, bold)),
                    Line::from(card.marks_line()),
                    Line::from(Span::styled(card.grade_line(), bold.fg(Color::Green))),
                ]
            }
        };
        frame.render_widget(
            Paragraph::new(lines)
                .block(card_block)
                .wrap(Wrap { trim: true }),
            chunks[1],
        );

        let inner = input_block.inner(chunks[0]);
        let cursor_x = cursor_column(inner, self.result.roll.chars().count());
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.mode, self.tab) {
            (Mode::EditingRow { .. }, _) => key_hints(&[
                ("Tab", "Next field"),
                ("←→", "Gender"),
                ("Enter", "Stage row"),
                ("Esc", "Cancel"),
            ]),
            (Mode::ConfirmRowDelete(_), _) => key_hints(&[("y", "Remove"), ("n", "Keep")]),
            (Mode::ConfirmLeave(_), _) => key_hints(&[
                ("←→", "Choose"),
                ("Enter", "Confirm"),
                ("Esc", "Cancel"),
            ]),
            (Mode::Normal, Tab::StudentRegistration | Tab::StaffManagement) => key_hints(&[
                ("F1-F5", "Tabs"),
                ("Tab", "Next field"),
                ("←→", "Gender"),
                ("Enter", "Register"),
                ("Ctrl+R", "Clear"),
                ("Ctrl+C", "Quit"),
            ]),
            (Mode::Normal, Tab::ViewRecords) => key_hints(&[
                ("F1-F5", "Tabs"),
                ("Tab", "Students/Staff"),
                ("e", "Edit"),
                ("+", "Add"),
                ("-", "Remove"),
                ("s", "Save"),
                ("u", "Undo edits"),
                ("q", "Quit"),
            ]),
            (Mode::Normal, Tab::Search) => key_hints(&[
                ("F1-F5", "Tabs"),
                ("Esc", "Clear"),
                ("Ctrl+C", "Quit"),
            ]),
            (Mode::Normal, Tab::ResultCard) => key_hints(&[
                ("F1-F5", "Tabs"),
                ("Enter", "View Result"),
                ("Esc", "Clear"),
                ("Ctrl+C", "Quit"),
            ]),
        }
    }

    fn draw_row_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &RecordForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("{title} ({})", form.collection.label());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form, "Enter to stage • Tab to switch • Esc to cancel"));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        place_form_cursor(frame, inner, form);
    }

    fn draw_confirm_row_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmRowDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Remove Row")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let lines = vec![
            Line::from(format!(
                "Remove {} ({} {}) from the table?",
                confirm.name,
                confirm.collection.key_field(),
                confirm.key
            )),
            Line::from(""),
            Line::from(Span::styled(
                "The change is saved with the rest of the table.",
                Style::default().fg(Color::Gray),
            )),
            Line::from("y to remove • n or Esc to keep"),
        ];

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn draw_confirm_leave(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmLeaveRecords) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Unsaved Edits").borders(Borders::ALL);
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let lines = vec![
            Line::from("The records table has edits that are not saved yet."),
            Line::from(""),
            button_row(&confirm.labels(), confirm.selected_index()),
        ];

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Apply a text-editing key to `form`. Returns `false` for keys the form does
/// not consume (Enter, Esc, ...), which the caller handles.
fn edit_form(form: &mut RecordForm, code: KeyCode) -> bool {
    match code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Left if form.active == FormField::Gender => form.cycle_gender(false),
        KeyCode::Right if form.active == FormField::Gender => form.cycle_gender(true),
        KeyCode::Backspace => {
            form.backspace();
            form.error = None;
        }
        KeyCode::Char(ch) => {
            if form.push_char(ch) {
                form.error = None;
            }
        }
        _ => return false,
    }
    true
}

/// Form field a repository validation failure points at, if any.
fn offending_field(err: &anyhow::Error, collection: Collection) -> Option<FormField> {
    let validation = err.downcast_ref::<RepoError>()?.validation()?;
    let label = match validation {
        ValidationError::MissingField(label) => *label,
        ValidationError::DuplicateKey { .. } => return Some(FormField::Key),
        ValidationError::UnselectedChoice(_) => return Some(FormField::Gender),
    };
    FormField::ALL
        .into_iter()
        .find(|field| field.label(collection) == label)
}

/// Error line when the form has one, otherwise the gray `hint`.
fn form_hint(form: &RecordForm, hint: &'static str) -> Line<'static> {
    match &form.error {
        Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}

/// Put the terminal cursor at the end of the active text field. The gender
/// selector has no cursor.
fn place_form_cursor(frame: &mut Frame, inner: Rect, form: &RecordForm) {
    if form.active == FormField::Gender {
        return;
    }
    let row = FormField::ALL
        .iter()
        .position(|field| *field == form.active)
        .unwrap_or(0);
    let prefix = form.active.label(form.collection).chars().count() + 2;
    let cursor_x = cursor_column(inner, prefix + form.value_len(form.active));
    let cursor_y = inner
        .y
        .saturating_add(u16::try_from(row).unwrap_or(u16::MAX))
        .min(inner.bottom().saturating_sub(1));
    frame.set_cursor_position((cursor_x, cursor_y));
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::TempDir;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn app() -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("school_data.json"));
        let repository = Repository::open(store).unwrap();
        (dir, App::with_today(repository, today()))
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    /// Fill the active registration form and press Enter.
    fn register(app: &mut App, name: &str, key: &str) {
        type_text(app, name);
        press(app, KeyCode::Tab);
        type_text(app, key);
        press(app, KeyCode::Tab);
        type_text(app, "CS");
        press(app, KeyCode::Tab);
        type_text(app, "0300");
        press(app, KeyCode::Tab);
        type_text(app, "m");
        press(app, KeyCode::Enter);
    }

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn registering_a_student_saves_and_clears_the_form() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");

        assert_eq!(app.status(), Some("Student Registered Successfully!"));
        assert_eq!(app.repository().students().len(), 1);
        assert_eq!(app.repository().students()[0].submission_date, today());
        assert!(app.student_form.name.is_empty());
    }

    #[test]
    fn duplicate_roll_keeps_input_and_focuses_key() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");
        register(&mut app, "Ann", "5");

        assert_eq!(app.status(), Some("Roll No 5 already exists!"));
        assert_eq!(app.student_form.name, "Ann");
        assert_eq!(app.student_form.active, FormField::Key);
        assert_eq!(app.repository().students().len(), 1);
    }

    #[test]
    fn staff_tab_registers_staff() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::F(2));
        register(&mut app, "Ms. Khan", "12");

        assert_eq!(app.tab(), Tab::StaffManagement);
        assert_eq!(app.status(), Some("Staff Registered Successfully!"));
        assert_eq!(app.repository().staff()[0].staff_id, 12);
    }

    #[test]
    fn leaving_records_with_staged_removal_can_save() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");

        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.has_pending_changes());
        assert_eq!(app.repository().students().len(), 1);

        press(&mut app, KeyCode::F(5));
        assert!(matches!(app.mode, Mode::ConfirmLeave(_)));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.tab(), Tab::ResultCard);
        assert!(app.repository().students().is_empty());
        type_text(&mut app, "5");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status(), Some("Student not found!"));
    }

    #[test]
    fn discard_restores_the_saved_rows() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");

        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('y'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Right);
        assert!(press(&mut app, KeyCode::Enter));

        assert!(!app.has_pending_changes());
        assert_eq!(app.repository().students().len(), 1);
    }

    #[test]
    fn editing_a_row_stages_until_saved() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");

        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "by");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.repository().students()[0].name, "Bob");

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.status(), Some("Updated!"));
        assert_eq!(app.repository().students()[0].name, "Bobby");
    }

    #[test]
    fn staged_duplicate_keys_are_rejected_on_save() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");
        register(&mut app, "Ann", "6");

        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "6");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('s'));

        assert_eq!(app.status(), Some("row 2: Roll No 6 already exists!"));
        assert_eq!(app.repository().students()[0].roll_no, 5);
        assert!(app.has_pending_changes());
    }

    #[test]
    fn search_and_result_card_find_registered_student() {
        let (_dir, mut app) = app();
        register(&mut app, "Bob", "5");

        press(&mut app, KeyCode::F(4));
        type_text(&mut app, "BOB");
        assert_eq!(app.search.results.len(), 1);
        assert!(rendered(&app).contains("Student → Name: Bob"));

        press(&mut app, KeyCode::F(5));
        type_text(&mut app, "5");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status(), Some("Result Found!"));
        assert!(rendered(&app).contains("Grade: A+ (88.8%)"));
    }

    #[test]
    fn adding_a_row_after_the_largest_roll_leaves_key_blank() {
        let (_dir, mut app) = app();
        register(&mut app, "Max", &i64::MAX.to_string());
        assert_eq!(app.repository().students()[0].roll_no, i64::MAX);

        press(&mut app, KeyCode::F(3));
        press(&mut app, KeyCode::Char('+'));
        match &app.mode {
            Mode::EditingRow { index: None, form } => assert!(form.key.is_empty()),
            _ => panic!("expected the add-row form"),
        }
    }

    #[test]
    fn oversized_roll_number_is_reported_out_of_range() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status(), Some("Enter a roll number."));

        type_text(&mut app, "99999999999999999999");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status(), Some("Roll No is out of range."));
    }

    #[test]
    fn long_input_keeps_cursor_on_screen() {
        let (_dir, mut app) = app();
        type_text(&mut app, &"x".repeat(400));
        rendered(&app);

        press(&mut app, KeyCode::F(4));
        type_text(&mut app, &"y".repeat(400));
        assert!(rendered(&app).contains("No results found"));
    }

    #[test]
    fn ctrl_keys_clear_and_quit() {
        let (_dir, mut app) = app();
        type_text(&mut app, "Bob");
        assert!(!app.handle_ctrl('r').unwrap());
        assert!(app.student_form.name.is_empty());
        assert!(app.handle_ctrl('c').unwrap());
    }

    #[test]
    fn empty_records_tab_renders_placeholder() {
        let (_dir, mut app) = app();
        press(&mut app, KeyCode::F(3));
        let screen = rendered(&app);
        assert!(screen.contains("School Management System"));
        assert!(screen.contains("No records yet."));
    }
}
