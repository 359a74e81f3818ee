use crate::commands::format_due;
use crate::edit::EditSession;
use crate::model::{Task, TaskId};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::view::{filter_counts, filtered_view, is_overdue, remaining_count, Filter};
use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::cell::Cell;
use std::io::{stdout, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub fn run<S: KeyValueStore>(store: TaskStore<S>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(store);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S: KeyValueStore> {
    store: TaskStore<S>,
    filter: Filter,
    focus: Pane,
    selected_task: usize,
    selected_archived: usize,
    edit: EditSession,
    last_change: Rc<Cell<Instant>>,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Creating(TaskForm),
    Editing(FieldValue),
    ConfirmDelete { id: TaskId, archived: bool },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Pane {
    Tasks,
    Archive,
}

struct TaskForm {
    text: FieldValue,
    date: FieldValue,
    time: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Text,
    Date,
    Time,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_boundary(self.cursor, &self.value);
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.value.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Applies a line-editing key. Returns false for keys it does not use.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c)
            }
            _ => return false,
        }
        true
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl TaskForm {
    fn new() -> Self {
        TaskForm {
            text: FieldValue::new(""),
            date: FieldValue::new(""),
            time: FieldValue::new(""),
            field: FormField::Text,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Date,
            FormField::Date => FormField::Time,
            FormField::Time => FormField::Text,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Text => FormField::Time,
            FormField::Date => FormField::Text,
            FormField::Time => FormField::Date,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Text => &mut self.text,
            FormField::Date => &mut self.date,
            FormField::Time => &mut self.time,
        }
    }
}

impl<S: KeyValueStore> App<S> {
    fn new(mut store: TaskStore<S>) -> Self {
        let last_change = Rc::new(Cell::new(Instant::now()));
        let stamp = Rc::clone(&last_change);
        store.subscribe(move |_| stamp.set(Instant::now()));
        let snapshot = store.snapshot();
        let status = format!(
            "Loaded {} task(s), {} archived",
            snapshot.active.len(),
            snapshot.archived.len()
        );
        App {
            store,
            filter: Filter::All,
            focus: Pane::Tasks,
            selected_task: 0,
            selected_archived: 0,
            edit: EditSession::new(),
            last_change,
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let quit = match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) => {
                self.handle_form_key(key);
                false
            }
            Mode::Editing(_) => {
                self.handle_edit_key(key);
                false
            }
            Mode::ConfirmDelete { .. } => {
                self.handle_confirm_key(key);
                false
            }
        };
        self.ensure_bounds();
        quit
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => self.set_filter(Filter::All),
            KeyCode::Char('2') => self.set_filter(Filter::Active),
            KeyCode::Char('3') => self.set_filter(Filter::Completed),
            KeyCode::Char('f') => self.set_filter(self.filter.next()),
            KeyCode::Tab | KeyCode::Char('a') => {
                self.focus = match self.focus {
                    Pane::Tasks => Pane::Archive,
                    Pane::Archive => Pane::Tasks,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Pane::Tasks => self.selected_task = self.selected_task.saturating_sub(1),
                Pane::Archive => {
                    self.selected_archived = self.selected_archived.saturating_sub(1)
                }
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Pane::Tasks => self.selected_task += 1,
                Pane::Archive => self.selected_archived += 1,
            },
            KeyCode::Char('n') => {
                self.mode = Mode::Creating(TaskForm::new());
                self.status = "New task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
            KeyCode::Char(' ') | KeyCode::Char('x') if self.focus == Pane::Tasks => {
                if let Some(id) = self.current_task_id() {
                    match self.store.toggle(id) {
                        Ok(_) => self.status = format!("Toggled {}", id),
                        Err(err) => self.status = format!("Toggle failed: {}", err),
                    }
                }
            }
            KeyCode::Char('e') if self.focus == Pane::Tasks => self.begin_edit(),
            KeyCode::Char('c') => match self.store.clear_completed() {
                Ok(0) => self.status = "No completed tasks to archive".into(),
                Ok(moved) => self.status = format!("Archived {} task(s)", moved),
                Err(err) => self.status = format!("Archive failed: {}", err),
            },
            KeyCode::Char('r') if self.focus == Pane::Archive => {
                if let Some(id) = self.current_archived_id() {
                    match self.store.restore_archived(id) {
                        Ok(_) => self.status = format!("Restored {}", id),
                        Err(err) => self.status = format!("Restore failed: {}", err),
                    }
                }
            }
            KeyCode::Char('d') => {
                let target = match self.focus {
                    Pane::Tasks => self.current_task_id().map(|id| (id, false)),
                    Pane::Archive => self.current_archived_id().map(|id| (id, true)),
                };
                match target {
                    Some((id, archived)) => {
                        self.mode = Mode::ConfirmDelete { id, archived };
                        self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", id);
                    }
                    None => self.status = "Nothing selected to delete".into(),
                }
            }
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close_form = false;
        if let Mode::Creating(form) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close_form = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Enter => close_form = self.create_task_from_form(form),
                _ => {
                    form.active_field_mut().handle_key(key);
                }
            }
        }
        self.mode = if close_form { Mode::Normal } else { mode };
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::Editing(field) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    self.edit.cancel();
                    self.status = "Edit canceled".into();
                    close = true;
                }
                KeyCode::Enter => match self.edit.commit(&mut self.store) {
                    Ok(Some(id)) => {
                        self.status = format!("Updated {}", id);
                        close = true;
                    }
                    Ok(None) => {
                        self.status = "Task no longer exists".into();
                        close = true;
                    }
                    Err(err) => self.status = format!("Could not save: {}", err),
                },
                _ => {
                    if field.handle_key(key) {
                        self.edit.set_draft(field.value.clone());
                    }
                }
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let (id, archived) = match &self.mode {
            Mode::ConfirmDelete { id, archived } => (*id, *archived),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let result = if archived {
                    self.store.delete_archived(id)
                } else {
                    self.store.delete(id)
                };
                self.status = match result {
                    Ok(_) => format!("Deleted {}", id),
                    Err(err) => format!("Delete failed: {}", err),
                };
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn set_filter(&mut self, filter: Filter) {
        if self.filter != filter {
            self.filter = filter;
            self.selected_task = 0;
            self.status = format!("Showing {} tasks", filter);
        }
    }

    fn begin_edit(&mut self) {
        let Some((id, text)) = self.current_task().map(|t| (t.id, t.text.clone())) else {
            self.status = "No task selected to edit".into();
            return;
        };
        self.edit.begin(id, &text);
        self.mode = Mode::Editing(FieldValue::new(&text));
        self.status = format!("Editing {} (Enter save, Esc cancel)", id);
    }

    fn create_task_from_form(&mut self, form: &TaskForm) -> bool {
        let date = Some(form.date.value.as_str()).filter(|d| !d.trim().is_empty());
        let time = Some(form.time.value.as_str()).filter(|t| !t.trim().is_empty());
        match self.store.add(&form.text.value, date, time) {
            Ok(id) => {
                let dropped =
                    date.is_some() && self.store.find(id).is_some_and(|t| t.due_at.is_none());
                self.status = if dropped {
                    format!("Created {} (due date not understood, ignored)", id)
                } else {
                    format!("Created {}", id)
                };
                if self.filter != Filter::Completed {
                    self.selected_task = self.visible_tasks().len().saturating_sub(1);
                }
                true
            }
            Err(err) => {
                self.status = format!("Could not create: {}", err);
                false
            }
        }
    }

    fn visible_tasks(&self) -> Vec<&Task> {
        filtered_view(self.store.active(), self.filter)
    }

    fn current_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_task).copied()
    }

    fn current_task_id(&self) -> Option<TaskId> {
        self.current_task().map(|t| t.id)
    }

    fn current_archived_id(&self) -> Option<TaskId> {
        self.store.archived().get(self.selected_archived).map(|t| t.id)
    }

    fn ensure_bounds(&mut self) {
        let visible = self.visible_tasks().len();
        self.selected_task = self.selected_task.min(visible.saturating_sub(1));
        let archived = self.store.archived().len();
        self.selected_archived = self.selected_archived.min(archived.saturating_sub(1));
    }

    fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(layout[1]);
        self.draw_tasks(f, body[0]);
        self.draw_archive(f, body[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, form),
            Mode::ConfirmDelete { id, archived } => self.draw_confirm(f, *id, *archived),
            Mode::Normal | Mode::Editing(_) => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let counts = filter_counts(self.store.active());
        let mut spans = Vec::new();
        for (idx, filter) in Filter::ALL.iter().enumerate() {
            let label = format!(" {} {} ({}) ", idx + 1, filter.label(), counts.get(*filter));
            let style = if *filter == self.filter {
                Style::default()
                    .bg(Color::LightMagenta)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("  saved {}", format_elapsed(self.last_change.get())),
            Style::default().fg(Color::DarkGray),
        ));
        let header = Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(Span::styled(
                        "todos",
                        Style::default()
                            .fg(Color::LightMagenta)
                            .add_modifier(Modifier::BOLD),
                    )),
            );
        f.render_widget(header, area);
    }

    fn draw_tasks(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Tasks;
        let block = pane_block(
            format!("Tasks · {} remaining", remaining_count(self.store.active())),
            focused,
        );

        if self.store.active().is_empty() {
            let empty = Paragraph::new("No tasks yet. Press n to add one!")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let now = Utc::now();
        let editing = match &self.mode {
            Mode::Editing(field) => self.edit.target().map(|id| (id, field)),
            _ => None,
        };
        let items: Vec<ListItem> = self
            .visible_tasks()
            .into_iter()
            .map(|task| match editing {
                Some((id, field)) if id == task.id => edit_item(field),
                _ => task_item(task, is_overdue(task, now)),
            })
            .collect();
        let mut state = ListState::default();
        if focused && !items.is_empty() {
            state.select(Some(self.selected_task));
        }
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_archive(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Archive;
        let archived = self.store.snapshot().archived;
        let block = pane_block(format!("Archived ({})", archived.len()), focused);
        let items: Vec<ListItem> = archived
            .iter()
            .map(|task| {
                ListItem::new(Line::from(vec![
                    Span::styled("✓ ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        task.text.clone(),
                        Style::default()
                            .fg(Color::Gray)
                            .add_modifier(Modifier::CROSSED_OUT),
                    ),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        if focused && !items.is_empty() {
            state.select(Some(self.selected_archived));
        }
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightYellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let mut spans = vec![
            key("1 2 3 / f", Color::LightCyan),
            Span::raw(" filter  "),
            key("↑↓ / j k", Color::LightCyan),
            Span::raw(" move  "),
            key("Tab", Color::LightCyan),
            Span::raw(" pane  "),
        ];
        match self.focus {
            Pane::Tasks => spans.extend([
                key("n", Color::LightMagenta),
                Span::raw(" new  "),
                key("space", Color::LightGreen),
                Span::raw(" done  "),
                key("e", Color::LightYellow),
                Span::raw(" edit  "),
                key("c", Color::LightGreen),
                Span::raw(" archive done  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
            ]),
            Pane::Archive => spans.extend([
                key("r", Color::LightGreen),
                Span::raw(" restore  "),
                key("d", Color::LightRed),
                Span::raw(" delete  "),
            ]),
        }
        spans.extend([key("q", Color::LightRed), Span::raw(" quit")]);
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, form: &TaskForm) {
        let area = centered_rect(60, 40, f.size());
        let mut fields = Vec::new();
        fields.push(field_line("Task", &form.text, form.field == FormField::Text));
        fields.push(field_line(
            "Due date (YYYY-MM-DD)",
            &form.date,
            form.field == FormField::Date,
        ));
        fields.push(field_line(
            "Due time (HH:MM)",
            &form.time,
            form.field == FormField::Time,
        ));
        fields.push(Line::from(""));
        fields.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        "New Task",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, id: TaskId, archived: bool) {
        let area = centered_rect(50, 30, f.size());
        let task = if archived {
            self.store.find_archived(id)
        } else {
            self.store.find(id)
        };
        let text = task
            .map(|t| t.text.clone())
            .unwrap_or_else(|| id.to_string());
        let prompt = if archived {
            format!("Permanently delete \"{}\"?", text)
        } else {
            format!("Delete \"{}\"?", text)
        };
        let body = vec![
            Line::from(Span::styled(
                prompt,
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled(
                        "Confirm Delete",
                        Style::default()
                            .fg(Color::LightRed)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightRed)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

fn task_item(task: &Task, overdue: bool) -> ListItem<'static> {
    let check = if task.completed { "[x] " } else { "[ ] " };
    let text_style = if task.completed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![
        Span::styled(check, Style::default().fg(Color::LightGreen)),
        Span::styled(task.text.clone(), text_style),
    ];
    if let Some(due) = task.due_at.as_ref() {
        let (label, color) = if overdue {
            (format!("  overdue {}", format_due(due)), Color::LightRed)
        } else {
            (format!("  due {}", format_due(due)), Color::Gray)
        };
        spans.push(Span::styled(label, Style::default().fg(color)));
    }
    ListItem::new(Line::from(spans))
}

fn edit_item(field: &FieldValue) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled("edit ", Style::default().fg(Color::LightYellow)),
        Span::styled(
            field.with_caret(),
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn prev_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
