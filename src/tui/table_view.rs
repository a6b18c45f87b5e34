#![forbid(unsafe_code)]

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::task::TaskOperations;
use crate::task::model::{Task, display_timestamp};
use crate::tui::centered_rect;
use crate::tui::modal::{ModalAction, Submission, TaskModal};

/// Which popup, if any, sits on top of the table.
#[derive(Debug, Clone)]
pub enum ModalState {
    Closed,
    OpenCreate(TaskModal),
    OpenUpdate(TaskModal),
    ConfirmDelete(Task),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Continue,
    Refresh,
    Quit,
}

/// Table of tasks plus the edit modal. Writes go out through [`TaskOperations`].
#[derive(Debug)]
pub struct TaskView {
    table_state: TableState,
    modal: ModalState,
    confirm_delete: bool,
    show_details: bool,
}

impl TaskView {
    #[must_use]
    pub fn new(confirm_delete: bool, show_details: bool) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            table_state,
            modal: ModalState::Closed,
            confirm_delete,
            show_details,
        }
    }

    #[must_use]
    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    #[must_use]
    pub fn is_modal_open(&self) -> bool {
        !matches!(self.modal, ModalState::Closed)
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    #[must_use]
    pub fn selected<'a>(&self, tasks: &'a [Task]) -> Option<&'a Task> {
        tasks.get(self.selected_index())
    }

    /// Keeps the selection inside a list that may have shrunk after a refresh.
    pub fn clamp_selection(&mut self, len: usize) {
        let idx = self.selected_index().min(len.saturating_sub(1));
        self.table_state.select(Some(idx));
    }

    fn move_selection(&mut self, len: usize, delta: i64) {
        if len == 0 {
            return;
        }
        let cur = i64::try_from(self.selected_index()).unwrap_or(0);
        let max = i64::try_from(len - 1).unwrap_or(0);
        let next = usize::try_from((cur + delta).clamp(0, max)).unwrap_or(0);
        self.table_state.select(Some(next));
    }

    pub fn open_create(&mut self) {
        self.modal = ModalState::OpenCreate(TaskModal::create());
    }

    /// Opens the update form. Tasks the server has not assigned an id are ignored.
    pub fn open_update(&mut self, task: &Task) {
        if task.id.is_none() {
            return;
        }
        self.modal = ModalState::OpenUpdate(TaskModal::update(task.clone()));
    }

    fn request_delete(&mut self, task: &Task, ops: &dyn TaskOperations) {
        if self.confirm_delete {
            self.modal = ModalState::ConfirmDelete(task.clone());
        } else {
            ops.delete(task.id);
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        tasks: &[Task],
        ops: &dyn TaskOperations,
    ) -> ViewAction {
        match &mut self.modal {
            ModalState::OpenCreate(modal) | ModalState::OpenUpdate(modal) => {
                match modal.handle_key(key) {
                    ModalAction::Continue => {}
                    ModalAction::Cancel => self.modal = ModalState::Closed,
                    ModalAction::Submit(submission) => {
                        // Closes before the request resolves; failures only reach the log.
                        self.modal = ModalState::Closed;
                        match submission {
                            Submission::Create(task) => ops.create(task),
                            Submission::Update(task) => ops.update(task),
                        }
                    }
                }
                return ViewAction::Continue;
            }
            ModalState::ConfirmDelete(task) => {
                match key.code {
                    KeyCode::Char('y') => {
                        ops.delete(task.id);
                        self.modal = ModalState::Closed;
                    }
                    KeyCode::Char('n') | KeyCode::Esc => self.modal = ModalState::Closed,
                    _ => {}
                }
                return ViewAction::Continue;
            }
            ModalState::Closed => {}
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Quit,
            KeyCode::Char('r') => return ViewAction::Refresh,
            KeyCode::Char('n') => self.open_create(),
            KeyCode::Char('u') | KeyCode::Enter => {
                if let Some(task) = self.selected(tasks) {
                    self.open_update(task);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.selected(tasks) {
                    self.request_delete(task, ops);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(tasks.len(), -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(tasks.len(), 1),
            KeyCode::PageUp => self.move_selection(tasks.len(), -10),
            KeyCode::PageDown => self.move_selection(tasks.len(), 10),
            KeyCode::Char('g') | KeyCode::Home => self.table_state.select(Some(0)),
            KeyCode::Char('G') | KeyCode::End => {
                self.table_state.select(Some(tasks.len().saturating_sub(1)));
            }
            _ => {}
        }
        ViewAction::Continue
    }

    pub fn draw(&mut self, f: &mut Frame<'_>, area: Rect, tasks: &[Task]) {
        let constraints = if self.show_details {
            vec![Constraint::Min(3), Constraint::Length(1)]
        } else {
            vec![Constraint::Min(3)]
        };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        self.draw_table(f, layout[0], tasks);
        if self.show_details {
            self.draw_detail_line(f, layout[1], tasks);
        }

        match &self.modal {
            ModalState::Closed => {}
            ModalState::OpenCreate(modal) | ModalState::OpenUpdate(modal) => modal.draw(f),
            ModalState::ConfirmDelete(task) => draw_confirm_delete(f, task),
        }
    }

    fn draw_table(&mut self, f: &mut Frame<'_>, area: Rect, tasks: &[Task]) {
        let headers = Row::new(vec!["ID", "Title", "Description", "Completed"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = tasks.iter().map(|t| {
            let completed_style = if t.completed {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(t.id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::from(t.title.clone()),
                Cell::from(t.description.clone()),
                Cell::from(t.completed_label()).style(completed_style),
            ])
        });

        let table = Table::new(
            rows,
            vec![
                Constraint::Length(6),
                Constraint::Percentage(30),
                Constraint::Min(10),
                Constraint::Length(10),
            ],
        )
        .header(headers)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Tasks ({})", tasks.len())),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_detail_line(&self, f: &mut Frame<'_>, area: Rect, tasks: &[Task]) {
        let dim = Style::default().fg(Color::DarkGray);
        let line = match self.selected(tasks) {
            Some(t) => Line::from(vec![
                Span::styled("Created: ", dim),
                Span::raw(display_timestamp(t.created_at.as_deref())),
                Span::styled("  •  Updated: ", dim),
                Span::raw(display_timestamp(t.updated_at.as_deref())),
            ]),
            None => Line::from(Span::styled("No tasks.", dim)),
        };
        f.render_widget(Paragraph::new(line), area);
    }
}

fn draw_confirm_delete(f: &mut Frame<'_>, task: &Task) {
    let area = centered_rect(60, 25, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Delete task");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(format!("Delete \"{}\"?", task.title)),
        Line::from(""),
        Line::from("[y] Delete    [n] Cancel"),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crossterm::event::KeyModifiers;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    /// Records write intents instead of sending them anywhere.
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl TaskOperations for Recorder {
        fn create(&self, task: Task) {
            self.calls
                .borrow_mut()
                .push(format!("create {} / {} / {}", task.title, task.description, task.completed));
        }

        fn update(&self, task: Task) {
            self.calls
                .borrow_mut()
                .push(format!("update {:?} completed={}", task.id, task.completed));
        }

        fn delete(&self, id: Option<u64>) {
            self.calls.borrow_mut().push(format!("delete {id:?}"));
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample() -> Vec<Task> {
        vec![
            Task {
                id: Some(1),
                ..Task::new("A", "d")
            },
            Task {
                id: Some(2),
                completed: true,
                ..Task::new("B", "e")
            },
        ]
    }

    fn render(view: &mut TaskView, tasks: &[Task]) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                view.draw(f, area, tasks);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_rows_with_completed_column() {
        let mut view = TaskView::new(false, true);
        let tasks = vec![Task {
            id: Some(1),
            ..Task::new("A", "d")
        }];
        let screen = render(&mut view, &tasks);
        assert!(screen.contains("Completed"));
        assert!(screen.contains("False"));
        assert!(screen.contains("Tasks (1)"));
    }

    #[test]
    fn renders_empty_list() {
        let mut view = TaskView::new(false, true);
        let screen = render(&mut view, &[]);
        assert!(screen.contains("Tasks (0)"));
        assert!(screen.contains("No tasks."));
        assert!(!screen.contains("False"));
    }

    #[test]
    fn delete_is_immediate_by_default() {
        let ops = Recorder::default();
        let tasks = sample();
        let mut view = TaskView::new(false, true);
        view.handle_key(key(KeyCode::Down), &tasks, &ops);
        view.handle_key(key(KeyCode::Char('d')), &tasks, &ops);
        assert_eq!(*ops.calls.borrow(), vec!["delete Some(2)"]);
        assert!(!view.is_modal_open());
    }

    #[test]
    fn delete_can_require_confirmation() {
        let ops = Recorder::default();
        let tasks = sample();
        let mut view = TaskView::new(true, true);
        view.handle_key(key(KeyCode::Char('d')), &tasks, &ops);
        assert!(matches!(view.modal(), ModalState::ConfirmDelete(_)));
        assert!(ops.calls.borrow().is_empty());

        view.handle_key(key(KeyCode::Char('n')), &tasks, &ops);
        assert!(!view.is_modal_open());
        assert!(ops.calls.borrow().is_empty());

        view.handle_key(key(KeyCode::Char('d')), &tasks, &ops);
        view.handle_key(key(KeyCode::Char('y')), &tasks, &ops);
        assert_eq!(*ops.calls.borrow(), vec!["delete Some(1)"]);
    }

    #[test]
    fn new_task_flow_creates_and_closes() {
        let ops = Recorder::default();
        let tasks = sample();
        let mut view = TaskView::new(false, true);
        view.handle_key(key(KeyCode::Char('n')), &tasks, &ops);
        assert!(matches!(view.modal(), ModalState::OpenCreate(_)));

        for c in "Buy milk".chars() {
            view.handle_key(key(KeyCode::Char(c)), &tasks, &ops);
        }
        view.handle_key(key(KeyCode::Tab), &tasks, &ops);
        for c in "2%".chars() {
            view.handle_key(key(KeyCode::Char(c)), &tasks, &ops);
        }
        view.handle_key(key(KeyCode::Enter), &tasks, &ops);

        assert!(!view.is_modal_open());
        assert_eq!(*ops.calls.borrow(), vec!["create Buy milk / 2% / false"]);
    }

    #[test]
    fn invalid_submit_keeps_modal_open() {
        let ops = Recorder::default();
        let mut view = TaskView::new(false, true);
        view.handle_key(key(KeyCode::Char('n')), &[], &ops);
        view.handle_key(key(KeyCode::Tab), &[], &ops);
        view.handle_key(key(KeyCode::Char('x')), &[], &ops);
        view.handle_key(key(KeyCode::Enter), &[], &ops);
        assert!(matches!(view.modal(), ModalState::OpenCreate(_)));
        assert!(ops.calls.borrow().is_empty());
    }

    #[test]
    fn update_flow_and_cancel() {
        let ops = Recorder::default();
        let tasks = sample();
        let mut view = TaskView::new(false, true);

        view.handle_key(key(KeyCode::Char('u')), &tasks, &ops);
        assert!(matches!(view.modal(), ModalState::OpenUpdate(_)));
        view.handle_key(key(KeyCode::Esc), &tasks, &ops);
        assert!(!view.is_modal_open());
        assert!(ops.calls.borrow().is_empty());

        view.handle_key(key(KeyCode::Enter), &tasks, &ops);
        view.handle_key(key(KeyCode::Tab), &tasks, &ops);
        view.handle_key(key(KeyCode::Tab), &tasks, &ops);
        view.handle_key(key(KeyCode::Char(' ')), &tasks, &ops);
        view.handle_key(key(KeyCode::Enter), &tasks, &ops);
        assert_eq!(*ops.calls.borrow(), vec!["update Some(1) completed=true"]);
    }

    #[test]
    fn unsaved_task_cannot_be_opened_for_update() {
        let mut view = TaskView::new(false, true);
        view.open_update(&Task::new("draft", "d"));
        assert!(!view.is_modal_open());
    }

    #[test]
    fn selection_is_clamped_after_shrinking() {
        let ops = Recorder::default();
        let tasks = sample();
        let mut view = TaskView::new(false, true);
        view.handle_key(key(KeyCode::Char('G')), &tasks, &ops);
        assert_eq!(view.selected(&tasks).and_then(|t| t.id), Some(2));
        view.clamp_selection(1);
        assert_eq!(view.selected(&tasks[..1]).and_then(|t| t.id), Some(1));
    }

    #[test]
    fn quit_and_refresh_only_when_closed() {
        let ops = Recorder::default();
        let mut view = TaskView::new(false, true);
        assert_eq!(view.handle_key(key(KeyCode::Char('r')), &[], &ops), ViewAction::Refresh);
        assert_eq!(view.handle_key(key(KeyCode::Char('q')), &[], &ops), ViewAction::Quit);
        view.handle_key(key(KeyCode::Char('n')), &[], &ops);
        assert_eq!(view.handle_key(key(KeyCode::Char('q')), &[], &ops), ViewAction::Continue);
    }
}
