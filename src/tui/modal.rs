#![forbid(unsafe_code)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use thiserror::Error;

use crate::task::model::Task;
use crate::tui::centered_rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn insert_char(&mut self, c: char) {
        let byte = self.byte_offset(self.cursor);
        self.text.insert(byte, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte = self.byte_offset(self.cursor);
        self.text.remove(byte);
    }

    fn delete(&mut self) {
        if self.cursor >= self.text.chars().count() {
            return;
        }
        let byte = self.byte_offset(self.cursor);
        self.text.remove(byte);
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.insert_char(c);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("title is required")]
    MissingTitle,
    #[error("description is required")]
    MissingDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalField {
    Title,
    Description,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(Task),
    Update(Task),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    Continue,
    Cancel,
    Submit(Submission),
}

/// Create/update form for a single task.
///
/// With a backing task the form is in update mode: fields start from the task and
/// the completed checkbox is shown. Without one it is in create mode and
/// `completed` is always false. The form keeps nothing across open/close cycles.
#[derive(Debug, Clone)]
pub struct TaskModal {
    backing: Option<Task>,
    title: TextInput,
    description: TextInput,
    completed: bool,
    field: ModalField,
    error: Option<FormError>,
}

impl TaskModal {
    #[must_use]
    pub fn create() -> Self {
        Self::open(None)
    }

    #[must_use]
    pub fn update(task: Task) -> Self {
        Self::open(Some(task))
    }

    fn open(backing: Option<Task>) -> Self {
        let (title, description, completed) = backing.as_ref().map_or_else(
            || (String::new(), String::new(), false),
            |t| (t.title.clone(), t.description.clone(), t.completed),
        );
        Self {
            backing,
            title: TextInput::new(title),
            description: TextInput::new(description),
            completed,
            field: ModalField::Title,
            error: None,
        }
    }

    #[must_use]
    pub fn is_update(&self) -> bool {
        self.backing.is_some()
    }

    #[must_use]
    pub fn field(&self) -> ModalField {
        self.field
    }

    #[must_use]
    pub fn error(&self) -> Option<FormError> {
        self.error
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    fn fields(&self) -> &'static [ModalField] {
        if self.is_update() {
            &[ModalField::Title, ModalField::Description, ModalField::Completed]
        } else {
            &[ModalField::Title, ModalField::Description]
        }
    }

    fn step_field(&mut self, forward: bool) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        let next = if forward {
            (idx + 1) % fields.len()
        } else {
            (idx + fields.len() - 1) % fields.len()
        };
        self.field = fields[next];
    }

    fn on_last_field(&self) -> bool {
        self.fields().last() == Some(&self.field)
    }

    /// Builds the normalized task, or the first required field that is empty.
    pub fn validate(&self) -> Result<Task, FormError> {
        if self.title.as_str().trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        if self.description.as_str().trim().is_empty() {
            return Err(FormError::MissingDescription);
        }
        Ok(Task {
            id: self.backing.as_ref().and_then(|t| t.id),
            title: self.title.as_str().to_owned(),
            description: self.description.as_str().to_owned(),
            completed: self.is_update() && self.completed,
            created_at: None,
            updated_at: None,
        })
    }

    fn submit(&mut self) -> ModalAction {
        match self.validate() {
            Ok(task) => {
                self.error = None;
                ModalAction::Submit(if self.is_update() {
                    Submission::Update(task)
                } else {
                    Submission::Create(task)
                })
            }
            Err(e) => {
                self.error = Some(e);
                self.field = match e {
                    FormError::MissingTitle => ModalField::Title,
                    FormError::MissingDescription => ModalField::Description,
                };
                ModalAction::Continue
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return self.submit();
        }
        match key.code {
            KeyCode::Esc => ModalAction::Cancel,
            KeyCode::Tab | KeyCode::Down => {
                self.step_field(true);
                ModalAction::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.step_field(false);
                ModalAction::Continue
            }
            KeyCode::Enter if self.on_last_field() => self.submit(),
            KeyCode::Enter => {
                self.step_field(true);
                ModalAction::Continue
            }
            _ => {
                self.error = None;
                match self.field {
                    ModalField::Title => self.title.handle_key(key),
                    ModalField::Description => self.description.handle_key(key),
                    ModalField::Completed => {
                        if matches!(key.code, KeyCode::Char(' ' | 'x')) {
                            self.completed = !self.completed;
                        }
                    }
                }
                ModalAction::Continue
            }
        }
    }

    pub fn draw(&self, f: &mut Frame<'_>) {
        let area = centered_rect(70, 40, f.area());
        f.render_widget(Clear, area);
        let title = if self.is_update() {
            "Update Task"
        } else {
            "Create Task"
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let label = Style::default().add_modifier(Modifier::BOLD);
        let style_for = |field: ModalField| {
            if self.field == field {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            }
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Title:       ", label),
                Span::styled(self.title.as_str(), style_for(ModalField::Title)),
            ]),
            Line::from(vec![
                Span::styled("Description: ", label),
                Span::styled(self.description.as_str(), style_for(ModalField::Description)),
            ]),
        ];
        if self.is_update() {
            lines.push(Line::from(vec![
                Span::styled("Completed:   ", label),
                Span::styled(
                    if self.completed { "[x]" } else { "[ ]" },
                    style_for(ModalField::Completed),
                ),
            ]));
        }

        if let Some(err) = self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(
                    "Error: ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(err.to_string(), Style::default().fg(Color::Red)),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter next/submit • Tab switch field • Space toggle • Ctrl-S submit • Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
