#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tokio::sync::watch;

use crate::api::TaskApi;
use crate::api::http::HttpTaskApi;
use crate::config::Config;
use crate::task::controller::TaskController;
use crate::task::model::Task;
use crate::tui;
use crate::tui::table_view::{ModalState, TaskView, ViewAction};

struct AppState {
    view: TaskView,
    tasks_rx: watch::Receiver<Vec<Task>>,
    should_quit: bool,
}

pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let api: Arc<dyn TaskApi> = Arc::new(HttpTaskApi::new(cfg.api.base_url.clone()));
    let mut controller = TaskController::new(api);

    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    tracing::info!(url = %cfg.api.base_url, "session started");
    controller.mount();

    let mut app = AppState {
        view: TaskView::new(cfg.ui.confirm_delete, cfg.ui.show_details),
        tasks_rx: controller.subscribe(),
        should_quit: false,
    };
    let tick = Duration::from_millis(cfg.ui.tick_ms);

    loop {
        let tasks = app.tasks_rx.borrow_and_update().clone();
        app.view.clamp_selection(tasks.len());

        {
            let Some(terminal) = guard.terminal.as_mut() else {
                anyhow::bail!("terminal unavailable");
            };
            terminal.draw(|f| draw(f, &cfg, &mut app.view, &tasks))?;
        }

        if app.should_quit {
            break;
        }

        if event::poll(tick)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(key, &mut app, &controller, &tasks);
        }
    }

    controller.unmount();
    tracing::info!("session ended");
    Ok(())
}

fn handle_key(key: KeyEvent, app: &mut AppState, controller: &TaskController, tasks: &[Task]) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.view.handle_key(key, tasks, controller) {
        ViewAction::Continue => {}
        ViewAction::Refresh => controller.read(None),
        ViewAction::Quit => app.should_quit = true,
    }
}

fn draw(f: &mut Frame<'_>, cfg: &Config, view: &mut TaskView, tasks: &[Task]) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, root[0], cfg);
    view.draw(f, root[1], tasks);
    draw_footer(f, root[2], view);
}

fn draw_header(f: &mut Frame<'_>, area: Rect, cfg: &Config) {
    let line = Line::from(vec![
        Span::styled("Tasks", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {}", cfg.api.base_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, view: &TaskView) {
    let hint = match view.modal() {
        ModalState::Closed => {
            "n new • u/Enter update • d delete • r refresh • j/k move • q quit"
        }
        ModalState::OpenCreate(_) | ModalState::OpenUpdate(_) => {
            "Enter next/submit • Tab switch field • Esc cancel"
        }
        ModalState::ConfirmDelete(_) => "y delete • n/Esc cancel",
    };
    f.render_widget(
        Paragraph::new(hint).style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
        area,
    );
}

struct TerminalGuard {
    terminal: Option<tui::CrosstermTerminal>,
}

impl TerminalGuard {
    fn new(terminal: tui::CrosstermTerminal) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}
