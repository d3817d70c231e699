mod input;

use crate::error::{Result, TdError};
use crate::i18n::Key;
use crate::parser::INDENT_WIDTH;
use crate::store::{Mode, Store};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use std::io::stdout;
use std::time::Duration;

fn terminal_err(e: std::io::Error) -> TdError {
    TdError::Terminal(e.to_string())
}

fn ui(frame: &mut Frame, store: &Store) {
    match store.mode() {
        Mode::Loading => {
            frame.render_widget(Paragraph::new(store.t(Key::Loading)), frame.area());
            return;
        }
        Mode::Error => {
            let text = store.message().unwrap_or_default().to_string();
            let error = Paragraph::new(text)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" error ")
                        .title_bottom(" q to quit ")
                        .border_style(Style::default().fg(Color::Red)),
                );
            frame.render_widget(error, frame.area());
            return;
        }
        Mode::List | Mode::Add | Mode::Edit => {}
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // tasks
            Constraint::Length(3), // input / status
            Constraint::Length(1), // controls
        ])
        .split(frame.area());

    // Tasks
    let tasks = store.tasks();
    let items: Vec<ListItem> = if tasks.is_empty() {
        vec![ListItem::new(store.t(Key::NoTasks)).style(Style::default().fg(Color::DarkGray))]
    } else {
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let selected = i == store.selected();
                let label = format!(
                    "{}{}{} {}",
                    if selected { "> " } else { "  " },
                    " ".repeat(task.level * INDENT_WIDTH),
                    task.checkbox(),
                    task.label
                );
                let style = if selected {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else if task.completed {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(label).style(style)
            })
            .collect()
    };

    let done = tasks.iter().filter(|t| t.completed).count();
    let title = format!(" {} ({}/{}) ", store.t(Key::AppTitle), done, tasks.len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(format!(" {} ", store.file_path().display()))
            .border_style(Style::default().fg(Color::Cyan)),
    );
    let mut list_state = ListState::default().with_selected(Some(store.selected()));
    frame.render_stateful_widget(list, chunks[0], &mut list_state);

    // Input or status line
    let typed = format!("{}_", store.input());
    let (line, style, mode_label) = match store.mode() {
        Mode::Add => (
            store.translate(Key::AddTaskPrompt, &[("inputValue", typed.as_str())]),
            Style::default(),
            " ADD ",
        ),
        Mode::Edit => (
            store.translate(Key::EditTaskPrompt, &[("inputValue", typed.as_str())]),
            Style::default(),
            " EDIT ",
        ),
        _ => (
            store.message().unwrap_or_default().to_string(),
            Style::default().fg(Color::Green),
            " LIST ",
        ),
    };
    let status = Paragraph::new(line).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(mode_label)
            .border_style(Style::default().fg(if store.mode() == Mode::List {
                Color::Gray
            } else {
                Color::Green
            })),
    );
    frame.render_widget(status, chunks[1]);

    // Controls
    let controls = if store.mode() == Mode::List {
        store.t(Key::ControlsList)
    } else {
        store.t(Key::ControlsAdd)
    };
    frame.render_widget(
        Paragraph::new(controls).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

/// Run the interactive list until the user quits.
///
/// The terminal is restored even when the loop fails.
pub fn run(store: &mut Store) -> Result<()> {
    enable_raw_mode().map_err(terminal_err)?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(terminal_err)?;

    let result = event_loop(store);

    disable_raw_mode().map_err(terminal_err)?;
    stdout()
        .execute(LeaveAlternateScreen)
        .map_err(terminal_err)?;

    result
}

fn event_loop(store: &mut Store) -> Result<()> {
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).map_err(terminal_err)?;

    loop {
        store.poll_writeback();

        terminal
            .draw(|f| ui(f, store))
            .map_err(terminal_err)?;

        if event::poll(Duration::from_millis(100)).map_err(terminal_err)? {
            if let Event::Key(key) = event::read().map_err(terminal_err)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if input::handle_key(store, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
