use crate::catalog::MAX_NUM_PADS;
use crate::control::{ControlContext, KeyAction};
use crate::mirror::MirrorSnapshot;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use std::io;
use std::time::Duration;

const HELP: &str = "Press a key (q:quit; s,S:sel pad; c,C:sel command; up,down: change parameter)";

/// Poll interval, which is also the latency for showing module reports.
const POLL_INTERVAL: Duration = Duration::from_millis(30);

pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Char('q') => Some(KeyAction::Quit),
        KeyCode::Char('s') => Some(KeyAction::NextPad),
        KeyCode::Char('S') => Some(KeyAction::PrevPad),
        KeyCode::Char('c') => Some(KeyAction::NextCommand),
        KeyCode::Char('C') => Some(KeyAction::PrevCommand),
        KeyCode::Up => Some(KeyAction::Increment),
        KeyCode::Down => Some(KeyAction::Decrement),
        _ => None,
    }
}

pub fn pad_line(snapshot: &MirrorSnapshot) -> String {
    format!("Selected pad: {} / {}", snapshot.selected_pad, MAX_NUM_PADS - 1)
}

pub fn parameter_line(snapshot: &MirrorSnapshot) -> String {
    let descriptor = snapshot.selected_descriptor();
    format!(
        "Parameter: {:>9}: {}",
        descriptor.name,
        descriptor.label(snapshot.selected_value())
    )
}

/// Runs the terminal front end until the user quits.
pub fn run(context: &ControlContext) -> anyhow::Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, context);

    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;
    terminal.show_cursor()?;

    result.map_err(Into::into)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    context: &ControlContext,
) -> io::Result<()> {
    loop {
        if context.mirror.take_changed() {
            render(terminal, &context.mirror.snapshot())?;
        }

        // Poll with timeout so reports decoded by the block callback show up
        // even when there's no user input.
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(action) = key_action(key.code) {
                    if context.on_key(action).is_break() {
                        return Ok(());
                    }
                }
            }
            Event::Resize(..) => render(terminal, &context.mirror.snapshot())?,
            _ => {}
        }
    }
}

fn render(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    snapshot: &MirrorSnapshot,
) -> io::Result<()> {
    terminal.draw(|frame| {
        let [help_area, body_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Length(5)]).areas(frame.area());

        frame.render_widget(
            Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
            help_area,
        );

        let lines = vec![
            Line::from(pad_line(snapshot)),
            Line::from(vec![Span::styled(
                parameter_line(snapshot),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Edrumulus")),
            body_area,
        );
    })?;
    Ok(())
}
