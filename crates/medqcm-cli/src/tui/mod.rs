//! MedQCM TUI
//!
//! Terminal user interface for the MedQCM question bank.
//!
//! ## Layout
//!
//! Two screens:
//! - Dashboard: the year/semester/module tree with a detail preview
//! - Module: tabs for Révision (immediate feedback), Test (scored exam
//!   session) and Ressources (linked PDFs)
//!
//! ## Navigation
//!
//! - j/k or ↑/↓: Move selection up/down
//! - Enter: Expand container / open module / advance
//! - Tab, h/l: Switch module tabs
//! - Esc or b: Back to the dashboard
//! - q: Quit
//!
//! ## Commands
//!
//! - 1-9: Pick/toggle an answer option
//! - s: Start a test, r: retry after the result
//! - g: Generate questions with the configured AI service
//! - o: Open the selected PDF in the system handler
//! - :pdf / :qcm: Add content to the open module

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use medqcm_core::controller::Controller;
use medqcm_core::genai::{GenError, Generator};
use medqcm_core::models::Question;
use medqcm_core::seed::initial_store;
use medqcm_core::Config;

use app::{App, GenRequest, InputMode, Screen, Tab};

/// Completed generation request, delivered back to the UI loop
struct GenOutcome {
    module_id: String,
    result: Result<Vec<Question>, GenError>,
}

/// Run the TUI application
pub async fn run() -> Result<()> {
    let config = Config::load()?;

    // Initialize TUI logging (file-based, only if MEDQCM_LOG is set)
    init_tui_logging(&config);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let controller = Controller::new(initial_store());
    let mut app = App::new(config, controller);

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    // Channel for finished generation requests; capacity 1 is enough since
    // at most one request is in flight
    let (gen_tx, mut gen_rx) = mpsc::channel::<GenOutcome>(1);

    loop {
        // Check for status message timeout
        app.check_status_timeout();

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            // A generation request finished
            outcome = gen_rx.recv() => {
                if let Some(outcome) = outcome {
                    app.finish_generation(outcome.module_id, outcome.result);
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                // Check for terminal events (non-blocking)
                if event::poll(std::time::Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        match app.input_mode {
                            InputMode::Normal => {
                                handle_normal_mode(app, &gen_tx, key.code, key.modifiers);
                            }
                            InputMode::Command => {
                                handle_command_mode(app, key.code, key.modifiers);
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(
    app: &mut App,
    gen_tx: &mpsc::Sender<GenOutcome>,
    code: KeyCode,
    modifiers: KeyModifiers,
) {
    // Clear status message on navigation keys
    match code {
        KeyCode::Char('j') | KeyCode::Char('k') | KeyCode::Up | KeyCode::Down | KeyCode::Tab => {
            app.status_message = None;
        }
        _ => {}
    }

    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
        }

        // Tab switching on the module screen
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right if app.screen == Screen::Module => {
            app.next_tab();
        }
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left
            if app.screen == Screen::Module =>
        {
            app.prev_tab();
        }

        // Back to the dashboard
        KeyCode::Esc | KeyCode::Char('b') if app.screen == Screen::Module => {
            app.back_to_dashboard();
        }

        KeyCode::Enter => handle_enter(app),

        // Answer options
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            handle_option_key(app, index);
        }

        // Review: toggle explanation
        KeyCode::Char('e') if app.screen == Screen::Module && app.tab == Tab::Review => {
            app.review_toggle_explanation();
        }

        // Exam: start / previous / retry
        KeyCode::Char('s') if app.screen == Screen::Module && app.tab == Tab::Exam => {
            app.exam_start();
        }
        KeyCode::Char('p') if app.screen == Screen::Module && app.tab == Tab::Exam => {
            app.exam_previous();
        }
        KeyCode::Char('r') if app.screen == Screen::Module && app.tab == Tab::Exam => {
            app.exam_retry();
        }

        // Resources: open the selected PDF
        KeyCode::Char('o') if app.screen == Screen::Module && app.tab == Tab::Resources => {
            open_current_pdf(app);
        }

        // Generation
        KeyCode::Char('g') if app.screen == Screen::Module => {
            spawn_generation(app, gen_tx);
        }

        // Command mode
        KeyCode::Char(':') if app.screen == Screen::Module => {
            app.enter_command_mode();
        }

        // Help
        KeyCode::Char('?') => {
            app.toggle_help();
        }

        _ => {}
    }
}

/// Handle key events in command mode
fn handle_command_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => {
            app.exit_input_mode();
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.exit_input_mode();
        }
        KeyCode::Enter => {
            app.execute_command();
            app.exit_input_mode();
        }
        KeyCode::Char(c) => {
            app.insert_char(c);
        }
        KeyCode::Backspace => {
            app.delete_char();
        }
        KeyCode::Left => {
            app.cursor_left();
        }
        KeyCode::Right => {
            app.cursor_right();
        }
        _ => {}
    }
}

/// Enter activates whatever the current context points at
fn handle_enter(app: &mut App) {
    match app.screen {
        Screen::Dashboard => app.activate_row(),
        Screen::Module => match app.tab {
            Tab::Review => app.review_submit(),
            Tab::Exam => app.exam_next(),
            Tab::Resources => open_current_pdf(app),
        },
    }
}

/// Digit keys pick options in the Review and Exam tabs
fn handle_option_key(app: &mut App, index: usize) {
    if app.screen != Screen::Module {
        return;
    }
    match app.tab {
        Tab::Review => app.review_select(index),
        Tab::Exam => app.exam_toggle(index),
        Tab::Resources => {}
    }
}

/// Open the selected PDF with the system handler
fn open_current_pdf(app: &mut App) {
    let Some(pdf) = app.current_pdf() else {
        return;
    };
    let name = pdf.name.clone();
    match open::that(&pdf.url) {
        Ok(()) => app.set_status(format!("Ouverture de {}", name)),
        Err(e) => app.set_status(format!("Impossible d'ouvrir {}: {}", name, e)),
    }
}

/// Kick off a generation request for the open module.
///
/// The request runs on its own task; the UI stays responsive and the
/// result comes back through the channel with the module id captured at
/// start time.
fn spawn_generation(app: &mut App, gen_tx: &mpsc::Sender<GenOutcome>) {
    let Some(request) = app.begin_generation() else {
        return;
    };

    let generator = match Generator::from_config(&app.config) {
        Ok(g) => g,
        Err(e) => {
            app.is_generating = false;
            app.set_status(e.to_string());
            return;
        }
    };

    let tx = gen_tx.clone();
    tokio::spawn(async move {
        let GenRequest {
            module_id,
            module_name,
            description,
            count,
        } = request;
        let result = generator
            .generate(&module_name, description.as_deref(), count)
            .await;
        let _ = tx
            .send(GenOutcome {
                module_id,
                result,
            })
            .await;
    });
}

/// Initialize logging for TUI mode
///
/// Only initializes if the MEDQCM_LOG environment variable is set.
/// Logs to file (config.log_file or a default under the temp dir).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("MEDQCM_LOG") else {
        return;
    };

    let log_path = config.log_file_path();

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "medqcm_core={},medqcm_cli={}",
        log_level, log_level
    ));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
