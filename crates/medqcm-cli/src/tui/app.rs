//! Application state and logic

use std::collections::BTreeSet;
use std::time::Instant;

use medqcm_core::controller::{Action, Controller};
use medqcm_core::exam::ExamSession;
use medqcm_core::models::{Module, PdfResource, Question};
use medqcm_core::review::ReviewCard;
use medqcm_core::{bank, Config, GenError};

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Command input mode (after pressing :)
    Command,
}

/// Which screen is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// The year/semester/module tree
    Dashboard,
    /// One module with its tabs
    Module,
}

/// Tabs of the module screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Review,
    Exam,
    Resources,
}

impl Tab {
    /// Move to the next tab (wrapping)
    pub fn next(self) -> Self {
        match self {
            Tab::Review => Tab::Exam,
            Tab::Exam => Tab::Resources,
            Tab::Resources => Tab::Review,
        }
    }

    /// Move to the previous tab (wrapping)
    pub fn prev(self) -> Self {
        match self {
            Tab::Review => Tab::Resources,
            Tab::Exam => Tab::Review,
            Tab::Resources => Tab::Exam,
        }
    }
}

/// One visible row of the dashboard tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRow {
    Year {
        year_id: String,
    },
    Semester {
        year_id: String,
        semester_id: String,
    },
    Module {
        year_id: String,
        semester_id: String,
        module_id: String,
    },
}

/// Path of the module being viewed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSelection {
    pub year_id: String,
    pub semester_id: String,
    pub module_id: String,
}

/// Everything needed to run one generation request off the UI thread
#[derive(Debug, Clone)]
pub struct GenRequest {
    pub module_id: String,
    pub module_name: String,
    pub description: Option<String>,
    pub count: usize,
}

/// Application state
pub struct App {
    /// Configuration (credential, model, generation count)
    pub config: Config,
    /// Owns the content tree; all mutations go through dispatch
    pub controller: Controller,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Command input buffer
    pub command_input: String,
    /// Cursor position in command input
    pub command_cursor: usize,
    /// Which screen is shown
    pub screen: Screen,
    /// Flattened dashboard tree rows (respects expansion state)
    pub rows: Vec<TreeRow>,
    /// Currently selected row index
    pub row_index: usize,
    /// Expanded years
    pub expanded_years: BTreeSet<String>,
    /// Expanded semesters
    pub expanded_semesters: BTreeSet<String>,
    /// Module being viewed, when on the module screen
    pub selected: Option<ModuleSelection>,
    /// Active tab of the module screen
    pub tab: Tab,
    /// One immediate-mode card per question of the viewed module
    pub review_cards: Vec<ReviewCard>,
    /// Index of the card being shown
    pub review_index: usize,
    /// Exam session for the viewed module
    pub exam: ExamSession,
    /// Selected PDF row in the Resources tab
    pub pdf_index: usize,
    /// Re-entrancy guard: at most one generation in flight
    pub is_generating: bool,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
}

impl App {
    /// Create the app over an initial store
    pub fn new(config: Config, controller: Controller) -> Self {
        let mut app = Self {
            config,
            controller,
            should_quit: false,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            command_cursor: 0,
            screen: Screen::Dashboard,
            rows: Vec::new(),
            row_index: 0,
            expanded_years: BTreeSet::new(),
            expanded_semesters: BTreeSet::new(),
            selected: None,
            tab: Tab::Review,
            review_cards: Vec::new(),
            review_index: 0,
            exam: ExamSession::new(),
            pdf_index: 0,
            is_generating: false,
            status_message: None,
            status_message_time: None,
            show_help: false,
        };
        app.rebuild_rows();
        app
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > std::time::Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ==================== Dashboard ====================

    /// Rebuild the flattened tree rows from the store and expansion state
    pub fn rebuild_rows(&mut self) {
        let mut rows = Vec::new();
        for year in &self.controller.state().years {
            rows.push(TreeRow::Year {
                year_id: year.id.clone(),
            });
            if !self.expanded_years.contains(&year.id) {
                continue;
            }
            for semester in &year.semesters {
                rows.push(TreeRow::Semester {
                    year_id: year.id.clone(),
                    semester_id: semester.id.clone(),
                });
                if !self.expanded_semesters.contains(&semester.id) {
                    continue;
                }
                for module in &semester.modules {
                    rows.push(TreeRow::Module {
                        year_id: year.id.clone(),
                        semester_id: semester.id.clone(),
                        module_id: module.id.clone(),
                    });
                }
            }
        }
        self.rows = rows;
        if !self.rows.is_empty() {
            self.row_index = self.row_index.min(self.rows.len() - 1);
        } else {
            self.row_index = 0;
        }
    }

    /// The currently selected tree row
    pub fn current_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.row_index)
    }

    /// Move selection up in the current context
    pub fn move_up(&mut self) {
        match self.screen {
            Screen::Dashboard => {
                self.row_index = self.row_index.saturating_sub(1);
            }
            Screen::Module => match self.tab {
                Tab::Review => {
                    self.review_index = self.review_index.saturating_sub(1);
                }
                Tab::Resources => {
                    self.pdf_index = self.pdf_index.saturating_sub(1);
                }
                Tab::Exam => {}
            },
        }
    }

    /// Move selection down in the current context
    pub fn move_down(&mut self) {
        match self.screen {
            Screen::Dashboard => {
                if self.row_index < self.rows.len().saturating_sub(1) {
                    self.row_index += 1;
                }
            }
            Screen::Module => match self.tab {
                Tab::Review => {
                    if self.review_index < self.review_cards.len().saturating_sub(1) {
                        self.review_index += 1;
                    }
                }
                Tab::Resources => {
                    let count = self.current_module().map_or(0, |m| m.pdfs.len());
                    if self.pdf_index < count.saturating_sub(1) {
                        self.pdf_index += 1;
                    }
                }
                Tab::Exam => {}
            },
        }
    }

    /// Handle Enter on the dashboard: expand/collapse containers, open
    /// modules
    pub fn activate_row(&mut self) {
        let Some(row) = self.current_row().cloned() else {
            return;
        };
        match row {
            TreeRow::Year { year_id } => {
                if !self.expanded_years.remove(&year_id) {
                    self.expanded_years.insert(year_id);
                }
                self.rebuild_rows();
            }
            TreeRow::Semester { semester_id, .. } => {
                if !self.expanded_semesters.remove(&semester_id) {
                    self.expanded_semesters.insert(semester_id);
                }
                self.rebuild_rows();
            }
            TreeRow::Module {
                year_id,
                semester_id,
                module_id,
            } => {
                self.open_module(ModuleSelection {
                    year_id,
                    semester_id,
                    module_id,
                });
            }
        }
    }

    // ==================== Module screen ====================

    /// Open a module: fresh tab/review/exam state
    pub fn open_module(&mut self, selection: ModuleSelection) {
        self.selected = Some(selection);
        self.screen = Screen::Module;
        self.tab = Tab::Review;
        self.review_index = 0;
        self.pdf_index = 0;
        self.exam = ExamSession::new();
        self.rebuild_review_cards();
    }

    /// Leave the module screen. Selection and exam progress are transient
    /// and discarded here; an in-flight generation keeps its module id and
    /// commits tree-wide on completion.
    pub fn back_to_dashboard(&mut self) {
        self.selected = None;
        self.screen = Screen::Dashboard;
        self.review_cards.clear();
        self.exam = ExamSession::new();
    }

    /// The module being viewed
    pub fn current_module(&self) -> Option<&Module> {
        let selection = self.selected.as_ref()?;
        bank::find_module(self.controller.state(), &selection.module_id)
    }

    /// Rebuild the review cards from the viewed module's question list
    pub fn rebuild_review_cards(&mut self) {
        let questions: Vec<Question> = self
            .current_module()
            .map(|m| m.questions.clone())
            .unwrap_or_default();
        self.review_cards = questions.into_iter().map(ReviewCard::immediate).collect();
        if !self.review_cards.is_empty() {
            self.review_index = self.review_index.min(self.review_cards.len() - 1);
        } else {
            self.review_index = 0;
        }
    }

    /// Switch to the next tab
    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
    }

    /// Switch to the previous tab
    pub fn prev_tab(&mut self) {
        self.tab = self.tab.prev();
    }

    // ==================== Review tab ====================

    /// The card being shown in the Review tab
    pub fn current_review_card(&self) -> Option<&ReviewCard> {
        self.review_cards.get(self.review_index)
    }

    /// Pick an option on the current review card
    pub fn review_select(&mut self, option_index: usize) {
        if let Some(card) = self.review_cards.get_mut(self.review_index) {
            if option_index < card.question().options.len() {
                card.select(option_index);
            }
        }
    }

    /// Lock a multi-answer review card on its accumulated selection
    pub fn review_submit(&mut self) {
        if let Some(card) = self.review_cards.get_mut(self.review_index) {
            card.submit();
        }
    }

    /// Toggle the explanation panel of the current review card
    pub fn review_toggle_explanation(&mut self) {
        if let Some(card) = self.review_cards.get_mut(self.review_index) {
            card.toggle_explanation();
        }
    }

    // ==================== Exam tab ====================

    /// Start a test over the viewed module's questions
    pub fn exam_start(&mut self) {
        let Some(module) = self.current_module() else {
            return;
        };
        let questions = module.questions.clone();
        if !self.exam.start(&questions) {
            self.set_status("Aucune question éligible pour le test");
        }
    }

    /// Toggle an option of the current exam question, recording the new
    /// selection set through the engine
    pub fn exam_toggle(&mut self, option_index: usize) {
        let Some(question) = self.exam.current_question() else {
            return;
        };
        if option_index >= question.options.len() {
            return;
        }
        let mut selected = self
            .exam
            .answer_for(&question.id)
            .cloned()
            .unwrap_or_default();
        if !selected.remove(&option_index) {
            selected.insert(option_index);
        }
        self.exam.record_answer(selected);
    }

    /// Advance the exam (finishes the test on the last question)
    pub fn exam_next(&mut self) {
        self.exam.go_next();
    }

    /// Step the exam back
    pub fn exam_previous(&mut self) {
        self.exam.go_previous();
    }

    /// Discard the finished session and return to the intro
    pub fn exam_retry(&mut self) {
        self.exam.retry();
    }

    // ==================== Resources tab ====================

    /// The selected PDF in the Resources tab
    pub fn current_pdf(&self) -> Option<&PdfResource> {
        self.current_module()?.pdfs.get(self.pdf_index)
    }

    // ==================== Generation ====================

    /// Prepare a generation request for the viewed module.
    ///
    /// Captures the stable module id, not a live reference; the result is
    /// committed tree-wide by id when it arrives. Returns None (with a
    /// status message) when generation cannot start.
    pub fn begin_generation(&mut self) -> Option<GenRequest> {
        if self.is_generating {
            self.set_status("Une génération est déjà en cours");
            return None;
        }
        if !self.config.has_api_key() {
            self.set_status(GenError::MissingApiKey.to_string());
            return None;
        }
        let module = self.current_module()?;
        let request = GenRequest {
            module_id: module.id.clone(),
            module_name: module.name.clone(),
            description: module.description.clone(),
            count: self.config.generate_count,
        };
        self.is_generating = true;
        self.set_status(format!("Génération de {} questions...", request.count));
        Some(request)
    }

    /// Apply a finished generation request.
    ///
    /// The batch commits to the module id captured at request time, even
    /// if the user has navigated elsewhere since; the UI only refreshes
    /// when the committed module is the one being viewed.
    pub fn finish_generation(
        &mut self,
        module_id: String,
        result: Result<Vec<Question>, GenError>,
    ) {
        self.is_generating = false;
        match result {
            Ok(questions) if questions.is_empty() => {
                self.set_status("Le service n'a renvoyé aucune question");
            }
            Ok(questions) => {
                let count = questions.len();
                let target_name = bank::find_module(self.controller.state(), &module_id)
                    .map(|m| m.name.clone());
                let committed = self.controller.dispatch(Action::AppendGenerated {
                    module_id: module_id.clone(),
                    questions,
                });
                if !committed {
                    self.set_status("Module introuvable, questions abandonnées");
                    return;
                }
                let viewing_target = self
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.module_id == module_id);
                if viewing_target {
                    self.rebuild_review_cards();
                }
                match target_name {
                    Some(name) => {
                        self.set_status(format!("{} questions IA ajoutées à {}", count, name))
                    }
                    None => self.set_status(format!("{} questions IA ajoutées", count)),
                }
                self.rebuild_rows();
            }
            Err(e) => {
                self.set_status(e.to_string());
            }
        }
    }

    // ==================== Command mode ====================

    /// Enter command mode
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Exit command mode
    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        self.command_input.insert(self.command_cursor, c);
        self.command_cursor += c.len_utf8();
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.command_cursor > 0 {
            let prev = self.command_input[..self.command_cursor]
                .chars()
                .next_back()
                .map_or(0, |c| c.len_utf8());
            self.command_cursor -= prev;
            self.command_input.remove(self.command_cursor);
        }
    }

    /// Move cursor left
    pub fn cursor_left(&mut self) {
        if self.command_cursor > 0 {
            let prev = self.command_input[..self.command_cursor]
                .chars()
                .next_back()
                .map_or(0, |c| c.len_utf8());
            self.command_cursor -= prev;
        }
    }

    /// Move cursor right
    pub fn cursor_right(&mut self) {
        if self.command_cursor < self.command_input.len() {
            let next = self.command_input[self.command_cursor..]
                .chars()
                .next()
                .map_or(0, |c| c.len_utf8());
            self.command_cursor += next;
        }
    }

    /// Parse and execute a command from the input buffer.
    ///
    /// Module-screen commands:
    /// - `pdf <name> | <url>` adds a PDF resource
    /// - `qcm <text> | <opt> | <opt> [| ...] | correct=a,c` adds a question
    pub fn execute_command(&mut self) {
        let input = self.command_input.trim().to_string();

        if let Some(rest) = input.strip_prefix("pdf ") {
            self.command_add_pdf(rest);
        } else if let Some(rest) = input.strip_prefix("qcm ") {
            self.command_add_question(rest);
        } else if !input.is_empty() {
            self.set_status(format!("Commande inconnue: {}", input));
        }
    }

    fn command_add_pdf(&mut self, rest: &str) {
        let Some(selection) = self.selected.clone() else {
            self.set_status("Ouvrez un module pour ajouter un PDF");
            return;
        };
        let Some(pdf) = parse_pdf_command(rest) else {
            self.set_status("Usage: pdf <nom> | <url>");
            return;
        };
        let name = pdf.name.clone();
        self.controller.dispatch(Action::AddPdf {
            year_id: selection.year_id,
            semester_id: selection.semester_id,
            module_id: selection.module_id,
            pdf,
        });
        self.set_status(format!("PDF ajouté: {}", name));
    }

    fn command_add_question(&mut self, rest: &str) {
        let Some(selection) = self.selected.clone() else {
            self.set_status("Ouvrez un module pour ajouter une question");
            return;
        };
        let question = match parse_qcm_command(rest) {
            Ok(q) => q,
            Err(usage) => {
                self.set_status(usage);
                return;
            }
        };
        self.controller.dispatch(Action::AddQuestion {
            year_id: selection.year_id,
            semester_id: selection.semester_id,
            module_id: selection.module_id,
            question,
        });
        self.rebuild_review_cards();
        self.set_status("Question ajoutée");
    }
}

/// Parse `<name> | <url>` into a PDF resource
fn parse_pdf_command(rest: &str) -> Option<PdfResource> {
    let (name, url) = rest.split_once('|')?;
    let name = name.trim();
    let url = url.trim();
    if name.is_empty() || url.is_empty() {
        return None;
    }
    Some(PdfResource::create(name, url))
}

/// Parse `<text> | <opt> | <opt> [| ...] | correct=a,c` into a question
fn parse_qcm_command(rest: &str) -> Result<Question, String> {
    const USAGE: &str = "Usage: qcm <énoncé> | <option> | <option> [| ...] | correct=a,c";

    let mut parts: Vec<&str> = rest.split('|').map(str::trim).collect();
    let Some(last) = parts.pop() else {
        return Err(USAGE.to_string());
    };
    let Some(letters) = last.strip_prefix("correct=") else {
        return Err(USAGE.to_string());
    };
    if parts.len() < 3 {
        // Need at least an answer statement and two options
        return Err(USAGE.to_string());
    }

    let text = parts.remove(0);
    let options: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
    if text.is_empty() || options.iter().any(|o| o.is_empty()) {
        return Err(USAGE.to_string());
    }

    let mut correct = BTreeSet::new();
    for letter in letters.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let mut chars = letter.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(USAGE.to_string());
        };
        let index = (c.to_ascii_lowercase() as isize) - ('a' as isize);
        if index < 0 || index as usize >= options.len() {
            return Err(format!("Réponse invalide: {}", letter));
        }
        correct.insert(index as usize);
    }
    if correct.is_empty() {
        return Err(USAGE.to_string());
    }

    Ok(Question::manual(text, options, correct))
}
