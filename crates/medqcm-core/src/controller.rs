//! State controller
//!
//! All question-bank mutations go through a reducer: pure functions
//! `(DataStore, Action) -> DataStore` applied by [`Controller::dispatch`].
//! Every new root is published on a watch channel, so views redraw from
//! published state instead of from the mutation site.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::bank;
use crate::models::{DataStore, PdfResource, Question};

/// A mutation of the question bank
#[derive(Debug, Clone)]
pub enum Action {
    /// Add one question to a module addressed by its full path
    AddQuestion {
        year_id: String,
        semester_id: String,
        module_id: String,
        question: Question,
    },
    /// Add one PDF resource to a module addressed by its full path
    AddPdf {
        year_id: String,
        semester_id: String,
        module_id: String,
        pdf: PdfResource,
    },
    /// Commit a finished generation batch, addressed tree-wide by the
    /// module id captured when the request was started. Safe against the
    /// user having navigated away in the meantime.
    AppendGenerated {
        module_id: String,
        questions: Vec<Question>,
    },
}

/// Apply one action to a store, producing the next root.
///
/// Lookup misses leave the store unchanged (deep-equal result).
pub fn reduce(store: &DataStore, action: &Action) -> DataStore {
    match action {
        Action::AddQuestion {
            year_id,
            semester_id,
            module_id,
            question,
        } => {
            let Some(module) = bank::find_module(store, module_id) else {
                warn!(module_id, "AddQuestion: module not found");
                return store.clone();
            };
            let module = module.clone().with_question(question.clone());
            bank::update_module(store, year_id, semester_id, &module)
        }
        Action::AddPdf {
            year_id,
            semester_id,
            module_id,
            pdf,
        } => {
            let Some(module) = bank::find_module(store, module_id) else {
                warn!(module_id, "AddPdf: module not found");
                return store.clone();
            };
            let module = module.clone().with_pdf(pdf.clone());
            bank::update_module(store, year_id, semester_id, &module)
        }
        Action::AppendGenerated {
            module_id,
            questions,
        } => {
            let (next, found) = bank::append_questions(store, module_id, questions.clone());
            if !found {
                warn!(module_id, "AppendGenerated: module vanished, batch dropped");
            }
            next
        }
    }
}

/// Owns the current root and publishes every replacement.
pub struct Controller {
    state: DataStore,
    tx: watch::Sender<DataStore>,
}

impl Controller {
    /// Create a controller over an initial store
    pub fn new(initial: DataStore) -> Self {
        let (tx, _) = watch::channel(initial.clone());
        Self { state: initial, tx }
    }

    /// The current root
    pub fn state(&self) -> &DataStore {
        &self.state
    }

    /// Subscribe to published roots
    pub fn subscribe(&self) -> watch::Receiver<DataStore> {
        self.tx.subscribe()
    }

    /// Dispatch an action. Returns whether the store changed.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = reduce(&self.state, &action);
        if next == self.state {
            debug!(?action, "dispatch left the store unchanged");
            return false;
        }
        self.state = next.clone();
        self.tx.send_replace(next);
        true
    }
}
