//! Data models for MedQCM
//!
//! Defines the study-content tree: Year → Semester → Module, where each
//! module carries QCM questions and PDF resources. All records are plain
//! values; "updating" one means building a new value and replacing it in
//! the tree (see the `bank` module).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id prefix carried by AI-generated questions.
///
/// This prefix is the sole discriminator that excludes a question from
/// exam eligibility: AI-authored content is never part of a scored test.
pub const AI_ID_PREFIX: &str = "ai-";

/// Id prefix carried by manually added questions.
pub const MANUAL_ID_PREFIX: &str = "manual-";

/// A multiple-choice question
///
/// Correctness is represented as a non-empty set of option indices;
/// single-answer questions are the size-1 special case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    /// Unique identifier within its module
    pub id: String,
    /// The question statement
    pub text: String,
    /// Answer options, in display order (length >= 2)
    pub options: Vec<String>,
    /// Indices of the options that constitute a fully correct answer
    pub correct: BTreeSet<usize>,
    /// Optional rationale shown after answering
    pub explanation: Option<String>,
}

impl Question {
    /// Create a question with an explicit correct-index set
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options,
            correct: correct.into_iter().collect(),
            explanation: None,
        }
    }

    /// Create a single-answer question
    pub fn single(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self::new(id, text, options, [correct_index])
    }

    /// Create a manually authored question with a fresh `manual-` id
    pub fn manual(
        text: impl Into<String>,
        options: Vec<String>,
        correct: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self::new(
            format!("{}{}", MANUAL_ID_PREFIX, Uuid::new_v4()),
            text,
            options,
            correct,
        )
    }

    /// Attach an explanation
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Whether this question was produced by the generation service
    pub fn is_ai_generated(&self) -> bool {
        self.id.starts_with(AI_ID_PREFIX)
    }

    /// Whether this question may appear in a scored exam session
    pub fn is_exam_eligible(&self) -> bool {
        !self.is_ai_generated()
    }

    /// The sole correct index, when the question is single-answer
    pub fn single_correct_index(&self) -> Option<usize> {
        if self.correct.len() == 1 {
            self.correct.iter().next().copied()
        } else {
            None
        }
    }

    /// Exact-match grading: the selection must equal the correct set.
    /// No partial credit.
    pub fn grades_correct(&self, selected: &BTreeSet<usize>) -> bool {
        !self.correct.is_empty() && *selected == self.correct
    }
}

/// A linked PDF resource. The URL is opaque and never validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfResource {
    /// Unique identifier within its module
    pub id: String,
    /// Display name
    pub name: String,
    /// Where the document lives
    pub url: String,
}

impl PdfResource {
    /// Create a resource with an explicit id
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }

    /// Create a resource with a fresh id
    pub fn create(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(format!("pdf-{}", Uuid::new_v4()), name, url)
    }
}

/// A topic unit containing questions and PDF resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    /// Unique identifier within its semester
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Questions, in display order
    pub questions: Vec<Question>,
    /// PDF resources, in display order
    pub pdfs: Vec<PdfResource>,
}

impl Module {
    /// Create an empty module
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            questions: Vec::new(),
            pdfs: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a question
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Append a PDF resource
    pub fn with_pdf(mut self, pdf: PdfResource) -> Self {
        self.pdfs.push(pdf);
        self
    }

    /// Questions usable in exam mode (non-AI)
    pub fn eligible_questions(&self) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.is_exam_eligible()).collect()
    }
}

/// A semester grouping modules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Semester {
    /// Unique identifier within its year
    pub id: String,
    /// Display name
    pub name: String,
    /// Modules, in display order
    pub modules: Vec<Module>,
}

impl Semester {
    /// Create an empty semester
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            modules: Vec::new(),
        }
    }

    /// Append a module
    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }
}

/// An academic year grouping semesters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Year {
    /// Unique identifier within the store
    pub id: String,
    /// Display name
    pub name: String,
    /// Semesters, in display order
    pub semesters: Vec<Semester>,
}

impl Year {
    /// Create an empty year
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            semesters: Vec::new(),
        }
    }

    /// Append a semester
    pub fn with_semester(mut self, semester: Semester) -> Self {
        self.semesters.push(semester);
        self
    }
}

/// The single root of the study-content tree
///
/// Constructed once at startup from the seed; every mutation replaces the
/// whole root (see `bank` and `controller`), so readers never observe a
/// torn intermediate state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DataStore {
    /// Academic years, in display order
    pub years: Vec<Year>,
}

impl DataStore {
    /// Look up a year by id
    pub fn year(&self, year_id: &str) -> Option<&Year> {
        self.years.iter().find(|y| y.id == year_id)
    }
}
