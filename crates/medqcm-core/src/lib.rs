//! MedQCM Core Library
//!
//! This crate provides the core functionality for MedQCM, a study
//! application for medical students: a question bank organized as
//! Year → Semester → Module, an exam engine, review-card interaction
//! logic, and an adapter for AI question generation.
//!
//! # Architecture
//!
//! The content tree is a single in-memory value ([`DataStore`]) built from
//! a fixed seed at startup. Mutations are pure functions that produce a
//! new root; the [`Controller`] applies them and publishes every new root
//! on a watch channel for views to redraw from.
//!
//! # Quick Start
//!
//! ```text
//! let mut controller = Controller::new(seed::initial_store());
//!
//! // Run an exam over a module
//! let module = bank::find_module(controller.state(), "mod-anat-1").unwrap();
//! let mut session = ExamSession::new();
//! session.start(&module.questions);
//! ```
//!
//! # Modules
//!
//! - `models`: the content-tree value records
//! - `seed`: the fixed startup dataset
//! - `bank`: pure tree mutations (module replacement, tree-wide commits)
//! - `exam`: the Intro → Active → Result session state machine
//! - `review`: single-question card interaction (immediate/exam modes)
//! - `genai`: the Gemini generation adapter and its error taxonomy
//! - `controller`: action reducer and state publication
//! - `config`: application configuration

pub mod bank;
pub mod config;
pub mod controller;
pub mod exam;
pub mod genai;
pub mod models;
pub mod review;
pub mod seed;

pub use config::Config;
pub use controller::{Action, Controller};
pub use exam::{ExamSession, Outcome, Phase, Score, MAX_TEST_QUESTIONS};
pub use genai::{GenError, Generator};
pub use models::{
    DataStore, Module, PdfResource, Question, Semester, Year, AI_ID_PREFIX, MANUAL_ID_PREFIX,
};
pub use review::{OptionAppearance, ReviewCard, ReviewMode};
