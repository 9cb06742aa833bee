//! Repository providers.

pub mod seaorm;
