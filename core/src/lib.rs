pub mod advice;
pub mod error;
pub mod measurement;
pub mod prompt;
