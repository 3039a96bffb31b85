//! Shared utilities

pub mod error;

pub use error::{AppError, AppResult, ErrorResponse, FieldErrors};
