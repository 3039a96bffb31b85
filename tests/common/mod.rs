//! Shared test utilities

pub mod test_app;

pub use test_app::TestApp;
