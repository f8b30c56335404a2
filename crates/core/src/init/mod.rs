//! Workspace scaffolding for `.showrunner/`.

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_structure, InitOptions};
