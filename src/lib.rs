//! Quill application library
//!
//! Blog platform backend: user registration, token login, and blog posts with
//! ownership checks, assembled from modules on top of the Quill kernel.

pub mod app;
pub mod modules;
pub mod state;
pub mod utils;

pub use app::App;
pub use state::AppState;
