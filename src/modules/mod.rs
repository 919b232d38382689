pub mod blogs;
pub mod login;
pub mod users;

use quill_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register(users::create_module(state.clone()));
    registry.register(login::create_module(state.clone()));
    registry.register(blogs::create_module(state.clone()));
}
