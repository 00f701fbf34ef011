pub mod books;

use std::sync::Arc;

use shelf_kernel::{settings::Settings, ModuleRegistry};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) {
    let books = Arc::new(books::memory::InMemoryBooks::new(settings.books.clone()));
    registry.register(books::create_module(books));
}
