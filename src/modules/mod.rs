pub mod books;

use std::sync::Arc;

use bookstore_http::views::Views;
use bookstore_kernel::ModuleRegistry;

use books::store::BookStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn BookStore>, views: Arc<Views>) {
    registry.register(books::create_module(store, views));
}
