// Template Store: versioned reusable documents, performance aggregates, read cache.
// `TemplateStore` is the only entry point; repositories and caches are swappable backends.

pub mod cache;
pub mod handlers;
pub mod postgres;
pub mod repository;
pub mod store;
