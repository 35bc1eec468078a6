pub mod codec;
pub mod core_api;
pub mod document;
pub mod editors;
pub mod locator;
