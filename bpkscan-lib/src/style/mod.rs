pub mod index;
pub mod loader;
pub mod parse;
pub mod selector;
pub mod sheet;
