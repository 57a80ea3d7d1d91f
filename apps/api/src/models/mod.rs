pub mod document;
pub mod posting;
pub mod template;
