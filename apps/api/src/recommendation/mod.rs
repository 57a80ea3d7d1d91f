// Template recommendation and optimization-strategy selection.

pub mod engine;
pub mod handlers;
pub mod strategy;
