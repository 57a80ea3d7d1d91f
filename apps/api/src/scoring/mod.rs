pub mod checks;
pub mod compatibility;
pub mod config;
pub mod handlers;
pub mod keywords;
