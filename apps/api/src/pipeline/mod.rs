pub mod batch;
pub mod collaborators;
pub mod handlers;
pub mod optimizer;
