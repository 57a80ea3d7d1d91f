// Requirement extraction and role classification.
// Pure lexical passes over the injectable `Vocabulary`; no I/O, no LLM calls.

pub mod classifier;
pub mod extractor;
pub mod handlers;
pub mod text;
pub mod vocabulary;
