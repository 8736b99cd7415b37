// CV ingestion: extract text → embed → persist CV → index vector.
// Extraction failures degrade; embedding failures abort before anything is written.

pub mod extract;
pub mod handlers;
pub mod pipeline;
