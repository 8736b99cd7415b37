// Job catalogue: CRUD over the job store, kept in sync with the job
// namespace of the vector index. Full-corpus re-embedding lives in `reindex`
// and runs outside the request-serving process.

pub mod catalog;
pub mod handlers;
pub mod reindex;
pub mod validation;
