// Interaction Recorder: idempotent (user, job, type) upserts that drive the
// "Your Activity" views. Independent of the ranking path.

pub mod handlers;
pub mod recorder;
pub mod validation;
