pub mod cv;
pub mod interaction;
pub mod job;
