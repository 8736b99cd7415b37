// CV-to-job recommendation: latest CV → stored vector → top-K job query →
// bulk hydration → ranked list. Also serves free-text semantic job search.

pub mod engine;
pub mod handlers;
