pub mod client;
pub mod parser;
pub mod sources;

pub use client::ApiClient;
pub use sources::{EventCursor, EventsSource, RunCursor, RunListFilter, RunsSource};
