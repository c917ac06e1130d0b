//! Incremental ("infinite scroll") loading of cursor-paginated lists.

pub mod actor;
pub mod session;
pub mod source;

pub use actor::{InfiniteLoader, LoaderCommand, LoaderConfig, LoaderHandle};
pub use session::{Completion, FetchKind, ListSession, ListSnapshot, Ticket};
pub use source::{PageRequest, PageSource, ScrollContainer, ScrollMetrics};
