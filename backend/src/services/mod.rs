//! Service layer: everything between a parsed table and a rendered view.
//!
//! Summaries, charts and the split are pure functions over a [`Table`]; the
//! workflow controller strings them together per activity and the cache keeps
//! parsed uploads around between requests.
//!
//! [`Table`]: crate::models::Table

pub mod cache;
pub mod charts;
pub mod correlation;
pub mod splitter;
pub mod summary;
pub mod workflow;


pub use cache::TableCache;
pub use workflow::{load_dataset, render_view};
