//! Feed materialization.
//!
//! ```text
//! scan ─▶ extract ─▶ (identify, cover, describe) ─▶ assemble ─▶ FeedCache
//! ```
//!
//! [`FeedPipeline`] turns the library into a [`FeedDocument`]. [`FeedCache`]
//! wraps any [`FeedSource`] (normally the pipeline) and decides when that
//! work has to happen again.

mod assemble;
mod cache;
mod describe;
mod duration;
pub mod error;
pub mod models;
mod pipeline;

pub use crate::assemble::assemble;
pub use crate::cache::{Built, CacheEntry, FeedCache, FeedSource};
pub use crate::describe::{DEFAULT_TEMPLATE, DescriptionFields, DescriptionTemplate, Fallbacks, PLACEHOLDER};
pub use crate::duration::format_duration;
pub use crate::pipeline::{FeedPipeline, PipelineSettings};
