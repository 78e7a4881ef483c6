//! News pipeline for newsbot.
//!
//! Sources are fetched, normalized into records, matched against each
//! user's keywords, filtered through the user's seen-set and delivered.

pub mod dispatcher;
pub mod fetcher;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod seen;
pub mod types;

pub use dispatcher::{format_message, DeliveryReport, Dispatcher};
pub use fetcher::{validate_url, NewsFetcher};
pub use matcher::match_keywords;
pub use normalize::{fingerprint, normalize, truncate_description};
pub use pipeline::{CycleReport, Pipeline};
pub use scheduler::{Scheduler, SchedulerState, TickOutcome};
pub use seen::SeenRepository;
pub use types::{NewsRecord, RawEntry, MAX_DESCRIPTION_CHARS, TRUNCATION_MARKER};
