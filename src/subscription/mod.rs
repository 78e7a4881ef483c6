//! Subscription management for newsbot.
//!
//! This module owns per-user keywords, the shared source list and
//! polling intervals.

pub mod repository;
pub mod service;
pub mod types;
pub mod validation;

pub use repository::{KeywordRepository, SourceRepository};
pub use service::{SubscriptionService, ANNOUNCEMENT_SOURCE_NAME};
pub use types::{AddKeywordsOutcome, NewSource, Source, SourceKind};
pub use validation::ValidationError;
