//! newsbot - keyword-filtered crypto news delivered over Telegram
//!
//! Users subscribe to keywords through a chat menu. A periodic pipeline
//! fetches RSS feeds and exchange announcements, matches them against each
//! user's keywords and delivers unseen items.

pub mod bot;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod news;
pub mod subscription;
pub mod telegram;

pub use bot::{BotHandler, DialogueState, UpdateRunner};
pub use config::Config;
pub use db::{Database, User, UserRepository};
pub use error::{NewsbotError, Result};
pub use news::{CycleReport, NewsRecord, Pipeline, Scheduler, SchedulerState, TickOutcome};
pub use subscription::{Source, SourceKind, SubscriptionService};
pub use telegram::{DeliveryError, MessageSender, OutgoingMessage, TelegramClient};
