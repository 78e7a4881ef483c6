//! Chat message handler.
//!
//! Runs the dialogue state machine for each chat and executes the
//! resulting actions through [`SubscriptionService`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use super::dialogue::{parse_input, transition, Action, DialogueState};
use super::messages;
use crate::config::Config;
use crate::db::Database;
use crate::subscription::validation::parse_source_id;
use crate::subscription::SubscriptionService;
use crate::telegram::{IncomingMessage, MessageSender, OutgoingMessage, ReplyKeyboardMarkup};
use crate::{NewsbotError, Result};

/// A reply to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTML text.
    pub text: String,
    /// Keyboard to show.
    pub keyboard: ReplyKeyboardMarkup,
}

/// Outcome of executing one action.
struct Executed {
    text: String,
    valid: bool,
}

impl Executed {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            valid: true,
        }
    }

    fn rejected(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            valid: false,
        }
    }
}

/// Handles incoming chat messages.
pub struct BotHandler {
    db: Arc<Database>,
    config: Arc<Config>,
    sender: Arc<dyn MessageSender>,
    dialogues: RwLock<HashMap<i64, DialogueState>>,
}

impl BotHandler {
    /// Create a new handler.
    pub fn new(db: Arc<Database>, config: Arc<Config>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            db,
            config,
            sender,
            dialogues: RwLock::new(HashMap::new()),
        }
    }

    /// Current dialogue state of a chat.
    pub async fn state_of(&self, chat_id: i64) -> DialogueState {
        self.dialogues
            .read()
            .await
            .get(&chat_id)
            .copied()
            .unwrap_or_default()
    }

    async fn set_state(&self, chat_id: i64, state: DialogueState) {
        let mut dialogues = self.dialogues.write().await;
        if state == DialogueState::Idle {
            dialogues.remove(&chat_id);
        } else {
            dialogues.insert(chat_id, state);
        }
    }

    /// Handle a message and send the reply.
    pub async fn handle(&self, message: &IncomingMessage) -> Result<()> {
        let reply = self.respond(message).await?;
        let outgoing = OutgoingMessage::new(message.chat_id, reply.text)
            .html()
            .with_keyboard(reply.keyboard)
            .without_preview();
        self.sender.send_message(&outgoing).await?;
        Ok(())
    }

    /// Compute the reply to a message and advance the chat's state.
    ///
    /// Rejected input is answered with the reason; the state then stays on
    /// the question so the user can try again.
    pub async fn respond(&self, message: &IncomingMessage) -> Result<Reply> {
        let chat_id = message.chat_id;
        let service = SubscriptionService::new(&self.db, &self.config);
        service.register_user(chat_id).await?;

        let state = self.state_of(chat_id).await;
        let input = parse_input(&message.text);
        let step = transition(state, input);
        debug!(chat_id, ?state, action = ?step.action, "Dialogue step");

        let executed = match self.execute(&service, message, &step.action).await {
            Ok(executed) => executed,
            Err(NewsbotError::Validation(e)) => {
                debug!(chat_id, "Rejected input: {}", e);
                Executed::rejected(messages::invalid_input(&e.to_string()))
            }
            Err(e) => {
                error!(chat_id, "Failed to handle message: {}", e);
                self.set_state(chat_id, DialogueState::Idle).await;
                return Ok(Reply {
                    text: messages::INTERNAL_ERROR.to_string(),
                    keyboard: messages::main_keyboard(),
                });
            }
        };

        let next = if executed.valid {
            step.on_success
        } else {
            step.on_invalid
        };
        self.set_state(chat_id, next).await;

        Ok(Reply {
            text: executed.text,
            keyboard: keyboard_for(next),
        })
    }

    async fn execute(
        &self,
        service: &SubscriptionService<'_>,
        message: &IncomingMessage,
        action: &Action,
    ) -> Result<Executed> {
        let chat_id = message.chat_id;
        let executed = match action {
            Action::Welcome => Executed::ok(messages::welcome(&message.first_name)),
            Action::ShowHelp => Executed::ok(messages::help(self.config.bot.max_keywords)),
            Action::ListKeywords => {
                let keywords = service.list_keywords(chat_id).await?;
                Executed::ok(messages::keyword_list(&keywords))
            }
            Action::PromptAddKeywords => Executed::ok(messages::PROMPT_ADD_KEYWORDS),
            Action::AddKeywords(raw) => {
                let outcome = service.add_keywords(chat_id, raw).await?;
                let text = messages::keywords_added(&outcome);
                if outcome.added.is_empty() && outcome.skipped.is_empty() {
                    Executed::rejected(text)
                } else {
                    Executed::ok(text)
                }
            }
            Action::PromptRemoveKeyword => {
                let keywords = service.list_keywords(chat_id).await?;
                Executed::ok(messages::prompt_remove_keyword(&keywords))
            }
            Action::RemoveKeyword(word) => {
                if service.remove_keyword(chat_id, word).await? {
                    Executed::ok(messages::keyword_removed(word))
                } else {
                    Executed::rejected(messages::keyword_not_found(word))
                }
            }
            Action::ClearKeywords => {
                let removed = service.clear_keywords(chat_id).await?;
                Executed::ok(messages::keywords_cleared(removed))
            }
            Action::ListSources => {
                let sources = service.list_sources().await?;
                Executed::ok(messages::source_list(&sources))
            }
            Action::PromptSourceKind => Executed::ok(messages::PROMPT_SOURCE_KIND),
            Action::InvalidSourceKind => Executed::ok(messages::INVALID_SOURCE_KIND),
            Action::PromptRssSource => Executed::ok(messages::PROMPT_RSS_SOURCE),
            Action::AddRssSource(raw) => {
                let source = service.add_rss_source(raw).await?;
                Executed::ok(messages::source_added(&source))
            }
            Action::AddAnnouncementSource => {
                let source = service.add_announcement_source().await?;
                Executed::ok(messages::source_added(&source))
            }
            Action::PromptRemoveSource => {
                let sources = service.list_sources().await?;
                Executed::ok(messages::prompt_remove_source(&sources))
            }
            Action::RemoveSource(raw) => {
                let id = parse_source_id(raw)?;
                match service.remove_source(id).await {
                    Ok(source) => Executed::ok(messages::source_removed(&source)),
                    Err(NewsbotError::NotFound(_)) => {
                        Executed::rejected(messages::source_not_found(id))
                    }
                    Err(e) => return Err(e),
                }
            }
            Action::PromptInterval => {
                let user = service.register_user(chat_id).await?;
                Executed::ok(messages::prompt_interval(user.update_interval))
            }
            Action::SetInterval(raw) => {
                let seconds = service.set_interval(chat_id, raw).await?;
                Executed::ok(messages::interval_set(seconds))
            }
            Action::Cancel => Executed::ok(messages::CANCELLED),
            Action::UnknownCommand(name) => Executed::ok(messages::unknown_command(name)),
            Action::Unrecognized => Executed::ok(messages::UNRECOGNIZED),
        };
        Ok(executed)
    }
}

fn keyboard_for(state: DialogueState) -> ReplyKeyboardMarkup {
    match state {
        DialogueState::Idle => messages::main_keyboard(),
        DialogueState::ChoosingSourceKind => messages::source_kind_keyboard(),
        _ => messages::cancel_keyboard(),
    }
}
