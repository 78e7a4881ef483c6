//! Chat menu state machine.
//!
//! Input is classified into commands (slash commands or menu buttons) and
//! free text. [`transition`] maps the current state and the input to an
//! action plus the state to enter when the action succeeds or when the
//! user's input is rejected. Commands are accepted in every state and
//! restart the flow.

use super::messages::{
    BTN_ADD, BTN_ADD_SOURCE, BTN_CANCEL, BTN_CLEAR, BTN_HELP, BTN_INTERVAL, BTN_KEYWORDS,
    BTN_KIND_ANNOUNCEMENTS, BTN_KIND_RSS, BTN_REMOVE, BTN_REMOVE_SOURCE, BTN_SOURCES,
};

/// Where a user is in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogueState {
    /// No pending question.
    #[default]
    Idle,
    /// Waiting for comma-separated keywords.
    AddingKeywords,
    /// Waiting for a keyword to remove.
    RemovingKeyword,
    /// Waiting for the kind of a new source.
    ChoosingSourceKind,
    /// Waiting for `name | url`.
    AddingRssSource,
    /// Waiting for a source number.
    RemovingSource,
    /// Waiting for an interval in seconds.
    SettingInterval,
}

/// A menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Keywords,
    Add,
    Remove,
    Clear,
    Sources,
    AddSource,
    RemoveSource,
    Interval,
    Cancel,
}

impl Command {
    /// Look up a slash command by name, without the slash.
    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "keywords" => Command::Keywords,
            "add" => Command::Add,
            "remove" => Command::Remove,
            "clear" => Command::Clear,
            "sources" => Command::Sources,
            "add_source" => Command::AddSource,
            "remove_source" => Command::RemoveSource,
            "interval" => Command::Interval,
            "cancel" => Command::Cancel,
            _ => return None,
        };
        Some(command)
    }

    /// Look up a menu button by its label.
    pub fn from_button(label: &str) -> Option<Self> {
        let command = match label {
            BTN_KEYWORDS => Command::Keywords,
            BTN_ADD => Command::Add,
            BTN_REMOVE => Command::Remove,
            BTN_CLEAR => Command::Clear,
            BTN_SOURCES => Command::Sources,
            BTN_ADD_SOURCE => Command::AddSource,
            BTN_REMOVE_SOURCE => Command::RemoveSource,
            BTN_INTERVAL => Command::Interval,
            BTN_HELP => Command::Help,
            BTN_CANCEL => Command::Cancel,
            _ => return None,
        };
        Some(command)
    }
}

/// Classified user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A known command.
    Command(Command),
    /// A slash command we do not know.
    UnknownCommand(String),
    /// Anything else.
    Text(String),
}

/// Classify a message text.
pub fn parse_input(text: &str) -> Input {
    let trimmed = text.trim();

    if let Some(command) = Command::from_button(trimmed) {
        return Input::Command(command);
    }

    let Some(without_slash) = trimmed.strip_prefix('/') else {
        return Input::Text(trimmed.to_string());
    };

    // "/add@newsbot extra" -> "add"
    let name = without_slash
        .split_whitespace()
        .next()
        .unwrap_or("")
        .split('@')
        .next()
        .unwrap_or("");

    match Command::from_name(name) {
        Some(command) => Input::Command(command),
        None => Input::UnknownCommand(name.to_string()),
    }
}

/// What the handler should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Welcome,
    ShowHelp,
    ListKeywords,
    PromptAddKeywords,
    AddKeywords(String),
    PromptRemoveKeyword,
    RemoveKeyword(String),
    ClearKeywords,
    ListSources,
    PromptSourceKind,
    InvalidSourceKind,
    PromptRssSource,
    AddRssSource(String),
    AddAnnouncementSource,
    PromptRemoveSource,
    RemoveSource(String),
    PromptInterval,
    SetInterval(String),
    Cancel,
    UnknownCommand(String),
    Unrecognized,
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Action to execute.
    pub action: Action,
    /// Next state if the action succeeds.
    pub on_success: DialogueState,
    /// Next state if the user's input is rejected.
    pub on_invalid: DialogueState,
}

impl Transition {
    fn to(action: Action, next: DialogueState) -> Self {
        Self {
            action,
            on_success: next,
            on_invalid: next,
        }
    }

    fn retry(action: Action, state: DialogueState) -> Self {
        Self {
            action,
            on_success: DialogueState::Idle,
            on_invalid: state,
        }
    }
}

/// The transition function.
pub fn transition(state: DialogueState, input: Input) -> Transition {
    use DialogueState as S;

    match input {
        Input::Command(command) => match command {
            Command::Start => Transition::to(Action::Welcome, S::Idle),
            Command::Help => Transition::to(Action::ShowHelp, S::Idle),
            Command::Keywords => Transition::to(Action::ListKeywords, S::Idle),
            Command::Add => Transition::to(Action::PromptAddKeywords, S::AddingKeywords),
            Command::Remove => Transition::to(Action::PromptRemoveKeyword, S::RemovingKeyword),
            Command::Clear => Transition::to(Action::ClearKeywords, S::Idle),
            Command::Sources => Transition::to(Action::ListSources, S::Idle),
            Command::AddSource => Transition::to(Action::PromptSourceKind, S::ChoosingSourceKind),
            Command::RemoveSource => Transition::to(Action::PromptRemoveSource, S::RemovingSource),
            Command::Interval => Transition::to(Action::PromptInterval, S::SettingInterval),
            Command::Cancel => Transition::to(Action::Cancel, S::Idle),
        },
        Input::UnknownCommand(name) => Transition::to(Action::UnknownCommand(name), S::Idle),
        Input::Text(text) => match state {
            S::Idle => Transition::to(Action::Unrecognized, S::Idle),
            S::AddingKeywords => Transition::retry(Action::AddKeywords(text), state),
            S::RemovingKeyword => Transition::retry(Action::RemoveKeyword(text), state),
            S::ChoosingSourceKind => {
                if text.eq_ignore_ascii_case(BTN_KIND_RSS) || text.eq_ignore_ascii_case("rss") {
                    Transition::to(Action::PromptRssSource, S::AddingRssSource)
                } else if text.eq_ignore_ascii_case(BTN_KIND_ANNOUNCEMENTS) {
                    Transition::to(Action::AddAnnouncementSource, S::Idle)
                } else {
                    Transition::to(Action::InvalidSourceKind, state)
                }
            }
            S::AddingRssSource => Transition::retry(Action::AddRssSource(text), state),
            S::RemovingSource => Transition::retry(Action::RemoveSource(text), state),
            S::SettingInterval => Transition::retry(Action::SetInterval(text), state),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [DialogueState; 7] = [
        DialogueState::Idle,
        DialogueState::AddingKeywords,
        DialogueState::RemovingKeyword,
        DialogueState::ChoosingSourceKind,
        DialogueState::AddingRssSource,
        DialogueState::RemovingSource,
        DialogueState::SettingInterval,
    ];

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(parse_input("/start"), Input::Command(Command::Start));
        assert_eq!(parse_input(" /ADD "), Input::Command(Command::Add));
        assert_eq!(
            parse_input("/add_source@newsbot"),
            Input::Command(Command::AddSource)
        );
        assert_eq!(
            parse_input("/interval 120"),
            Input::Command(Command::Interval)
        );
        assert_eq!(
            parse_input("/frobnicate"),
            Input::UnknownCommand("frobnicate".to_string())
        );
    }

    #[test]
    fn test_parse_buttons() {
        assert_eq!(parse_input(BTN_KEYWORDS), Input::Command(Command::Keywords));
        assert_eq!(parse_input(BTN_CANCEL), Input::Command(Command::Cancel));
        assert_eq!(
            parse_input(BTN_REMOVE_SOURCE),
            Input::Command(Command::RemoveSource)
        );
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(
            parse_input("  bitcoin, eth "),
            Input::Text("bitcoin, eth".to_string())
        );
    }

    #[test]
    fn test_commands_reset_from_every_state() {
        for state in ALL_STATES {
            let t = transition(state, Input::Command(Command::Keywords));
            assert_eq!(t.action, Action::ListKeywords);
            assert_eq!(t.on_success, DialogueState::Idle);

            let t = transition(state, Input::Command(Command::Add));
            assert_eq!(t.on_success, DialogueState::AddingKeywords);
        }
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        for state in ALL_STATES {
            let t = transition(state, Input::Command(Command::Cancel));
            assert_eq!(t.action, Action::Cancel);
            assert_eq!(t.on_success, DialogueState::Idle);
            assert_eq!(t.on_invalid, DialogueState::Idle);
        }
    }

    #[test]
    fn test_text_in_idle_is_unrecognized() {
        let t = transition(DialogueState::Idle, Input::Text("hello".to_string()));
        assert_eq!(t.action, Action::Unrecognized);
        assert_eq!(t.on_success, DialogueState::Idle);
    }

    #[test]
    fn test_adding_keywords_flow() {
        let t = transition(
            DialogueState::AddingKeywords,
            Input::Text("eth, btc".to_string()),
        );
        assert_eq!(t.action, Action::AddKeywords("eth, btc".to_string()));
        assert_eq!(t.on_success, DialogueState::Idle);
        assert_eq!(t.on_invalid, DialogueState::AddingKeywords);
    }

    #[test]
    fn test_invalid_rss_input_stays_in_adding_rss_source() {
        let t = transition(
            DialogueState::AddingRssSource,
            Input::Text("no separator".to_string()),
        );
        assert_eq!(t.action, Action::AddRssSource("no separator".to_string()));
        assert_eq!(t.on_invalid, DialogueState::AddingRssSource);
    }

    #[test]
    fn test_choosing_source_kind() {
        let t = transition(
            DialogueState::ChoosingSourceKind,
            Input::Text(BTN_KIND_RSS.to_string()),
        );
        assert_eq!(t.action, Action::PromptRssSource);
        assert_eq!(t.on_success, DialogueState::AddingRssSource);

        let t = transition(
            DialogueState::ChoosingSourceKind,
            Input::Text(BTN_KIND_ANNOUNCEMENTS.to_string()),
        );
        assert_eq!(t.action, Action::AddAnnouncementSource);
        assert_eq!(t.on_success, DialogueState::Idle);

        let t = transition(
            DialogueState::ChoosingSourceKind,
            Input::Text("podcast".to_string()),
        );
        assert_eq!(t.action, Action::InvalidSourceKind);
        assert_eq!(t.on_success, DialogueState::ChoosingSourceKind);
    }

    #[test]
    fn test_unknown_command_resets() {
        let t = transition(
            DialogueState::SettingInterval,
            Input::UnknownCommand("nope".to_string()),
        );
        assert_eq!(t.action, Action::UnknownCommand("nope".to_string()));
        assert_eq!(t.on_success, DialogueState::Idle);
    }
}
