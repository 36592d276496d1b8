//! Conversation turns and their rendering into prompt context.

use serde::{Deserialize, Serialize};

/// Rendered context for an empty conversation.
pub const NO_PRIOR_CONVERSATION: &str = "No prior conversation";

/// Speaker of a recorded turn.
///
/// Anything other than `user` arriving on the wire is treated as the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    #[serde(other)]
    Assistant,
}

impl TurnRole {
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        }
    }
}

/// One message of the caller's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Render turns (oldest first) as one `Role: content` line each.
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return NO_PRIOR_CONVERSATION.to_string();
    }
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_sentinel() {
        assert_eq!(format_history(&[]), NO_PRIOR_CONVERSATION);
    }

    #[test]
    fn renders_one_line_per_turn_in_order() {
        let turns = vec![
            Turn::user("My room is 12x10 ft"),
            Turn::assistant("Noted."),
            Turn::user("Which paint?"),
        ];
        assert_eq!(
            format_history(&turns),
            "User: My room is 12x10 ft\nAssistant: Noted.\nUser: Which paint?"
        );
    }

    #[test]
    fn unknown_roles_deserialize_as_assistant() {
        let turns: Vec<Turn> = serde_json::from_str(
            r#"[{"role": "user", "content": "hi"}, {"role": "system", "content": "be nice"}]"#,
        )
        .unwrap();
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(format_history(&turns), "User: hi\nAssistant: be nice");
    }
}
