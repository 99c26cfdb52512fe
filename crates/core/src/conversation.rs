//! Conversation-related types.

use std::fmt::{self, Display, Write as _};

use llm_chat_model::ModelMessage;

/// The author of a [`Turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,
    /// The person typing at the prompt.
    User,
    /// The model.
    Assistant,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// One message in a [`Transcript`].
///
/// Turns are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a turn authored by `role`.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl From<&Turn> for ModelMessage {
    fn from(turn: &Turn) -> Self {
        let content = turn.content.clone();
        match turn.role {
            Role::System => ModelMessage::System(content),
            Role::User => ModelMessage::User(content),
            Role::Assistant => ModelMessage::Assistant(content),
        }
    }
}

/// The ordered history of turns sent to a provider for context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates a transcript that starts with a system turn.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(prompt: S) -> Self {
        Self {
            turns: vec![Turn::new(Role::System, prompt)],
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    /// Returns all turns in order.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if there are no turns at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Converts the turns into provider messages.
    pub fn to_messages(&self) -> Vec<ModelMessage> {
        self.turns.iter().map(ModelMessage::from).collect()
    }

    /// Renders the exchanged turns as `You:` and `AI:` lines. The system
    /// turn is left out.
    pub fn format(&self) -> String {
        let mut formatted = String::new();
        for turn in &self.turns {
            let label = match turn.role {
                Role::System => continue,
                Role::User => "You",
                Role::Assistant => "AI",
            };
            // Writing into a `String` never fails.
            let _ = writeln!(formatted, "{label}: {}", turn.content);
        }
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let mut transcript = Transcript::with_system_prompt("Be brief.");
        transcript.push(Turn::new(Role::User, "Hello"));
        transcript.push(Turn::new(Role::Assistant, "Hi there!"));
        assert_eq!(transcript.format(), "You: Hello\nAI: Hi there!\n");
        assert_eq!(Transcript::default().format(), "");
    }

    #[test]
    fn test_to_messages() {
        let mut transcript = Transcript::with_system_prompt("Be brief.");
        transcript.push(Turn::new(Role::User, "Hello"));
        assert_eq!(
            transcript.to_messages(),
            vec![
                ModelMessage::System("Be brief.".to_owned()),
                ModelMessage::User("Hello".to_owned()),
            ]
        );
    }
}
