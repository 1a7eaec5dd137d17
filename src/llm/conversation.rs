//! Conversation state threaded between analysis calls.
//!
//! The client never stores history. Callers own a [`Conversation`] value and
//! pass it back in for follow-up turns, which keeps independent sessions
//! safe to run concurrently against one client.

use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered turn history for one analysis session.
///
/// The first turn is always the system prompt; user and assistant turns
/// alternate after it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the system prompt and the first user turn.
    pub fn opening(system_prompt: &str, user_text: &str) -> Self {
        Self {
            messages: vec![
                Message::new(Role::System, system_prompt),
                Message::new(Role::User, user_text),
            ],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent assistant reply, if any.
    pub fn last_assistant(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_shape() {
        let conversation = Conversation::opening("be helpful", "analyze this");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.messages()[1].role, Role::User);
    }

    #[test]
    fn test_turns_alternate() {
        let mut conversation = Conversation::opening("sys", "doc");
        conversation.push_assistant("summary");
        conversation.push_user("follow-up");
        conversation.push_assistant("answer");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
        assert_eq!(conversation.last_assistant(), Some("answer"));
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let message = Message::new(Role::Assistant, "hi");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
