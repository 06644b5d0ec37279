//! Conversation primitives shared by every chat-capable provider.

use serde::{Deserialize, Serialize};

/// Author of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by both Ollama and OpenAI chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One `{role, content}` message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Borrowed wire message, serialized identically for Ollama and OpenAI.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Builds the wire message list: the system instruction (if any) first, then the turns in order.
pub(crate) fn wire_messages<'a>(system: Option<&'a str>, turns: &'a [ChatTurn]) -> Vec<WireMessage<'a>> {
    let mut out = Vec::with_capacity(turns.len() + 1);
    if let Some(sys) = system {
        out.push(WireMessage {
            role: ChatRole::System.as_str(),
            content: sys,
        });
    }
    out.extend(turns.iter().map(|t| WireMessage {
        role: t.role.as_str(),
        content: &t.content,
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_instruction_goes_first() {
        let reply = ChatTurn {
            role: ChatRole::Assistant,
            content: "a1".into(),
        };
        let turns = vec![ChatTurn::user("q1"), reply, ChatTurn::user("q2")];
        let msgs = wire_messages(Some("be grounded"), &turns);
        let roles: Vec<_> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(msgs[0].content, "be grounded");
        assert_eq!(msgs[3].content, "q2");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatTurn::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
