//! Model-facing conversation history.

use chat_provider::{ChatMessage, RunId, RunRequest};

/// History sent with every request. The remote service keeps no state
/// between calls, so this is the whole conversation as it sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    instructions: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            messages: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Records a model reply. Empty replies are not recorded.
    pub fn commit_reply(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.is_empty() {
            return false;
        }
        self.messages.push(ChatMessage::assistant(text));
        true
    }

    pub fn request(&self, run_id: RunId) -> RunRequest {
        RunRequest {
            run_id,
            messages: self.messages.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_full_history_and_instructions() {
        let mut session = ChatSession::new("answer concisely.");
        session.push_user("2+2?");
        assert!(session.commit_reply("4"));
        session.push_user("3+3?");

        let request = session.request(7);
        assert_eq!(request.run_id, 7);
        assert_eq!(request.instructions, "answer concisely.");
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::user("2+2?"),
                ChatMessage::assistant("4"),
                ChatMessage::user("3+3?"),
            ]
        );
    }

    #[test]
    fn empty_reply_is_not_committed() {
        let mut session = ChatSession::new("");
        session.push_user("hi");
        assert!(!session.commit_reply(""));
        assert_eq!(session.len(), 1);
    }
}
