use serde::{Deserialize, Serialize};

/// Speaker of one content turn on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<Role>, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Body of a `streamGenerateContent` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
    #[serde(
        rename = "systemInstruction",
        skip_serializing_if = "Option::is_none"
    )]
    pub system_instruction: Option<Content>,
}

impl GeminiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a system instruction; blank text clears it.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.system_instruction = if text.trim().is_empty() {
            None
        } else {
            Some(Content::text(None, text))
        };
        self
    }

    /// Append one turn. Consecutive turns from the same role are merged into
    /// one content block, since the API expects alternating roles.
    pub fn push_turn(&mut self, role: Role, text: impl Into<String>) {
        let part = Part { text: text.into() };
        match self.contents.last_mut() {
            Some(last) if last.role == Some(role) => last.parts.push(part),
            _ => self.contents.push(Content {
                role: Some(role),
                parts: vec![part],
            }),
        }
    }

    pub fn with_turn(mut self, role: Role, text: impl Into<String>) -> Self {
        self.push_turn(role, text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
