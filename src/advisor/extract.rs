//! Decoding of chat-completion replies.
//!
//! Providers disagree on `message.content`: some send a flat string, others an
//! ordered list of typed parts (`{"type": "text", "text": ..}`,
//! `{"type": "output_text", "content": ..}`, ...).

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    PlainText(String),
    PartList(Vec<Value>),
}

impl ChatCompletion {
    /// Lenient decode; a body of unexpected shape reads as "no choices".
    pub fn from_body(body: &Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or_default()
    }

    pub fn first_text(&self) -> Option<String> {
        self.choices.first().and_then(extract_text)
    }
}

/// Assistant text of a single choice, if any.
pub fn extract_text(choice: &Choice) -> Option<String> {
    let content = choice.message.as_ref()?.content.as_ref()?;
    match content {
        MessageContent::PlainText(text) => Some(text.clone()),
        MessageContent::PartList(parts) => {
            let first = parts
                .iter()
                .find_map(|p| non_empty_str(p, "text").or_else(|| non_empty_str(p, "content")));
            if let Some(text) = first {
                return Some(text.to_string());
            }
            let texts: Vec<&str> = parts.iter().filter_map(|p| non_empty_str(p, "text")).collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            }
        }
    }
}

fn non_empty_str<'a>(part: &'a Value, key: &str) -> Option<&'a str> {
    part.as_object()?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
}
