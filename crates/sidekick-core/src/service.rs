//! Request and reply shapes for the external AI service.

use serde::{Deserialize, Serialize};

/// What the AI service is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiAction {
    Chat,
    Ask,
    Summarize,
    Translate,
    Extract,
    Search,
    Transcribe,
    Tts,
}

impl AiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Ask => "ask",
            Self::Summarize => "summarize",
            Self::Translate => "translate",
            Self::Extract => "extract",
            Self::Search => "search",
            Self::Transcribe => "transcribe",
            Self::Tts => "tts",
        }
    }
}

/// A structured request to the AI service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequest {
    pub action: AiAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AiRequest {
    /// Request carrying a free-form prompt.
    pub fn prompt(action: AiAction, prompt: impl Into<String>) -> Self {
        Self {
            action,
            prompt: Some(prompt.into()),
            text: None,
            target_language: None,
            url: None,
        }
    }

    /// Request carrying a body of text to operate on.
    pub fn text(action: AiAction, text: impl Into<String>) -> Self {
        Self {
            action,
            prompt: None,
            text: Some(text.into()),
            target_language: None,
            url: None,
        }
    }

    /// Request pointing at a remote resource (e.g. audio to transcribe).
    pub fn url(action: AiAction, url: impl Into<String>) -> Self {
        Self {
            action,
            prompt: None,
            text: None,
            target_language: None,
            url: Some(url.into()),
        }
    }
}

/// The AI service's reply. Which field is populated depends on the action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AiReply {
    /// First textual field present, in order of specificity.
    pub fn text(&self) -> Option<&str> {
        [
            &self.summary,
            &self.translation,
            &self.transcription,
            &self.response,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .find(|t| !t.is_empty())
    }

    /// Binary result to relay as an attachment, if any.
    pub fn media_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .or(self.attachment_url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_empty_fields() {
        let req = AiRequest::prompt(AiAction::Chat, "hello");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "chat");
        assert_eq!(json["prompt"], "hello");
        assert!(json.get("text").is_none());
        assert!(json.get("targetLanguage").is_none());
    }

    #[test]
    fn test_translate_request_uses_camel_case() {
        let mut req = AiRequest::text(AiAction::Translate, "bom dia");
        req.target_language = Some("english".into());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["targetLanguage"], "english");
    }

    #[test]
    fn test_reply_text_prefers_specific_field() {
        let reply: AiReply =
            serde_json::from_str(r#"{"response":"generic","summary":"short"}"#).unwrap();
        assert_eq!(reply.text(), Some("short"));
    }

    #[test]
    fn test_reply_blank_text_is_none() {
        let reply: AiReply = serde_json::from_str(r#"{"response":"   "}"#).unwrap();
        assert_eq!(reply.text(), None);
    }

    #[test]
    fn test_reply_media_url() {
        let reply: AiReply =
            serde_json::from_str(r#"{"audioUrl":"https://x/a.ogg"}"#).unwrap();
        assert_eq!(reply.media_url(), Some("https://x/a.ogg"));
        assert!(reply.text().is_none());
    }
}
