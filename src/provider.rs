//! Text provider adapter: turns a verse reference into a [`VerseRecord`]
//! by asking a chat-completion model for worksheet JSON.
//!
//! The HTTP call sits behind [`ChatBackend`] so the retry and parsing rules
//! can be exercised without a network.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{word_count, VerseRecord, TRACE_WORD_LIMIT};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// One retry after the first failure.
const MAX_ATTEMPTS: u32 = 2;

const SYSTEM_PROMPT: &str = "You help Christian homeschoolers create Bible worksheets.";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider returned empty content")]
    EmptyContent,

    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Anything that can answer a chat prompt with text.
pub trait ChatBackend {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat-completions client over blocking `reqwest`.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn new(api_key: Option<String>, model: &str, base_url: &str) -> Result<Self, ProviderError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json()?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prompts
// ────────────────────────────────────────────────────────────────────────────

/// Worksheet request for one reference.
pub fn verse_prompt(reference: &str, version: &str) -> Vec<ChatMessage> {
    let user = format!(
        r#"
Return valid JSON with:
- "verse": the reference
- "fullVerse": full Bible verse from the {upper} version (no reference, capitalize first letter, full sentence).
- "traceableVerse": If fullVerse has {limit} words or fewer, return it exactly. If longer, return the most important self-contained {limit}-word-or-less excerpt that preserves the spiritual message.
- "handwritingLines": 3
- "reflectionQuestion": one simple life-application question
- "imageIdea": coloring prompt based on the verse
- "version": "{lower}"

Rules:
- Capitalize pronouns for God/Jesus (He, His, etc.)
- Use Unicode quotes for internal quotes: “ ” and ‘ ’
- No ASCII straight quotes, no quotes around whole verse
- No extra spaces before punctuation
- Return JSON only, no explanation

Verse: {reference}
"#,
        upper = version.to_uppercase(),
        lower = version.to_lowercase(),
        limit = TRACE_WORD_LIMIT,
    );
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Follow-up asking for a shorter tracing excerpt.
pub fn shorten_prompt(full_verse: &str) -> Vec<ChatMessage> {
    let user = format!(
        r#"
Your previous traceableVerse was too long. Return new JSON with a shorter traceableVerse (<={TRACE_WORD_LIMIT} words) while preserving meaning.

Original verse: {full_verse}

Only return updated JSON, and keep the original fullVerse as-is.
"#
    );
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// The JSON object inside a model reply, tolerating Markdown code fences and
/// surrounding prose.
pub fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub fn parse_record(reply: &str) -> Result<VerseRecord, ProviderError> {
    Ok(serde_json::from_str(extract_json(reply))?)
}

// ────────────────────────────────────────────────────────────────────────────
// Provider
// ────────────────────────────────────────────────────────────────────────────

pub struct VerseProvider<B> {
    backend: B,
}

impl<B: ChatBackend> VerseProvider<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Fetch and parse a record, retrying once on any failure.
    ///
    /// The returned record carries the requested version in upper case.
    /// Required fields are not checked here; that is
    /// [`WorksheetContent::from_record`](crate::content::WorksheetContent::from_record)'s job.
    pub fn fetch_verse(&self, reference: &str, version: &str) -> Result<VerseRecord, ProviderError> {
        let prompt = verse_prompt(reference, version);
        let mut last_error = ProviderError::EmptyContent;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                log::warn!("retrying provider call for {reference} after: {last_error}");
            }
            match self.backend.complete(&prompt).and_then(|reply| parse_record(&reply)) {
                Ok(mut record) => {
                    record.version = Some(version.to_uppercase());
                    log::debug!("provider answered {reference} on attempt {attempt}");
                    return Ok(record);
                }
                Err(e) => last_error = e,
            }
        }
        log::warn!("giving up on {reference}: {last_error}");
        Err(last_error)
    }

    /// If the excerpt is longer than the tracing limit, ask once for a
    /// shorter one. Any failure keeps the record as it was.
    pub fn shorten_traceable(&self, mut record: VerseRecord) -> VerseRecord {
        let too_long = record
            .traceable_verse
            .as_deref()
            .map(|t| word_count(t) > TRACE_WORD_LIMIT)
            .unwrap_or(false);
        if !too_long {
            return record;
        }

        let full = record.full_verse.clone().unwrap_or_default();
        match self
            .backend
            .complete(&shorten_prompt(&full))
            .and_then(|reply| parse_record(&reply))
        {
            Ok(fixed) => {
                if let Some(shorter) = fixed.traceable_verse.filter(|t| !t.trim().is_empty()) {
                    record.traceable_verse = Some(shorter);
                }
            }
            Err(e) => log::warn!("shortening traceable excerpt failed: {e}"),
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replays canned replies and records every prompt it was sent.
    struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<String, ProviderError>>>,
        prompts: RefCell<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl ChatBackend for &ScriptedBackend {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
            self.prompts.borrow_mut().push(messages.to_vec());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyContent))
        }
    }

    const REPLY: &str = r#"{"verse": "John 3:16", "fullVerse": "For God so loved the world", "traceableVerse": "For God so loved the world", "handwritingLines": 3, "reflectionQuestion": "Who?", "imageIdea": "A globe", "version": "esv"}"#;

    #[test]
    fn first_reply_is_used() {
        let backend = ScriptedBackend::new(vec![Ok(REPLY.to_string())]);
        let provider = VerseProvider::new(&backend);
        let record = provider.fetch_verse("John 3:16", "esv").unwrap();
        assert_eq!(record.full_verse.as_deref(), Some("For God so loved the world"));
        assert_eq!(record.version.as_deref(), Some("ESV"));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn retries_exactly_once() {
        let backend = ScriptedBackend::new(vec![
            Err(ProviderError::EmptyContent),
            Ok(REPLY.to_string()),
        ]);
        let provider = VerseProvider::new(&backend);
        assert!(provider.fetch_verse("John 3:16", "esv").is_ok());
        assert_eq!(backend.calls(), 2);

        let backend = ScriptedBackend::new(vec![
            Err(ProviderError::EmptyContent),
            Ok("not json at all".to_string()),
            Ok(REPLY.to_string()),
        ]);
        let provider = VerseProvider::new(&backend);
        let err = provider.fetch_verse("John 3:16", "esv").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let reply = format!("Here you go:\n```json\n{REPLY}\n```");
        let record = parse_record(&reply).unwrap();
        assert_eq!(record.verse.as_deref(), Some("John 3:16"));
    }

    #[test]
    fn prompt_names_version_and_reference() {
        let prompt = verse_prompt("Psalm 23:1", "kjv");
        assert_eq!(prompt[0].role, "system");
        assert!(prompt[1].content.contains("from the KJV version"));
        assert!(prompt[1].content.contains("\"version\": \"kjv\""));
        assert!(prompt[1].content.contains("Verse: Psalm 23:1"));
    }

    #[test]
    fn long_excerpt_is_shortened() {
        let long = vec!["word"; 30].join(" ");
        let record = VerseRecord {
            full_verse: Some(vec!["full"; 40].join(" ")),
            traceable_verse: Some(long),
            ..VerseRecord::default()
        };
        let backend =
            ScriptedBackend::new(vec![Ok(r#"{"traceableVerse": "short excerpt"}"#.to_string())]);
        let provider = VerseProvider::new(&backend);
        let fixed = provider.shorten_traceable(record);
        assert_eq!(fixed.traceable_verse.as_deref(), Some("short excerpt"));
        assert!(backend.prompts.borrow()[0][1].content.contains("Original verse: full full"));
    }

    #[test]
    fn short_excerpt_needs_no_call() {
        let record = VerseRecord {
            traceable_verse: Some("For God so loved".to_string()),
            ..VerseRecord::default()
        };
        let backend = ScriptedBackend::new(Vec::new());
        let provider = VerseProvider::new(&backend);
        assert_eq!(provider.shorten_traceable(record.clone()), record);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn failed_shortening_keeps_record() {
        let record = VerseRecord {
            traceable_verse: Some(vec!["word"; 30].join(" ")),
            ..VerseRecord::default()
        };
        let backend = ScriptedBackend::new(vec![Err(ProviderError::EmptyContent)]);
        let provider = VerseProvider::new(&backend);
        assert_eq!(provider.shorten_traceable(record.clone()), record);
    }

    #[test]
    fn missing_key_is_reported() {
        let err = OpenAiBackend::new(None, DEFAULT_MODEL, DEFAULT_BASE_URL)
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
