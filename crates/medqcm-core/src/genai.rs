//! AI question generation
//!
//! Thin adapter around the Gemini `generateContent` REST endpoint: builds a
//! French QCM prompt with a structured-output schema, maps the JSON result
//! into [`Question`] records, and classifies failures. No retry, backoff,
//! or partial-batch recovery; errors surface to the caller, who decides
//! whether to allow a manual re-invocation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{Question, AI_ID_PREFIX};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 30;

/// Errors from the generation adapter
#[derive(Error, Debug)]
pub enum GenError {
    /// Configuration error: no credential, nothing was sent
    #[error(
        "No API key configured. Set MEDQCM_API_KEY or GEMINI_API_KEY, \
         or add api_key to the config file."
    )]
    MissingApiKey,

    /// The service is rate-limited or overloaded; retry later by hand
    #[error("The generation service is overloaded or out of quota. Try again in a moment.")]
    Quota { details: String },

    /// Transport-level failure
    #[error("Request to the generation service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be used (malformed JSON, wrong shape)
    #[error("The generation service returned an unusable response: {0}")]
    InvalidResponse(String),

    /// Any other service-side failure
    #[error("Generation service error: {0}")]
    Api(String),
}

impl GenError {
    /// Whether a later manual retry is worth suggesting to the user
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenError::Quota { .. } | GenError::Http(_))
    }
}

/// One question as returned by the service, before id assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Client for the generation service
pub struct Generator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Generator {
    /// Build a generator from configuration.
    ///
    /// Fails fast with [`GenError::MissingApiKey`] when no credential is
    /// configured; no network interaction happens in that case.
    pub fn from_config(config: &Config) -> Result<Self, GenError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenError::MissingApiKey)?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
        })
    }

    /// Generate `count` QCM questions about a module.
    ///
    /// An empty or missing response body yields an empty vec, not an error.
    pub async fn generate(
        &self,
        module_name: &str,
        description: Option<&str>,
        count: usize,
    ) -> Result<Vec<Question>, GenError> {
        let prompt = build_prompt(module_name, description, count);
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        debug!(model = %self.model, count, "requesting question generation");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_failure(status.as_u16(), &body));
        }

        let payload: Value = response.json().await?;
        let Some(text) = extract_text(&payload) else {
            debug!("generation response carried no text");
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let raw = parse_raw(text)?;
        let questions = map_questions(raw, Utc::now().timestamp_millis());
        info!(count = questions.len(), module = module_name, "questions generated");
        Ok(questions)
    }
}

/// Build the generation instruction
fn build_prompt(module_name: &str, description: Option<&str>, count: usize) -> String {
    let context = description
        .filter(|d| !d.is_empty())
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();

    format!(
        "Génère {count} questions QCM (Choix Multiples) pour un module de médecine \
         intitulé \"{module_name}\"{context}.\n\
         Pour chaque question :\n\
         - Fournis un énoncé clair.\n\
         - Fournis 4 options de réponse.\n\
         - Indique l'index de la réponse correcte (0 à 3).\n\
         - Fournis une explication brève.\n\
         - Le contenu doit être en français."
    )
}

/// JSON schema the service must honor for its structured output
fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "text": { "type": "STRING" },
                "options": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                },
                "correctIndex": { "type": "INTEGER" },
                "explanation": { "type": "STRING" }
            },
            "required": ["text", "options", "correctIndex", "explanation"]
        }
    })
}

/// Full request body for `generateContent`
fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

/// Pull the generated text out of a `generateContent` response
fn extract_text(payload: &Value) -> Option<&str> {
    payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Parse the structured-output text into raw questions
fn parse_raw(text: &str) -> Result<Vec<RawQuestion>, GenError> {
    serde_json::from_str(text).map_err(|e| GenError::InvalidResponse(e.to_string()))
}

/// Map raw questions to records with fresh `ai-` ids.
///
/// Ids combine the batch timestamp with the in-batch position, so they stay
/// unique even when two questions arrive in the same millisecond.
pub fn map_questions(raw: Vec<RawQuestion>, batch_millis: i64) -> Vec<Question> {
    raw.into_iter()
        .enumerate()
        .map(|(index, r)| {
            let mut question = Question::single(
                format!("{}{}-{}", AI_ID_PREFIX, batch_millis, index),
                r.text,
                r.options,
                r.correct_index,
            );
            question.explanation = r.explanation;
            question
        })
        .collect()
}

/// Markers of a rate-limit or overload condition in an error body
fn is_quota_signal(message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains("quota")
        || msg.contains("rate limit")
        || msg.contains("overload")
        || msg.contains("resource_exhausted")
        || msg.contains("unavailable")
}

/// Classify a non-success HTTP response
fn classify_api_failure(status: u16, body: &str) -> GenError {
    let details: String = body.chars().take(300).collect();
    if status == 429 || status == 503 || is_quota_signal(body) {
        GenError::Quota { details }
    } else {
        GenError::Api(format!("HTTP {}: {}", status, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, correct_index: usize) -> RawQuestion {
        RawQuestion {
            text: text.to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index,
            explanation: Some(format!("{} expliqué", text)),
        }
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        match Generator::from_config(&config) {
            Err(GenError::MissingApiKey) => {}
            other => panic!("expected MissingApiKey, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_api_key_counts_as_missing() {
        let config = Config {
            api_key: Some(String::new()),
            ..Config::default()
        };
        assert!(matches!(
            Generator::from_config(&config),
            Err(GenError::MissingApiKey)
        ));
    }

    #[test]
    fn test_mapping_round_trip() {
        let batch = vec![raw("Q1", 0), raw("Q2", 2), raw("Q3", 3)];
        let expected = batch.clone();

        let questions = map_questions(batch, 1700000000000);
        assert_eq!(questions.len(), 3);

        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);

        for (question, r) in questions.iter().zip(&expected) {
            assert!(question.id.starts_with(AI_ID_PREFIX));
            assert!(!question.is_exam_eligible());
            assert_eq!(question.text, r.text);
            assert_eq!(question.options, r.options);
            assert_eq!(question.single_correct_index(), Some(r.correct_index));
            assert_eq!(question.explanation, r.explanation);
        }
    }

    #[test]
    fn test_parse_raw_well_formed() {
        let text = r#"[
            {"text": "Q?", "options": ["a", "b", "c", "d"], "correctIndex": 1, "explanation": "e"}
        ]"#;
        let raw = parse_raw(text).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].correct_index, 1);
        assert_eq!(raw[0].explanation.as_deref(), Some("e"));
    }

    #[test]
    fn test_parse_raw_malformed_is_invalid_response() {
        assert!(matches!(
            parse_raw("not json at all"),
            Err(GenError::InvalidResponse(_))
        ));
        // A half-parsed batch is not recovered either
        assert!(matches!(
            parse_raw(r#"[{"text": "Q?", "options": ["a"]"#),
            Err(GenError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_extract_text_shapes() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "[]" }] } }
            ]
        });
        assert_eq!(extract_text(&payload), Some("[]"));

        // Missing body yields None (-> empty batch, not an error)
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn test_quota_classification() {
        assert!(matches!(
            classify_api_failure(429, "Too many requests"),
            GenError::Quota { .. }
        ));
        assert!(matches!(
            classify_api_failure(503, "overloaded"),
            GenError::Quota { .. }
        ));
        assert!(matches!(
            classify_api_failure(400, "RESOURCE_EXHAUSTED: quota exceeded"),
            GenError::Quota { .. }
        ));
        assert!(matches!(
            classify_api_failure(500, "internal error"),
            GenError::Api(_)
        ));
    }

    #[test]
    fn test_retryability() {
        assert!(GenError::Quota {
            details: String::new()
        }
        .is_retryable());
        assert!(!GenError::MissingApiKey.is_retryable());
        assert!(!GenError::Api("boom".into()).is_retryable());
        assert!(!GenError::InvalidResponse("bad".into()).is_retryable());
    }

    #[test]
    fn test_prompt_mentions_module_and_count() {
        let prompt = build_prompt("Anatomie I", Some("Ostéologie"), 5);
        assert!(prompt.contains("5 questions"));
        assert!(prompt.contains("Anatomie I"));
        assert!(prompt.contains("Ostéologie"));
        assert!(prompt.contains("4 options"));

        let bare = build_prompt("Cytologie", None, 3);
        assert!(!bare.contains("()"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("p");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let required = &body["generationConfig"]["responseSchema"]["items"]["required"];
        assert_eq!(
            required,
            &json!(["text", "options", "correctIndex", "explanation"])
        );
    }
}
