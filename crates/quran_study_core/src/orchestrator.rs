//! The AI study session: turns a tool request into one backend call and interprets
//! the answer as display text or as a quiz.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::domain::{Chapter, QuizQuestion, Verse};
use crate::ports::{PortError, PortResult, ResponseMode, TextGenerationService};
use crate::prompts::{build_prompt, StudyTool};

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "خطأ: لم يتم العثور على مفتاح API_KEY في إعدادات البيئة. يرجى مراجعة دليل الإعداد.";
pub const AI_FAILURE_MESSAGE: &str =
    "عذراً، حدث خطأ أثناء الاتصال بالذكاء الاصطناعي. تأكد من صحة مفتاح الـ API وصلاحيته.";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```(?:json|JSON)?").unwrap());

/// What the study panel should show after a tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Text { title: String, body: String },
    /// An empty question list means generation failed.
    Quiz { title: String, questions: Vec<QuizQuestion> },
    ConfigurationError { title: String, message: String },
    Failed { title: String, message: String },
}

impl AiOutcome {
    pub fn title(&self) -> &str {
        match self {
            AiOutcome::Text { title, .. }
            | AiOutcome::Quiz { title, .. }
            | AiOutcome::ConfigurationError { title, .. }
            | AiOutcome::Failed { title, .. } => title,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizRecord {
    question: String,
    options: Vec<String>,
    correct_index: usize,
}

impl QuizRecord {
    fn to_domain(self) -> PortResult<QuizQuestion> {
        if self.options.is_empty() || self.correct_index >= self.options.len() {
            return Err(PortError::Parse(format!(
                "correctIndex {} does not address one of {} options",
                self.correct_index,
                self.options.len()
            )));
        }
        Ok(QuizQuestion {
            question: self.question,
            options: self.options,
            correct_index: self.correct_index,
        })
    }
}

/// Removes code-fence delimiters a model may wrap around JSON.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Parses a generated quiz. Accepts a bare array or an object wrapping one (JSON-mode
/// backends often insist on an object root).
pub fn parse_quiz(raw: &str) -> PortResult<Vec<QuizQuestion>> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| PortError::Parse(e.to_string()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut fields) => match fields.remove("questions") {
            Some(serde_json::Value::Array(items)) => items,
            _ => fields
                .into_iter()
                .find_map(|(_, v)| match v {
                    serde_json::Value::Array(items) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| PortError::Parse("no question array in object".to_string()))?,
        },
        _ => return Err(PortError::Parse("expected a JSON array of questions".to_string())),
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<QuizRecord>(item)
                .map_err(|e| PortError::Parse(e.to_string()))?
                .to_domain()
        })
        .collect()
}

/// Dispatches study-tool requests to the generative backend.
#[derive(Clone)]
pub struct AiOrchestrator {
    backend: Arc<dyn TextGenerationService>,
}

impl AiOrchestrator {
    pub fn new(backend: Arc<dyn TextGenerationService>) -> Self {
        Self { backend }
    }

    /// Runs one tool. Returns `None` for no-op input (verse tool without a verse, blank
    /// question); no request is issued in that case.
    pub async fn run(&self, tool: &StudyTool, chapter: &Chapter, verse: Option<&Verse>) -> Option<AiOutcome> {
        let prompt = build_prompt(tool, chapter, verse)?;
        let title = prompt.title;

        if !self.backend.has_credential() {
            return Some(AiOutcome::ConfigurationError {
                title,
                message: MISSING_CREDENTIAL_MESSAGE.to_string(),
            });
        }

        let reply = self.backend.generate(&prompt.text, prompt.mode).await;

        let outcome = match prompt.mode {
            ResponseMode::Json => {
                let questions = reply.and_then(|raw| parse_quiz(&raw)).unwrap_or_default();
                AiOutcome::Quiz { title, questions }
            }
            ResponseMode::Text => match reply {
                Ok(body) if !body.trim().is_empty() => AiOutcome::Text { title, body },
                Ok(_) | Err(_) => AiOutcome::Failed {
                    title,
                    message: AI_FAILURE_MESSAGE.to_string(),
                },
            },
        };
        Some(outcome)
    }
}
