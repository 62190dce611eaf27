//! Daily flashcards and quizzes built from a learner's interests.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, TutorError};

/// Flashcards requested per day.
pub const FLASHCARD_COUNT: usize = 10;

/// Quiz questions requested per day.
pub const QUIZ_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub topic: String,
    pub fact: String,
    #[serde(default)]
    pub seen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub completed: bool,
}

/// One day's generated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyContent {
    pub flashcards: Vec<Flashcard>,
    pub quizzes: Vec<Quiz>,
}

#[derive(Deserialize)]
struct FlashcardSet {
    flashcards: Vec<Flashcard>,
}

#[derive(Deserialize)]
struct QuizSet {
    quizzes: Vec<Quiz>,
}

pub(crate) fn flashcard_prompt(topics: &[String]) -> String {
    format!(
        "Generate {} flashcards with unknown facts for the following topics: {}.\n\
         Return the response in this JSON format:\n\
         {{\"flashcards\": [{{\"id\": \"1\", \"topic\": \"topic_name\", \"fact\": \"interesting fact\", \"seen\": false}}]}}",
        FLASHCARD_COUNT,
        topics.join(", ")
    )
}

pub(crate) fn quiz_prompt(topics: &[String]) -> String {
    format!(
        "Generate {} multiple choice quiz questions for the following topics: {}.\n\
         Return the response in this JSON format:\n\
         {{\"quizzes\": [{{\"id\": \"1\", \"topic\": \"topic_name\", \"question\": \"quiz question\", \
         \"options\": [\"option1\", \"option2\", \"option3\", \"option4\"], \
         \"correctAnswer\": \"correct_option\", \"completed\": false}}]}}",
        QUIZ_COUNT,
        topics.join(", ")
    )
}

pub(crate) fn parse_flashcards(reply: &str) -> Result<Vec<Flashcard>> {
    parse_json::<FlashcardSet>(reply, "flashcards").map(|set| set.flashcards)
}

/// Questions whose answer is not one of their options are dropped.
pub(crate) fn parse_quizzes(reply: &str) -> Result<Vec<Quiz>> {
    let quizzes = parse_json::<QuizSet>(reply, "quizzes")?.quizzes;
    Ok(quizzes
        .into_iter()
        .filter(|q| q.options.contains(&q.correct_answer))
        .collect())
}

/// Decode a JSON reply, tolerating a surrounding Markdown code fence.
fn parse_json<T: DeserializeOwned>(reply: &str, what: &str) -> Result<T> {
    let body = strip_code_fence(reply.trim());
    serde_json::from_str(body).map_err(|e| {
        warn!("Completion did not return valid {} JSON: {}", what, e);
        TutorError::UpstreamEmpty
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}
