//! Chat-turn orchestration.

use std::sync::Arc;

use brain_core::{
    hash_prompt, ChatMessage, Completion, CompletionClient, CompletionRequest, ToolDefinition,
    ToolExecutor, GENERATE_IMAGE,
};
use database::models::{ConversationMessage, Role};
use database::{conversation, message, user_profile, Database, TeachingPreferences};
use tracing::{debug, info, warn};

use crate::config::TutorConfig;
use crate::daily::{self, DailyContent, Flashcard, Quiz};
use crate::error::{Result, TutorError};
use crate::prompt::build_system_prompt;

/// System prompt for analogy generation.
pub const ANALOGY_SYSTEM_PROMPT: &str =
    "You are an expert at creating educational analogies that make complex concepts easy to understand.";

/// Difficulty used when the caller names none.
pub const DEFAULT_DIFFICULTY: &str = "intermediate";

/// Returned when daily content is requested before any interest is saved.
pub const NO_INTERESTS_MESSAGE: &str =
    "Please set your interests in your profile to get personalized content";

/// The outcome of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// The persisted assistant message.
    pub message: ConversationMessage,
    /// The conversation title, when this turn derived it.
    pub title: Option<String>,
}

/// The AI tutor.
///
/// Holds no conversation state of its own; every turn re-reads the store.
pub struct Tutor {
    db: Database,
    brain: Arc<dyn CompletionClient>,
    images: Option<Arc<dyn ToolExecutor>>,
    config: TutorConfig,
}

impl Tutor {
    /// Create a tutor over a database and a completion backend.
    pub fn new(db: Database, brain: Arc<dyn CompletionClient>, config: TutorConfig) -> Self {
        info!(
            "Tutor initialized with backend: {}, history: {}, images: {}",
            brain.name(),
            config.history_limit,
            config.enable_images
        );

        Self {
            db,
            brain,
            images: None,
            config,
        }
    }

    /// Attach the executor that serves `generate_image` calls.
    pub fn with_image_tool(mut self, images: Arc<dyn ToolExecutor>) -> Self {
        self.images = Some(images);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    fn image_tool(&self) -> Option<&Arc<dyn ToolExecutor>> {
        self.images
            .as_ref()
            .filter(|tool| self.config.enable_images && tool.supports(GENERATE_IMAGE))
    }

    /// Run one chat turn in a conversation owned by `user_id`.
    ///
    /// The learner's message is persisted before the backend is called and
    /// stays persisted if the call fails. `topic` overrides the topic stored
    /// on the conversation.
    pub async fn chat_turn(
        &self,
        user_id: &str,
        conversation_id: &str,
        user_text: &str,
        topic: Option<&str>,
    ) -> Result<ChatTurn> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(TutorError::InvalidInput("message content is empty".to_string()));
        }

        let pool = self.db.pool();
        let chat = conversation::get_conversation(pool, conversation_id, user_id).await?;

        let prefs = user_profile::get_profile(pool, user_id)
            .await?
            .map(|profile| profile.preferences())
            .unwrap_or_default();
        let topic = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or(chat.topic.as_deref());

        let appended = message::append_message(pool, &chat.id, Role::User, user_text, None).await?;
        let mut title = appended.derived_title;

        let history = message::list_recent_messages(pool, &chat.id, self.config.history_limit).await?;
        let request = self.build_chat_request(&prefs, topic, &history);

        debug!(
            conversation_id = %chat.id,
            messages = request.messages.len(),
            "Requesting completion"
        );
        let completion = self.brain.complete(request).await?;

        let (content, image_url) = self.resolve_reply(&completion).await?;

        let appended = message::append_message(
            pool,
            &chat.id,
            Role::Assistant,
            &content,
            image_url.as_deref(),
        )
        .await?;
        if appended.derived_title.is_some() {
            title = appended.derived_title;
        }

        info!(
            conversation_id = %chat.id,
            has_image = image_url.is_some(),
            "Chat turn complete"
        );

        Ok(ChatTurn {
            message: appended.message,
            title,
        })
    }

    fn build_chat_request(
        &self,
        prefs: &TeachingPreferences,
        topic: Option<&str>,
        history: &[ConversationMessage],
    ) -> CompletionRequest {
        let system_prompt = build_system_prompt(prefs, topic);
        debug!("System prompt fingerprint: {}", hash_prompt(&system_prompt));

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(
            history
                .iter()
                .map(|m| ChatMessage::new(m.role.as_str(), m.content.clone())),
        );

        let mut request = CompletionRequest::new(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);
        if self.image_tool().is_some() {
            request = request.with_tool(ToolDefinition::generate_image());
        }
        request
    }

    /// Reply text plus an image URL from a `generate_image` call, if any.
    async fn resolve_reply(&self, completion: &Completion) -> Result<(String, Option<String>)> {
        let call = completion.tool_call(GENERATE_IMAGE);

        let mut image_prompt = None;
        let mut image_url = None;
        if let Some(call) = call {
            match call.to_request() {
                Ok(request) => {
                    image_prompt = request.get_string("prompt").map(str::to_string);
                    if let Some(tool) = self.image_tool() {
                        let result = tool.execute(request).await;
                        if result.success {
                            image_url = Some(result.content);
                        } else {
                            warn!("Image generation failed: {}", result.content);
                        }
                    } else {
                        warn!("Ignoring generate_image call: images are disabled");
                    }
                }
                Err(e) => warn!("Malformed generate_image arguments: {}", e),
            }
        }

        // A bare tool call still yields a reply: the image description.
        let content = match completion.text_content() {
            Some(text) => text.to_string(),
            None => image_prompt.ok_or(TutorError::UpstreamEmpty)?,
        };

        Ok((content, image_url))
    }

    /// Generate a standalone analogy for `concept`.
    pub async fn generate_analogy(&self, concept: &str, difficulty: Option<&str>) -> Result<String> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(TutorError::InvalidInput("Concept is required".to_string()));
        }
        let difficulty = difficulty
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DIFFICULTY);

        let prompt = format!(
            "Create a clear and engaging analogy to explain the concept of \"{}\" at a {} level. \
             Include both the analogy and a detailed explanation of how it relates to the concept.",
            concept, difficulty
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(ANALOGY_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .temperature(self.config.temperature)
        .max_tokens(self.config.analogy_max_tokens);

        let completion = self.brain.complete(request).await?;
        completion
            .text_content()
            .map(str::to_string)
            .ok_or(TutorError::UpstreamEmpty)
    }

    /// Generate today's flashcards for a set of topics.
    pub async fn generate_flashcards(&self, interests: &[String]) -> Result<Vec<Flashcard>> {
        let topics = non_empty_topics(interests)?;
        let reply = self.complete_daily(daily::flashcard_prompt(&topics)).await?;
        daily::parse_flashcards(&reply)
    }

    /// Generate today's multiple-choice questions for a set of topics.
    pub async fn generate_quizzes(&self, interests: &[String]) -> Result<Vec<Quiz>> {
        let topics = non_empty_topics(interests)?;
        let reply = self.complete_daily(daily::quiz_prompt(&topics)).await?;
        daily::parse_quizzes(&reply)
    }

    /// Flashcards and quizzes from the interests saved on `user_id`'s profile.
    pub async fn daily_content(&self, user_id: &str) -> Result<DailyContent> {
        let interests = user_profile::get_profile(self.db.pool(), user_id)
            .await?
            .map(|profile| profile.preferences().interests)
            .unwrap_or_default();

        let flashcards = self.generate_flashcards(&interests).await?;
        let quizzes = self.generate_quizzes(&interests).await?;

        info!(
            user_id = %user_id,
            flashcards = flashcards.len(),
            quizzes = quizzes.len(),
            "Daily content generated"
        );
        Ok(DailyContent { flashcards, quizzes })
    }

    async fn complete_daily(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .temperature(self.config.temperature)
            .max_tokens(self.config.daily_max_tokens);

        let completion = self.brain.complete(request).await?;
        completion
            .text_content()
            .map(str::to_string)
            .ok_or(TutorError::UpstreamEmpty)
    }
}

fn non_empty_topics(interests: &[String]) -> Result<Vec<String>> {
    let topics: Vec<String> = interests
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect();
    if topics.is_empty() {
        return Err(TutorError::InvalidInput(NO_INTERESTS_MESSAGE.to_string()));
    }
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::BrainError;
    use database::user;
    use mock_brain::{MockImageTool, ScriptedBrain};

    async fn setup() -> (Database, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        user::create_user(db.pool(), "alice", "alice@example.com", "Alice")
            .await
            .unwrap();
        user::create_user(db.pool(), "bob", "bob@example.com", "Bob")
            .await
            .unwrap();
        let chat = conversation::create_conversation(db.pool(), "alice", "New Chat", None)
            .await
            .unwrap();
        (db, chat.id)
    }

    fn tutor(db: &Database, brain: Arc<ScriptedBrain>) -> Tutor {
        Tutor::new(db.clone(), brain, TutorConfig::default())
    }

    #[tokio::test]
    async fn test_chat_turn_persists_both_messages_and_title() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::with_replies(["Torque is a twisting force."]));
        let tutor = tutor(&db, brain.clone());

        let turn = tutor
            .chat_turn("alice", &chat, "What is torque?", None)
            .await
            .unwrap();

        assert_eq!(turn.message.role, Role::Assistant);
        assert_eq!(turn.message.content, "Torque is a twisting force.");
        assert_eq!(turn.title.as_deref(), Some("What is torque?"));

        let messages = message::list_messages(db.pool(), &chat).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);

        let request = brain.last_request().await.unwrap();
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.system_prompt(), Some(crate::GENERIC_SYSTEM_PROMPT));
        assert_eq!(request.messages.len(), 2);
        assert!(request.tools.is_empty());
    }

    #[tokio::test]
    async fn test_chat_turn_uses_preferences_and_topic() {
        let (db, chat) = setup().await;
        user_profile::save_preferences(
            db.pool(),
            "alice",
            &TeachingPreferences {
                teaching_tone: Some("direct".to_string()),
                interests: vec!["cooking".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let brain = Arc::new(ScriptedBrain::with_replies(["ok"]));
        let tutor = tutor(&db, brain.clone());

        tutor
            .chat_turn("alice", &chat, "Explain osmosis", Some("Biology"))
            .await
            .unwrap();

        let request = brain.last_request().await.unwrap();
        let prompt = request.system_prompt().unwrap();
        assert!(prompt.starts_with("You provide clear, concise explanations"));
        assert!(prompt.contains("cooking and culinary arts"));
        assert!(prompt.ends_with("information about Biology."));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let (db, chat) = setup().await;
        for i in 0..14 {
            message::append_message(db.pool(), &chat, Role::User, &format!("m{}", i), None)
                .await
                .unwrap();
        }
        let brain = Arc::new(ScriptedBrain::with_replies(["ok"]));
        let tutor = tutor(&db, brain.clone());

        tutor.chat_turn("alice", &chat, "latest", None).await.unwrap();

        let request = brain.last_request().await.unwrap();
        assert_eq!(request.messages.len(), 11);
        assert_eq!(request.messages.last().unwrap().content, "latest");
    }

    #[tokio::test]
    async fn test_chat_turn_other_users_conversation() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::with_replies(["should not be used"]));
        let tutor = tutor(&db, brain.clone());

        let result = tutor.chat_turn("bob", &chat, "hi", None).await;
        assert!(matches!(result, Err(TutorError::NotFound(_))));
        assert!(brain.requests().await.is_empty());
        assert_eq!(message::count_messages(db.pool(), &chat).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_completion_persists_no_reply() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::new());
        brain.push(Completion::text("   ")).await;
        let tutor = tutor(&db, brain.clone());

        let result = tutor.chat_turn("alice", &chat, "hi", None).await;
        assert!(matches!(result, Err(TutorError::UpstreamEmpty)));

        let result = tutor.chat_turn("alice", &chat, "hi again", None).await;
        assert!(matches!(result, Err(TutorError::UpstreamEmpty)));

        let messages = message::list_messages(db.pool(), &chat).await.unwrap();
        assert!(messages.iter().all(|m| m.role == Role::User));
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::new());
        brain.push_error(BrainError::Timeout).await;
        let tutor = tutor(&db, brain);

        let result = tutor.chat_turn("alice", &chat, "hi", None).await;
        assert!(matches!(result, Err(TutorError::Brain(BrainError::Timeout))));
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let (db, chat) = setup().await;
        let tutor = tutor(&db, Arc::new(ScriptedBrain::new()));
        let result = tutor.chat_turn("alice", &chat, "  ", None).await;
        assert!(matches!(result, Err(TutorError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_image_call_attaches_url() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::new());
        brain
            .push(
                Completion::text("Here is a diagram of a piston.").with_tool_call(
                    "call-1",
                    GENERATE_IMAGE,
                    r#"{"prompt": "a piston cross-section"}"#,
                ),
            )
            .await;
        let images = Arc::new(MockImageTool::new("https://img.example/piston.png"));
        let config = TutorConfig {
            enable_images: true,
            ..Default::default()
        };
        let tutor = Tutor::new(db.clone(), brain.clone(), config).with_image_tool(images.clone());

        let turn = tutor
            .chat_turn("alice", &chat, "Show me a piston", None)
            .await
            .unwrap();

        assert_eq!(
            turn.message.image_url.as_deref(),
            Some("https://img.example/piston.png")
        );
        assert_eq!(turn.message.content, "Here is a diagram of a piston.");
        assert_eq!(images.prompts().await, vec!["a piston cross-section".to_string()]);

        let request = brain.last_request().await.unwrap();
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_image_keeps_text_reply() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::new());
        brain
            .push(Completion::default().with_tool_call(
                "call-1",
                GENERATE_IMAGE,
                r#"{"prompt": "a gearbox"}"#,
            ))
            .await;
        let config = TutorConfig {
            enable_images: true,
            ..Default::default()
        };
        let tutor = Tutor::new(db.clone(), brain, config)
            .with_image_tool(Arc::new(MockImageTool::failing()));

        let turn = tutor
            .chat_turn("alice", &chat, "Draw a gearbox", None)
            .await
            .unwrap();
        assert!(turn.message.image_url.is_none());
        assert_eq!(turn.message.content, "a gearbox");
    }

    #[tokio::test]
    async fn test_reply_text_mentioning_images_does_not_trigger_tool() {
        let (db, chat) = setup().await;
        let brain = Arc::new(ScriptedBrain::with_replies([
            "Here's an image of a cell: imagine a tiny city.",
        ]));
        let images = Arc::new(MockImageTool::new("https://img.example/cell.png"));
        let config = TutorConfig {
            enable_images: true,
            ..Default::default()
        };
        let tutor = Tutor::new(db.clone(), brain, config).with_image_tool(images.clone());

        let turn = tutor.chat_turn("alice", &chat, "What is a cell?", None).await.unwrap();
        assert!(turn.message.image_url.is_none());
        assert!(images.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_generate_analogy() {
        let (db, _) = setup().await;
        let brain = Arc::new(ScriptedBrain::with_replies(["Voltage is like water pressure."]));
        let tutor = tutor(&db, brain.clone());

        let analogy = tutor.generate_analogy("voltage", None).await.unwrap();
        assert_eq!(analogy, "Voltage is like water pressure.");

        let request = brain.last_request().await.unwrap();
        assert_eq!(request.system_prompt(), Some(ANALOGY_SYSTEM_PROMPT));
        assert!(request.messages[1]
            .content
            .starts_with("Create a clear and engaging analogy to explain the concept of \"voltage\" at a intermediate level."));

        let result = tutor.generate_analogy("  ", Some("advanced")).await;
        assert!(matches!(result, Err(TutorError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_daily_content_from_profile_interests() {
        let (db, _) = setup().await;
        user_profile::save_preferences(
            db.pool(),
            "alice",
            &TeachingPreferences {
                interests: vec!["cars".to_string(), "music".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let brain = Arc::new(ScriptedBrain::with_replies([
            r#"{"flashcards": [{"id": "1", "topic": "cars", "fact": "Early cars had tillers."}]}"#,
            r#"```json
{"quizzes": [{"id": 1, "topic": "music", "question": "Keys on a piano?",
  "options": ["66", "88", "92", "100"], "correctAnswer": "88"}]}
```"#,
        ]));
        let tutor = tutor(&db, brain.clone());

        let content = tutor.daily_content("alice").await.unwrap();
        assert_eq!(content.flashcards.len(), 1);
        assert_eq!(content.flashcards[0].fact, "Early cars had tillers.");
        assert_eq!(content.quizzes[0].id, "1");

        let requests = brain.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[0].messages[0].content.contains("topics: cars, music."));
        assert_eq!(requests[0].max_tokens, Some(2000));
        assert!(requests[1].messages[0].content.starts_with("Generate 3 multiple choice"));
    }

    #[tokio::test]
    async fn test_daily_content_requires_interests() {
        let (db, _) = setup().await;
        let brain = Arc::new(ScriptedBrain::new());
        let tutor = tutor(&db, brain.clone());

        let result = tutor.daily_content("alice").await;
        assert!(matches!(result, Err(TutorError::InvalidInput(msg)) if msg == NO_INTERESTS_MESSAGE));

        let result = tutor.generate_quizzes(&["  ".to_string()]).await;
        assert!(matches!(result, Err(TutorError::InvalidInput(_))));
        assert!(brain.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_flashcards_are_upstream_empty() {
        let (db, _) = setup().await;
        let brain = Arc::new(ScriptedBrain::with_replies(["Sure! Here are ten facts..."]));
        let tutor = tutor(&db, brain);

        let result = tutor.generate_flashcards(&["nature".to_string()]).await;
        assert!(matches!(result, Err(TutorError::UpstreamEmpty)));
    }
}
