use async_trait::async_trait;
use rand::rng;
use rand::seq::IndexedRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use course_core::grading::{GradingRequest, GradingResult};
use course_core::model::LessonDefinition;

use crate::config::MentorConfig;
use crate::error::{ConfigError, MentorError};

const PRACTICE_TOPICS: [&str; 6] = [
    "Marketing",
    "Coding",
    "Creative Writing",
    "Data Analysis",
    "Roleplaying",
    "Crisis Management",
];

/// Grades submissions and invents practice tasks.
#[async_trait]
pub trait Mentor: Send + Sync {
    /// Judge a submission. Never fails: transport problems and unreadable
    /// answers are reported as failed grades with explanatory feedback.
    async fn grade(&self, request: &GradingRequest) -> GradingResult;

    /// Produce a fresh practice task.
    ///
    /// # Errors
    ///
    /// Returns `MentorError` when the mentor is disabled, unreachable, or
    /// answers with something that is not a task.
    async fn generate_task(&self) -> Result<LessonDefinition, MentorError>;
}

/// `Mentor` backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct MentorService {
    client: Client,
    config: Option<MentorConfig>,
}

impl MentorService {
    /// # Errors
    ///
    /// Returns `ConfigError` if the environment holds an invalid base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(MentorConfig::from_env()?))
    }

    #[must_use]
    pub fn new(config: Option<MentorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, system: String, user: String) -> Result<String, MentorError> {
        let config = self.config.as_ref().ok_or(MentorError::Disabled)?;

        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(config.completions_url())
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MentorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(MentorError::EmptyResponse)
    }
}

#[async_trait]
impl Mentor for MentorService {
    async fn grade(&self, request: &GradingRequest) -> GradingResult {
        match self
            .complete(grading_instructions(request), request.submission.clone())
            .await
        {
            Ok(text) => {
                let result = GradingResult::from_model_output(&text);
                debug!(passed = result.passed, score = result.score, "submission graded");
                result
            }
            Err(err) => {
                warn!(error = %err, "grading request failed");
                GradingResult::transport_failure()
            }
        }
    }

    async fn generate_task(&self) -> Result<LessonDefinition, MentorError> {
        let topic = PRACTICE_TOPICS.choose(&mut rng()).copied().unwrap_or("Marketing");
        let text = self
            .complete(
                task_instructions(topic),
                "Generate a new random daily challenge.".to_string(),
            )
            .await?;
        let task = LessonDefinition::from_generated(&text)?;
        debug!(topic, title = %task.title, "practice task generated");
        Ok(task)
    }
}

fn grading_instructions(request: &GradingRequest) -> String {
    format!(
        "You are an expert Prompt Engineering Mentor.\n\
         You are grading a student's submission for a specific day of a course.\n\n\
         Current Module: {title}\n\
         Task: {task}\n\
         Grading Criteria: {criteria}\n\n\
         Evaluate the user's message strictly against the Grading Criteria.\n\
         Be constructive and encouraging, but firm on the criteria.\n\
         If they fail, explain exactly what is missing.\n\
         If they pass, give a brief compliment and explain why it was good.\n\n\
         Answer with a JSON object: {{\"passed\": boolean, \"feedback\": string \
         (Markdown allowed), \"score\": integer from 1 to 100}}.",
        title = request.lesson_title,
        task = request.task,
        criteria = request.grading_criteria,
    )
}

fn task_instructions(topic: &str) -> String {
    format!(
        "You are a Prompt Engineering Course Creator.\n\
         Generate a unique, challenging practical exercise about {topic}.\n\n\
         Answer with a JSON object with these string fields:\n\
         title: a catchy title for the challenge.\n\
         theory: a brief (2-3 sentences) tip or technique related to the task.\n\
         example: a short example of input and output for the technique.\n\
         task: a specific, hard scenario the user must solve by writing a prompt.\n\
         gradingCriteria: what specifically should be in their prompt."
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
