use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, validate_required_text};
use crate::entity::chatbot_rule;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    #[schema(example = "Kapan pendaftaran beasiswa dibuka?")]
    pub message: String,
}

impl Validate for ChatRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.message, "Message", 2_000)
    }
}

/// Where a chatbot reply came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// A rule keyword occurred verbatim in the message.
    Keyword,
    /// A message word was a near miss of a rule keyword.
    Typo,
    /// No rule matched; the generative model answered.
    Generative,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ChatResponse {
    #[schema(example = "success")]
    pub status: &'static str,
    pub reply: String,
    pub source: ReplySource,
}

/// Body of a failed chat request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ChatErrorResponse {
    #[schema(example = "error")]
    pub status: &'static str,
    pub message: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRuleRequest {
    #[schema(example = "beasiswa")]
    pub keyword: String,
    pub response: String,
}

impl Validate for CreateRuleRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.keyword, "Keyword", 100)?;
        validate_required_text(&self.response, "Response", 10_000)
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateRuleRequest {
    pub keyword: Option<String>,
    pub response: Option<String>,
}

impl Validate for UpdateRuleRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(keyword) = &self.keyword {
            validate_required_text(keyword, "Keyword", 100)?;
        }
        if let Some(response) = &self.response {
            validate_required_text(response, "Response", 10_000)?;
        }
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RuleResponse {
    #[schema(example = "BOT001")]
    pub id: String,
    pub keyword: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<chatbot_rule::Model> for RuleResponse {
    fn from(m: chatbot_rule::Model) -> Self {
        Self {
            id: m.id,
            keyword: m.keyword,
            response: m.response,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
