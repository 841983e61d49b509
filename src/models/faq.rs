use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Faq {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    // Free-text grouping shown as a heading on the FAQ page.
    pub category: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateFaqRequest {
    #[validate(length(min = 1, max = 500, message = "question must be 1-500 characters"))]
    pub question: String,
    #[validate(length(min = 1, message = "answer is required"))]
    pub answer: String,
    #[validate(length(max = 120))]
    pub category: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateFaqRequest {
    #[validate(length(min = 1, max = 500, message = "question must be 1-500 characters"))]
    pub question: Option<String>,
    #[validate(length(min = 1, message = "answer is required"))]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    #[ts(type = "string | null")]
    pub category: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateFaqRequest {
    pub fn apply_to(self, faq: &mut Faq) {
        if let Some(question) = self.question {
            faq.question = question;
        }
        if let Some(answer) = self.answer {
            faq.answer = answer;
        }
        if let Some(category) = self.category {
            faq.category = category;
        }
        if let Some(sort_order) = self.sort_order {
            faq.sort_order = sort_order;
        }
        if let Some(is_active) = self.is_active {
            faq.is_active = is_active;
        }
    }
}
