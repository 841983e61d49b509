//! REST handlers, one module per resource.
//!
//! Every mutating handler follows the same shape: extract and validate the payload
//! (`ValidJson`), check the cross-row rules (slug uniqueness, parents), build the full
//! row and hand it to the repository.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, FieldError},
    models::{ContentStatus, is_valid_slug, slugify},
};

pub mod auth;
pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod faq;
pub mod media;
pub mod navigation;
pub mod news;
pub mod pages;
pub mod settings;
pub mod users;

/// ValidJson
///
/// `Json<T>` followed by `T::validate()`. Malformed bodies and validation failures
/// both become 400 responses in the common error format, so nothing invalid ever
/// reaches a handler body.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        payload.validate()?;
        Ok(ValidJson(payload))
    }
}

/// Uses the explicit slug when given, otherwise derives one from `source`.
pub(crate) fn resolve_slug(explicit: Option<String>, source: &str) -> AppResult<String> {
    let slug = explicit.unwrap_or_else(|| slugify(source));
    if is_valid_slug(&slug) {
        Ok(slug)
    } else {
        Err(AppError::Validation(vec![FieldError {
            field: "slug".to_string(),
            message: "a slug could not be derived from the title; provide one explicitly".to_string(),
        }]))
    }
}

pub(crate) fn duplicate_slug(kind: &str, slug: &str) -> AppError {
    AppError::BadRequest(format!("A {kind} with slug '{slug}' already exists"))
}

/// Stamps `published_at` the first time a record becomes published.
pub(crate) fn stamp_publication(status: ContentStatus, published_at: &mut Option<DateTime<Utc>>) {
    if status == ContentStatus::Published && published_at.is_none() {
        *published_at = Some(Utc::now());
    }
}

/// Trims and drops empty strings so optional text columns store NULL, not "".
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_derived_when_missing() {
        assert_eq!(resolve_slug(None, "BE-500 Battery Emulator").unwrap(), "be-500-battery-emulator");
        assert_eq!(resolve_slug(Some("custom".into()), "ignored").unwrap(), "custom");
        assert!(matches!(resolve_slug(None, "!!!"), Err(AppError::Validation(_))));
    }

    #[test]
    fn publication_is_stamped_once() {
        let mut at = None;
        stamp_publication(ContentStatus::Draft, &mut at);
        assert!(at.is_none());
        stamp_publication(ContentStatus::Published, &mut at);
        let first = at;
        assert!(first.is_some());
        stamp_publication(ContentStatus::Published, &mut at);
        assert_eq!(at, first);
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" x ".into())), Some("x".into()));
    }
}
