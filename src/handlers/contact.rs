use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{ValidJson, non_empty, settings::load_site_settings};
use crate::{
    AppState,
    auth::{AuthUser, normalize_email},
    error::{AppError, AppResult},
    mail::contact_notification,
    models::{
        ContactFilter, ContactRequest, ContactStatus, ContactSubmission, SiteSettings, UpdateContactStatusRequest,
    },
    repository::api_limit,
};

/// submit_contact
///
/// [Public Route] Stores a contact-form message, then notifies sales by e-mail.
/// The submission is accepted even when the notification fails; the outcome is
/// recorded on the row (`email_sent`, `email_error`) for the inbox.
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Submission stored", body = ContactSubmission),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactSubmission>)> {
    let now = Utc::now();
    let submission = state
        .repo
        .create_contact(ContactSubmission {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            email: normalize_email(&req.email),
            company: non_empty(req.company),
            phone: non_empty(req.phone),
            subject: non_empty(req.subject),
            message: req.message.trim().to_string(),
            status: ContactStatus::New,
            email_sent: false,
            email_error: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let recipient = notification_recipient(load_site_settings(&state.repo).await, &state.config.contact_recipient);
    let email = contact_notification(&submission, &recipient);

    let submission = match state.mailer.send(&email).await {
        Ok(()) => {
            tracing::info!(contact_id = %submission.id, "contact notification sent");
            state.repo.record_contact_email(submission.id, true, None).await?
        }
        Err(e) => {
            tracing::error!(contact_id = %submission.id, error = %e, "contact notification failed");
            state.repo.record_contact_email(submission.id, false, Some(e.to_string())).await?
        }
    };

    Ok((StatusCode::CREATED, Json(submission)))
}

/// The configured sales address, or `fallback` when none is set or the settings
/// can not be read. The submission is already stored at this point.
fn notification_recipient(site: AppResult<SiteSettings>, fallback: &str) -> String {
    match site {
        Ok(site) => site.notification_email.unwrap_or_else(|| fallback.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "site settings unavailable, notifying the default recipient");
            fallback.to_string()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/contact-submissions",
    tag = "contact",
    params(ContactFilter),
    responses((status = 200, description = "Inbox, newest first", body = [ContactSubmission]))
)]
pub async fn list_contacts(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ContactFilter>,
) -> AppResult<Json<Vec<ContactSubmission>>> {
    filter.limit = api_limit(filter.limit);
    Ok(Json(state.repo.list_contacts(&filter).await?))
}

#[utoipa::path(
    patch,
    path = "/api/contact-submissions/{id}",
    tag = "contact",
    request_body = UpdateContactStatusRequest,
    responses((status = 200, description = "Updated", body = ContactSubmission), (status = 404, description = "Not found"))
)]
pub async fn update_contact_status(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateContactStatusRequest>,
) -> AppResult<Json<ContactSubmission>> {
    if state.repo.get_contact(id).await?.is_none() {
        return Err(AppError::NotFound("Contact submission"));
    }
    Ok(Json(state.repo.update_contact_status(id, req.status).await?))
}

#[utoipa::path(
    delete,
    path = "/api/contact-submissions/{id}",
    tag = "contact",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_contact(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.delete_contact(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Contact submission"))
    }
}
