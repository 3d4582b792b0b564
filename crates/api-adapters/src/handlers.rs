//! # Handlers
//!
//! Coordinates the flow between HTTP requests and the catalogue services.
//! Forms are server-side sessions: `GET /boulders/new` and
//! `GET /boulders/{id}/edit` open one, submit and cancel close it.

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use domains::{Boulder, DomainError, UploadRequest};
use serde_json::{json, Value};
use services::{BoulderCard, BoulderForm, FormSession, IntakeState};
use uuid::Uuid;

use crate::error::{status_for, WebResult};
use crate::form_input::FormInput;
use crate::state::AppState;
use crate::views::{FormPage, IndexPage};

fn render(page: &impl Template) -> WebResult<Html<String>> {
    Ok(Html(page.render()?))
}

/// `GET /`
pub async fn list_boulders(State(state): State<AppState>) -> WebResult<Html<String>> {
    // A failed fetch has been logged and left the listing empty.
    let boulders = match state.catalog.list().await {
        Ok(boulders) => boulders,
        Err(_) => state.catalog.boulders().await,
    };
    let cards = boulders.iter().map(BoulderCard::from_boulder).collect();
    render(&IndexPage { cards })
}

/// `GET /boulders/new`
pub async fn new_boulder(State(state): State<AppState>) -> WebResult<Html<String>> {
    let session = FormSession::new(BoulderForm::default_draft(&state.settings));
    let (token, session) = state.open_form(session).await;
    state.catalog.begin_create(token).await;
    render_opened(token, &session).await
}

/// `GET /boulders/{id}/edit`
pub async fn edit_boulder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<Html<String>> {
    let boulder = match state.catalog.find(id).await {
        Some(boulder) => boulder,
        None => {
            let _ = state.catalog.list().await;
            state
                .catalog
                .find(id)
                .await
                .ok_or_else(|| DomainError::NotFound("Boulder".into(), id.to_string()))?
        }
    };

    let form = match BoulderForm::from_persisted(&boulder) {
        Ok(form) => form,
        Err(err) => {
            tracing::warn!(%id, error = %err, "editing boulder with its styles cleared");
            BoulderForm::from_persisted(&Boulder {
                style: None,
                ..boulder
            })?
        }
    };

    let (token, session) = state.open_form(FormSession::new(form)).await;
    state.catalog.begin_edit(token, id).await;
    render_opened(token, &session).await
}

async fn render_opened(token: Uuid, session: &FormSession) -> WebResult<Html<String>> {
    tracing::debug!(%token, "form opened");
    render(&FormPage::from_session(token, session, None).await)
}

/// `POST /boulders/form/{token}`
///
/// Success redirects to the listing. Any failure re-renders the form with
/// what the user entered and an error banner.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    mut multipart: Multipart,
) -> WebResult<Response> {
    let session = state
        .form(token)
        .ok_or_else(|| DomainError::NotFound("Form".into(), token.to_string()))?;
    let mut input = FormInput::read(&mut multipart).await?;

    // Rejected outright: the in-flight submission owns the form until it ends.
    if session.intake().is_uploading() {
        let err = DomainError::UploadInProgress;
        tracing::warn!(%token, "submit rejected while an upload is in flight");
        let page = FormPage::from_session(token, &session, Some(err.to_string())).await;
        return Ok((status_for(&err), render(&page)?).into_response());
    }

    // A new file replaces the selection even when other fields are invalid.
    if let Some(image) = input.image.take() {
        session.intake().select(image).await;
    }

    let mut applied = Ok(());
    session.edit(|form| applied = input.apply(form)).await;

    let outcome = match applied {
        Ok(()) => save(&state, token, &session).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => {
            state.close_form(token).await;
            Ok(Redirect::to("/").into_response())
        }
        Err(err) => {
            tracing::warn!(%token, error = %err, "submission failed");
            let banner = banner(&err, &session).await;
            let page = FormPage::from_session(token, &session, Some(banner)).await;
            Ok((status_for(&err), render(&page)?).into_response())
        }
    }
}

async fn save(state: &AppState, token: Uuid, session: &FormSession) -> domains::Result<()> {
    let record = session
        .prepare_submission(state.converter.as_ref(), state.uploads.as_ref())
        .await?;
    state.catalog.submit(token, &record).await
}

/// Message shown above a form that failed to save.
async fn banner(err: &DomainError, session: &FormSession) -> String {
    let intake_state = session.intake().state().await;
    let unnamed = session.form().await.name.is_empty();
    match (err, intake_state) {
        (DomainError::Conversion(_) | DomainError::Upload(_), IntakeState::Failed(message)) => {
            message
        }
        (DomainError::Validation(_), _) if unnamed => "El nombre es obligatorio.".to_string(),
        _ => err.to_string(),
    }
}

/// `POST /boulders/form/{token}/cancel`
pub async fn cancel_form(State(state): State<AppState>, Path(token): Path<Uuid>) -> Redirect {
    state.close_form(token).await;
    Redirect::to("/")
}

/// `POST /api/boulders`
///
/// JSON contract of the image upload endpoint. Rejections are reported in
/// the body with `success: false`.
pub async fn upload_image(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> impl IntoResponse {
    let response = state.upload_service.handle(&request).await;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(response))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
