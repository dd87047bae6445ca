//! # Front-end Pages
//!
//! HTML entry points. The landing page and the admin page accept an SSO
//! ticket; everything else under `public/` is served by the static fallback.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct TicketParams {
    ticket: Option<String>,
}

async fn page(path: &Path) -> Result<Html<String>, ApiError> {
    match tokio::fs::read_to_string(path).await {
        Ok(body) => Ok(Html(body)),
        Err(e) => {
            tracing::error!("Cannot serve page {:?}: {}", path, e);
            Err(ApiError::NotFound(format!("page {}", path.display())))
        }
    }
}

/// `/`: public index, or the authenticated view when a valid ticket is given.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketParams>,
) -> Result<Html<String>, ApiError> {
    let Some(ticket) = params.ticket else {
        return page(&state.config.server.public_dir.join("index.html")).await;
    };
    match state
        .validator
        .validate(&ticket, &state.config.sso.service)
        .await
    {
        Some(user) => {
            tracing::info!("SSO login for '{}'", user);
            page(&state.config.server.pages_dir.join("authenticated.html")).await
        }
        None => Err(ApiError::Forbidden),
    }
}

/// `/admin`: only with a ticket valid for the admin service.
pub async fn admin(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TicketParams>,
) -> Result<Html<String>, ApiError> {
    let ticket = params.ticket.ok_or(ApiError::Forbidden)?;
    match state
        .validator
        .validate(&ticket, &state.config.sso.admin_service)
        .await
    {
        Some(user) => {
            tracing::info!("SSO admin login for '{}'", user);
            page(&state.config.server.pages_dir.join("admin.html")).await
        }
        None => Err(ApiError::Forbidden),
    }
}

pub async fn profile(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    page(&state.config.server.public_dir.join("profile.html")).await
}

pub async fn new_member(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    page(&state.config.server.public_dir.join("new.html")).await
}

pub async fn test_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    page(&state.config.server.public_dir.join("test.html")).await
}
