//! Authorization resolver for board access.
//!
//! Requests targeting a board carry one of two credential kinds: the
//! session cookie (a user principal, full access when owner or admin) or a
//! board access token (anonymous, read-only, scoped to exactly one board).
//! Resolution tries credentials in a fixed order and short-circuits on the
//! first one that fully resolves; a token that is valid but scoped to a
//! *different* board falls through to the session path instead of blocking
//! an otherwise legitimate owner or admin.

use axum::http::{HeaderMap, header};
use std::sync::Arc;

use super::{ApiError, AppState, auth};
use crate::db::BoardDetail;
use crate::entities::{boards, users};

const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Outcome of one credential resolver.
pub enum Credential<T> {
    /// The credential was present and valid.
    Resolved(T),
    /// No credential of this kind was offered.
    NotPresent,
    /// A credential was offered but did not check out.
    Invalid,
}

/// Extract a board-token candidate from the request. Priority order:
/// query parameter, Authorization header (Bearer prefix stripped, a bare
/// value accepted as-is), then the X-Access-Token header. First non-empty
/// match wins.
#[must_use]
pub fn extract_token_candidate(
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> Option<String> {
    if let Some(token) = query_token
        && !token.is_empty()
    {
        return Some(token.to_string());
    }

    if let Some(authorization) = headers.get(header::AUTHORIZATION)
        && let Ok(value) = authorization.to_str()
        && !value.is_empty()
    {
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    if let Some(token) = headers.get(ACCESS_TOKEN_HEADER)
        && let Ok(value) = token.to_str()
        && !value.is_empty()
    {
        return Some(value.to_string());
    }

    None
}

/// Resolve a token candidate to the board it is scoped to. Successful
/// resolution touches the token's `last_used_at` as a side effect.
async fn resolve_board_token(
    state: &AppState,
    candidate: Option<String>,
) -> Result<Credential<BoardDetail>, ApiError> {
    let Some(candidate) = candidate else {
        return Ok(Credential::NotPresent);
    };

    let Some(token) = state.store.resolve_access_token(&candidate).await? else {
        return Ok(Credential::Invalid);
    };

    match state.store.find_board_detail(token.board_id).await? {
        Some(detail) => Ok(Credential::Resolved(detail)),
        // Token row outlived its board somehow; treat as a dead credential.
        None => Ok(Credential::Invalid),
    }
}

/// Resolve the session cookie to a user principal.
async fn resolve_session_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Credential<users::Model>, ApiError> {
    if auth::session_token(headers, &state.config.session.cookie_name).is_none() {
        return Ok(Credential::NotPresent);
    }
    match auth::optional_user(state, headers).await? {
        Some(user) => Ok(Credential::Resolved(user)),
        None => Ok(Credential::Invalid),
    }
}

fn can_manage(board: &boards::Model, user: &users::Model) -> bool {
    board.owner_id == user.id || user.is_admin
}

/// Read access to a board. Tries the access-token
/// path first; on success the grant is anonymous and board-scoped. Falls
/// through to the session path, where owner or admin gets the board and
/// anyone else gets Forbidden. No resolvable credential at all is
/// Unauthorized.
pub async fn authorize_board_read(
    state: &Arc<AppState>,
    board_id: i32,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<BoardDetail, ApiError> {
    let candidate = extract_token_candidate(query_token, headers);

    if let Credential::Resolved(detail) = resolve_board_token(state, candidate).await?
        && detail.board.id == board_id
    {
        tracing::debug!(board_id, "Board read authorized via access token");
        return Ok(detail);
    }

    match resolve_session_user(state, headers).await? {
        Credential::Resolved(user) => {
            let detail = state
                .store
                .find_board_detail(board_id)
                .await?
                .ok_or_else(|| ApiError::board_not_found(board_id))?;

            if !can_manage(&detail.board, &user) {
                tracing::warn!(
                    board_id,
                    user_id = user.id,
                    "Board read denied: not owner or admin"
                );
                return Err(ApiError::forbidden(
                    "You don't have permission to access this board",
                ));
            }

            Ok(detail)
        }
        Credential::NotPresent | Credential::Invalid => {
            Err(ApiError::unauthorized("Authentication required"))
        }
    }
}

/// Write access to a board and everything it owns (widgets, settings,
/// access tokens). Only the session/ownership path can grant this; access
/// tokens never authorize mutation.
pub async fn authorize_board_write(
    state: &Arc<AppState>,
    board_id: i32,
    headers: &HeaderMap,
) -> Result<(boards::Model, users::Model), ApiError> {
    let user = auth::require_user(state, headers).await?;

    let board = state
        .store
        .find_board_by_id(board_id)
        .await?
        .ok_or_else(|| ApiError::board_not_found(board_id))?;

    if !can_manage(&board, &user) {
        tracing::warn!(
            board_id,
            user_id = user.id,
            "Board write denied: not owner or admin"
        );
        return Err(ApiError::forbidden(
            "You don't have permission to modify this board",
        ));
    }

    Ok((board, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn query_parameter_wins_over_headers() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer from-header");
        let token = extract_token_candidate(Some("from-query"), &headers);
        assert_eq!(token.as_deref(), Some("from-query"));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer abc123");
        assert_eq!(
            extract_token_candidate(None, &headers).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn bare_authorization_value_is_accepted() {
        let headers = headers_with(header::AUTHORIZATION, "abc123");
        assert_eq!(
            extract_token_candidate(None, &headers).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn dedicated_header_is_last_resort() {
        let headers = headers_with(
            header::HeaderName::from_static(ACCESS_TOKEN_HEADER),
            "xyz789",
        );
        assert_eq!(
            extract_token_candidate(None, &headers).as_deref(),
            Some("xyz789")
        );
    }

    #[test]
    fn empty_candidates_are_skipped() {
        let headers = HeaderMap::new();
        assert!(extract_token_candidate(Some(""), &headers).is_none());
        assert!(extract_token_candidate(None, &headers).is_none());
    }
}
