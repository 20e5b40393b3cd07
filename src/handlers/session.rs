//! HTTP endpoints for `/session`
//!
//! `POST /session` is the only unauthenticated route. Every other route runs
//! the bearer check first and then the ownership constraint for the session
//! it addresses.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use warp::http::header::{ACCEPT, AUTHORIZATION};
use warp::http::{HeaderMap, StatusCode};
use warp::reply::Response;
use warp::{Filter, Rejection};

use crate::auth::user::IdentifierField;
use crate::constants::{DEFAULT_IDENTIFIER_FIELD, SESSION_PATH};
use crate::core::server::SharedSessionService;
use crate::error::{Result, RustySessionsError};
use crate::handlers::error::{error_response, handle_rejection};
use crate::handlers::negotiate::MediaType;
use crate::security::with_security_headers;
use crate::session::model::{Session, SessionPatch, SessionReplacement, SessionView};
use crate::session::registry::SessionOperation;

/// Maximum accepted JSON body size
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Login payload. The identifier is read from the field named by
/// `identifier_field`, "email" when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub identifier_field: Option<String>,
    pub password: String,
}

impl LoginRequest {
    /// Identifier field and its value
    pub fn identifier(&self) -> Result<(IdentifierField, &str)> {
        let field = IdentifierField::from_str(
            self.identifier_field.as_deref().unwrap_or(DEFAULT_IDENTIFIER_FIELD),
        )?;

        let value = match field {
            IdentifierField::Email => self.email.as_deref(),
            IdentifierField::Username => self.username.as_deref(),
        };

        value
            .map(|v| (field, v))
            .ok_or_else(|| RustySessionsError::ValidationError(format!("'{}' is required", field)))
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: usize,
}

/// Every session route plus `/health`, with rejections rendered and security headers applied
pub fn routes(
    service: SharedSessionService,
) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let login = session_root()
        .and(warp::post())
        .and(accept())
        .and(json_body::<LoginRequest>())
        .and(with_service(service.clone()))
        .and_then(handle_login);

    let current = session_root()
        .and(warp::get())
        .and(accept())
        .and(authorization())
        .and(with_service(service.clone()))
        .and_then(handle_get_current);

    let logout = session_root()
        .and(warp::delete())
        .and(accept())
        .and(authorization())
        .and(with_service(service.clone()))
        .and_then(handle_delete_current);

    let get_by_id = session_by_id()
        .and(warp::get())
        .and(accept())
        .and(authorization())
        .and(with_service(service.clone()))
        .and_then(handle_get_by_id);

    let patch_by_id = session_by_id()
        .and(warp::patch())
        .and(accept())
        .and(authorization())
        .and(json_body::<SessionPatch>())
        .and(with_service(service.clone()))
        .and_then(handle_patch_by_id);

    let put_by_id = session_by_id()
        .and(warp::put())
        .and(accept())
        .and(authorization())
        .and(json_body::<SessionReplacement>())
        .and(with_service(service.clone()))
        .and_then(handle_put_by_id);

    let delete_by_id = session_by_id()
        .and(warp::delete())
        .and(accept())
        .and(authorization())
        .and(with_service(service))
        .and_then(handle_delete_by_id);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| Response::new("OK".into()));

    login
        .or(current)
        .unify()
        .or(logout)
        .unify()
        .or(get_by_id)
        .unify()
        .or(patch_by_id)
        .unify()
        .or(put_by_id)
        .unify()
        .or(delete_by_id)
        .unify()
        .or(health)
        .unify()
        .recover(handle_rejection)
        .unify()
        .map(|reply: Response| with_security_headers(reply))
}

fn session_root() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path(SESSION_PATH).and(warp::path::end())
}

fn session_by_id() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::path(SESSION_PATH)
        .and(warp::path::param::<String>())
        .and(warp::path::end())
}

/// Response media type from `Accept`. Unreadable values fall back like unknown ones.
fn accept() -> impl Filter<Extract = (MediaType,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| {
        MediaType::from_accept(headers.get(ACCEPT).and_then(|value| value.to_str().ok()))
    })
}

/// Raw `Authorization` header. Never rejects: a value that is not visible
/// ASCII is a malformed token and answers 401 like any other.
fn authorization() -> impl Filter<Extract = (Result<Option<String>>,), Error = Infallible> + Clone {
    warp::header::headers_cloned().map(|headers: HeaderMap| {
        headers
            .get(AUTHORIZATION)
            .map(|value| {
                value.to_str().map(str::to_string).map_err(|_| {
                    RustySessionsError::TokenMalformed("authorization header is not visible ASCII".to_string())
                })
            })
            .transpose()
    })
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with_service(
    service: SharedSessionService,
) -> impl Filter<Extract = (SharedSessionService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// Render a success with `status` or the mapped error
fn respond<T: Serialize>(media: MediaType, result: Result<T>, status: StatusCode) -> Response {
    match result {
        Ok(body) => media.render(&body, status),
        Err(e) => error_response(media, &e),
    }
}

async fn handle_login(
    media: MediaType,
    request: LoginRequest,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    Ok(respond(media, login(&request, &service).await, StatusCode::ACCEPTED))
}

async fn login(request: &LoginRequest, service: &SharedSessionService) -> Result<Session> {
    let (field, identifier) = request.identifier()?;
    service.engine.login(identifier, &request.password, field).await
}

async fn handle_get_current(
    media: MediaType,
    authorization: Result<Option<String>>,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    Ok(respond(media, current_session(authorization, &service).await, StatusCode::OK))
}

async fn current_session(authorization: Result<Option<String>>, service: &SharedSessionService) -> Result<SessionView> {
    let identity = service.validator.authenticate(authorization?.as_deref()).await?;
    let view = service.registry.get_session(&identity.token).await?;
    service
        .registry
        .authorize(SessionOperation::Get, &view.session, identity.user_id())?;
    Ok(view)
}

async fn handle_delete_current(
    media: MediaType,
    authorization: Result<Option<String>>,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    Ok(respond(media, delete_current(authorization, &service).await, StatusCode::OK))
}

async fn delete_current(authorization: Result<Option<String>>, service: &SharedSessionService) -> Result<DeleteResponse> {
    let identity = service.validator.authenticate(authorization?.as_deref()).await?;
    let deleted = match service.registry.get_session(&identity.token).await {
        Ok(view) => {
            service
                .registry
                .authorize(SessionOperation::Delete, &view.session, identity.user_id())?;
            service.registry.delete_session(&identity.token).await?
        }
        Err(RustySessionsError::NotFound(_)) => 0,
        Err(e) => return Err(e),
    };
    Ok(DeleteResponse { deleted })
}

async fn handle_get_by_id(
    id: String,
    media: MediaType,
    authorization: Result<Option<String>>,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    let result = async {
        let identity = service.validator.authenticate(authorization?.as_deref()).await?;
        service.registry.get_owned(&id, identity.user_id()).await
    }
    .await;
    Ok(respond(media, result, StatusCode::OK))
}

async fn handle_patch_by_id(
    id: String,
    media: MediaType,
    authorization: Result<Option<String>>,
    patch: SessionPatch,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    let result = async {
        let identity = service.validator.authenticate(authorization?.as_deref()).await?;
        service.registry.patch_owned(&id, identity.user_id(), patch).await
    }
    .await;
    Ok(respond(media, result, StatusCode::OK))
}

async fn handle_put_by_id(
    id: String,
    media: MediaType,
    authorization: Result<Option<String>>,
    replacement: SessionReplacement,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    let result = async {
        let identity = service.validator.authenticate(authorization?.as_deref()).await?;
        service.registry.put_owned(&id, identity.user_id(), replacement).await
    }
    .await;
    Ok(respond(media, result, StatusCode::OK))
}

async fn handle_delete_by_id(
    id: String,
    media: MediaType,
    authorization: Result<Option<String>>,
    service: SharedSessionService,
) -> std::result::Result<Response, Rejection> {
    let result = async {
        let identity = service.validator.authenticate(authorization?.as_deref()).await?;
        let deleted = service.registry.delete_owned(&id, identity.user_id()).await?;
        Ok::<_, RustySessionsError>(DeleteResponse { deleted })
    }
    .await;
    Ok(respond(media, result, StatusCode::OK))
}
