//! Token extraction from requests.
//!
//! The default extractor accepts the three token sources of RFC 6750:
//!
//! - `Authorization: Bearer <token>` header (section 2.1)
//! - `access_token` field of a form-encoded body (section 2.2)
//! - `access_token` query parameter (section 2.3)
//!
//! Each source is also exposed as a function so custom extractors can
//! compose them.

use crate::errors::ExtractionError;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, Uri},
};
use bytes::{Bytes, BytesMut};
use futures::{future, stream, StreamExt};

/// Encoded token string as presented by the client.
pub type RawToken = String;

/// Name of the query parameter / form field carrying a token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Maximum form body buffered while looking for a token (64 KiB).
pub const MAX_FORM_BODY_BYTES: usize = 64 * 1024;

const BEARER_PREFIX: &str = "Bearer ";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Pulls the raw token out of a request.
///
/// `Ok(None)` means the request carries no token, which is a normal outcome.
/// The request is mutable so an extractor may buffer the body; it must leave
/// an equivalent body in place for downstream handlers.
#[async_trait]
pub trait TokenExtractor: Send + Sync {
    async fn extract(&self, req: &mut Request) -> Result<Option<RawToken>, ExtractionError>;
}

/// Read a token from the `Authorization` header.
///
/// Returns `None` if the header is absent, not valid ASCII, does not use the
/// `Bearer` scheme, or carries an empty credential.
pub fn token_from_header(headers: &HeaderMap) -> Option<RawToken> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) else {
        tracing::debug!(target: "jwt_guard.extract", "Invalid Authorization header format");
        return None;
    };

    non_empty(token.trim())
}

/// Read a token from the `access_token` query parameter.
pub fn token_from_query(uri: &Uri) -> Option<RawToken> {
    uri.query().and_then(|query| access_token_param(query.as_bytes()))
}

/// Read a token from the `access_token` field of a form-encoded body.
///
/// Only bodies declared as `application/x-www-form-urlencoded` are read. The
/// body is always put back on the request with the same content. A body
/// larger than `MAX_FORM_BODY_BYTES` is not searched and yields `Ok(None)`.
///
/// # Errors
///
/// Returns `ExtractionError::UnreadableBody` if reading the body fails. The
/// bytes read so far followed by the same error are put back, so downstream
/// readers observe the original failure.
pub async fn token_from_form(req: &mut Request) -> Result<Option<RawToken>, ExtractionError> {
    let is_form = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.get(..FORM_CONTENT_TYPE.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        });
    if !is_form {
        return Ok(None);
    }

    let declared_len = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_FORM_BODY_BYTES) {
        tracing::debug!(target: "jwt_guard.extract", "Form body exceeds limit, not searched for a token");
        return Ok(None);
    }

    let mut data = std::mem::take(req.body_mut()).into_data_stream();
    let mut buffered = BytesMut::new();

    while let Some(chunk) = data.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!(target: "jwt_guard.extract", error = %e, "Failed to buffer form body");
                let reason = e.to_string();
                let replay = stream::iter([Ok(buffered.freeze()), Err(e)]);
                *req.body_mut() = Body::from_stream(replay);
                return Err(ExtractionError::UnreadableBody(reason));
            }
        };
        buffered.extend_from_slice(&chunk);

        if buffered.len() > MAX_FORM_BODY_BYTES {
            tracing::debug!(target: "jwt_guard.extract", "Form body exceeds limit, not searched for a token");
            let head = stream::once(future::ready(Ok::<Bytes, axum::Error>(buffered.freeze())));
            *req.body_mut() = Body::from_stream(head.chain(data));
            return Ok(None);
        }
    }

    let bytes = buffered.freeze();
    let token = access_token_param(&bytes);
    *req.body_mut() = Body::from(bytes);

    Ok(token)
}

fn access_token_param(encoded: &[u8]) -> Option<RawToken> {
    url::form_urlencoded::parse(encoded)
        .find(|(name, _)| name == ACCESS_TOKEN_PARAM)
        .and_then(|(_, value)| non_empty(value.trim()))
}

fn non_empty(value: &str) -> Option<RawToken> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// RFC 6750 extractor: header, then form body, then query string.
///
/// The form body is only consulted when the header carries no token, so a
/// request authenticated by header never has its body buffered. The same
/// token presented through several sources is accepted once. Different tokens
/// yield `ExtractionError::MultipleTokens`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTokenExtractor;

#[async_trait]
impl TokenExtractor for DefaultTokenExtractor {
    async fn extract(&self, req: &mut Request) -> Result<Option<RawToken>, ExtractionError> {
        let from_header = token_from_header(req.headers());
        let from_form = match from_header {
            Some(_) => None,
            None => token_from_form(req).await?,
        };
        let from_query = token_from_query(req.uri());

        let mut found = [from_header, from_form, from_query].into_iter().flatten();
        let Some(token) = found.next() else {
            return Ok(None);
        };

        if found.any(|other| other != token) {
            tracing::debug!(target: "jwt_guard.extract", "Request carried conflicting access tokens");
            return Err(ExtractionError::MultipleTokens);
        }

        Ok(Some(token))
    }
}
