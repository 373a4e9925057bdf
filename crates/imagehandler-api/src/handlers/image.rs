//! `GET /image`: query parameters in, image or 304 out.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use chrono::{DateTime, Utc};
use http::header;
use imagehandler_core::{AppError, RequestParams};
use imagehandler_services::{ClientCache, ConditionalHeaders, ImageReply, ReplyStatus};
use percent_encoding::percent_decode_str;

use crate::error::HttpAppError;
use crate::state::AppState;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub async fn get_image(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let production = state.handler.config().is_production();
    respond(&state, query.as_deref().unwrap_or_default(), &headers)
        .await
        .map_err(|error| HttpAppError::new(error, production))
}

async fn respond(state: &AppState, query: &str, headers: &HeaderMap) -> Result<Response, AppError> {
    let params = parse_query(query)?;
    let conditional = conditional_headers(headers);
    let reply = state.handler.handle(&params, &conditional).await?;
    into_response(reply)
}

/// Decode an `application/x-www-form-urlencoded` query. Escapes that do not
/// decode to UTF-8 reject the request.
fn parse_query(raw: &str) -> Result<RequestParams, AppError> {
    let mut pairs = Vec::new();
    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        pairs.push((decode_component(key)?, decode_component(value)?));
    }
    Ok(RequestParams::from_pairs(pairs))
}

fn decode_component(raw: &str) -> Result<String, AppError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AppError::BadRequest(format!("Malformed query parameter '{}'", raw)))
}

fn conditional_headers(headers: &HeaderMap) -> ConditionalHeaders {
    let tags: Vec<&str> = headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    ConditionalHeaders {
        if_none_match: (!tags.is_empty()).then(|| tags.join(",")),
        if_modified_since: headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date),
    }
}

fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn http_date(date: DateTime<Utc>) -> String {
    date.format(HTTP_DATE).to_string()
}

fn into_response(reply: ImageReply) -> Result<Response, AppError> {
    let status = match reply.status {
        ReplyStatus::Ok => StatusCode::OK,
        ReplyStatus::NotModified => StatusCode::NOT_MODIFIED,
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, reply.content_type);

    match &reply.client_cache {
        Some(cache) => {
            for (name, value) in cache_headers(cache)? {
                builder = builder.header(name, value);
            }
        }
        None => builder = builder.header(header::CACHE_CONTROL, "no-cache"),
    }

    let body = match reply.status {
        ReplyStatus::Ok => {
            builder = builder.header(header::CONTENT_LENGTH, reply.body.len());
            Body::from(reply.body)
        }
        ReplyStatus::NotModified => Body::empty(),
    };

    builder.body(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to build response");
        AppError::Internal(e.to_string())
    })
}

fn cache_headers(cache: &ClientCache) -> Result<[(header::HeaderName, HeaderValue); 4], AppError> {
    let value = |raw: String| {
        HeaderValue::from_str(&raw).map_err(|e| AppError::Internal(format!("Invalid header value: {}", e)))
    };
    Ok([
        (header::ETAG, value(format!("\"{}\"", cache.etag))?),
        (
            header::CACHE_CONTROL,
            value(format!("public, max-age={}", cache.max_age.as_secs()))?,
        ),
        (header::EXPIRES, value(http_date(cache.expires))?),
        (header::LAST_MODIFIED, value(http_date(cache.last_modified))?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_round_trip() {
        let date = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(date), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(date));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_parse_query_decodes_form_encoding() {
        let params = parse_query("file=my+photo.png&Text=a%26b&&width=&greyscale=1").unwrap();
        assert_eq!(params.get("file"), Some("my photo.png"));
        assert_eq!(params.get("text"), Some("a&b"));
        assert!(params.has("greyscale"));
        assert!(!params.has("width"));
    }

    #[test]
    fn test_parse_query_rejects_invalid_utf8() {
        assert!(matches!(
            parse_query("file=%FF%FE"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(parse_query("%C3=1"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_conditional_headers_join_tags() {
        let mut headers = HeaderMap::new();
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"A\""));
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"B\""));
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_static("garbage"),
        );
        let conditional = conditional_headers(&headers);
        assert_eq!(conditional.if_none_match.as_deref(), Some("\"A\",\"B\""));
        assert!(conditional.if_modified_since.is_none());
    }

    #[test]
    fn test_no_cache_without_client_cache() {
        let reply = ImageReply {
            status: ReplyStatus::Ok,
            body: bytes::Bytes::from_static(b"abc"),
            content_type: "image/png",
            client_cache: None,
        };
        let response = into_response(reply).unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "3");
        assert!(response.headers().get(header::ETAG).is_none());
    }
}
