use std::io;

use axum::{
    body::Body,
    http::{HeaderMap, Method, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use thiserror::Error;
use tokio::io::AsyncReadExt as _;
use tracing::error;

use crate::{
    bundle::{ResourceId, ResourceSet},
    mime::{self, BodyKind},
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reading a resource of the bundle failed. Resources are static, so this points to a broken
/// bundle rather than to something a retry could fix.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to open embedded resource '{id}'")]
    Open {
        id: ResourceId,
        #[source]
        source: io::Error,
    },
    #[error("failed to read embedded resource '{id}'")]
    Read {
        id: ResourceId,
        #[source]
        source: io::Error,
    },
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let source = match &self {
            ServeError::Open { source, .. } | ServeError::Read { source, .. } => source,
        };
        error!(error = %self, %source, "Serving embedded resource failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Writes the content of `id` as a `200 OK` response. Content type is derived from the extension
/// and always carries `charset=utf-8`. Text is re-encoded as UTF-8, binary content is passed
/// through untouched.
///
/// If the set knows an entity tag for `id`, it is sent as `ETag`. A request whose `If-None-Match`
/// matches it is answered with `304 Not Modified` and the resource is not read at all. `HEAD`
/// requests get the same headers as `GET`, but an empty body.
///
/// The resource stream is opened for this call only and dropped before returning, on success as
/// well as on failure.
pub async fn respond(
    set: &impl ResourceSet,
    id: &ResourceId,
    method: &Method,
    request_headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let etag = set.etag(id);
    if let Some(etag) = &etag
        && if_none_match(request_headers, etag)
    {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag.clone())]).into_response());
    }

    let media_type = mime::classify(mime::extension_of(&id.path).unwrap_or_default());
    let content = read_resource(set, id).await?;
    let content = match media_type.body {
        BodyKind::Binary => content,
        BodyKind::Text => into_utf8_text(content).into_bytes(),
    };

    let content_type = format!("{};charset=utf-8", media_type.mime);
    let content_length = content.len().to_string();
    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(content)
    };
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, content_length),
        ],
        AppendHeaders(etag.map(|etag| (header::ETAG, etag))),
        body,
    )
        .into_response())
}

/// `true` if one of the tags listed in `If-None-Match` is `etag`, or the header is `*`. Weak tags
/// match their strong counterpart.
fn if_none_match(request_headers: &HeaderMap, etag: &str) -> bool {
    request_headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}

async fn read_resource(set: &impl ResourceSet, id: &ResourceId) -> Result<Vec<u8>, ServeError> {
    let mut stream = set.open(id).await.map_err(|source| ServeError::Open {
        id: id.clone(),
        source,
    })?;
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .await
        .map_err(|source| ServeError::Read {
            id: id.clone(),
            source,
        })?;
    Ok(content)
}

/// Decodes `bytes` as UTF-8. A byte order mark is dropped, invalid sequences are replaced with
/// `U+FFFD`.
fn into_utf8_text(mut bytes: Vec<u8>) -> String {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
