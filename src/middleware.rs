//! Hooks the embedded UI into an axum application.

use std::{borrow::Cow, sync::Arc};

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    bundle::ResourceSet,
    prefix::RoutePrefix,
    resource_index::ResourceIndex,
    responder::respond,
    routing::{Outcome, classify},
};

/// Configuration of an [`EmbeddedUi`].
#[derive(Clone, Debug)]
pub struct UiConfig {
    /// URL namespace owned by the UI.
    pub prefix: RoutePrefix,
    /// Document served for `index` routes without a matching resource. Relative to the bundle root.
    pub entry_document: String,
}

impl UiConfig {
    pub fn new(prefix: RoutePrefix) -> Self {
        UiConfig {
            prefix,
            entry_document: "index.html".to_owned(),
        }
    }

    pub fn with_entry_document(mut self, entry_document: impl Into<String>) -> Self {
        self.entry_document = entry_document.into();
        self
    }
}

/// A single page application served from a bundle of resources. Immutable after construction, so
/// it can be shared between any number of concurrent requests without synchronization.
pub struct EmbeddedUi<B> {
    bundle: B,
    index: ResourceIndex,
}

impl<B> EmbeddedUi<B>
where
    B: ResourceSet,
{
    pub fn new(config: UiConfig, bundle: B) -> Self {
        let index = ResourceIndex::new(config.prefix, bundle.resources(), &config.entry_document);
        debug!(
            prefix = %index.prefix(),
            resources = index.len(),
            "Indexed embedded UI bundle"
        );
        EmbeddedUi { bundle, index }
    }

    /// Puts the UI in front of every route and the fallback of `router`. Must be called after all
    /// routes have been added.
    pub fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(
            Arc::new(self),
            serve_embedded_ui::<B>,
        ))
    }

    /// Answers `request` from the bundle, or hands it to `next`. The response of `next` is returned
    /// as is.
    ///
    /// The path is percent decoded exactly once, before any matching. Paths which do not decode to
    /// UTF-8 can not name a resource and are handed to `next`.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        // Only the head is borrowed while reading resources, the body is not `Sync`.
        let (parts, body) = request.into_parts();
        let Ok(path) = urlencoding::decode(parts.uri.path()).map(Cow::into_owned) else {
            debug!(uri = %parts.uri, "Path is not percent encoded UTF-8");
            return next.run(Request::from_parts(parts, body)).await;
        };
        let path = path.as_str();
        match classify(&self.index, &parts.method, path) {
            Outcome::Redirect => {
                let location = redirect_location(&parts.uri, &parts.headers);
                debug!(path, %location, "Redirecting to UI entry point");
                (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
            }
            Outcome::ServeEntry(id) | Outcome::ServeAsset(id) => {
                debug!(path, resource = %id, "Serving embedded resource");
                respond(&self.bundle, id, &parts.method, &parts.headers)
                    .await
                    .into_response()
            }
            Outcome::NotFound => {
                debug!(path, "No embedded resource below UI prefix");
                StatusCode::NOT_FOUND.into_response()
            }
            Outcome::Delegate => next.run(Request::from_parts(parts, body)).await,
        }
    }
}

/// Middleware function for [`axum::middleware::from_fn_with_state`].
pub async fn serve_embedded_ui<B>(
    State(ui): State<Arc<EmbeddedUi<B>>>,
    request: Request,
    next: Next,
) -> Response
where
    B: ResourceSet,
{
    ui.handle(request, next).await
}

/// The requested URL with trailing slashes removed and `/index` appended. Absolute if the request
/// tells us the host, either in its URI or via the `Host` header. The query is kept.
fn redirect_location(uri: &Uri, headers: &HeaderMap) -> String {
    let path = uri.path().trim_end_matches('/');
    let host = uri.authority().map(|authority| authority.as_str()).or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
    });
    let mut location = match host {
        Some(host) => {
            let scheme = uri.scheme_str().unwrap_or("http");
            format!("{scheme}://{host}{path}/index")
        }
        None => format!("{path}/index"),
    };
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }
    location
}

#[cfg(test)]
mod tests {
    use std::io;

    use axum::{
        body::Body,
        http::{self, Method},
        routing::{get, post},
    };
    use http_body_util::BodyExt as _;
    use tower::ServiceExt; // for `oneshot`

    use super::*;
    use crate::bundle::{MemoryBundle, ResourceId, ResourceStream};

    const INDEX_HTML: &str = "<!doctype html><title>UI</title><script src=\"app.js\"></script>";
    const APP_JS: &str = "document.title = \"Grüezi\";";
    const LOGO_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\xff";

    fn bundle() -> MemoryBundle {
        MemoryBundle::new("ui")
            .with_file("index.html", INDEX_HTML)
            .with_file("app.js", APP_JS)
            .with_file("logo.png", LOGO_PNG)
    }

    fn app(bundle: impl ResourceSet) -> Router {
        let downstream = Router::new()
            .route("/other/route", get(|| async { "downstream" }))
            .route("/custom/ui", post(|| async { "posted" }))
            .fallback(|| async { (StatusCode::IM_A_TEAPOT, "fallback") });
        let config = UiConfig::new(RoutePrefix::new("custom/ui").unwrap());
        EmbeddedUi::new(config, bundle).wrap(downstream)
    }

    fn get_request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .header(header::HOST, "host")
            .body(Body::empty())
            .unwrap()
    }

    fn header_str<'r>(response: &'r Response, name: header::HeaderName) -> &'r str {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn bare_prefix_redirects_permanently_to_index() {
        // Given
        let app = app(bundle());

        // When
        let response = app.oneshot(get_request("/custom/ui")).await.unwrap();

        // Then
        assert_eq!(StatusCode::MOVED_PERMANENTLY, response.status());
        assert_eq!(
            "http://host/custom/ui/index",
            header_str(&response, header::LOCATION)
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn redirect_keeps_casing_and_drops_trailing_slash() {
        let app = app(bundle());

        let response = app.oneshot(get_request("/Custom/UI/")).await.unwrap();

        assert_eq!(StatusCode::MOVED_PERMANENTLY, response.status());
        assert_eq!(
            "http://host/Custom/UI/index",
            header_str(&response, header::LOCATION)
        );
    }

    #[tokio::test]
    async fn entry_document_is_served_as_html() {
        // Given
        let app = app(bundle());

        // When
        let response = app
            .oneshot(get_request("/custom/ui/index.html"))
            .await
            .unwrap();

        // Then
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "text/html;charset=utf-8",
            header_str(&response, header::CONTENT_TYPE)
        );
        assert_eq!(INDEX_HTML.as_bytes(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn index_route_without_extension_serves_entry_document() {
        let app = app(bundle());

        let response = app.oneshot(get_request("/custom/ui/index")).await.unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(INDEX_HTML.as_bytes(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn script_is_served_as_javascript() {
        let app = app(bundle());

        let response = app.oneshot(get_request("/custom/ui/app.js")).await.unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "text/javascript;charset=utf-8",
            header_str(&response, header::CONTENT_TYPE)
        );
        assert_eq!(APP_JS.as_bytes(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn image_is_served_unchanged() {
        let app = app(bundle());

        let response = app
            .oneshot(get_request("/custom/ui/logo.png"))
            .await
            .unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "image/png;charset=utf-8",
            header_str(&response, header::CONTENT_TYPE)
        );
        assert_eq!(LOGO_PNG, body_bytes(response).await);
    }

    #[tokio::test]
    async fn resource_is_found_outside_of_prefix() {
        let app = app(bundle());

        let response = app.oneshot(get_request("/app.js")).await.unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(APP_JS.as_bytes(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn unknown_route_is_answered_by_downstream() {
        // Given
        let app = app(bundle());

        // When
        let routed = app
            .clone()
            .oneshot(get_request("/other/route"))
            .await
            .unwrap();
        let fallback = app.oneshot(get_request("/elsewhere")).await.unwrap();

        // Then
        assert_eq!(StatusCode::OK, routed.status());
        assert_eq!(b"downstream".as_slice(), body_bytes(routed).await);
        assert_eq!(StatusCode::IM_A_TEAPOT, fallback.status());
        assert_eq!(b"fallback".as_slice(), body_bytes(fallback).await);
    }

    #[tokio::test]
    async fn missing_resource_below_prefix_is_404() {
        let app = app(bundle());

        let response = app
            .oneshot(get_request("/custom/ui/missing.js"))
            .await
            .unwrap();

        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }

    #[tokio::test]
    async fn non_get_request_reaches_downstream() {
        let app = app(bundle());

        let response = app
            .oneshot(
                http::Request::builder()
                    .method(Method::POST)
                    .uri("/custom/ui")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(b"posted".as_slice(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn repeated_requests_yield_identical_responses() {
        let app = app(bundle());

        let first = app
            .clone()
            .oneshot(get_request("/custom/ui/logo.png"))
            .await
            .unwrap();
        let second = app
            .oneshot(get_request("/custom/ui/logo.png"))
            .await
            .unwrap();

        assert_eq!(body_bytes(first).await, body_bytes(second).await);
    }

    #[tokio::test]
    async fn broken_bundle_results_in_500() {
        // Given a bundle which lists a resource it can not open
        struct BrokenBundle;
        impl ResourceSet for BrokenBundle {
            fn resources(&self) -> Vec<ResourceId> {
                vec![ResourceId {
                    namespace: "ui".to_owned(),
                    path: "app.js".to_owned(),
                }]
            }

            async fn open(&self, _id: &ResourceId) -> io::Result<ResourceStream> {
                Err(io::Error::other("corrupt bundle"))
            }
        }
        let app = app(BrokenBundle);

        // When
        let response = app.oneshot(get_request("/custom/ui/app.js")).await.unwrap();

        // Then
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    }

    #[test]
    fn redirect_location_is_relative_without_host() {
        let uri: Uri = "/custom/ui/".parse().unwrap();

        let location = redirect_location(&uri, &HeaderMap::new());

        assert_eq!("/custom/ui/index", location);
    }

    #[test]
    fn redirect_location_keeps_query_and_absolute_uri() {
        let uri: Uri = "https://example.com/custom/ui?theme=dark".parse().unwrap();

        let location = redirect_location(&uri, &HeaderMap::new());

        assert_eq!("https://example.com/custom/ui/index?theme=dark", location);
    }

    #[tokio::test]
    async fn percent_encoded_path_is_decoded_before_matching() {
        // Given
        let app = app(bundle());

        // When the prefix and the file name are percent encoded
        let encoded_prefix = app
            .clone()
            .oneshot(get_request("/custom/u%69/app.js"))
            .await
            .unwrap();
        let encoded_file = app
            .oneshot(get_request("/custom/ui/%61pp.js"))
            .await
            .unwrap();

        // Then both name the same resource
        assert_eq!(StatusCode::OK, encoded_prefix.status());
        assert_eq!(APP_JS.as_bytes(), body_bytes(encoded_prefix).await);
        assert_eq!(StatusCode::OK, encoded_file.status());
        assert_eq!(APP_JS.as_bytes(), body_bytes(encoded_file).await);
    }

    #[tokio::test]
    async fn path_which_is_not_utf8_reaches_downstream() {
        let app = app(bundle());

        let response = app.oneshot(get_request("/custom/ui/%FF")).await.unwrap();

        assert_eq!(StatusCode::IM_A_TEAPOT, response.status());
    }

    #[tokio::test]
    async fn relative_reference_from_client_route_is_served() {
        // Given the entry document loaded at a client side route
        let app = app(bundle());

        // When it resolves `app.js` relative to that route
        let response = app
            .oneshot(get_request("/custom/ui/index/settings/app.js"))
            .await
            .unwrap();

        // Then the script is served, not the entry document
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "text/javascript;charset=utf-8",
            header_str(&response, header::CONTENT_TYPE)
        );
        assert_eq!(APP_JS.as_bytes(), body_bytes(response).await);
    }

    #[tokio::test]
    async fn missing_file_below_index_is_404() {
        let app = app(bundle());

        let response = app
            .oneshot(get_request("/custom/ui/index/x.js"))
            .await
            .unwrap();

        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }

    #[tokio::test]
    async fn head_request_is_answered_without_body() {
        // Given
        let app = app(bundle());

        // When
        let response = app
            .oneshot(
                http::Request::builder()
                    .method(Method::HEAD)
                    .uri("/custom/ui/app.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Then
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            "text/javascript;charset=utf-8",
            header_str(&response, header::CONTENT_TYPE)
        );
        assert_eq!(
            APP_JS.len().to_string(),
            header_str(&response, header::CONTENT_LENGTH)
        );
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn revalidation_with_current_etag_is_not_modified() {
        // Given a client which fetched the logo before
        let app = app(bundle());
        let first = app
            .clone()
            .oneshot(get_request("/custom/ui/logo.png"))
            .await
            .unwrap();
        let etag = header_str(&first, header::ETAG).to_owned();

        // When it revalidates its copy
        let mut request = get_request("/custom/ui/logo.png");
        request
            .headers_mut()
            .insert(header::IF_NONE_MATCH, etag.parse().unwrap());
        let response = app.oneshot(request).await.unwrap();

        // Then
        assert!(!etag.is_empty());
        assert_eq!(StatusCode::NOT_MODIFIED, response.status());
        assert!(body_bytes(response).await.is_empty());
    }
}
