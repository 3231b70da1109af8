//! Serves a single page application compiled into the binary from within an axum application.
//!
//! Requests for the route prefix are redirected to `<prefix>/index`, `index` routes load the entry
//! document, and any path naming a resource of the bundle is answered from it. Everything else is
//! handed to the next handler.
//!
//! ```ignore
//! #[derive(RustEmbed)]
//! #[folder = "ui/"]
//! struct UiAssets;
//!
//! let config = UiConfig::new("custom/ui".parse()?);
//! let app = EmbeddedUi::new(config, EmbeddedBundle::<UiAssets>::new("ui"))
//!     .wrap(Router::new().route("/health", get(|| async { "OK" })));
//! ```

pub mod bundle;
pub mod middleware;
pub mod mime;
pub mod prefix;
pub mod resource_index;
pub mod responder;
pub mod routing;

pub use self::{
    bundle::{EmbeddedBundle, MemoryBundle, ResourceId, ResourceSet, ResourceStream},
    middleware::{EmbeddedUi, UiConfig, serve_embedded_ui},
    prefix::{InvalidPrefix, RoutePrefix},
    responder::ServeError,
    routing::Outcome,
};
