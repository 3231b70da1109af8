//! Decides what happens to a request before anything is written.

use axum::http::Method;

use crate::{bundle::ResourceId, mime, resource_index::ResourceIndex};

/// What the embedded UI does with a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<'i> {
    /// The bare prefix has been requested. Redirect permanently to `<prefix>/index`.
    Redirect,
    /// An `index` route below the prefix. Serves the resource, which usually is the entry document.
    ServeEntry(&'i ResourceId),
    /// Any path which names a resource of the bundle.
    ServeAsset(&'i ResourceId),
    /// Within the namespace of the prefix, but there is nothing to serve.
    NotFound,
    /// Not our business. Handed to the next handler unchanged.
    Delegate,
}

/// Classifies a request. `path` must be percent decoded. Rules are tried in order, the first match
/// wins:
///
/// 1. `GET` of the prefix itself, with or without trailing slash: [`Outcome::Redirect`]
/// 2. `GET` of `/<prefix>/index...`: an exact match in the bundle is served as
///    [`Outcome::ServeEntry`]. Otherwise the path is treated as a client side route. Resources
///    referenced relative to such a route, e.g. `/<prefix>/index/settings/assets/app.js`, are
///    served as [`Outcome::ServeAsset`]. A route ending in a file name with an extension which
///    does not exist is [`Outcome::NotFound`]. Any other route gets the entry document, so the
///    application loads.
/// 3. `GET` of any path naming a resource: [`Outcome::ServeAsset`]. This includes paths outside of
///    the prefix.
/// 4. `GET` of any other path below the prefix: [`Outcome::NotFound`]
/// 5. Everything else: [`Outcome::Delegate`]
///
/// `HEAD` is classified like `GET`. All other methods are delegated.
pub fn classify<'i>(index: &'i ResourceIndex, method: &Method, path: &str) -> Outcome<'i> {
    if method != Method::GET && method != Method::HEAD {
        return Outcome::Delegate;
    }

    let prefix = index.prefix();
    if prefix.is_exactly(path) {
        return Outcome::Redirect;
    }

    let below_prefix = prefix.strip(path);
    if let Some(rest) = below_prefix
        && starts_with_ignore_ascii_case(rest.trim_start_matches('/'), "index")
    {
        return classify_index_route(index, path, rest);
    }

    match (index.resolve(path), below_prefix) {
        (Some(id), _) => Outcome::ServeAsset(id),
        (None, Some(_)) => Outcome::NotFound,
        (None, None) => Outcome::Delegate,
    }
}

/// `rest` is the path below the prefix, starting with the `index` segment.
fn classify_index_route<'i>(index: &'i ResourceIndex, path: &str, rest: &str) -> Outcome<'i> {
    if let Some(id) = index.resolve(path) {
        return Outcome::ServeEntry(id);
    }

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    // Longest suffix first, so `index/a/assets/app.js` prefers `a/assets/app.js` over `app.js`.
    for start in 1..segments.len() {
        if let Some(id) = index.get(&segments[start..].join("/")) {
            return Outcome::ServeAsset(id);
        }
    }

    if segments.len() > 1 && mime::extension_of(rest).is_some() {
        return Outcome::NotFound;
    }
    match index.entry() {
        Some(id) => Outcome::ServeEntry(id),
        None => Outcome::NotFound,
    }
}

fn starts_with_ignore_ascii_case(text: &str, start: &str) -> bool {
    text.get(..start.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(start))
}
