use std::collections::{HashMap, hash_map::Entry};

use tracing::warn;

use crate::{bundle::ResourceId, prefix::RoutePrefix};

/// Resolves request paths to resources of a bundle. Built once, then shared read only between all
/// requests.
#[derive(Debug)]
pub struct ResourceIndex {
    prefix: RoutePrefix,
    by_path: HashMap<String, ResourceId>,
    /// The document loaded for every client side route of the single page application.
    entry: Option<ResourceId>,
}

impl ResourceIndex {
    /// Indexes `resources` by their relative path. If two resources share a path, the first one in
    /// enumeration order wins.
    pub fn new(prefix: RoutePrefix, resources: Vec<ResourceId>, entry_document: &str) -> Self {
        let mut by_path = HashMap::with_capacity(resources.len());
        for id in resources {
            match by_path.entry(id.path.clone()) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                }
                Entry::Occupied(occupied) => {
                    warn!(
                        kept = %occupied.get(),
                        ignored = %id,
                        "Two embedded resources share the same path"
                    );
                }
            }
        }
        let entry_document = entry_document.trim_matches('/');
        let entry = by_path.get(entry_document).cloned();
        if entry.is_none() {
            warn!(entry_document, "Entry document is not part of the bundle");
        }
        ResourceIndex {
            prefix,
            by_path,
            entry,
        }
    }

    pub fn prefix(&self) -> &RoutePrefix {
        &self.prefix
    }

    /// Resource for a request path. The route prefix is removed from the start of the path, the
    /// rest must match the relative path of a resource exactly. The path is expected to be percent
    /// decoded already.
    pub fn resolve(&self, request_path: &str) -> Option<&ResourceId> {
        self.get(normalize(&self.prefix, request_path)?)
    }

    /// Resource at `relative_path` from the root of the bundle.
    pub fn get(&self, relative_path: &str) -> Option<&ResourceId> {
        self.by_path.get(relative_path)
    }

    /// The entry document of the single page application, if the bundle contains it.
    pub fn entry(&self) -> Option<&ResourceId> {
        self.entry.as_ref()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }
}

/// Path relative to the bundle root a request path refers to. `None` if nothing remains after
/// removing the route prefix.
fn normalize<'p>(prefix: &RoutePrefix, request_path: &'p str) -> Option<&'p str> {
    let path = prefix.strip(request_path).unwrap_or(request_path);
    Some(path.trim_matches('/')).filter(|path| !path.is_empty())
}
