//! The set of named resources the UI is served from.

use std::{fmt, io, io::Cursor, marker::PhantomData, pin::Pin, sync::Arc};

use rust_embed::RustEmbed;
use sha2::{Digest, Sha256};
use tokio::io::AsyncRead;

/// Byte stream of a single resource. Opened per request and dropped at the end of it.
pub type ResourceStream = Pin<Box<dyn AsyncRead + Send>>;

/// Identifies a resource within a bundle. Unlike flattened, dot joined names the relative path is
/// kept intact, so `a/app.js` and `b/app.js` never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Name of the bundle the resource belongs to. Informational only, it is never matched against
    /// request paths.
    pub namespace: String,
    /// Path relative to the root of the bundle, separated by `/`, e.g. `assets/app.js`.
    pub path: String,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// A read only, enumerable set of resources, known at construction time.
pub trait ResourceSet: Send + Sync + 'static {
    /// All resources in enumeration order. Called once, then the UI is constructed.
    fn resources(&self) -> Vec<ResourceId>;

    /// Opens a fresh stream of the resources content. May be called any number of times, also
    /// concurrently for the same resource.
    fn open(&self, id: &ResourceId) -> impl Future<Output = io::Result<ResourceStream>> + Send;

    /// Quoted entity tag of the resources content, e.g. `"3a7bd3e2"`. Identical content yields an
    /// identical tag. `None` if the set can not tell, in which case no `ETag` is sent.
    fn etag(&self, _id: &ResourceId) -> Option<String> {
        None
    }
}

/// Quoted, hex encoded SHA-256 digest.
fn quoted_etag(digest: &[u8]) -> String {
    format!("\"{}\"", hex::encode(digest))
}

/// Resources compiled into the binary with `rust-embed`.
///
/// ```ignore
/// #[derive(RustEmbed)]
/// #[folder = "ui/"]
/// struct UiAssets;
///
/// let bundle = EmbeddedBundle::<UiAssets>::new("ui");
/// ```
pub struct EmbeddedBundle<E> {
    namespace: String,
    _assets: PhantomData<fn() -> E>,
}

impl<E> EmbeddedBundle<E> {
    pub fn new(namespace: impl Into<String>) -> Self {
        EmbeddedBundle {
            namespace: namespace.into(),
            _assets: PhantomData,
        }
    }
}

impl<E> ResourceSet for EmbeddedBundle<E>
where
    E: RustEmbed + 'static,
{
    fn resources(&self) -> Vec<ResourceId> {
        E::iter()
            .map(|path| ResourceId {
                namespace: self.namespace.clone(),
                path: path.into_owned(),
            })
            .collect()
    }

    async fn open(&self, id: &ResourceId) -> io::Result<ResourceStream> {
        let file = E::get(&id.path).ok_or_else(|| not_found(id))?;
        Ok(Box::pin(Cursor::new(file.data)))
    }

    fn etag(&self, id: &ResourceId) -> Option<String> {
        let file = E::get(&id.path)?;
        Some(quoted_etag(&file.metadata.sha256_hash()))
    }
}

/// Resources held in memory. Useful for hosts which generate their assets at startup.
#[derive(Clone, Debug, Default)]
pub struct MemoryBundle {
    namespace: String,
    files: Vec<MemoryFile>,
}

#[derive(Clone, Debug)]
struct MemoryFile {
    id: ResourceId,
    content: Arc<[u8]>,
    etag: String,
}

impl MemoryBundle {
    pub fn new(namespace: impl Into<String>) -> Self {
        MemoryBundle {
            namespace: namespace.into(),
            files: Vec::new(),
        }
    }

    /// Adds a file at `path`. Files are enumerated in the order they are added.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let id = ResourceId {
            namespace: self.namespace.clone(),
            path: path.into(),
        };
        let content: Arc<[u8]> = content.into().into();
        let etag = quoted_etag(&Sha256::digest(&content));
        self.files.push(MemoryFile { id, content, etag });
        self
    }
}

impl ResourceSet for MemoryBundle {
    fn resources(&self) -> Vec<ResourceId> {
        self.files.iter().map(|file| file.id.clone()).collect()
    }

    async fn open(&self, id: &ResourceId) -> io::Result<ResourceStream> {
        let file = self.file(id).ok_or_else(|| not_found(id))?;
        Ok(Box::pin(Cursor::new(file.content.clone())))
    }

    fn etag(&self, id: &ResourceId) -> Option<String> {
        self.file(id).map(|file| file.etag.clone())
    }
}

impl MemoryBundle {
    fn file(&self, id: &ResourceId) -> Option<&MemoryFile> {
        self.files.iter().find(|file| &file.id == id)
    }
}

fn not_found(id: &ResourceId) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("resource '{id}' is not part of the bundle"),
    )
}
