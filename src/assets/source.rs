use std::path::{Path, PathBuf};

use base64::Engine as _;

use crate::foundation::error::{ReelcastError, ReelcastResult};

/// Bytes fetched for a resource reference, with the MIME type when the reference carried one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedResource {
    /// Declared MIME type (`data:` URLs, `blob:` references), if any.
    pub mime: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

/// Resolves a resource reference (URL or path) into bytes.
///
/// Implementations must be usable from the asset loader's worker threads.
pub trait ResourceFetcher: Send + Sync {
    /// Return `Ok(None)` when the reference scheme is not handled by this fetcher.
    fn try_fetch(&self, reference: &str) -> ReelcastResult<Option<FetchedResource>>;

    /// Fetch or fail with a decode error naming the reference.
    fn fetch(&self, reference: &str) -> ReelcastResult<FetchedResource> {
        self.try_fetch(reference)?.ok_or_else(|| {
            ReelcastError::decode(format!(
                "no fetcher handles resource '{}'",
                abbreviate(reference)
            ))
        })
    }
}

/// Fetcher for `data:` URLs, `file://` URLs and filesystem paths.
///
/// Relative paths resolve against `root`.
#[derive(Clone, Debug)]
pub struct LocalFetcher {
    root: PathBuf,
}

impl LocalFetcher {
    /// Create a fetcher resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_path(&self, raw: &str) -> PathBuf {
        let p = Path::new(raw);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl Default for LocalFetcher {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ResourceFetcher for LocalFetcher {
    fn try_fetch(&self, reference: &str) -> ReelcastResult<Option<FetchedResource>> {
        if reference.starts_with("data:") {
            return parse_data_url(reference).map(Some);
        }
        if reference.starts_with("blob:")
            || reference.starts_with("http://")
            || reference.starts_with("https://")
        {
            return Ok(None);
        }
        let raw = reference.strip_prefix("file://").unwrap_or(reference);
        if raw.is_empty() {
            return Err(ReelcastError::decode("resource path must be non-empty"));
        }
        let path = self.resolve_path(raw);
        let bytes = std::fs::read(&path).map_err(|e| {
            ReelcastError::decode(format!("failed to read '{}': {e}", path.display()))
        })?;
        Ok(Some(FetchedResource { mime: None, bytes }))
    }
}

/// Tries each fetcher in order and returns the first that handles the reference.
#[derive(Default)]
pub struct ChainFetcher {
    fetchers: Vec<std::sync::Arc<dyn ResourceFetcher>>,
}

impl ChainFetcher {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fetcher.
    pub fn with(mut self, fetcher: std::sync::Arc<dyn ResourceFetcher>) -> Self {
        self.fetchers.push(fetcher);
        self
    }
}

impl ResourceFetcher for ChainFetcher {
    fn try_fetch(&self, reference: &str) -> ReelcastResult<Option<FetchedResource>> {
        for f in &self.fetchers {
            if let Some(res) = f.try_fetch(reference)? {
                return Ok(Some(res));
            }
        }
        Ok(None)
    }
}

/// Decode a `data:[<mime>][;base64],<payload>` URL.
pub fn parse_data_url(url: &str) -> ReelcastResult<FetchedResource> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ReelcastError::decode("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ReelcastError::decode("data URL has no ',' separator"))?;

    let mut parts = meta.split(';');
    let mime = parts
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ReelcastError::decode(format!("invalid base64 in data URL: {e}")))?
    } else {
        percent_decode(payload)?
    };
    Ok(FetchedResource { mime, bytes })
}

/// Encode bytes as a base64 `data:` URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn percent_decode(s: &str) -> ReelcastResult<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| ReelcastError::decode("invalid percent escape in data URL"))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Shorten long references (data URLs) for log and error messages.
pub(crate) fn abbreviate(reference: &str) -> String {
    const MAX: usize = 64;
    if reference.len() <= MAX {
        return reference.to_string();
    }
    let mut end = MAX;
    while !reference.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &reference[..end])
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
