//! Turning backend media paths into fetchable URLs.

use reqwest::Url;

/// Resolves media paths returned by the backend against the API base.
///
/// The backend hands out either storage-relative paths (`media/abc.mp4`)
/// or fully external URLs (a CDN); callers never need to know which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResolver {
    base: String,
}

impl MediaResolver {
    /// Creates a resolver for the given API base. Trailing slashes are dropped.
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// The API base without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Builds `{base}/{path}` with exactly one separating slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Resolves a media path. Empty paths resolve to nothing; absolute
    /// http(s) URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if is_absolute_http(path) {
            return Some(path.to_string());
        }
        Some(self.endpoint(path))
    }

    /// Builds `{base}/videos/{id}[/{suffix}]`, encoding `id` as a single
    /// path segment so it can never change the request target.
    pub fn video_endpoint(&self, id: &str, suffix: Option<&str>) -> String {
        let Ok(mut url) = Url::parse(&self.base) else {
            let path = match suffix {
                Some(suffix) => format!("videos/{}/{}", id, suffix),
                None => format!("videos/{}", id),
            };
            return self.endpoint(&path);
        };

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("videos").push(id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url.to_string()
    }

    /// Direct download link for a finished video.
    pub fn download_url(&self, id: &str) -> String {
        self.video_endpoint(id, Some("download"))
    }
}

fn is_absolute_http(path: &str) -> bool {
    Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
