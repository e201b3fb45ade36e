//! Bidirectional authored-path <-> URL translation, keyed off a configured
//! `webRoot`. Mirrors the substitution rules a webpack dev server's source
//! maps expect, since that is the overwhelming majority of "authored path
//! doesn't match the filesystem" cases in practice.

use std::path::{Path, PathBuf};

use url::Url;

#[derive(Debug, Clone)]
pub struct SourcePathResolverOptions {
    pub web_root: Option<PathBuf>,
    pub base_url: Option<Url>,
    /// `sourceMapPathOverrides`: a pattern containing the literal substring
    /// `"{webRoot}"` mapped to its filesystem replacement, checked in
    /// insertion order.
    pub source_map_path_overrides: Vec<(String, String)>,
}

impl Default for SourcePathResolverOptions {
    fn default() -> Self {
        Self {
            web_root: None,
            base_url: None,
            source_map_path_overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourcePathResolver {
    options: SourcePathResolverOptions,
}

impl SourcePathResolver {
    pub fn new(options: SourcePathResolverOptions) -> Self {
        Self { options }
    }

    /// True when this resolver's runtime is remote enough that a
    /// `sourceMapPathOverrides`-resolved path's content hash should still
    /// be verified against what's on disk (the network may have rewritten
    /// the file in flight).
    pub fn should_check_content_hash(&self) -> bool {
        self.options
            .base_url
            .as_ref()
            .map(|u| !matches!(u.host_str(), Some("localhost") | Some("127.0.0.1") | None))
            .unwrap_or(true)
    }

    pub fn absolute_path_to_url(&self, path: &Path) -> Option<Url> {
        if let (Some(web_root), Some(base_url)) = (&self.options.web_root, &self.options.base_url)
        {
            if let Ok(relative) = path.strip_prefix(web_root) {
                let mut url = base_url.clone();
                let rel_str = relative.to_string_lossy().replace('\\', "/");
                url.set_path(&join_url_path(url.path(), &rel_str));
                return Some(url);
            }
        }
        Url::from_file_path(path).ok()
    }

    pub fn url_to_absolute_path(&self, url_str: &str) -> Option<PathBuf> {
        if let Some(stripped) = url_str.strip_prefix("file://") {
            return Some(PathBuf::from(stripped));
        }

        let web_root = self.options.web_root.as_ref()?;

        for (prefix, replacement) in &self.options.source_map_path_overrides {
            if let Some(rest) = url_str.strip_prefix(prefix.as_str()) {
                let resolved = replacement.replace("{webRoot}", &web_root.to_string_lossy());
                return Some(PathBuf::from(resolved).join(rest));
            }
        }

        if let Some(rest) = url_str.strip_prefix("webpack:///./~/") {
            return Some(web_root.join("node_modules").join(rest));
        }
        if let Some(rest) = url_str.strip_prefix("webpack:///./") {
            return Some(web_root.join(rest));
        }
        if let Some(rest) = url_str.strip_prefix("webpack:///src/") {
            return Some(web_root.join(rest));
        }
        if let Some(rest) = url_str.strip_prefix("webpack:///") {
            return Some(PathBuf::from("/").join(rest));
        }

        let url = Url::parse(url_str).ok()?;
        let base_url = self.options.base_url.as_ref()?;
        if url.host_str() != base_url.host_str() || url.scheme() != base_url.scheme() {
            return None;
        }

        let base_path = base_url.path();
        let relative = url
            .path()
            .strip_prefix(base_path)
            .unwrap_or_else(|| url.path().trim_start_matches('/'));
        let relative = match relative {
            "" | "/" => "index.html",
            other => other.trim_start_matches('/'),
        };
        Some(web_root.join(relative))
    }
}

fn join_url_path(base: &str, relative: &str) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    joined.push('/');
    joined.push_str(relative.trim_start_matches('/'));
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SourcePathResolver {
        SourcePathResolver::new(SourcePathResolverOptions {
            web_root: Some(PathBuf::from("/repo/src")),
            base_url: Some(Url::parse("http://localhost:8080/").unwrap()),
            source_map_path_overrides: Vec::new(),
        })
    }

    #[test]
    fn resolves_webpack_dot_slash_tilde_to_node_modules() {
        let r = resolver();
        let path = r.url_to_absolute_path("webpack:///./~/lodash/index.js").unwrap();
        assert_eq!(path, PathBuf::from("/repo/src/node_modules/lodash/index.js"));
    }

    #[test]
    fn resolves_webpack_dot_slash_to_web_root() {
        let r = resolver();
        let path = r.url_to_absolute_path("webpack:///./app.js").unwrap();
        assert_eq!(path, PathBuf::from("/repo/src/app.js"));
    }

    #[test]
    fn resolves_webpack_src_to_web_root() {
        let r = resolver();
        let path = r.url_to_absolute_path("webpack:///src/app.js").unwrap();
        assert_eq!(path, PathBuf::from("/repo/src/app.js"));
    }

    #[test]
    fn resolves_bare_webpack_to_filesystem_root() {
        let r = resolver();
        let path = r.url_to_absolute_path("webpack:///etc/passwd").unwrap();
        assert_eq!(path, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn strips_file_scheme_directly() {
        let r = resolver();
        let path = r.url_to_absolute_path("file:///tmp/x.js").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.js"));
    }

    #[test]
    fn empty_path_resolves_to_index_html() {
        let r = resolver();
        let path = r.url_to_absolute_path("http://localhost:8080/").unwrap();
        assert_eq!(path, PathBuf::from("/repo/src/index.html"));
    }

    #[test]
    fn applies_source_map_path_overrides_first() {
        let r = SourcePathResolver::new(SourcePathResolverOptions {
            web_root: Some(PathBuf::from("/repo/src")),
            base_url: Some(Url::parse("http://localhost:8080/").unwrap()),
            source_map_path_overrides: vec![("webpack:///".to_string(), "{webRoot}/".to_string())],
        });
        let path = r.url_to_absolute_path("webpack:///app.js").unwrap();
        assert_eq!(path, PathBuf::from("/repo/src/app.js"));
    }

    #[test]
    fn absolute_path_under_web_root_becomes_base_url_relative() {
        let r = resolver();
        let url = r.absolute_path_to_url(Path::new("/repo/src/app.js")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/app.js");
    }

    #[test]
    fn absolute_path_outside_web_root_becomes_file_url() {
        let r = resolver();
        let url = r.absolute_path_to_url(Path::new("/elsewhere/app.js")).unwrap();
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn round_trips_a_path_under_web_root() {
        let r = resolver();
        let path = Path::new("/repo/src/nested/app.js");
        let url = r.absolute_path_to_url(path).unwrap();
        let back = r.url_to_absolute_path(url.as_str()).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn remote_host_requires_content_hash_check() {
        let r = SourcePathResolver::new(SourcePathResolverOptions {
            web_root: None,
            base_url: Some(Url::parse("http://example.com/").unwrap()),
            source_map_path_overrides: Vec::new(),
        });
        assert!(r.should_check_content_hash());
    }

    #[test]
    fn localhost_does_not_require_content_hash_check() {
        let r = resolver();
        assert!(!r.should_check_content_hash());
    }
}
