//! V3 source map parsing and coordinate lookup.
//!
//! Covers both the plain form (`{version, sources, names, mappings}`) and
//! the indexed form (`{sections: [{offset, map}]}`). A map with `sections`
//! carrying a `url` field is rejected outright — per-section remote maps
//! are not something any adapter has ever had to fetch in practice and
//! are explicitly out of scope here.

pub mod vlq;

use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, thiserror::Error)]
pub enum SourceMapError {
    #[error("malformed source map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source map version {0} is unsupported, only v3 is")]
    UnsupportedVersion(u32),

    #[error("sectioned source maps with a remote `url` are unsupported")]
    RemoteSection,

    #[error("malformed mappings string at byte {0}")]
    MalformedMappings(usize),
}

#[derive(Debug, Deserialize)]
struct RawSourceMap {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    source_root: Option<String>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    mappings: String,
    #[serde(default)]
    sections: Option<Vec<RawSection>>,
    #[serde(default)]
    sources_content: Option<Vec<Option<String>>>,
}

fn default_version() -> u32 {
    3
}

#[derive(Debug, Deserialize)]
struct RawSection {
    offset: RawOffset,
    #[serde(default)]
    map: Option<Box<RawSourceMap>>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOffset {
    line: i64,
    column: i64,
}

/// One resolved mapping between a generated (compiled) position and an
/// optional authored position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub generated_line: i64,
    pub generated_column: i64,
    pub source: Option<String>,
    pub source_line: Option<i64>,
    pub source_column: Option<i64>,
    pub name: Option<String>,
}

impl Entry {
    fn generated_key(&self) -> (i64, i64) {
        (self.generated_line, self.generated_column)
    }

    fn source_key(&self) -> Option<(i64, i64)> {
        Some((self.source_line?, self.source_column?))
    }
}

/// A parsed source map plus its lazily-built reverse indices, one per
/// authored source.
#[derive(Debug)]
pub struct SourceMap {
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    entries: Vec<Entry>,
    reverse: std::cell::RefCell<rustc_hash::FxHashMap<String, Vec<usize>>>,
}

impl SourceMap {
    /// Strips the XSSI-protection prefix (`)]}'` on its own line) some
    /// servers prepend to map responses, then parses.
    pub fn parse(raw: &str) -> Result<Self, SourceMapError> {
        let stripped = raw.strip_prefix(")]}'").unwrap_or(raw);
        let parsed: RawSourceMap = serde_json::from_str(stripped)?;
        Self::from_raw(parsed)
    }

    fn from_raw(raw: RawSourceMap) -> Result<Self, SourceMapError> {
        if let Some(sections) = raw.sections {
            return Self::from_sections(sections);
        }
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }
        let sources = resolve_source_paths(&raw.sources, raw.source_root.as_deref());
        let entries = parse_mappings(&raw.mappings, &sources, &raw.names)?;
        Ok(Self {
            sources,
            names: raw.names,
            sources_content: raw.sources_content.unwrap_or_default(),
            entries,
            reverse: Default::default(),
        })
    }

    fn from_sections(sections: Vec<RawSection>) -> Result<Self, SourceMapError> {
        let mut sources = Vec::new();
        let mut names = Vec::new();
        let mut sources_content = Vec::new();
        let mut entries = Vec::new();
        for section in sections {
            if section.url.is_some() {
                return Err(SourceMapError::RemoteSection);
            }
            let Some(map) = section.map else {
                continue;
            };
            let sub = Self::from_raw(*map)?;
            for entry in sub.entries {
                entries.push(Entry {
                    generated_line: entry.generated_line + section.offset.line,
                    generated_column: if entry.generated_line == 0 {
                        entry.generated_column + section.offset.column
                    } else {
                        entry.generated_column
                    },
                    ..entry
                });
            }
            sources.extend(sub.sources);
            names.extend(sub.names);
            sources_content.extend(sub.sources_content);
        }
        entries.sort_by(|a, b| a.generated_key().cmp(&b.generated_key()));
        Ok(Self {
            sources,
            names,
            sources_content,
            entries,
            reverse: Default::default(),
        })
    }

    /// Returns the entry with the greatest `(line, col) <= query`
    /// (upper-bound-minus-one semantics).
    pub fn find_entry(&self, line: i64, column: i64) -> Option<&Entry> {
        let key = (line, column);
        let idx = match self
            .entries
            .binary_search_by(|e| e.generated_key().cmp(&key))
        {
            Ok(i) => i,
            Err(0) => return None,
            Err(i) => i - 1,
        };
        self.entries.get(idx)
    }

    /// Returns the entry for `source` with the smallest `(line, col) >=
    /// query`; if none exists, falls back to the last entry on the same
    /// `sourceLine`.
    pub fn find_reverse_entry(&self, source: &str, line: i64, column: i64) -> Option<&Entry> {
        self.ensure_reverse_index(source);
        let reverse = self.reverse.borrow();
        let indices = reverse.get(source)?;
        let key = (line, column);
        let found = indices.binary_search_by(|&i| {
            self.entries[i]
                .source_key()
                .expect("indexed entries always have a source position")
                .cmp(&key)
        });
        let entries_idx = match found {
            Ok(i) => indices[i],
            Err(i) if i < indices.len() => indices[i],
            // Past every mapped position for this source: clamp to the last
            // entry on the source's final line rather than returning none.
            Err(_) => *indices.last()?,
        };
        Some(&self.entries[entries_idx])
    }

    fn ensure_reverse_index(&self, source: &str) {
        if self.reverse.borrow().contains_key(source) {
            return;
        }
        let mut indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.source.as_deref() == Some(source))
            .map(|(i, _)| i)
            .collect();
        indices.sort_by(|&a, &b| {
            self.entries[a]
                .source_key()
                .cmp(&self.entries[b].source_key())
        });
        self.reverse.borrow_mut().insert(source.to_string(), indices);
    }
}

fn resolve_source_paths(sources: &[Option<String>], source_root: Option<&str>) -> Vec<String> {
    sources
        .iter()
        .map(|s| {
            let s = s.clone().unwrap_or_default();
            match source_root {
                Some(root) if !root.is_empty() && !s.starts_with('/') && !s.contains("://") => {
                    format!("{}/{}", root.trim_end_matches('/'), s)
                }
                _ => s,
            }
        })
        .collect()
}

fn parse_mappings(
    mappings: &str,
    sources: &[String],
    names: &[String],
) -> Result<Vec<Entry>, SourceMapError> {
    let mut entries = Vec::new();
    let mut generated_line = 0i64;
    let mut generated_column = 0i64;
    let mut source_index = 0i64;
    let mut source_line = 0i64;
    let mut source_column = 0i64;
    let mut name_index = 0i64;

    for (line_no, line) in mappings.split(';').enumerate() {
        generated_line = line_no as i64;
        generated_column = 0;
        if line.is_empty() {
            continue;
        }
        for segment in line.split(',') {
            if segment.is_empty() {
                continue;
            }
            let fields = vlq::decode_all(segment.as_bytes())
                .ok_or(SourceMapError::MalformedMappings(line_no))?;
            let mut iter = fields.into_iter();
            let Some(gc) = iter.next() else {
                continue;
            };
            generated_column += gc;

            let mut entry = Entry {
                generated_line,
                generated_column,
                source: None,
                source_line: None,
                source_column: None,
                name: None,
            };

            if let Some(si) = iter.next() {
                source_index += si;
                let sl = iter
                    .next()
                    .ok_or(SourceMapError::MalformedMappings(line_no))?;
                source_line += sl;
                let sc = iter
                    .next()
                    .ok_or(SourceMapError::MalformedMappings(line_no))?;
                source_column += sc;
                entry.source = sources.get(source_index as usize).cloned();
                entry.source_line = Some(source_line);
                entry.source_column = Some(source_column);

                if let Some(ni) = iter.next() {
                    name_index += ni;
                    entry.name = names.get(name_index as usize).cloned();
                }
            }

            entries.push(entry);
        }
    }

    entries.sort_by(|a, b| match a.generated_key().cmp(&b.generated_key()) {
        Ordering::Equal => Ordering::Equal,
        other => other,
    });
    Ok(entries)
}

/// External collaborator boundary for fetching a source map body from
/// whatever `sourceMappingURL` names (`http(s)://`, `file://`, `data:`):
/// mirrors how [`crate::cdp::client::CdpClient`] externalizes the wire
/// transport, so `adapter-core` never opens a socket or touches the
/// filesystem on its own.
#[async_trait::async_trait(?Send)]
pub trait SourceMapLoader {
    /// Returns `None` on any fetch failure; the caller logs and treats the
    /// script as having no source map rather than failing the parse.
    async fn load(&self, url: &str) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn sample_map() -> &'static str {
        indoc! {r#"
        {
            "version": 3,
            "sources": ["a.ts"],
            "names": ["foo"],
            "mappings": "AAAA,SAASA"
        }
        "#}
    }

    #[test]
    fn parses_sources_and_names() {
        let map = SourceMap::parse(sample_map()).unwrap();
        assert_eq!(map.sources, vec!["a.ts".to_string()]);
        assert_eq!(map.names, vec!["foo".to_string()]);
    }

    #[test]
    fn strips_xssi_prefix() {
        let with_prefix = format!(")]}}'\n{}", sample_map());
        assert!(SourceMap::parse(&with_prefix).is_ok());
    }

    #[test]
    fn find_entry_returns_nearest_preceding() {
        let map = SourceMap::parse(sample_map()).unwrap();
        let entry = map.find_entry(0, 100).unwrap();
        assert_eq!(entry.generated_line, 0);
    }

    #[test]
    fn find_entry_before_first_mapping_is_none() {
        let map = SourceMap::parse(sample_map()).unwrap();
        assert!(map.find_entry(-1, 0).is_none());
    }

    #[test]
    fn rejects_remote_sections() {
        let raw = r#"{"sections":[{"offset":{"line":0,"column":0},"url":"http://example.com/x.js.map"}]}"#;
        assert!(matches!(
            SourceMap::parse(raw),
            Err(SourceMapError::RemoteSection)
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let raw = r#"{"version":2,"sources":[],"names":[],"mappings":""}"#;
        assert!(matches!(
            SourceMap::parse(raw),
            Err(SourceMapError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn find_reverse_entry_picks_smallest_at_or_after_query() {
        let raw = indoc! {r#"
        {
            "version": 3,
            "sources": ["a.ts"],
            "names": [],
            "mappings": "AAAA,CAACA;AACA,CAACA"
        }
        "#};
        let map = SourceMap::parse(raw).unwrap();
        // source_line 0 carries entries at source_column 0 and 1.
        let entry = map.find_reverse_entry("a.ts", 0, 1).unwrap();
        assert_eq!((entry.source_line, entry.source_column), (Some(0), Some(1)));
    }

    #[test]
    fn find_reverse_entry_clamps_past_last_mapping() {
        let raw = indoc! {r#"
        {
            "version": 3,
            "sources": ["a.ts"],
            "names": [],
            "mappings": "AAAA,CAACA;AACA,CAACA"
        }
        "#};
        let map = SourceMap::parse(raw).unwrap();
        let entry = map.find_reverse_entry("a.ts", 50, 0).unwrap();
        assert_eq!(entry.source_line, Some(1));
    }
}
