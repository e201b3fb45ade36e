//! Scans the workspace for `.js.map` files ahead of time so the first
//! `setBreakpoints` call (issued before the program has even started, and
//! so before any script-parsed event exists to resolve against) can still
//! predict a compiled location.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::sourcemap::SourceMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedLocation {
    pub compiled_url: String,
    pub compiled_line: i64,
    pub compiled_column: i64,
}

/// One discovered map file: its compiled URL and the parsed map used to
/// reverse-query it.
struct DiscoveredMap {
    compiled_url: String,
    map: SourceMap,
}

#[derive(Default)]
pub struct BreakpointPredictor {
    /// Authored absolute path -> every map whose `sources` list includes it.
    index: HashMap<PathBuf, Vec<usize>>,
    maps: Vec<DiscoveredMap>,
}

impl BreakpointPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from a pre-enumerated list of `(compiled_url,
    /// map_file_contents)` pairs and a path resolver converting a map's
    /// authored source entries into absolute filesystem paths. Takes an
    /// already-read file list rather than walking the filesystem itself,
    /// so the actual blocking directory scan
    /// (`tokio::task::spawn_blocking`) lives with the caller that owns the
    /// root path and I/O.
    pub fn build(
        &mut self,
        discovered: Vec<(String, String)>,
        resolve_path: impl Fn(&str) -> Option<PathBuf>,
    ) {
        for (compiled_url, raw_map) in discovered {
            let map = match SourceMap::parse(&raw_map) {
                Ok(map) => map,
                // Non-fatal: a malformed map on disk shouldn't abort the
                // whole predictive scan.
                Err(_) => continue,
            };
            let map_index = self.maps.len();
            for source in &map.sources {
                if let Some(path) = resolve_path(source) {
                    self.index.entry(path).or_default().push(map_index);
                }
            }
            self.maps.push(DiscoveredMap { compiled_url, map });
        }
    }

    /// Reverse-queries every map whose `sources` covers `path`, returning
    /// every hit. Results are best-effort: a map with no entry at this
    /// exact position simply contributes nothing.
    pub fn predicted_resolved_locations(
        &self,
        path: &Path,
        line: i64,
        column: i64,
    ) -> Vec<PredictedLocation> {
        let Some(map_indices) = self.index.get(path) else {
            return Vec::new();
        };

        map_indices
            .iter()
            .filter_map(|&i| {
                let discovered = &self.maps[i];
                let source_path = path.to_string_lossy();
                let entry = discovered
                    .map
                    .find_reverse_entry(&source_path, line - 1, column - 1)?;
                Some(PredictedLocation {
                    compiled_url: discovered.compiled_url.clone(),
                    compiled_line: entry.generated_line,
                    compiled_column: entry.generated_column,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_locations_for_indexed_source() {
        let mut predictor = BreakpointPredictor::new();
        let map_json = r#"{"version":3,"sources":["/repo/src/app.ts"],"names":[],"mappings":"AAAA"}"#;
        predictor.build(
            vec![("http://localhost/app.js".to_string(), map_json.to_string())],
            |s| Some(PathBuf::from(s)),
        );

        let hits = predictor.predicted_resolved_locations(Path::new("/repo/src/app.ts"), 1, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].compiled_url, "http://localhost/app.js");
    }

    #[test]
    fn unindexed_path_yields_no_predictions() {
        let predictor = BreakpointPredictor::new();
        assert!(predictor
            .predicted_resolved_locations(Path::new("/nowhere.ts"), 1, 1)
            .is_empty());
    }

    #[test]
    fn malformed_map_is_skipped_without_panicking() {
        let mut predictor = BreakpointPredictor::new();
        predictor.build(
            vec![("http://localhost/app.js".to_string(), "not json".to_string())],
            |s| Some(PathBuf::from(s)),
        );
        assert!(predictor.maps.is_empty());
    }
}
