//! Registry of [`Script`]s and [`Source`]s, and the cross-source UI-location
//! translation that makes breakpoints and stack frames work across a
//! source map boundary.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::context::AdapterContext;
use crate::sourcemap::SourceMap;

/// Opaque, adapter-lifetime-unique handle for a [`Source`], also doubling as
/// the DAP `sourceReference` sent to the client for sources with no
/// filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceReference(pub i64);

pub type ScriptId = String;

/// A compiled unit loaded into a runtime.
#[derive(Debug, Clone)]
pub struct Script {
    pub script_id: ScriptId,
    pub url: String,
    pub source_map_url: Option<String>,
    pub embedded_offset_line: i64,
    pub embedded_offset_column: i64,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Runtime,
    Authored,
}

/// An addressable code document, either backed directly by a runtime script
/// or derived from one of its source map's `sources` entries.
#[derive(Debug, Clone)]
pub struct Source {
    pub source_reference: SourceReference,
    pub kind: SourceKind,
    pub url: Option<String>,
    pub absolute_path: Option<PathBuf>,
    pub script_id: Option<ScriptId>,
    /// Populated only for runtime sources that own a parsed map.
    pub source_map: Option<Rc<SourceMap>>,
    /// For an authored source, the path (within its owning map) used to
    /// index entries/reverse-lookups.
    pub map_source_path: Option<String>,
    siblings: RefCell<Vec<SourceReference>>,
}

impl Source {
    pub fn add_sibling(&self, other: SourceReference) {
        let mut siblings = self.siblings.borrow_mut();
        if !siblings.contains(&other) {
            siblings.push(other);
        }
    }

    pub fn siblings(&self) -> Vec<SourceReference> {
        self.siblings.borrow().clone()
    }
}

/// `(source, line, column)`, 1-based: the DAP-facing coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiLocation {
    pub source: SourceReference,
    pub line: i64,
    pub column: i64,
}

/// `(thread/script, line, column)`, 0-based: the CDP-facing coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocation {
    pub script_id: ScriptId,
    pub line: i64,
    pub column: i64,
}

#[derive(Debug)]
pub struct SourceContainer {
    by_url: RefCell<HashMap<String, SourceReference>>,
    by_path: RefCell<HashMap<PathBuf, SourceReference>>,
    by_reference: RefCell<HashMap<SourceReference, Rc<Source>>>,
    scripts: RefCell<HashMap<ScriptId, Script>>,
    context: AdapterContext,
}

impl Default for SourceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceContainer {
    pub fn new() -> Self {
        Self::with_context(AdapterContext::new())
    }

    /// Shares the session-wide id counters (see [`AdapterContext`]) instead
    /// of keeping its own, so `sourceReference` draws from the same
    /// process-wide sequence the design notes call for.
    pub fn with_context(context: AdapterContext) -> Self {
        Self {
            by_url: RefCell::new(HashMap::new()),
            by_path: RefCell::new(HashMap::new()),
            by_reference: RefCell::new(HashMap::new()),
            scripts: RefCell::new(HashMap::new()),
            context,
        }
    }

    fn allocate_reference(&self) -> SourceReference {
        self.context.next_source_reference()
    }

    /// Registers a runtime script, along with a runtime [`Source`] for it.
    /// If `source_map` is supplied (already fetched and parsed by the
    /// caller), registers one authored [`Source`] per entry in
    /// `source_map.sources` and wires the sibling relation both ways.
    pub fn register_script(
        &self,
        script: Script,
        source_map: Option<SourceMap>,
        resolve_path: impl Fn(&str) -> Option<PathBuf>,
    ) -> SourceReference {
        let runtime_ref = self.allocate_reference();
        let map_rc = source_map.map(Rc::new);

        let runtime_source = Rc::new(Source {
            source_reference: runtime_ref,
            kind: SourceKind::Runtime,
            url: Some(script.url.clone()),
            absolute_path: resolve_path(&script.url),
            script_id: Some(script.script_id.clone()),
            source_map: map_rc.clone(),
            map_source_path: None,
            siblings: RefCell::new(Vec::new()),
        });

        self.by_url
            .borrow_mut()
            .insert(script.url.clone(), runtime_ref);
        if let Some(path) = &runtime_source.absolute_path {
            self.by_path.borrow_mut().insert(path.clone(), runtime_ref);
        }
        self.by_reference
            .borrow_mut()
            .insert(runtime_ref, runtime_source.clone());
        self.scripts.borrow_mut().insert(script.script_id.clone(), script);

        if let Some(map) = &map_rc {
            for authored_path in &map.sources {
                let authored_ref = self.allocate_reference();
                let absolute_path = resolve_path(authored_path);
                let authored_source = Rc::new(Source {
                    source_reference: authored_ref,
                    kind: SourceKind::Authored,
                    url: Some(authored_path.clone()),
                    absolute_path: absolute_path.clone(),
                    script_id: None,
                    source_map: None,
                    map_source_path: Some(authored_path.clone()),
                    siblings: RefCell::new(Vec::new()),
                });
                authored_source.add_sibling(runtime_ref);
                runtime_source.add_sibling(authored_ref);

                if let Some(path) = &absolute_path {
                    self.by_path.borrow_mut().insert(path.clone(), authored_ref);
                } else {
                    self.by_url
                        .borrow_mut()
                        .insert(authored_path.clone(), authored_ref);
                }
                self.by_reference
                    .borrow_mut()
                    .insert(authored_ref, authored_source);
            }
        }

        runtime_ref
    }

    /// Registers a bare placeholder source for a path that has not been
    /// loaded by any runtime yet, so `setBreakpoints` against it has a
    /// `SourceReference` to anchor against before `register_script` ever
    /// sees a matching script. `resolve_url` only runs on first registration.
    pub fn ensure_path_source(
        &self,
        path: &std::path::Path,
        resolve_url: impl FnOnce() -> Option<String>,
    ) -> SourceReference {
        if let Some(existing) = self.by_path.borrow().get(path) {
            return *existing;
        }

        let reference = self.allocate_reference();
        let url = resolve_url();
        let source = Rc::new(Source {
            source_reference: reference,
            kind: SourceKind::Authored,
            url: url.clone(),
            absolute_path: Some(path.to_path_buf()),
            script_id: None,
            source_map: None,
            map_source_path: None,
            siblings: RefCell::new(Vec::new()),
        });

        self.by_path.borrow_mut().insert(path.to_path_buf(), reference);
        if let Some(url) = url {
            self.by_url.borrow_mut().insert(url, reference);
        }
        self.by_reference.borrow_mut().insert(reference, source);
        reference
    }

    pub fn source_by_reference(&self, reference: SourceReference) -> Option<Rc<Source>> {
        self.by_reference.borrow().get(&reference).cloned()
    }

    pub fn source_by_url(&self, url: &str) -> Option<Rc<Source>> {
        let reference = *self.by_url.borrow().get(url)?;
        self.source_by_reference(reference)
    }

    pub fn source_by_path(&self, path: &std::path::Path) -> Option<Rc<Source>> {
        let reference = *self.by_path.borrow().get(path)?;
        self.source_by_reference(reference)
    }

    pub fn script(&self, script_id: &str) -> Option<Script> {
        self.scripts.borrow().get(script_id).cloned()
    }

    /// Every UiLocation equivalent to `loc`, reached through sibling
    /// sources. Side-effect free and idempotent; callers may invoke it
    /// repeatedly without changing adapter state.
    pub fn current_sibling_ui_locations(
        &self,
        loc: UiLocation,
        prefer_source: Option<SourceReference>,
    ) -> Vec<UiLocation> {
        let Some(source) = self.source_by_reference(loc.source) else {
            return Vec::new();
        };

        let mut results = vec![loc];

        match source.kind {
            SourceKind::Authored => {
                for sibling_ref in source.siblings() {
                    let Some(sibling) = self.source_by_reference(sibling_ref) else {
                        continue;
                    };
                    let Some(map) = &sibling.source_map else {
                        continue;
                    };
                    let Some(map_path) = &source.map_source_path else {
                        continue;
                    };
                    if let Some(entry) =
                        map.find_reverse_entry(map_path, loc.line - 1, loc.column - 1)
                    {
                        results.push(UiLocation {
                            source: sibling_ref,
                            line: entry.generated_line + 1,
                            column: entry.generated_column + 1,
                        });
                    }
                }
            }
            SourceKind::Runtime => {
                if let Some(map) = &source.source_map {
                    if let Some(entry) = map.find_entry(loc.line - 1, loc.column - 1) {
                        if let (Some(source_path), Some(source_line), Some(source_col)) =
                            (&entry.source, entry.source_line, entry.source_column)
                        {
                            if let Some(authored) = self
                                .source_by_url(source_path)
                                .or_else(|| self.find_authored_sibling(&source, source_path))
                            {
                                results.push(UiLocation {
                                    source: authored.source_reference,
                                    line: source_line + 1,
                                    column: source_col + 1,
                                });
                            }
                        }
                    }
                }
            }
        }

        if let Some(prefer) = prefer_source {
            results.retain(|l| l.source == prefer);
        }

        results
    }

    fn find_authored_sibling(&self, runtime: &Source, map_path: &str) -> Option<Rc<Source>> {
        runtime.siblings().into_iter().find_map(|r| {
            let candidate = self.source_by_reference(r)?;
            if candidate.map_source_path.as_deref() == Some(map_path) {
                Some(candidate)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sourcemap::SourceMap;

    fn script_with_map() -> (Script, SourceMap) {
        let script = Script {
            script_id: "1".into(),
            url: "http://localhost/bundle.js".into(),
            source_map_url: Some("bundle.js.map".into()),
            embedded_offset_line: 0,
            embedded_offset_column: 0,
            hash: "abc".into(),
        };
        let map = SourceMap::parse(
            r#"{"version":3,"sources":["src/app.ts"],"names":[],"mappings":"AAAA"}"#,
        )
        .unwrap();
        (script, map)
    }

    #[test]
    fn registers_runtime_and_authored_sources_as_siblings() {
        let container = SourceContainer::new();
        let (script, map) = script_with_map();
        let runtime_ref = container.register_script(script, Some(map), |_| None);

        let runtime = container.source_by_reference(runtime_ref).unwrap();
        assert_eq!(runtime.siblings().len(), 1);

        let authored_ref = runtime.siblings()[0];
        let authored = container.source_by_reference(authored_ref).unwrap();
        assert_eq!(authored.kind, SourceKind::Authored);
        assert_eq!(authored.siblings(), vec![runtime_ref]);
    }

    #[test]
    fn sources_reachable_by_url_and_reference() {
        let container = SourceContainer::new();
        let (script, map) = script_with_map();
        let runtime_ref = container.register_script(script, Some(map), |_| None);

        assert!(container.source_by_url("http://localhost/bundle.js").is_some());
        assert!(container.source_by_reference(runtime_ref).is_some());
    }

    #[test]
    fn current_sibling_locations_is_idempotent() {
        let container = SourceContainer::new();
        let (script, map) = script_with_map();
        let runtime_ref = container.register_script(script, Some(map), |_| None);

        let loc = UiLocation {
            source: runtime_ref,
            line: 1,
            column: 1,
        };
        let first = container.current_sibling_ui_locations(loc, None);
        let second = container.current_sibling_ui_locations(loc, None);
        assert_eq!(first.len(), second.len());
    }
}
