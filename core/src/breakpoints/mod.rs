//! Desired-vs-installed breakpoint reconciliation.
//!
//! A DAP `Breakpoint` is a user intent; it may end up backed by zero, one,
//! or several CDP breakpoint ids, installed through up to three parallel
//! strategies that all race to cover the same intent. `(url, line, column)`
//! is the idempotence key that keeps them from installing duplicates.

pub mod predictor;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use tokio::sync::Notify;

use crate::cdp::client::{self, CdpError};
use crate::cdp::messages::{
    CdpBreakpointId, Location, RemoveBreakpointParams, SetBreakpointByUrlParams,
    SetBreakpointParams,
};
use crate::context::AdapterContext;
use crate::source_container::{SourceContainer, SourceReference, UiLocation};
use crate::thread::{ExceptionBreakpointMode, Thread};

use predictor::BreakpointPredictor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointId(pub i64);

#[derive(Debug, Clone, Default)]
pub struct BreakpointSpec {
    pub line: i64,
    pub column: Option<i64>,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    pub log_message: Option<String>,
}

/// Where a `setBreakpoints` call is anchored: sources with filesystem
/// identity are keyed by absolute path; virtual/inline sources by their
/// `sourceReference`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BreakpointAnchor {
    Path(PathBuf),
    Reference(SourceReference),
}

pub struct Breakpoint {
    pub id: BreakpointId,
    pub anchor: BreakpointAnchor,
    pub spec: BreakpointSpec,
    pub source_reference: SourceReference,
    installed: RefCell<Vec<CdpBreakpointId>>,
    resolved: RefCell<Option<UiLocation>>,
    requested_triples: RefCell<HashSet<(String, i64, i64)>>,
    in_flight_setters: RefCell<u32>,
    setters_idle: Notify,
}

impl Breakpoint {
    fn new(id: BreakpointId, anchor: BreakpointAnchor, spec: BreakpointSpec, source_reference: SourceReference) -> Self {
        Self {
            id,
            anchor,
            spec,
            source_reference,
            installed: RefCell::new(Vec::new()),
            resolved: RefCell::new(None),
            requested_triples: RefCell::new(HashSet::new()),
            in_flight_setters: RefCell::new(0),
            setters_idle: Notify::new(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.resolved.borrow().is_some()
    }

    pub fn resolved_location(&self) -> Option<UiLocation> {
        *self.resolved.borrow()
    }

    pub fn installed_ids(&self) -> Vec<CdpBreakpointId> {
        self.installed.borrow().clone()
    }

    /// `console.log(...)` rewrite for `logMessage` breakpoints, combined
    /// with any user-supplied condition as `(condition) && (logExpr)`. The
    /// trailing `sourceURL` comment keeps the synthesized call frame out of
    /// the user's own stack trace naming.
    pub fn log_expression(&self) -> Option<String> {
        let log_message = self.spec.log_message.as_ref()?;
        let interpolated = interpolate_log_message(log_message);
        let log_expr = format!("console.log({interpolated})//# sourceURL=logpoint.cdp");
        Some(match &self.spec.condition {
            Some(cond) => format!("({cond}) && ({log_expr})"),
            None => log_expr,
        })
    }

    fn effective_expression(&self) -> Option<String> {
        self.log_expression().or_else(|| self.spec.condition.clone())
    }

    fn try_claim_triple(&self, url: &str, line: i64, column: i64) -> bool {
        self.requested_triples
            .borrow_mut()
            .insert((url.to_string(), line, column))
    }

    fn begin_setter(&self) {
        *self.in_flight_setters.borrow_mut() += 1;
    }

    fn end_setter(&self) {
        let mut count = self.in_flight_setters.borrow_mut();
        *count -= 1;
        if *count == 0 {
            self.setters_idle.notify_waiters();
        }
    }

    async fn await_idle(&self) {
        loop {
            if *self.in_flight_setters.borrow() == 0 {
                return;
            }
            self.setters_idle.notified().await;
        }
    }

    /// Races all three strategies named in the design: by-URL (regex over
    /// the breakpoint's own UI location), predicted-via-local-source-maps,
    /// and by-current-sibling-script-id. Each installation that succeeds is
    /// recorded; duplicates are suppressed by the `(url, line, column)`
    /// idempotence key.
    pub async fn set(
        &self,
        thread: &Thread,
        sources: &SourceContainer,
        predictor: Option<&BreakpointPredictor>,
    ) -> Result<(), CdpError> {
        self.begin_setter();
        let result = self.set_inner(thread, sources, predictor).await;
        self.end_setter();
        result
    }

    async fn set_inner(
        &self,
        thread: &Thread,
        sources: &SourceContainer,
        predictor: Option<&BreakpointPredictor>,
    ) -> Result<(), CdpError> {
        let Some(source) = sources.source_by_reference(self.source_reference) else {
            return Ok(());
        };
        let condition = self.effective_expression();

        // Strategy 1: by URL regex, using the source's own URL.
        if let Some(url) = &source.url {
            if self.try_claim_triple(url, self.spec.line, self.spec.column.unwrap_or(0)) {
                let result = client::send(
                    thread_client(thread),
                    Some(thread_session(thread)),
                    SetBreakpointByUrlParams {
                        line_number: self.spec.line - 1,
                        url: None,
                        url_regex: Some(regex_escape_anchored(url)),
                        script_hash: None,
                        column_number: self.spec.column.map(|c| c - 1),
                        condition: condition.clone(),
                    },
                )
                .await;
                if let Ok(result) = result {
                    self.record_installation(thread, &result.breakpoint_id, &result.locations);
                }
            }
        }

        // Strategy 2: predicted compiled locations from local source maps.
        if let (Some(predictor), Some(path)) = (predictor, source.absolute_path.as_ref()) {
            for predicted in predictor.predicted_resolved_locations(path, self.spec.line, self.spec.column.unwrap_or(1)) {
                if !self.try_claim_triple(&predicted.compiled_url, predicted.compiled_line, predicted.compiled_column) {
                    continue;
                }
                let result = client::send(
                    thread_client(thread),
                    Some(thread_session(thread)),
                    SetBreakpointByUrlParams {
                        line_number: predicted.compiled_line,
                        url: Some(predicted.compiled_url.clone()),
                        url_regex: None,
                        script_hash: None,
                        column_number: Some(predicted.compiled_column),
                        condition: condition.clone(),
                    },
                )
                .await;
                if let Ok(result) = result {
                    self.record_installation(thread, &result.breakpoint_id, &result.locations);
                }
            }
        }

        // Strategy 3: current sibling locations resolved through a script
        // id already loaded in this thread.
        let ui_loc = UiLocation {
            source: self.source_reference,
            line: self.spec.line,
            column: self.spec.column.unwrap_or(1),
        };
        for sibling in sources.current_sibling_ui_locations(ui_loc, None) {
            let Some(sibling_source) = sources.source_by_reference(sibling.source) else {
                continue;
            };
            let Some(script_id) = &sibling_source.script_id else {
                continue;
            };
            let key_url = format!("script:{script_id}");
            if !self.try_claim_triple(&key_url, sibling.line, sibling.column) {
                continue;
            }
            let result = client::send(
                thread_client(thread),
                Some(thread_session(thread)),
                SetBreakpointParams {
                    location: Location {
                        script_id: script_id.clone(),
                        line_number: sibling.line - 1,
                        column_number: Some(sibling.column - 1),
                    },
                    condition: condition.clone(),
                },
            )
            .await;
            if let Ok(result) = result {
                self.record_installation_single(thread, &result.breakpoint_id, &result.actual_location);
            }
        }

        Ok(())
    }

    fn record_installation(&self, thread: &Thread, cdp_id: &str, locations: &[Location]) {
        self.installed.borrow_mut().push(CdpBreakpointId(cdp_id.to_string()));
        for loc in locations {
            self.record_resolved(thread, loc);
        }
    }

    fn record_installation_single(&self, thread: &Thread, cdp_id: &str, location: &Location) {
        self.installed.borrow_mut().push(CdpBreakpointId(cdp_id.to_string()));
        self.record_resolved(thread, location);
    }

    /// Invoked from `Debugger.breakpointResolved`: a breakpoint installed
    /// before its script loaded only becomes verified once CDP resolves it
    /// out of band, outside any `set()` call's own response handling.
    pub fn on_resolved(&self, thread: &Thread, location: &Location) {
        self.record_resolved(thread, location);
    }

    fn record_resolved(&self, thread: &Thread, location: &Location) {
        if self.resolved.borrow().is_some() {
            return;
        }
        if let Some(ui_loc) = thread.raw_to_ui_location(&crate::source_container::RawLocation {
            script_id: location.script_id.clone(),
            line: location.line_number,
            column: location.column_number.unwrap_or(0),
        }) {
            *self.resolved.borrow_mut() = Some(ui_loc);
        }
    }

    /// Awaits every in-flight `set()` before removing every installed CDP
    /// breakpoint id, so a `remove` issued hot on the heels of a `set`
    /// can't race it.
    async fn remove(&self, thread: &Thread) -> Result<(), CdpError> {
        self.await_idle().await;
        for installed in self.installed.borrow_mut().drain(..) {
            client::send(
                thread_client(thread),
                Some(thread_session(thread)),
                RemoveBreakpointParams {
                    breakpoint_id: installed.0,
                },
            )
            .await?;
        }
        Ok(())
    }
}

fn thread_client(thread: &Thread) -> &dyn crate::cdp::client::CdpClient {
    thread.cdp_client()
}

fn thread_session(thread: &Thread) -> &crate::cdp::messages::SessionId {
    &thread.session_id
}

fn regex_escape_anchored(url: &str) -> String {
    format!("^{}$", regex::escape(url))
}

/// Rewrites `logMessage` template text (`"x = {x}"`) into a JS template
/// literal expression (`` `x = ${x}` ``) for the log-point console.log call.
fn interpolate_log_message(template: &str) -> String {
    let mut out = String::from("`");
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                out.push_str("${");
                for next in chars.by_ref() {
                    if next == '}' {
                        out.push('}');
                        break;
                    }
                    out.push(next);
                }
            }
            '`' | '\\' | '$' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('`');
    out
}

pub struct BreakpointManager {
    by_path: RefCell<HashMap<PathBuf, Vec<Rc<Breakpoint>>>>,
    by_reference: RefCell<HashMap<SourceReference, Vec<Rc<Breakpoint>>>>,
    context: AdapterContext,
    exception_mode: RefCell<ExceptionBreakpointMode>,
}

impl BreakpointManager {
    pub fn new(context: AdapterContext) -> Self {
        Self {
            by_path: RefCell::new(HashMap::new()),
            by_reference: RefCell::new(HashMap::new()),
            context,
            exception_mode: RefCell::new(ExceptionBreakpointMode::None),
        }
    }

    pub fn exception_mode(&self) -> ExceptionBreakpointMode {
        *self.exception_mode.borrow()
    }

    pub fn set_exception_mode(&self, mode: ExceptionBreakpointMode) {
        *self.exception_mode.borrow_mut() = mode;
    }

    /// Replaces the whole breakpoint list for one anchor: removes every
    /// prior Breakpoint (awaiting in-flight setters first), then installs
    /// each new one against `thread` if attached.
    pub async fn set_breakpoints(
        &self,
        anchor: BreakpointAnchor,
        source_reference: SourceReference,
        specs: Vec<BreakpointSpec>,
        thread: Option<&Thread>,
        sources: &SourceContainer,
        predictor: Option<&BreakpointPredictor>,
    ) -> Result<Vec<Rc<Breakpoint>>, CdpError> {
        let previous = self.take_anchor(&anchor);
        if let Some(thread) = thread {
            for old in &previous {
                old.remove(thread).await?;
            }
        }

        let mut created = Vec::new();
        for spec in specs {
            let id = self.context.next_breakpoint_id();
            let bp = Rc::new(Breakpoint::new(id, anchor.clone(), spec, source_reference));
            if let Some(thread) = thread {
                bp.set(thread, sources, predictor).await?;
            }
            created.push(bp);
        }

        self.store_anchor(anchor, created.clone());
        Ok(created)
    }

    fn take_anchor(&self, anchor: &BreakpointAnchor) -> Vec<Rc<Breakpoint>> {
        match anchor {
            BreakpointAnchor::Path(path) => self.by_path.borrow_mut().remove(path).unwrap_or_default(),
            BreakpointAnchor::Reference(r) => self.by_reference.borrow_mut().remove(r).unwrap_or_default(),
        }
    }

    fn store_anchor(&self, anchor: BreakpointAnchor, breakpoints: Vec<Rc<Breakpoint>>) {
        match anchor {
            BreakpointAnchor::Path(path) => {
                self.by_path.borrow_mut().insert(path, breakpoints);
            }
            BreakpointAnchor::Reference(r) => {
                self.by_reference.borrow_mut().insert(r, breakpoints);
            }
        }
    }

    pub fn breakpoints_for_path(&self, path: &PathBuf) -> Vec<Rc<Breakpoint>> {
        self.by_path.borrow().get(path).cloned().unwrap_or_default()
    }

    pub fn breakpoints_for_reference(&self, reference: SourceReference) -> Vec<Rc<Breakpoint>> {
        self.by_reference.borrow().get(&reference).cloned().unwrap_or_default()
    }

    pub fn all_breakpoints(&self) -> Vec<Rc<Breakpoint>> {
        let mut all: Vec<Rc<Breakpoint>> = self.by_path.borrow().values().flatten().cloned().collect();
        all.extend(self.by_reference.borrow().values().flatten().cloned());
        all
    }

    /// Finds the Breakpoint a `Debugger.breakpointResolved` event refers to.
    pub fn find_by_installed_id(&self, cdp_id: &str) -> Option<Rc<Breakpoint>> {
        self.all_breakpoints()
            .into_iter()
            .find(|bp| bp.installed_ids().iter().any(|id| id.0 == cdp_id))
    }

    /// Maps CDP breakpoint ids (as reported by a pause's `hitBreakpoints`)
    /// back to the DAP [`BreakpointId`]s the client already knows about.
    pub fn resolve_hit_ids(&self, cdp_ids: &[String]) -> Vec<i64> {
        let all = self.all_breakpoints();
        cdp_ids
            .iter()
            .filter_map(|cdp_id| {
                all.iter()
                    .find(|bp| bp.installed_ids().iter().any(|id| &id.0 == cdp_id))
                    .map(|bp| bp.id.0)
            })
            .collect()
    }

    /// Called when a newly parsed script's source map resolves authored
    /// sources: looks up breakpoints registered against those sources (by
    /// path and by reference) and re-sets them at the script's current
    /// sibling locations.
    pub async fn update_for_source_map(
        &self,
        thread: &Thread,
        authored_paths: &[PathBuf],
        authored_references: &[SourceReference],
        sources: &SourceContainer,
        predictor: Option<&BreakpointPredictor>,
    ) -> Result<(), CdpError> {
        let mut targets = Vec::new();
        for path in authored_paths {
            targets.extend(self.breakpoints_for_path(path));
        }
        for reference in authored_references {
            targets.extend(self.breakpoints_for_reference(*reference));
        }
        for bp in targets {
            bp.set(thread, sources, predictor).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_expression_wraps_console_log_with_source_url() {
        let bp = Breakpoint::new(
            BreakpointId(1),
            BreakpointAnchor::Reference(SourceReference(1)),
            BreakpointSpec {
                line: 1,
                column: None,
                condition: None,
                hit_condition: None,
                log_message: Some("x = {x}".to_string()),
            },
            SourceReference(1),
        );
        let expr = bp.log_expression().unwrap();
        assert!(expr.contains("console.log(`x = ${x}`)"));
        assert!(expr.ends_with("//# sourceURL=logpoint.cdp"));
    }

    #[test]
    fn log_expression_combines_with_condition() {
        let bp = Breakpoint::new(
            BreakpointId(1),
            BreakpointAnchor::Reference(SourceReference(1)),
            BreakpointSpec {
                line: 1,
                column: None,
                condition: Some("x > 0".to_string()),
                hit_condition: None,
                log_message: Some("hit".to_string()),
            },
            SourceReference(1),
        );
        let expr = bp.log_expression().unwrap();
        assert!(expr.starts_with("(x > 0) && ("));
    }

    #[test]
    fn idempotence_key_rejects_duplicate_triples() {
        let bp = Breakpoint::new(
            BreakpointId(1),
            BreakpointAnchor::Reference(SourceReference(1)),
            BreakpointSpec::default(),
            SourceReference(1),
        );
        assert!(bp.try_claim_triple("u", 1, 1));
        assert!(!bp.try_claim_triple("u", 1, 1));
        assert!(bp.try_claim_triple("u", 1, 2));
    }

    #[test]
    fn unverified_until_a_location_resolves() {
        let bp = Breakpoint::new(
            BreakpointId(1),
            BreakpointAnchor::Reference(SourceReference(1)),
            BreakpointSpec::default(),
            SourceReference(1),
        );
        assert!(!bp.is_verified());
    }
}
