//! Top-level orchestrator: wires DAP requests to `Thread`, `BreakpointManager`,
//! `TargetManager`, `SourceContainer` and `VariableStore`, and turns CDP
//! events into outgoing DAP events.
//!
//! `AdapterSession` itself never touches a transport — the embedder feeds it
//! already-parsed DAP request arguments and CDP event payloads, and drains
//! `dap::Event`s it queues in response. See `adapter-cli` for a minimal
//! embedder.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use crate::breakpoints::predictor::BreakpointPredictor;
use crate::breakpoints::{Breakpoint, BreakpointAnchor, BreakpointManager, BreakpointSpec};
use crate::cdp::client::{self, CdpClient};
use crate::cdp::messages as cdp;
use crate::context::AdapterContext;
use crate::dap::{
    self, BreakpointEventBody, Capabilities, ContinueResponseBody, ContinuedEventBody,
    EvaluateResponseBody, Event, ExceptionBreakpointsFilter, ExitedEventBody,
    LoadedSourceEventBody, OutputEventBody, ScopesResponseBody, SetBreakpointsResponseBody,
    SetVariableResponseBody, SourceResponseBody, StackTraceResponseBody, StoppedEventBody,
    TerminatedEventBody, ThreadEventBody, ThreadsResponseBody, VariablesResponseBody,
};
use crate::dap::{
    Breakpoint as DapBreakpoint, Scope as DapScope, Source as DapSource,
    StackFrame as DapStackFrame, Thread as DapThread,
};
use crate::dap::{
    BreakpointLocation, BreakpointLocationsArguments, BreakpointLocationsResponseBody,
    ContinueArguments, EvaluateArguments, InitializeRequestArguments, NextArguments,
    PauseArguments, ScopesArguments, SetBreakpointsArguments, SetExceptionBreakpointsArguments,
    SetVariableArguments, SourceArguments, StackTraceArguments, StepInArguments,
    StepOutArguments, VariablesArguments,
};
use crate::error::{AdapterError, AdapterResult};
use crate::path_resolver::SourcePathResolver;
use crate::skip_files::BlackboxManager;
use crate::source_container::{RawLocation, Script, SourceContainer, SourceReference, UiLocation};
use crate::sourcemap::{SourceMap, SourceMapLoader};
use crate::stack_trace::{FrameId, StackFrame as CoreStackFrame};
use crate::target_manager::{Target, TargetEvent, TargetManager};
use crate::thread::{ExceptionBreakpointMode, Thread, ThreadId};
use crate::variables::VariableHandle;

/// One running debug session: every collaborator plus the bookkeeping that
/// routes a DAP request to the right `Thread` and renders its result back.
pub struct AdapterSession {
    context: AdapterContext,
    pub sources: Rc<SourceContainer>,
    pub breakpoints: Rc<BreakpointManager>,
    pub targets: Rc<TargetManager>,
    pub blackbox: Rc<BlackboxManager>,
    pub predictor: Rc<RefCell<BreakpointPredictor>>,
    path_resolver: SourcePathResolver,
    client: Rc<dyn CdpClient>,
    threads: Rc<RefCell<BTreeMap<ThreadId, Rc<Thread>>>>,
    /// Which thread owns a `variablesReference`, populated whenever one is
    /// minted (scopes, evaluate, nested object/array expansion).
    var_owner: Rc<RefCell<HashMap<i64, ThreadId>>>,
    /// Which thread owns a materialized `FrameId`, populated on every pause
    /// and every `stackTrace` expansion — `scopes`/`evaluate` only carry a
    /// frame id, not a thread id, so this is how they find their way back.
    frame_owner: Rc<RefCell<HashMap<FrameId, ThreadId>>>,
    next_thread_id: Cell<i64>,
    events: Rc<RefCell<VecDeque<Event>>>,
    /// Set once `terminated`/`exited` have been raised, so a transport
    /// disconnect racing the main target's own detach can't double-fire them.
    terminated: Rc<Cell<bool>>,
}

impl AdapterSession {
    pub fn new(
        client: Rc<dyn CdpClient>,
        path_resolver: SourcePathResolver,
        skip_file_patterns: &[String],
    ) -> Self {
        let context = AdapterContext::new();
        let targets = Rc::new(TargetManager::new());
        let threads: Rc<RefCell<BTreeMap<ThreadId, Rc<Thread>>>> =
            Rc::new(RefCell::new(BTreeMap::new()));
        let events: Rc<RefCell<VecDeque<Event>>> = Rc::new(RefCell::new(VecDeque::new()));
        let terminated = Rc::new(Cell::new(false));

        // A target's thread is created and registered before `TargetManager`
        // ever notifies `Attached` for it, and disposed from within
        // `TargetManager::detach` with `Detached` still firing while it's
        // attached, so this is the one place DAP `thread` events are raised
        // for every attachable target anywhere in the tree. The main
        // target's own detach additionally ends the session (§4.5): once
        // it's gone there is nothing left for the client to debug.
        {
            let threads = threads.clone();
            let events = events.clone();
            let context = context.clone();
            let terminated = terminated.clone();
            targets.on_event(move |event, target| {
                let Some(thread) = target.thread.borrow().clone() else {
                    return;
                };
                let reason = match event {
                    TargetEvent::Attached => "started",
                    TargetEvent::Detached { .. } => {
                        threads.borrow_mut().remove(&thread.id);
                        "exited"
                    }
                };
                push_event(
                    &events,
                    &context,
                    "thread",
                    ThreadEventBody {
                        reason: reason.to_string(),
                        thread_id: thread.id.0,
                    },
                );

                if let TargetEvent::Detached { was_main: true } = event {
                    emit_terminated(&events, &context, &terminated);
                }
            });
        }

        Self {
            breakpoints: Rc::new(BreakpointManager::new(context.clone())),
            sources: Rc::new(SourceContainer::with_context(context.clone())),
            context,
            targets,
            blackbox: Rc::new(BlackboxManager::new(skip_file_patterns)),
            predictor: Rc::new(RefCell::new(BreakpointPredictor::new())),
            path_resolver,
            client,
            threads,
            var_owner: Rc::new(RefCell::new(HashMap::new())),
            frame_owner: Rc::new(RefCell::new(HashMap::new())),
            next_thread_id: Cell::new(0),
            events,
            terminated,
        }
    }

    /// A fatal CDP transport disconnect: ends the session the same way the
    /// main target's own detach does, for an embedder that detects the
    /// underlying socket closing out from under an active session.
    pub fn on_transport_closed(&self) {
        emit_terminated(&self.events, &self.context, &self.terminated);
    }

    fn emit(&self, name: &str, body: impl Serialize) {
        push_event(&self.events, &self.context, name, body);
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    fn allocate_thread_id(&self) -> ThreadId {
        let id = self.next_thread_id.get() + 1;
        self.next_thread_id.set(id);
        ThreadId(id)
    }

    fn thread(&self, id: ThreadId) -> AdapterResult<Rc<Thread>> {
        self.threads
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(AdapterError::UnknownThread(id))
    }

    /// The reference implementation's single attached execution context,
    /// used wherever a request (`setBreakpoints` with no active pause,
    /// `setExceptionBreakpoints`) needs "the" thread rather than a specific
    /// one named by id.
    fn primary_thread(&self) -> Option<Rc<Thread>> {
        self.threads.borrow().values().next().cloned()
    }

    fn thread_for_variables_reference(&self, reference: i64) -> AdapterResult<Rc<Thread>> {
        let thread_id = *self
            .var_owner
            .borrow()
            .get(&reference)
            .ok_or(AdapterError::UnknownVariablesReference(reference))?;
        self.thread(thread_id)
    }

    // ------------------------------------------------------------------
    // Target/thread lifecycle (CDP-event-driven)
    // ------------------------------------------------------------------

    /// `Target.attachedToTarget`: constructs a `Thread` for attachable
    /// target types before registering the target, so `TargetManager`'s own
    /// `Attached` notification (used by embedders that want it) already
    /// sees the thread in place. Awaits the thread's own setup handshake
    /// (`Debugger.enable`/`Runtime.enable`, blackbox patterns, arming the
    /// source-map instrumentation breakpoint) before returning, so nothing
    /// else can race a `scriptParsed`/`paused` pair against an unprepared
    /// thread.
    pub async fn attach_target(
        &self,
        info: cdp::TargetInfo,
        session_id: cdp::SessionId,
        parent_session: Option<&cdp::SessionId>,
    ) -> Rc<Target> {
        self.enable_recursive_auto_attach(&session_id).await;

        let thread = if Target::is_attachable(&info.type_) {
            let id = self.allocate_thread_id();
            let thread = Rc::new(Thread::new(
                id,
                session_id.clone(),
                self.client.clone(),
                self.sources.clone(),
                self.blackbox.clone(),
                self.context.clone(),
            ));
            self.threads.borrow_mut().insert(id, thread.clone());
            self.install_script_source_map_handler(&thread);
            self.prepare_thread(&thread).await;
            Some(thread)
        } else {
            None
        };

        self.targets.attach(info, session_id, parent_session, thread)
    }

    /// `Target.setDiscoverTargets`/`Target.setAutoAttach` (flatten mode), sent
    /// against the freshly attached session itself rather than the browser
    /// root: each session needs its own auto-attach armed for CDP to keep
    /// recursing into that target's own children (a worker's nested worker,
    /// an iframe's nested iframe), which is how the tree in §4.5 ends up
    /// fully discovered instead of one level deep.
    async fn enable_recursive_auto_attach(&self, session_id: &cdp::SessionId) {
        if let Err(err) = client::send(
            &*self.client,
            Some(session_id),
            cdp::SetDiscoverTargetsParams { discover: true },
        )
        .await
        {
            log::warn!("Target.setDiscoverTargets failed for session {session_id}: {err}");
        }
        if let Err(err) = client::send(
            &*self.client,
            Some(session_id),
            cdp::SetAutoAttachParams {
                auto_attach: true,
                wait_for_debugger_on_start: true,
                flatten: true,
            },
        )
        .await
        {
            log::warn!("Target.setAutoAttach failed for session {session_id}: {err}");
        }
    }

    /// Installs the gate a held instrumentation pause (armed by
    /// `prepare_thread`) consults before the runtime is let go: a script
    /// whose newly reachable authored siblings now carry a breakpoint
    /// resolved at line/column 1 stays paused rather than racing past it.
    fn install_script_source_map_handler(&self, thread: &Rc<Thread>) {
        let sources = self.sources.clone();
        let breakpoints = self.breakpoints.clone();
        let thread_weak = Rc::downgrade(thread);
        thread.set_script_source_map_handler(move |script_id| {
            let Some(thread) = thread_weak.upgrade() else {
                return false;
            };
            let Some(source_ref) = thread.source_reference_for_script(script_id) else {
                return false;
            };
            let Some(source) = sources.source_by_reference(source_ref) else {
                return false;
            };
            source.siblings().into_iter().any(|sibling| {
                breakpoints
                    .breakpoints_for_reference(sibling)
                    .iter()
                    .filter_map(|bp| bp.resolved_location())
                    .any(|loc| loc.line <= 1 || loc.column <= 1)
            })
        });
    }

    /// Sends a newly attached thread's CDP setup handshake. Each step is
    /// best-effort: a runtime that rejects one of these (an older CDP
    /// implementation with no `EventBreakpoints` domain, say) still gets a
    /// working session, just without that refinement.
    async fn prepare_thread(&self, thread: &Rc<Thread>) {
        if let Err(err) = client::send(thread.cdp_client(), Some(&thread.session_id), cdp::DebuggerEnableParams).await
        {
            log::warn!("Debugger.enable failed for thread {}: {err}", thread.id);
        }
        if let Err(err) = client::send(thread.cdp_client(), Some(&thread.session_id), cdp::RuntimeEnableParams).await
        {
            log::warn!("Runtime.enable failed for thread {}: {err}", thread.id);
        }
        if let Err(err) = thread.apply_blackbox_patterns().await {
            log::warn!("failed to apply blackbox patterns for thread {}: {err}", thread.id);
        }
        if let Err(err) = client::send(
            thread.cdp_client(),
            Some(&thread.session_id),
            cdp::SetInstrumentationBreakpointParams {
                event_name: "instrumentation:beforeScriptWithSourceMapExecution".to_string(),
            },
        )
        .await
        {
            log::warn!("failed to arm source-map instrumentation breakpoint for thread {}: {err}", thread.id);
        }
    }

    /// `Target.detachedFromTarget`: tears the whole subtree down depth-first
    /// (handled inside `TargetManager::detach`); thread removal and
    /// `thread` "exited" events are raised by the listener registered in
    /// `new`.
    pub fn detach_target(&self, session_id: &cdp::SessionId) {
        self.targets.detach(session_id);
    }

    /// `Debugger.scriptParsed`: registers the script (and, if it carries a
    /// resolved source map, its authored siblings), announces each as a
    /// `loadedSource` event, then re-sets any breakpoint already waiting on
    /// one of the newly reachable authored paths/references.
    pub async fn on_script_parsed(
        &self,
        thread_id: ThreadId,
        params: cdp::ScriptParsedParams,
        loader: &dyn SourceMapLoader,
    ) -> AdapterResult<()> {
        let thread = self.thread(thread_id)?;

        let script = Script {
            script_id: params.script_id.clone(),
            url: params.url.clone(),
            source_map_url: params.source_map_url.clone(),
            embedded_offset_line: params.start_line,
            embedded_offset_column: params.start_column,
            hash: params.hash.clone(),
        };

        let source_map = match params.source_map_url.as_deref() {
            Some(map_url) if !map_url.is_empty() => {
                let resolved = resolve_map_url(&params.url, map_url);
                match loader.load(&resolved).await {
                    Some(raw) => match SourceMap::parse(&raw) {
                        Ok(map) => Some(map),
                        Err(err) => {
                            log::warn!("failed to parse source map {resolved}: {err}");
                            None
                        }
                    },
                    None => {
                        log::debug!("failed to fetch source map {resolved}");
                        None
                    }
                }
            }
            _ => None,
        };
        let has_map = source_map.is_some();

        let resolver = &self.path_resolver;
        let runtime_ref = self.sources.register_script(script, source_map, |path_or_url| {
            resolver.url_to_absolute_path(path_or_url)
        });
        thread.register_script(params.script_id.clone(), runtime_ref);
        self.emit_loaded_source(runtime_ref);

        if !has_map {
            return Ok(());
        }

        let mut authored_paths = Vec::new();
        let mut authored_refs = Vec::new();
        if let Some(runtime_source) = self.sources.source_by_reference(runtime_ref) {
            for sibling in runtime_source.siblings() {
                self.emit_loaded_source(sibling);
                if let Some(sibling_source) = self.sources.source_by_reference(sibling) {
                    if let Some(path) = &sibling_source.absolute_path {
                        authored_paths.push(path.clone());
                    }
                }
                authored_refs.push(sibling);
            }
        }

        let predictor = self.predictor.borrow();
        self.breakpoints
            .update_for_source_map(&thread, &authored_paths, &authored_refs, &self.sources, Some(&predictor))
            .await
            .map_err(AdapterError::Cdp)
    }

    fn emit_loaded_source(&self, reference: SourceReference) {
        let source = self.to_dap_source(reference);
        self.emit(
            "loadedSource",
            LoadedSourceEventBody {
                reason: "new".to_string(),
                source,
            },
        );
    }

    /// `Debugger.breakpointResolved`: a breakpoint installed ahead of its
    /// script loading only becomes verified once CDP resolves it, outside
    /// any `set()` call's own response.
    pub fn on_breakpoint_resolved(
        &self,
        thread_id: ThreadId,
        cdp_breakpoint_id: &str,
        location: cdp::Location,
    ) -> AdapterResult<()> {
        let thread = self.thread(thread_id)?;
        match self.breakpoints.find_by_installed_id(cdp_breakpoint_id) {
            Some(bp) => {
                let was_verified = bp.is_verified();
                bp.on_resolved(&thread, &location);
                if !was_verified && bp.is_verified() {
                    self.emit(
                        "breakpoint",
                        BreakpointEventBody {
                            reason: "changed".to_string(),
                            breakpoint: self.to_dap_breakpoint(&bp),
                        },
                    );
                }
            }
            // A resolution for an id this session never installed (e.g. one
            // left over from a breakpoint already removed) is swallowed,
            // not asserted on.
            None => log::debug!("breakpointResolved for unknown id {cdp_breakpoint_id}"),
        }
        Ok(())
    }

    /// `Debugger.paused`: for an ordinary pause, materializes the stack and
    /// emits `stopped`. A pause raised by the source-map instrumentation
    /// breakpoint armed in `prepare_thread` is intercepted instead — by the
    /// time it fires, `on_script_parsed` has already reconciled breakpoints
    /// for the script's authored siblings (CDP orders `scriptParsed` before
    /// the matching pause), so unless `Thread::should_remain_paused` says a
    /// resolved location needs the hold, the runtime is waved through via
    /// `Runtime.runIfWaitingForDebugger` and the client never sees it.
    pub async fn on_paused(&self, thread_id: ThreadId, params: cdp::PausedParams) -> AdapterResult<()> {
        let thread = self.thread(thread_id)?;

        if params.reason == "instrumentation" {
            let script_id = params
                .data
                .as_ref()
                .and_then(|d| d.get("scriptId"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            let remain_paused = match &script_id {
                Some(id) => thread.should_remain_paused(id),
                None => true,
            };
            if !remain_paused {
                thread.resume_from_instrumentation().await.map_err(AdapterError::Cdp)?;
                return Ok(());
            }
        }

        thread.on_paused(params.clone());

        if let Some(trace) = thread.stack_trace() {
            for frame in trace.frames() {
                self.frame_owner.borrow_mut().insert(frame.id, thread_id);
            }
        }

        let hit_ids = self.breakpoints.resolve_hit_ids(&params.hit_breakpoints);
        self.emit(
            "stopped",
            StoppedEventBody {
                reason: params.reason,
                description: None,
                thread_id: Some(thread_id.0),
                preserve_focus_hint: None,
                text: None,
                all_threads_stopped: true,
                hit_breakpoint_ids: if hit_ids.is_empty() { None } else { Some(hit_ids) },
            },
        );
        Ok(())
    }

    pub fn on_resumed(&self, thread_id: ThreadId) -> AdapterResult<()> {
        let thread = self.thread(thread_id)?;
        thread.on_resumed();
        self.emit(
            "continued",
            ContinuedEventBody {
                thread_id: thread_id.0,
                all_threads_continued: false,
            },
        );
        Ok(())
    }

    pub fn on_console_api_called(&self, params: &cdp::ConsoleApiCalledParams) {
        let event = Thread::translate_console_event(params);
        self.emit_output(event.category, event.output);
    }

    pub fn on_exception_thrown(&self, params: &cdp::ExceptionThrownParams) {
        let event = Thread::translate_exception_event(params);
        self.emit_output(event.category, event.output);
    }

    fn emit_output(&self, category: String, output: String) {
        self.emit(
            "output",
            OutputEventBody {
                category: Some(category),
                output,
                group: None,
                variables_reference: None,
                source: None,
                line: None,
                column: None,
                data: None,
            },
        );
    }

    // ------------------------------------------------------------------
    // DAP requests
    // ------------------------------------------------------------------

    pub fn initialize(&self, _args: InitializeRequestArguments) -> Capabilities {
        Capabilities {
            supports_configuration_done_request: true,
            supports_conditional_breakpoints: true,
            supports_evaluate_for_hovers: true,
            supports_set_variable: true,
            supports_log_points: true,
            supports_delayed_stack_trace_loading: true,
            supports_loaded_sources_request: true,
            supports_breakpoint_locations_request: true,
            supports_terminate_request: true,
            exception_breakpoint_filters: vec![
                ExceptionBreakpointsFilter {
                    filter: "all".to_string(),
                    label: "All Exceptions".to_string(),
                    default: false,
                },
                ExceptionBreakpointsFilter {
                    filter: "uncaught".to_string(),
                    label: "Uncaught Exceptions".to_string(),
                    default: true,
                },
            ],
            ..Default::default()
        }
    }

    pub fn threads(&self) -> ThreadsResponseBody {
        let threads = self
            .threads
            .borrow()
            .values()
            .map(|t| DapThread {
                id: t.id.0,
                name: format!("thread-{}", t.id.0),
            })
            .collect();
        ThreadsResponseBody { threads }
    }

    /// Replaces the breakpoint set for one source. Per the design's
    /// singular-thread wording, installation (when any thread is attached)
    /// always targets the first attached thread; per-script reconciliation
    /// for other threads happens separately through `on_script_parsed`.
    pub async fn set_breakpoints(
        &self,
        args: SetBreakpointsArguments,
    ) -> AdapterResult<SetBreakpointsResponseBody> {
        let (anchor, source_reference) = self.anchor_for_source(&args.source)?;
        let specs: Vec<BreakpointSpec> = args
            .breakpoints
            .unwrap_or_default()
            .into_iter()
            .map(|b| BreakpointSpec {
                line: b.line,
                column: b.column,
                condition: b.condition,
                hit_condition: b.hit_condition,
                log_message: b.log_message,
            })
            .collect();

        let thread = self.primary_thread();
        let predictor = self.predictor.borrow();
        let created = self
            .breakpoints
            .set_breakpoints(
                anchor,
                source_reference,
                specs,
                thread.as_deref(),
                &self.sources,
                Some(&predictor),
            )
            .await
            .map_err(AdapterError::Cdp)?;

        let breakpoints = created.iter().map(|bp| self.to_dap_breakpoint(bp)).collect();
        Ok(SetBreakpointsResponseBody { breakpoints })
    }

    pub async fn set_exception_breakpoints(
        &self,
        args: SetExceptionBreakpointsArguments,
    ) -> AdapterResult<()> {
        let mode = ExceptionBreakpointMode::from_dap_filters(&args.filters);
        self.breakpoints.set_exception_mode(mode);
        if let Some(thread) = self.primary_thread() {
            thread
                .set_exception_breakpoints(mode)
                .await
                .map_err(AdapterError::Cdp)?;
        }
        Ok(())
    }

    /// Answers `breakpointLocations`: the set of columns a breakpoint could
    /// actually land on within the requested line range, queried from the
    /// runtime via `Debugger.getPossibleBreakpoints` against whichever
    /// compiled script backs this source (directly, or through its first
    /// compiled sibling for an authored source), then translated back to
    /// the requesting source's own coordinates.
    pub async fn breakpoint_locations(
        &self,
        args: BreakpointLocationsArguments,
    ) -> AdapterResult<BreakpointLocationsResponseBody> {
        let (_, source_reference) = self.anchor_for_source(&args.source)?;
        let Some(thread) = self.primary_thread() else {
            return Ok(BreakpointLocationsResponseBody { breakpoints: Vec::new() });
        };
        let Some(source) = self.sources.source_by_reference(source_reference) else {
            return Ok(BreakpointLocationsResponseBody { breakpoints: Vec::new() });
        };

        let query_loc = UiLocation {
            source: source_reference,
            line: args.line,
            column: args.column.unwrap_or(1),
        };

        let (script_id, start_line, start_column) = match &source.script_id {
            Some(id) => (id.clone(), args.line - 1, args.column.map(|c| c - 1)),
            None => {
                let Some(resolved) = source.siblings().into_iter().find_map(|sibling| {
                    let sib_script_id = self.sources.source_by_reference(sibling)?.script_id.clone()?;
                    let loc = self
                        .sources
                        .current_sibling_ui_locations(query_loc, Some(sibling))
                        .into_iter()
                        .next()?;
                    Some((sib_script_id, loc.line - 1, Some(loc.column - 1)))
                }) else {
                    return Ok(BreakpointLocationsResponseBody { breakpoints: Vec::new() });
                };
                resolved
            }
        };

        let end = args.end_line.map(|end_line| cdp::Location {
            script_id: script_id.clone(),
            line_number: end_line - 1,
            column_number: args.end_column.map(|c| c - 1),
        });

        let result = client::send(
            thread.cdp_client(),
            Some(&thread.session_id),
            cdp::GetPossibleBreakpointsParams {
                start: cdp::Location {
                    script_id,
                    line_number: start_line,
                    column_number: start_column,
                },
                end,
                restrict_to_function: false,
            },
        )
        .await
        .map_err(AdapterError::Cdp)?;

        let breakpoints = result
            .locations
            .into_iter()
            .filter_map(|loc| {
                let raw = RawLocation {
                    script_id: loc.script_id,
                    line: loc.line_number,
                    column: loc.column_number.unwrap_or(0),
                };
                let ui = thread.raw_to_ui_location(&raw)?;
                let translated = self
                    .sources
                    .current_sibling_ui_locations(ui, Some(source_reference))
                    .into_iter()
                    .next()
                    .unwrap_or(ui);
                Some(BreakpointLocation {
                    line: translated.line,
                    column: Some(translated.column),
                })
            })
            .collect();

        Ok(BreakpointLocationsResponseBody { breakpoints })
    }

    pub async fn stack_trace(
        &self,
        args: StackTraceArguments,
    ) -> AdapterResult<StackTraceResponseBody> {
        let thread_id = ThreadId(args.thread_id);
        let thread = self.thread(thread_id)?;
        let trace = thread.stack_trace().ok_or(AdapterError::NotPaused(thread_id))?;

        let start = args.start_frame.unwrap_or(0).max(0) as usize;
        let levels = args.levels.filter(|&l| l > 0).map(|l| l as usize);
        let wanted_end = levels.map(|l| start + l);

        while trace.has_more() {
            if let Some(end) = wanted_end {
                if trace.materialized_count() >= end {
                    break;
                }
            }
            let context = self.context.clone();
            let pending_id = trace.pending_parent_id();
            let client = thread.cdp_client();
            let session_id = thread.session_id.clone();
            trace
                .expand(
                    move || context.next_frame_id(),
                    |cf: &cdp::RuntimeCallFrame| {
                        thread.raw_to_ui_location(&RawLocation {
                            script_id: cf.script_id.clone(),
                            line: cf.line_number,
                            column: cf.column_number,
                        })
                    },
                    async move {
                        let stack_trace_id = pending_id?;
                        client::send(
                            client,
                            Some(&session_id),
                            cdp::GetStackTraceParams { stack_trace_id },
                        )
                        .await
                        .ok()
                    },
                )
                .await;
        }

        let mut frames = trace.frames();
        for frame in &frames {
            self.frame_owner.borrow_mut().insert(frame.id, thread_id);
        }
        if let Some(end) = wanted_end {
            frames.truncate(end);
        }
        let frames: Vec<DapStackFrame> = frames
            .into_iter()
            .skip(start)
            .filter(|f| !self.is_frame_blackboxed(&thread, f))
            .map(|f| self.to_dap_stack_frame(&f))
            .collect();
        let total_frames = Some(trace.materialized_count() as i64);

        Ok(StackTraceResponseBody {
            stack_frames: frames,
            total_frames,
        })
    }

    pub fn scopes(&self, args: ScopesArguments) -> AdapterResult<ScopesResponseBody> {
        let frame_id = FrameId(args.frame_id);
        let thread_id = *self
            .frame_owner
            .borrow()
            .get(&frame_id)
            .ok_or(AdapterError::UnknownFrameId(args.frame_id))?;
        let thread = self.thread(thread_id)?;
        let call_frame_id = thread
            .call_frame_id(frame_id)
            .ok_or(AdapterError::UnknownFrameId(args.frame_id))?;
        let cdp_scopes = thread
            .scope_chain_for_call_frame(&call_frame_id)
            .unwrap_or_default();

        let scopes = cdp_scopes
            .into_iter()
            .map(|scope| {
                let reference = self.context.next_variables_reference();
                thread.variables().register(
                    reference,
                    VariableHandle::Scope {
                        object_id: scope.object.object_id.clone().unwrap_or_default(),
                        call_frame_id: call_frame_id.clone(),
                    },
                );
                self.var_owner.borrow_mut().insert(reference, thread_id);
                DapScope {
                    name: scope.name.clone().unwrap_or_else(|| scope_type_label(&scope.type_).to_string()),
                    presentation_hint: Some(scope_type_label(&scope.type_).to_string()),
                    variables_reference: reference,
                    named_variables: None,
                    indexed_variables: None,
                    expensive: scope.type_ == "global",
                    source: None,
                    line: None,
                    column: None,
                    end_line: None,
                    end_column: None,
                }
            })
            .collect();

        Ok(ScopesResponseBody { scopes })
    }

    pub async fn variables(&self, args: VariablesArguments) -> AdapterResult<VariablesResponseBody> {
        let thread = self.thread_for_variables_reference(args.variables_reference)?;
        let context = self.context.clone();
        let var_owner = self.var_owner.clone();
        let thread_id = thread.id;
        let variables = thread
            .variables()
            .variables(thread.cdp_client(), Some(&thread.session_id), args.variables_reference, move || {
                let reference = context.next_variables_reference();
                var_owner.borrow_mut().insert(reference, thread_id);
                reference
            })
            .await
            .map_err(AdapterError::Cdp)?;
        Ok(VariablesResponseBody { variables })
    }

    pub async fn set_variable(
        &self,
        args: SetVariableArguments,
    ) -> AdapterResult<SetVariableResponseBody> {
        let thread = self.thread_for_variables_reference(args.variables_reference)?;
        let result = thread
            .variables()
            .set_variable(
                thread.cdp_client(),
                Some(&thread.session_id),
                args.variables_reference,
                &args.name,
                &args.value,
                None,
            )
            .await
            .map_err(AdapterError::InvalidExpression)?;
        let (value, reference) = self.register_evaluate_result(&thread, &result);
        Ok(SetVariableResponseBody {
            value,
            type_: Some(result.type_),
            variables_reference: reference,
            named_variables: None,
            indexed_variables: None,
        })
    }

    pub async fn evaluate(&self, args: EvaluateArguments) -> AdapterResult<EvaluateResponseBody> {
        let (thread, frame_id) = match args.frame_id {
            Some(frame_id) => {
                let frame_id = FrameId(frame_id);
                let thread_id = *self
                    .frame_owner
                    .borrow()
                    .get(&frame_id)
                    .ok_or(AdapterError::UnknownFrameId(frame_id.0))?;
                (self.thread(thread_id)?, Some(frame_id))
            }
            None => (self.primary_thread().ok_or(AdapterError::NoMainTarget)?, None),
        };

        let result = thread
            .evaluate(&args.expression, frame_id, None)
            .await
            .map_err(AdapterError::Cdp)?;
        let (value, reference) = self.register_evaluate_result(&thread, &result);

        Ok(EvaluateResponseBody {
            result: value,
            type_: Some(result.type_),
            presentation_hint: None,
            variables_reference: reference,
            named_variables: None,
            indexed_variables: None,
        })
    }

    /// Renders an `evaluate`/`setVariable` top-level result. Quoted when the
    /// remote object is itself a string, so `evaluate("'42'")` reads as
    /// `'42'` and stays visually distinct from `evaluate("42")`'s `42` —
    /// unlike `render_remote_object_summary`'s console-output rendering,
    /// which prints a logged string bare.
    fn register_evaluate_result(&self, thread: &Rc<Thread>, obj: &cdp::RemoteObject) -> (String, i64) {
        let text = match &obj.value {
            Some(serde_json::Value::String(s)) if obj.type_ == "string" => format!("'{s}'"),
            _ => crate::variables::render_remote_object_summary(obj),
        };
        let Some(object_id) = &obj.object_id else {
            return (text, 0);
        };
        let reference = self.context.next_variables_reference();
        thread
            .variables()
            .register(reference, VariableHandle::Object { object_id: object_id.clone() });
        self.var_owner.borrow_mut().insert(reference, thread.id);
        (text, reference)
    }

    pub async fn continue_(&self, args: ContinueArguments) -> AdapterResult<ContinueResponseBody> {
        let thread = self.thread(ThreadId(args.thread_id))?;
        thread.resume().await.map_err(AdapterError::Cdp)?;
        Ok(ContinueResponseBody { all_threads_continued: false })
    }

    pub async fn next(&self, args: NextArguments) -> AdapterResult<()> {
        self.thread(ThreadId(args.thread_id))?
            .step_over()
            .await
            .map_err(AdapterError::Cdp)
    }

    pub async fn step_in(&self, args: StepInArguments) -> AdapterResult<()> {
        self.thread(ThreadId(args.thread_id))?
            .step_into()
            .await
            .map_err(AdapterError::Cdp)
    }

    pub async fn step_out(&self, args: StepOutArguments) -> AdapterResult<()> {
        self.thread(ThreadId(args.thread_id))?
            .step_out()
            .await
            .map_err(AdapterError::Cdp)
    }

    pub async fn pause(&self, args: PauseArguments) -> AdapterResult<()> {
        self.thread(ThreadId(args.thread_id))?
            .pause()
            .await
            .map_err(AdapterError::Cdp)
    }

    pub async fn source(&self, args: SourceArguments) -> AdapterResult<SourceResponseBody> {
        let reference = args
            .source_reference
            .or_else(|| args.source.as_ref().and_then(|s| s.source_reference))
            .ok_or_else(|| AdapterError::SourceNotFound("no sourceReference provided".to_string()))?;
        let source = self
            .sources
            .source_by_reference(SourceReference(reference))
            .ok_or_else(|| AdapterError::SourceNotFound(format!("unknown source reference {reference}")))?;

        if let Some(path) = &source.absolute_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| AdapterError::SourceNotFound(format!("{}: {e}", path.display())))?;
            return Ok(SourceResponseBody { content, mime_type: None });
        }

        let script_id = source
            .script_id
            .as_ref()
            .ok_or_else(|| AdapterError::SourceNotFound(format!("source {reference} has no backing script")))?;
        let thread = self.primary_thread().ok_or(AdapterError::NoMainTarget)?;
        let result = client::send(
            thread.cdp_client(),
            Some(&thread.session_id),
            cdp::GetScriptSourceParams { script_id: script_id.clone() },
        )
        .await
        .map_err(AdapterError::Cdp)?;
        Ok(SourceResponseBody { content: result.script_source, mime_type: None })
    }

    // ------------------------------------------------------------------
    // DAP <-> core type rendering
    // ------------------------------------------------------------------

    fn anchor_for_source(&self, source: &DapSource) -> AdapterResult<(BreakpointAnchor, SourceReference)> {
        if let Some(path) = &source.path {
            let path_buf = PathBuf::from(path);
            let resolver = &self.path_resolver;
            let reference = self
                .sources
                .ensure_path_source(&path_buf, || resolver.absolute_path_to_url(&path_buf).map(|u| u.to_string()));
            return Ok((BreakpointAnchor::Path(path_buf), reference));
        }
        if let Some(reference) = source.source_reference {
            return Ok((BreakpointAnchor::Reference(SourceReference(reference)), SourceReference(reference)));
        }
        Err(AdapterError::SourceNotFound(
            "setBreakpoints request carried neither a path nor a sourceReference".to_string(),
        ))
    }

    fn to_dap_source(&self, reference: SourceReference) -> DapSource {
        let Some(source) = self.sources.source_by_reference(reference) else {
            return DapSource::default();
        };
        DapSource {
            name: source
                .absolute_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .or_else(|| source.url.clone()),
            path: source.absolute_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            source_reference: if source.absolute_path.is_some() { None } else { Some(reference.0) },
            presentation_hint: None,
            origin: None,
            sources: None,
            adapter_data: None,
            checksums: None,
        }
    }

    fn source_for_anchor(&self, anchor: &BreakpointAnchor) -> Option<DapSource> {
        let reference = match anchor {
            BreakpointAnchor::Path(path) => self.sources.source_by_path(path)?.source_reference,
            BreakpointAnchor::Reference(r) => *r,
        };
        Some(self.to_dap_source(reference))
    }

    fn to_dap_breakpoint(&self, bp: &Breakpoint) -> DapBreakpoint {
        let resolved = bp.resolved_location();
        let source = resolved
            .map(|loc| self.to_dap_source(loc.source))
            .or_else(|| self.source_for_anchor(&bp.anchor));
        DapBreakpoint {
            id: Some(bp.id.0),
            verified: bp.is_verified(),
            message: None,
            source,
            line: resolved.map(|l| l.line).or(Some(bp.spec.line)),
            column: resolved.map(|l| l.column).or(bp.spec.column),
            end_line: None,
            end_column: None,
        }
    }

    /// Whether `frame` belongs to a script the session's `BlackboxManager`
    /// treats as non-user code. A frame with no resolved location (an
    /// async-chain separator, or one `stack_trace`'s lazy expansion hasn't
    /// been able to locate) is never hidden this way.
    fn is_frame_blackboxed(&self, thread: &Thread, frame: &CoreStackFrame) -> bool {
        frame
            .location
            .and_then(|loc| self.script_id_for_location(&loc))
            .map(|script_id| thread.is_script_blackboxed(&script_id))
            .unwrap_or(false)
    }

    /// The runtime script backing a UiLocation: directly for a runtime
    /// source, or through whichever sibling still has one for an authored
    /// source reached over a source map.
    fn script_id_for_location(&self, loc: &UiLocation) -> Option<String> {
        let source = self.sources.source_by_reference(loc.source)?;
        if let Some(script_id) = &source.script_id {
            return Some(script_id.clone());
        }
        source
            .siblings()
            .into_iter()
            .find_map(|sibling| self.sources.source_by_reference(sibling)?.script_id.clone())
    }

    fn to_dap_stack_frame(&self, frame: &CoreStackFrame) -> DapStackFrame {
        let (source, line, column) = match frame.location {
            Some(UiLocation { source, line, column }) => (Some(self.to_dap_source(source)), line, column),
            None => (None, 0, 0),
        };
        DapStackFrame {
            id: frame.id.0,
            name: frame.name.clone(),
            source,
            line,
            column,
            end_line: None,
            end_column: None,
            can_restart: false,
            instruction_pointer_reference: None,
            module_id: None,
            presentation_hint: if frame.is_async_separator { Some("label".to_string()) } else { None },
        }
    }
}

fn emit_terminated(events: &Rc<RefCell<VecDeque<Event>>>, context: &AdapterContext, terminated: &Rc<Cell<bool>>) {
    if terminated.replace(true) {
        return;
    }
    push_event(events, context, "terminated", TerminatedEventBody { restart: None });
    push_event(events, context, "exited", ExitedEventBody { exit_code: 0 });
}

fn push_event(events: &Rc<RefCell<VecDeque<Event>>>, context: &AdapterContext, name: &str, body: impl Serialize) {
    events.borrow_mut().push_back(Event {
        seq: context.next_dap_seq(),
        event: name.to_string(),
        body: Some(serde_json::to_value(body).expect("DAP event bodies are always serializable")),
    });
}

fn scope_type_label(cdp_type: &str) -> &'static str {
    match cdp_type {
        "global" => "globals",
        "closure" => "closure",
        _ => "locals",
    }
}

/// Resolves a `sourceMappingURL` relative to its owning script's own URL,
/// except for absolute (`http(s)://`, `data:`) urls which are used as-is.
fn resolve_map_url(script_url: &str, map_url: &str) -> String {
    if map_url.starts_with("data:") || map_url.contains("://") {
        return map_url.to_string();
    }
    url::Url::parse(script_url)
        .and_then(|base| base.join(map_url))
        .map(|joined| joined.to_string())
        .unwrap_or_else(|_| map_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::cell::RefCell as StdRefCell;
    use std::collections::HashMap as StdHashMap;

    struct FakeClient {
        objects: StdRefCell<StdHashMap<String, Vec<cdp::PropertyDescriptor>>>,
    }

    impl FakeClient {
        fn new() -> Self {
            Self { objects: StdRefCell::new(StdHashMap::new()) }
        }
    }

    #[async_trait(?Send)]
    impl CdpClient for FakeClient {
        async fn send_raw(
            &self,
            _session: Option<&cdp::SessionId>,
            method: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, crate::cdp::client::CdpError> {
            match method {
                "Runtime.evaluate" => {
                    let expr = params["expression"].as_str().unwrap_or_default();
                    let result = if expr == "({foo:42})" {
                        self.objects.borrow_mut().insert(
                            "obj1".to_string(),
                            vec![cdp::PropertyDescriptor {
                                name: "foo".to_string(),
                                value: Some(cdp::RemoteObject {
                                    type_: "number".to_string(),
                                    value: Some(serde_json::json!(42)),
                                    ..Default::default()
                                }),
                                writable: Some(true),
                                get: None,
                                set: None,
                                configurable: true,
                                enumerable: true,
                                was_thrown: None,
                                is_own: Some(true),
                                symbol: None,
                            }],
                        );
                        cdp::RemoteObject {
                            type_: "object".to_string(),
                            object_id: Some("obj1".to_string()),
                            ..Default::default()
                        }
                    } else if expr == "'42'" {
                        cdp::RemoteObject {
                            type_: "string".to_string(),
                            value: Some(serde_json::json!("42")),
                            ..Default::default()
                        }
                    } else {
                        cdp::RemoteObject {
                            type_: "number".to_string(),
                            value: Some(serde_json::json!(42)),
                            ..Default::default()
                        }
                    };
                    Ok(serde_json::json!(cdp::EvaluateResult { result, exception_details: None }))
                }
                "Debugger.getPossibleBreakpoints" => {
                    Ok(serde_json::json!(cdp::GetPossibleBreakpointsResult {
                        locations: vec![cdp::BreakLocation {
                            script_id: "sc1".to_string(),
                            line_number: 5,
                            column_number: Some(2),
                        }],
                    }))
                }
                "Runtime.getProperties" => {
                    let object_id = params["objectId"].as_str().unwrap_or_default();
                    let props = self.objects.borrow().get(object_id).cloned().unwrap_or_default();
                    Ok(serde_json::json!(cdp::GetPropertiesResult {
                        result: props,
                        internal_properties: vec![],
                        exception_details: None,
                    }))
                }
                _ => Ok(serde_json::json!({})),
            }
        }
    }

    fn session() -> AdapterSession {
        let resolver = SourcePathResolver::new(crate::path_resolver::SourcePathResolverOptions::default());
        AdapterSession::new(Rc::new(FakeClient::new()), resolver, &[])
    }

    fn page_info(id: &str) -> cdp::TargetInfo {
        cdp::TargetInfo {
            target_id: id.to_string(),
            type_: "page".to_string(),
            title: String::new(),
            url: "http://localhost/".to_string(),
            attached: true,
            opener_id: None,
            browser_context_id: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn initialize_reports_core_capabilities() {
        let session = session();
        let caps = session.initialize(InitializeRequestArguments {
            client_id: None,
            client_name: None,
            adapter_id: None,
            locale: None,
            lines_start_at_1: true,
            columns_start_at_1: true,
            path_format: None,
            supports_variable_type: false,
            supports_variable_paging: false,
            supports_run_in_terminal_request: false,
            supports_memory_references: false,
            supports_progress_reporting: false,
            supports_invalidated_event: false,
        });
        assert!(caps.supports_configuration_done_request);
        assert!(caps.supports_set_variable);
        assert_eq!(caps.exception_breakpoint_filters.len(), 2);
    }

    #[test]
    fn no_threads_before_any_target_attaches() {
        let session = session();
        assert!(session.threads().threads.is_empty());
    }

    #[tokio::test]
    async fn attaching_a_page_target_creates_a_thread_and_emits_started_event() {
        let session = session();
        let target = session.attach_target(page_info("t1"), cdp::SessionId("s1".into()), None).await;
        assert!(target.thread.borrow().is_some());
        assert_eq!(session.threads().threads.len(), 1);

        let events = session.drain_events();
        assert!(events.iter().any(|e| e.event == "thread"));
    }

    #[tokio::test]
    async fn detaching_a_target_removes_its_thread_and_emits_exited_event() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        session.attach_target(page_info("t1"), session_id.clone(), None).await;
        session.drain_events();

        session.detach_target(&session_id);
        assert!(session.threads().threads.is_empty());

        let events = session.drain_events();
        assert!(events.iter().any(|e| e.event == "thread"));
    }

    #[tokio::test]
    async fn detaching_the_main_target_emits_terminated_and_exited() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        session.attach_target(page_info("t1"), session_id.clone(), None).await;
        session.drain_events();

        session.detach_target(&session_id);
        let events = session.drain_events();
        assert!(events.iter().any(|e| e.event == "terminated"));
        assert!(events.iter().any(|e| e.event == "exited"));
    }

    #[tokio::test]
    async fn instrumentation_pause_with_no_forcing_breakpoint_auto_resumes() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        let target = session.attach_target(page_info("t1"), session_id, None).await;
        let thread_id = target.thread.borrow().as_ref().unwrap().id;

        session
            .on_script_parsed(thread_id, script_parsed("sc1", "http://localhost/app.js"), &NullLoader)
            .await
            .unwrap();
        session.drain_events();

        session
            .on_paused(
                thread_id,
                cdp::PausedParams {
                    call_frames: vec![],
                    reason: "instrumentation".to_string(),
                    data: Some(serde_json::json!({"scriptId": "sc1"})),
                    hit_breakpoints: vec![],
                    async_stack_trace: None,
                    async_stack_trace_id: None,
                },
            )
            .await
            .unwrap();

        let events = session.drain_events();
        assert!(!events.iter().any(|e| e.event == "stopped"));
    }

    #[tokio::test]
    async fn transport_closed_emits_terminated_and_exited_only_once() {
        let session = session();
        session.on_transport_closed();
        session.on_transport_closed();
        let events = session.drain_events();
        assert_eq!(events.iter().filter(|e| e.event == "terminated").count(), 1);
        assert_eq!(events.iter().filter(|e| e.event == "exited").count(), 1);
    }

    #[tokio::test]
    async fn evaluate_scalar_yields_no_variables_reference() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        session.attach_target(page_info("t1"), session_id, None).await;

        let result = session
            .evaluate(EvaluateArguments {
                expression: "40 + 2".to_string(),
                frame_id: None,
                context: None,
                format: None,
            })
            .await
            .unwrap();
        assert_eq!(result.variables_reference, 0);
    }

    #[tokio::test]
    async fn evaluate_string_literal_renders_quoted_and_scalar() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        session.attach_target(page_info("t1"), session_id, None).await;

        let result = session
            .evaluate(EvaluateArguments {
                expression: "'42'".to_string(),
                frame_id: None,
                context: None,
                format: None,
            })
            .await
            .unwrap();
        assert_eq!(result.result, "'42'");
        assert_eq!(result.variables_reference, 0);
    }

    #[tokio::test]
    async fn evaluate_object_yields_reference_with_one_property() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        session.attach_target(page_info("t1"), session_id, None).await;

        let result = session
            .evaluate(EvaluateArguments {
                expression: "({foo:42})".to_string(),
                frame_id: None,
                context: None,
                format: None,
            })
            .await
            .unwrap();
        assert!(result.variables_reference > 0);

        let vars = session
            .variables(VariablesArguments {
                variables_reference: result.variables_reference,
                filter: None,
                start: None,
                count: None,
                format: None,
            })
            .await
            .unwrap();
        assert_eq!(vars.variables.len(), 1);
        assert_eq!(vars.variables[0].name, "foo");
        assert_eq!(vars.variables[0].value, "42");
    }

    #[tokio::test]
    async fn evaluate_with_no_attached_thread_fails() {
        let session = session();
        let result = session
            .evaluate(EvaluateArguments {
                expression: "1".to_string(),
                frame_id: None,
                context: None,
                format: None,
            })
            .await;
        assert!(matches!(result, Err(AdapterError::NoMainTarget)));
    }

    struct NullLoader;

    #[async_trait::async_trait(?Send)]
    impl SourceMapLoader for NullLoader {
        async fn load(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn script_parsed(script_id: &str, url: &str) -> cdp::ScriptParsedParams {
        cdp::ScriptParsedParams {
            script_id: script_id.to_string(),
            url: url.to_string(),
            start_line: 0,
            start_column: 0,
            end_line: 10,
            end_column: 0,
            execution_context_id: 1,
            hash: "h".to_string(),
            source_map_url: None,
            has_source_url: false,
            is_module: false,
            length: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn breakpoint_locations_translates_possible_breakpoints_into_ui_coordinates() {
        let session = session();
        let session_id = cdp::SessionId("s1".into());
        let target = session.attach_target(page_info("t1"), session_id, None).await;
        let thread_id = target.thread.borrow().as_ref().unwrap().id;

        session
            .on_script_parsed(thread_id, script_parsed("sc1", "http://localhost/app.js"), &NullLoader)
            .await
            .unwrap();
        session.drain_events();

        let source_reference = session.sources.source_by_url("http://localhost/app.js").unwrap().source_reference;

        let result = session
            .breakpoint_locations(BreakpointLocationsArguments {
                source: DapSource {
                    source_reference: Some(source_reference.0),
                    ..Default::default()
                },
                line: 1,
                column: None,
                end_line: None,
                end_column: None,
            })
            .await
            .unwrap();

        assert_eq!(result.breakpoints.len(), 1);
        assert_eq!(result.breakpoints[0].line, 6);
        assert_eq!(result.breakpoints[0].column, Some(3));
    }

    #[tokio::test]
    async fn breakpoint_locations_with_no_matching_source_is_empty() {
        let session = session();
        let result = session
            .breakpoint_locations(BreakpointLocationsArguments {
                source: DapSource {
                    source_reference: Some(999),
                    ..Default::default()
                },
                line: 1,
                column: None,
                end_line: None,
                end_column: None,
            })
            .await
            .unwrap();
        assert!(result.breakpoints.is_empty());
    }
}
