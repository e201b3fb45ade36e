//! One CDP execution context: script registry, pause state, evaluation and
//! stepping, console/exception forwarding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::cdp::client::{self, CdpClient, CdpError};
use crate::cdp::messages::{
    CallFrame, ConsoleApiCalledParams, ExceptionThrownParams, PausedParams, PauseParams,
    ResumeParams, RunIfWaitingForDebuggerParams, Scope as CdpScope, SessionId,
    SetBlackboxPatternsParams, SetPauseOnExceptionsParams, StepIntoParams, StepOutParams,
    StepOverParams,
};
use crate::context::AdapterContext;
use crate::skip_files::BlackboxManager;
use crate::source_container::{RawLocation, ScriptId, SourceContainer, SourceReference, UiLocation};
use crate::stack_trace::{FrameId, SharedStackTrace, StackTrace};
use crate::variables::{render_remote_object_summary, VariableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub i64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionBreakpointMode {
    None,
    Uncaught,
    All,
}

impl ExceptionBreakpointMode {
    pub fn from_dap_filters(filters: &[String]) -> Self {
        if filters.iter().any(|f| f == "all") {
            Self::All
        } else if filters.iter().any(|f| f == "uncaught") {
            Self::Uncaught
        } else {
            Self::None
        }
    }

    fn cdp_state(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Uncaught => "uncaught",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PauseState {
    Initializing,
    Running,
    Paused {
        reason: String,
        description: Option<String>,
        hit_breakpoint_ids: Vec<String>,
        stack_trace: SharedStackTrace,
    },
    Disposed,
}

/// One console-forwarded line or a caught/uncaught exception, already
/// rendered to DAP `output`-body shape by the caller's event translator.
#[derive(Debug, Clone)]
pub struct ConsoleEvent {
    pub category: String,
    pub output: String,
}

pub struct Thread {
    pub id: ThreadId,
    pub session_id: SessionId,
    pub default_script_offset: (i64, i64),
    client: Rc<dyn CdpClient>,
    sources: Rc<SourceContainer>,
    blackbox: Rc<BlackboxManager>,
    context: AdapterContext,
    scripts: RefCell<HashMap<ScriptId, SourceReference>>,
    state: RefCell<PauseState>,
    variables: VariableStore,
    script_source_map_handler: RefCell<Option<Box<dyn Fn(&ScriptId) -> bool>>>,
    /// Raw call frames from the most recent `Debugger.paused`, keyed by
    /// `callFrameId`, so `scopes` can hand back a frame's own scope chain
    /// without re-fetching it. Cleared on resume, same lifetime as
    /// `variables_reference` allocations.
    raw_call_frames: RefCell<HashMap<String, CallFrame>>,
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl Thread {
    pub fn new(
        id: ThreadId,
        session_id: SessionId,
        client: Rc<dyn CdpClient>,
        sources: Rc<SourceContainer>,
        blackbox: Rc<BlackboxManager>,
        context: AdapterContext,
    ) -> Self {
        Self {
            id,
            session_id,
            default_script_offset: (0, 0),
            client,
            sources,
            blackbox,
            context,
            scripts: RefCell::new(HashMap::new()),
            state: RefCell::new(PauseState::Initializing),
            variables: VariableStore::new(),
            script_source_map_handler: RefCell::new(None),
            raw_call_frames: RefCell::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> PauseState {
        self.state.borrow().clone()
    }

    pub fn is_paused(&self) -> bool {
        matches!(*self.state.borrow(), PauseState::Paused { .. })
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn sources(&self) -> &Rc<SourceContainer> {
        &self.sources
    }

    pub fn cdp_client(&self) -> &dyn CdpClient {
        &*self.client
    }

    /// Installed once per attached thread: invoked with the script id named
    /// by a held instrumentation pause, before the thread is allowed out of
    /// it. Returning `true` means "stay paused regardless" (a resolved
    /// breakpoint landed at line/column <= 1).
    pub fn set_script_source_map_handler(&self, handler: impl Fn(&ScriptId) -> bool + 'static) {
        *self.script_source_map_handler.borrow_mut() = Some(Box::new(handler));
    }

    /// Whether a held instrumentation pause for `script_id` must stay paused.
    /// With no handler installed (no thread-level gate configured), there is
    /// nothing forcing a hold, so the runtime is let go.
    pub fn should_remain_paused(&self, script_id: &ScriptId) -> bool {
        self.script_source_map_handler
            .borrow()
            .as_ref()
            .map(|handler| handler(script_id))
            .unwrap_or(false)
    }

    /// Releases the pause CDP holds for an armed instrumentation
    /// breakpoint — distinct from `resume`, which continues a regular
    /// `Debugger.paused`.
    pub async fn resume_from_instrumentation(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), RunIfWaitingForDebuggerParams).await?;
        Ok(())
    }

    pub fn register_script(&self, script_id: ScriptId, source_reference: SourceReference) {
        self.scripts.borrow_mut().insert(script_id, source_reference);
    }

    pub fn source_reference_for_script(&self, script_id: &str) -> Option<SourceReference> {
        self.scripts.borrow().get(script_id).copied()
    }

    pub fn raw_to_ui_location(&self, raw: &RawLocation) -> Option<UiLocation> {
        let source_ref = self.source_reference_for_script(&raw.script_id)?;
        Some(UiLocation {
            source: source_ref,
            line: raw.line + 1,
            column: raw.column + 1,
        })
    }

    /// Handles `Debugger.paused`: captures the pause details and lazily
    /// constructs the initial StackTrace segment. Script-source-map-driven
    /// breakpoint reconciliation runs through
    /// `set_script_source_map_handler` before the caller resumes.
    pub fn on_paused(&self, params: PausedParams) {
        let context = self.context.clone();
        let scripts = &self.scripts;

        let stack_trace = StackTrace::from_paused(
            &params.call_frames,
            params.async_stack_trace,
            params.async_stack_trace_id.clone(),
            move || context.next_frame_id(),
            |cf| {
                let source_ref = *scripts.borrow().get(&cf.location.script_id)?;
                Some(UiLocation {
                    source: source_ref,
                    line: cf.location.line_number + 1,
                    column: cf.location.column_number.unwrap_or(0) + 1,
                })
            },
        );

        let description = params
            .data
            .as_ref()
            .and_then(|d| d.get("description"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        *self.raw_call_frames.borrow_mut() = params
            .call_frames
            .iter()
            .map(|cf| (cf.call_frame_id.clone(), cf.clone()))
            .collect();

        *self.state.borrow_mut() = PauseState::Paused {
            reason: params.reason,
            description,
            hit_breakpoint_ids: params.hit_breakpoints,
            stack_trace: Rc::new(stack_trace),
        };
    }

    /// A frame's scope chain, as captured at the last `Debugger.paused`.
    pub fn scope_chain_for_call_frame(&self, call_frame_id: &str) -> Option<Vec<CdpScope>> {
        self.raw_call_frames
            .borrow()
            .get(call_frame_id)
            .map(|cf| cf.scope_chain.clone())
    }

    pub fn on_resumed(&self) {
        self.variables.clear();
        self.raw_call_frames.borrow_mut().clear();
        *self.state.borrow_mut() = PauseState::Running;
    }

    pub fn dispose(&self) {
        self.variables.clear();
        self.raw_call_frames.borrow_mut().clear();
        self.scripts.borrow_mut().clear();
        *self.state.borrow_mut() = PauseState::Disposed;
    }

    pub async fn resume(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), ResumeParams::default()).await?;
        Ok(())
    }

    pub async fn step_over(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), StepOverParams).await?;
        Ok(())
    }

    pub async fn step_into(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), StepIntoParams).await?;
        Ok(())
    }

    pub async fn step_out(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), StepOutParams).await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), CdpError> {
        client::send(&*self.client, Some(&self.session_id), PauseParams).await?;
        Ok(())
    }

    /// Pushes the currently configured skip patterns down to the runtime
    /// so stepping skips them without a round-trip per frame.
    pub async fn apply_blackbox_patterns(&self) -> Result<(), CdpError> {
        client::send(
            &*self.client,
            Some(&self.session_id),
            SetBlackboxPatternsParams {
                patterns: self.blackbox.patterns(),
            },
        )
        .await?;
        Ok(())
    }

    /// Whether a script counts as non-user code, consulted when deciding
    /// whether a frame should be hidden from a materialized stack trace.
    pub fn is_script_blackboxed(&self, script_id: &str) -> bool {
        self.sources
            .script(script_id)
            .map(|s| self.blackbox.is_skipped(&s.url))
            .unwrap_or(false)
    }

    pub async fn set_exception_breakpoints(
        &self,
        mode: ExceptionBreakpointMode,
    ) -> Result<(), CdpError> {
        client::send(
            &*self.client,
            Some(&self.session_id),
            SetPauseOnExceptionsParams {
                state: mode.cdp_state().to_string(),
            },
        )
        .await?;
        Ok(())
    }

    /// Evaluates an expression: against the call frame named by `frame_id`
    /// when paused with a matching frame, otherwise against the thread's
    /// global execution context.
    pub async fn evaluate(
        &self,
        expression: &str,
        frame_id: Option<FrameId>,
        context_id: Option<i64>,
    ) -> Result<crate::cdp::messages::RemoteObject, CdpError> {
        let call_frame_id = frame_id.and_then(|id| self.call_frame_id(id));
        self.variables
            .evaluate(
                &*self.client,
                Some(&self.session_id),
                expression,
                call_frame_id.as_deref(),
                context_id,
            )
            .await
    }

    /// The current pause's materialized stack trace, if any.
    pub fn stack_trace(&self) -> Option<SharedStackTrace> {
        match self.state() {
            PauseState::Paused { stack_trace, .. } => Some(stack_trace),
            _ => None,
        }
    }

    pub fn call_frame_id(&self, frame_id: FrameId) -> Option<String> {
        let PauseState::Paused { stack_trace, .. } = self.state() else {
            return None;
        };
        stack_trace
            .frames()
            .into_iter()
            .find(|f| f.id == frame_id)
            .and_then(|f| f.call_frame_id)
    }

    /// Translates `Runtime.consoleAPICalled` into a DAP output line. Each
    /// argument is rendered through the same summary routine
    /// `VariableStore` uses for leaf values.
    pub fn translate_console_event(params: &ConsoleApiCalledParams) -> ConsoleEvent {
        let rendered: Vec<String> = params
            .args
            .iter()
            .map(render_remote_object_summary)
            .collect();
        ConsoleEvent {
            category: if params.type_ == "error" {
                "stderr".to_string()
            } else {
                "stdout".to_string()
            },
            output: format!("{}\n", rendered.join(" ")),
        }
    }

    pub fn translate_exception_event(params: &ExceptionThrownParams) -> ConsoleEvent {
        let description = params
            .exception_details
            .exception
            .as_ref()
            .map(render_remote_object_summary)
            .unwrap_or_else(|| params.exception_details.text.clone());
        ConsoleEvent {
            category: "stderr".to_string(),
            output: format!("{description}\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::client::CdpClient;
    use async_trait::async_trait;

    struct FakeClient;

    #[async_trait(?Send)]
    impl CdpClient for FakeClient {
        async fn send_raw(
            &self,
            _session: Option<&SessionId>,
            _method: &str,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value, CdpError> {
            Ok(serde_json::json!({}))
        }
    }

    fn make_thread() -> Thread {
        Thread::new(
            ThreadId(1),
            SessionId("s1".into()),
            Rc::new(FakeClient),
            Rc::new(SourceContainer::new()),
            Rc::new(BlackboxManager::new(&[])),
            AdapterContext::new(),
        )
    }

    #[test]
    fn starts_initializing() {
        let thread = make_thread();
        assert!(matches!(thread.state(), PauseState::Initializing));
        assert!(!thread.is_paused());
    }

    #[test]
    fn resumed_clears_variables_and_state() {
        let thread = make_thread();
        thread.variables().register(1, crate::variables::VariableHandle::Object {
            object_id: "x".into(),
        });
        thread.on_resumed();
        assert!(matches!(thread.state(), PauseState::Running));
        assert!(thread.variables().handle(1).is_none());
    }

    #[test]
    fn dispose_clears_script_table() {
        let thread = make_thread();
        thread.register_script("s1".into(), SourceReference(1));
        thread.dispose();
        assert!(thread.source_reference_for_script("s1").is_none());
        assert!(matches!(thread.state(), PauseState::Disposed));
    }

    #[test_case::test_case(&[], ExceptionBreakpointMode::None ; "no filters")]
    #[test_case::test_case(&["uncaught".to_string()], ExceptionBreakpointMode::Uncaught ; "uncaught only")]
    #[test_case::test_case(&["all".to_string()], ExceptionBreakpointMode::All ; "all")]
    fn exception_mode_from_filters(filters: &[String], expected: ExceptionBreakpointMode) {
        assert_eq!(ExceptionBreakpointMode::from_dap_filters(filters), expected);
    }

    #[test]
    fn unknown_script_is_not_blackboxed() {
        let thread = make_thread();
        assert!(!thread.is_script_blackboxed("missing"));
    }

    #[test]
    fn no_source_map_handler_means_no_hold() {
        let thread = make_thread();
        assert!(!thread.should_remain_paused(&"sc1".to_string()));
    }

    #[test]
    fn installed_source_map_handler_gates_the_hold() {
        let thread = make_thread();
        thread.set_script_source_map_handler(|script_id| script_id == "hold-me");
        assert!(thread.should_remain_paused(&"hold-me".to_string()));
        assert!(!thread.should_remain_paused(&"sc1".to_string()));
    }

    #[test]
    fn console_error_goes_to_stderr() {
        let params = ConsoleApiCalledParams {
            type_: "error".to_string(),
            args: vec![crate::cdp::messages::RemoteObject {
                type_: "string".to_string(),
                value: Some(serde_json::Value::String("boom".into())),
                ..Default::default()
            }],
            execution_context_id: 1,
            timestamp: 0.0,
        };
        let event = Thread::translate_console_event(&params);
        assert_eq!(event.category, "stderr");
        assert_eq!(event.output, "boom\n");
    }
}
