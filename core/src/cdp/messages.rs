//! CDP wire types: the envelope plus the Target/Debugger/Runtime domain
//! slices the adapter actually drives. Field names match the CDP spec
//! tables verbatim (camelCase on the wire); unknown/future fields are
//! absorbed by a `#[serde(flatten)]` catch-all rather than rejected, since
//! Chrome versions add fields to these payloads routinely.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ScriptId = String;
pub type RemoteObjectId = String;
pub type TargetId = String;
pub type ExecutionContextId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A CDP-side breakpoint handle, distinct from the DAP-facing
/// [`crate::breakpoints::BreakpointId`]: this is the string
/// `Debugger.setBreakpointByUrl` hands back, scoped to one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CdpBreakpointId(pub String);

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CommandEnvelope {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub method: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Response(ResponseEnvelope),
    Event(EventEnvelope),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ProtocolError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

// ============================================================================
// Target domain
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: TargetId,
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub attached: bool,
    #[serde(default)]
    pub opener_id: Option<TargetId>,
    #[serde(default)]
    pub browser_context_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedToTargetParams {
    pub session_id: SessionId,
    pub target_info: TargetInfo,
    pub waiting_for_debugger: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTargetParams {
    pub session_id: SessionId,
    #[serde(default)]
    pub target_id: Option<TargetId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCreatedParams {
    pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoChangedParams {
    pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyedParams {
    pub target_id: TargetId,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetDiscoverTargetsParams {
    pub discover: bool,
}

impl crate::cdp::client::CdpCommand for SetDiscoverTargetsParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Target.setDiscoverTargets";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetAutoAttachParams {
    pub auto_attach: bool,
    pub wait_for_debugger_on_start: bool,
    #[serde(default)]
    pub flatten: bool,
}

impl crate::cdp::client::CdpCommand for SetAutoAttachParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Target.setAutoAttach";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetParams {
    pub target_id: TargetId,
    #[serde(default)]
    pub flatten: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    pub session_id: SessionId,
}

impl crate::cdp::client::CdpCommand for AttachToTargetParams {
    type Response = AttachToTargetResult;
    const METHOD: &'static str = "Target.attachToTarget";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachFromTargetParams {
    pub session_id: SessionId,
}

impl crate::cdp::client::CdpCommand for DetachFromTargetParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Target.detachFromTarget";
}

// ============================================================================
// Domain enablement / handshake
// ============================================================================

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerEnableParams;

impl crate::cdp::client::CdpCommand for DebuggerEnableParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.enable";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEnableParams;

impl crate::cdp::client::CdpCommand for RuntimeEnableParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Runtime.enable";
}

/// Releases a target attached with `waitForDebuggerOnStart`. Distinct from
/// `Debugger.resume` — that one resumes a `Debugger.paused` pause, this one
/// releases the implicit attach-time pause before any script has run.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunIfWaitingForDebuggerParams;

impl crate::cdp::client::CdpCommand for RunIfWaitingForDebuggerParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Runtime.runIfWaitingForDebugger";
}

// ============================================================================
// EventBreakpoints domain
// ============================================================================

/// Arms a named instrumentation breakpoint. The adapter only ever uses
/// `instrumentation:beforeScriptWithSourceMapExecution`, which pauses a
/// script with an unresolved source map right before it runs so breakpoint
/// reconciliation can happen before user code is observable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInstrumentationBreakpointParams {
    pub event_name: String,
}

impl crate::cdp::client::CdpCommand for SetInstrumentationBreakpointParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "EventBreakpoints.setInstrumentationBreakpoint";
}

// ============================================================================
// Debugger domain
// ============================================================================

/// 0-based CDP location, as opposed to the 1-based [`crate::source_container::UiLocation`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub script_id: ScriptId,
    pub line_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedParams {
    pub script_id: ScriptId,
    pub url: String,
    pub start_line: i64,
    pub start_column: i64,
    pub end_line: i64,
    pub end_column: i64,
    pub execution_context_id: ExecutionContextId,
    pub hash: String,
    #[serde(default)]
    pub source_map_url: Option<String>,
    #[serde(default)]
    pub has_source_url: bool,
    #[serde(default)]
    pub is_module: bool,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedParams {
    pub call_frames: Vec<CallFrame>,
    pub reason: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub hit_breakpoints: Vec<String>,
    #[serde(default)]
    pub async_stack_trace: Option<AsyncStackTrace>,
    #[serde(default)]
    pub async_stack_trace_id: Option<StackTraceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncStackTrace {
    #[serde(default)]
    pub description: Option<String>,
    pub call_frames: Vec<RuntimeCallFrame>,
    #[serde(default)]
    pub parent: Option<Box<AsyncStackTrace>>,
    /// Set instead of `parent` once the inlined chain runs out; resolved
    /// on demand via `Debugger.getStackTrace`.
    #[serde(default)]
    pub parent_id: Option<StackTraceId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCallFrame {
    pub function_name: String,
    pub script_id: ScriptId,
    pub url: String,
    pub line_number: i64,
    pub column_number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    pub call_frame_id: String,
    pub function_name: String,
    pub location: Location,
    pub url: String,
    pub scope_chain: Vec<Scope>,
    #[serde(rename = "this")]
    pub this_obj: RemoteObject,
    #[serde(default)]
    pub return_value: Option<RemoteObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(rename = "type")]
    pub type_: String,
    pub object: RemoteObject,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_location: Option<Location>,
    #[serde(default)]
    pub end_location: Option<Location>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    pub line_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    pub breakpoint_id: String,
    pub locations: Vec<Location>,
}

impl crate::cdp::client::CdpCommand for SetBreakpointByUrlParams {
    type Response = SetBreakpointByUrlResult;
    const METHOD: &'static str = "Debugger.setBreakpointByUrl";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointParams {
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointResult {
    pub breakpoint_id: String,
    pub actual_location: Location,
}

impl crate::cdp::client::CdpCommand for SetBreakpointParams {
    type Response = SetBreakpointResult;
    const METHOD: &'static str = "Debugger.setBreakpoint";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointParams {
    pub breakpoint_id: String,
}

impl crate::cdp::client::CdpCommand for RemoveBreakpointParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.removeBreakpoint";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPossibleBreakpointsParams {
    pub start: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Location>,
    #[serde(default)]
    pub restrict_to_function: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakLocation {
    pub script_id: String,
    pub line_number: i64,
    #[serde(default)]
    pub column_number: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPossibleBreakpointsResult {
    pub locations: Vec<BreakLocation>,
}

impl crate::cdp::client::CdpCommand for GetPossibleBreakpointsParams {
    type Response = GetPossibleBreakpointsResult;
    const METHOD: &'static str = "Debugger.getPossibleBreakpoints";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResumeParams {
    #[serde(default)]
    pub terminate_on_resume: bool,
}

impl crate::cdp::client::CdpCommand for ResumeParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.resume";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepOverParams;

impl crate::cdp::client::CdpCommand for StepOverParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.stepOver";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepIntoParams;

impl crate::cdp::client::CdpCommand for StepIntoParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.stepInto";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepOutParams;

impl crate::cdp::client::CdpCommand for StepOutParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.stepOut";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseParams;

impl crate::cdp::client::CdpCommand for PauseParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.pause";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPauseOnExceptionsParams {
    pub state: String,
}

impl crate::cdp::client::CdpCommand for SetPauseOnExceptionsParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.setPauseOnExceptions";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSkipAllPausesParams {
    pub skip: bool,
}

impl crate::cdp::client::CdpCommand for SetSkipAllPausesParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.setSkipAllPauses";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBlackboxPatternsParams {
    pub patterns: Vec<String>,
}

impl crate::cdp::client::CdpCommand for SetBlackboxPatternsParams {
    type Response = serde_json::Value;
    const METHOD: &'static str = "Debugger.setBlackboxPatterns";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameParams {
    pub call_frame_id: String,
    pub expression: String,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub generate_preview: bool,
    #[serde(default)]
    pub throw_on_side_effect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameResult {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl crate::cdp::client::CdpCommand for EvaluateOnCallFrameParams {
    type Response = EvaluateOnCallFrameResult;
    const METHOD: &'static str = "Debugger.evaluateOnCallFrame";
}

/// Opaque identifier for a deferred async parent chain, handed out on an
/// `AsyncStackTrace` whose own frames ran out but whose ancestor is only
/// available on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceId {
    pub id: String,
    #[serde(default)]
    pub debugger_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStackTraceParams {
    pub stack_trace_id: StackTraceId,
}

impl crate::cdp::client::CdpCommand for GetStackTraceParams {
    type Response = AsyncStackTrace;
    const METHOD: &'static str = "Debugger.getStackTrace";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceParams {
    pub script_id: ScriptId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceResult {
    pub script_source: String,
    #[serde(default)]
    pub bytecode: Option<String>,
}

impl crate::cdp::client::CdpCommand for GetScriptSourceParams {
    type Response = GetScriptSourceResult;
    const METHOD: &'static str = "Debugger.getScriptSource";
}

// ============================================================================
// Runtime domain
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub unserializable_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub object_id: Option<RemoteObjectId>,
    #[serde(default)]
    pub preview: Option<ObjectPreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPreview {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub overflow: bool,
    #[serde(default)]
    pub properties: Vec<PropertyPreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPreview {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub value: Option<RemoteObject>,
    #[serde(default)]
    pub writable: Option<bool>,
    #[serde(default)]
    pub get: Option<RemoteObject>,
    #[serde(default)]
    pub set: Option<RemoteObject>,
    pub configurable: bool,
    pub enumerable: bool,
    #[serde(default)]
    pub was_thrown: Option<bool>,
    #[serde(default)]
    pub is_own: Option<bool>,
    #[serde(default)]
    pub symbol: Option<RemoteObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalPropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub value: Option<RemoteObject>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    pub object_id: RemoteObjectId,
    #[serde(default)]
    pub own_properties: bool,
    #[serde(default)]
    pub generate_preview: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResult {
    pub result: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub internal_properties: Vec<InternalPropertyDescriptor>,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl crate::cdp::client::CdpCommand for GetPropertiesParams {
    type Response = GetPropertiesResult;
    const METHOD: &'static str = "Runtime.getProperties";
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ExecutionContextId>,
    #[serde(default)]
    pub generate_preview: bool,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub throw_on_side_effect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl crate::cdp::client::CdpCommand for EvaluateParams {
    type Response = EvaluateResult;
    const METHOD: &'static str = "Runtime.evaluate";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    pub function_declaration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    #[serde(default)]
    pub arguments: Vec<CallArgument>,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub generate_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnResult {
    pub result: RemoteObject,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl crate::cdp::client::CdpCommand for CallFunctionOnParams {
    type Response = CallFunctionOnResult;
    const METHOD: &'static str = "Runtime.callFunctionOn";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    pub exception_id: i64,
    pub text: String,
    pub line_number: i64,
    pub column_number: i64,
    #[serde(default)]
    pub script_id: Option<ScriptId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionThrownParams {
    pub timestamp: f64,
    pub exception_details: ExceptionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDestroyedParams {
    pub execution_context_id: ExecutionContextId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalledParams {
    #[serde(rename = "type")]
    pub type_: String,
    pub args: Vec<RemoteObject>,
    pub execution_context_id: ExecutionContextId,
    pub timestamp: f64,
}
