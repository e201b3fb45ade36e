//! Routes one DAP [`Request`] to the matching [`AdapterSession`] method and
//! renders its result back into a [`Response`], draining whatever events the
//! call queued along the way.

use adapter_core::dap::{Event, ProtocolMessage, Request, Response};
use adapter_core::AdapterSession;

fn args<T: serde::de::DeserializeOwned>(request: &Request) -> Result<T, String> {
    serde_json::from_value(request.arguments.clone().unwrap_or(serde_json::Value::Null))
        .map_err(|e| format!("malformed arguments for {}: {e}", request.command))
}

fn body(value: impl serde::Serialize) -> Option<serde_json::Value> {
    Some(serde_json::to_value(value).expect("DAP response bodies are always serializable"))
}

async fn handle(session: &AdapterSession, request: &Request) -> Result<Option<serde_json::Value>, String> {
    match request.command.as_str() {
        "initialize" => Ok(body(session.initialize(args(request)?))),
        "configurationDone" | "launch" | "attach" => Ok(None),
        "setBreakpoints" => session
            .set_breakpoints(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "setExceptionBreakpoints" => session
            .set_exception_breakpoints(args(request)?)
            .await
            .map(|_| None)
            .map_err(|e| e.to_string()),
        "breakpointLocations" => session
            .breakpoint_locations(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "threads" => Ok(body(session.threads())),
        "stackTrace" => session
            .stack_trace(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "scopes" => session.scopes(args(request)?).map(body).map_err(|e| e.to_string()),
        "variables" => session
            .variables(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "setVariable" => session
            .set_variable(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "evaluate" => session
            .evaluate(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "continue" => session
            .continue_(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "next" => session.next(args(request)?).await.map(|_| None).map_err(|e| e.to_string()),
        "stepIn" => session
            .step_in(args(request)?)
            .await
            .map(|_| None)
            .map_err(|e| e.to_string()),
        "stepOut" => session
            .step_out(args(request)?)
            .await
            .map(|_| None)
            .map_err(|e| e.to_string()),
        "pause" => session.pause(args(request)?).await.map(|_| None).map_err(|e| e.to_string()),
        "source" => session
            .source(args(request)?)
            .await
            .map(body)
            .map_err(|e| e.to_string()),
        "disconnect" | "terminate" => Ok(None),
        other => Err(format!("command {other} not implemented")),
    }
}

/// Handles `request`, returning the response followed by any events the
/// session queued while handling it (in particular `initialized`, emitted
/// right after a successful `initialize`). `seq` fields are left at `0` —
/// the transport loop stamps real sequence numbers in send order.
pub async fn dispatch(session: &AdapterSession, request: Request) -> Vec<ProtocolMessage> {
    let command = request.command.clone();
    let request_seq = request.seq;
    let outcome = handle(session, &request).await;

    let response = match outcome {
        Ok(body) => Response::ok(0, request_seq, command.clone(), body),
        Err(message) => Response::error(0, request_seq, command.clone(), message),
    };
    let succeeded = response.success;

    let mut messages = vec![ProtocolMessage::Response(response)];
    if command == "initialize" && succeeded {
        messages.push(ProtocolMessage::Event(Event {
            seq: 0,
            event: "initialized".to_string(),
            body: None,
        }));
    }
    messages.extend(session.drain_events().into_iter().map(ProtocolMessage::Event));
    messages
}

pub fn stamp_seq(message: &mut ProtocolMessage, seq: i64) {
    match message {
        ProtocolMessage::Request(r) => r.seq = seq,
        ProtocolMessage::Response(r) => r.seq = seq,
        ProtocolMessage::Event(e) => e.seq = seq,
    }
}
