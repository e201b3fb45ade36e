//! Integration tests for the reference DAP transport: spawns the built
//! `adapter-cli` binary, speaks Content-Length-framed DAP over its stdio,
//! and checks the shapes of its responses.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use serde_json::json;

fn send(stdin: &mut std::process::ChildStdin, message: &serde_json::Value) {
    let body = serde_json::to_string(message).expect("request is valid JSON");
    write!(stdin, "Content-Length: {}\r\n\r\n{}", body.len(), body).expect("write request header");
    stdin.flush().expect("flush request");
}

fn recv(reader: &mut BufReader<std::process::ChildStdout>) -> Option<serde_json::Value> {
    let mut header = String::new();
    if reader.read_line(&mut header).unwrap_or(0) == 0 {
        return None;
    }
    let length: usize = header.trim().strip_prefix("Content-Length:")?.trim().parse().ok()?;

    let mut empty = String::new();
    reader.read_line(&mut empty).ok()?;

    let mut body = vec![0u8; length];
    std::io::Read::read_exact(reader, &mut body).ok()?;
    serde_json::from_slice(&body).ok()
}

fn spawn() -> (std::process::Child, std::process::ChildStdin, BufReader<std::process::ChildStdout>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_adapter-cli"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start adapter-cli");
    let stdin = child.stdin.take().expect("stdin");
    let stdout = child.stdout.take().expect("stdout");
    (child, stdin, BufReader::new(stdout))
}

#[test]
fn initialize_returns_capabilities_then_initialized_event() {
    let (mut child, mut stdin, mut reader) = spawn();

    send(
        &mut stdin,
        &json!({
            "seq": 1,
            "type": "request",
            "command": "initialize",
            "arguments": {
                "clientID": "test",
                "adapterID": "adapter-core",
                "linesStartAt1": true,
                "columnsStartAt1": true
            }
        }),
    );

    let response = recv(&mut reader).expect("initialize response");
    assert_eq!(response["type"], "response");
    assert_eq!(response["command"], "initialize");
    assert_eq!(response["success"], true);
    let body = response["body"].as_object().expect("capabilities body");
    assert_eq!(body["supportsSetVariable"], true);
    assert_eq!(body["exceptionBreakpointFilters"].as_array().unwrap().len(), 2);

    let event = recv(&mut reader).expect("initialized event");
    assert_eq!(event["type"], "event");
    assert_eq!(event["event"], "initialized");

    child.kill().ok();
    child.wait().ok();
}

#[test]
fn threads_is_empty_before_any_target_attaches() {
    let (mut child, mut stdin, mut reader) = spawn();

    send(&mut stdin, &json!({"seq": 1, "type": "request", "command": "initialize", "arguments": {}}));
    recv(&mut reader);
    recv(&mut reader);

    send(&mut stdin, &json!({"seq": 2, "type": "request", "command": "threads", "arguments": {}}));
    let response = recv(&mut reader).expect("threads response");

    assert_eq!(response["success"], true);
    assert!(response["body"]["threads"].as_array().unwrap().is_empty());

    child.kill().ok();
    child.wait().ok();
}

#[test]
fn unknown_command_fails_with_a_message() {
    let (mut child, mut stdin, mut reader) = spawn();

    send(&mut stdin, &json!({"seq": 1, "type": "request", "command": "notACommand", "arguments": {}}));
    let response = recv(&mut reader).expect("error response");

    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("not implemented"));

    child.kill().ok();
    child.wait().ok();
}

#[test]
fn evaluate_without_an_attached_thread_fails() {
    let (mut child, mut stdin, mut reader) = spawn();

    send(&mut stdin, &json!({"seq": 1, "type": "request", "command": "initialize", "arguments": {}}));
    recv(&mut reader);
    recv(&mut reader);

    send(
        &mut stdin,
        &json!({
            "seq": 2,
            "type": "request",
            "command": "evaluate",
            "arguments": {"expression": "1 + 1"}
        }),
    );
    let response = recv(&mut reader).expect("evaluate response");
    assert_eq!(response["success"], false);

    child.kill().ok();
    child.wait().ok();
}

#[test]
fn sequence_numbers_increase_across_messages() {
    let (mut child, mut stdin, mut reader) = spawn();

    send(&mut stdin, &json!({"seq": 1, "type": "request", "command": "initialize", "arguments": {}}));
    let response = recv(&mut reader).expect("initialize response");
    let event = recv(&mut reader).expect("initialized event");

    let response_seq = response["seq"].as_i64().unwrap();
    let event_seq = event["seq"].as_i64().unwrap();
    assert!(event_seq > response_seq);

    child.kill().ok();
    child.wait().ok();
}
