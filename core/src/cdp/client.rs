//! The CDP transport seam.
//!
//! `adapter-core` never opens a websocket itself — that belongs to whatever
//! embeds it (a real adapter binary talking to Chrome, or a test harness
//! replaying a fixture). Components depend on [`CdpClient`] instead, the way
//! `chromiumoxide`'s `Page` depends on its `PageInner::execute`, so they can
//! be driven by a fake in unit tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::messages::SessionId;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("transport closed")]
    Closed,

    #[error("CDP error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("malformed CDP payload: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("timed out waiting for a reply to {0}")]
    Timeout(String),
}

/// A single CDP command: the method name and the JSON shape of its params
/// and result, exactly as the CDP spec tables list them.
pub trait CdpCommand: Serialize {
    type Response: DeserializeOwned;

    const METHOD: &'static str;
}

/// Sends commands to the browser and is driven for events by whoever owns
/// the socket. Object-safe on purpose — `TargetManager` and `Thread` hold a
/// `Rc<dyn CdpClient>` so tests can substitute a fixture client without a
/// generic parameter creeping through every component.
#[async_trait(?Send)]
pub trait CdpClient {
    /// Sends a raw command and waits for its matching response. `session`
    /// is `None` only for the handful of browser-level commands issued
    /// before any target is attached (`Target.setDiscoverTargets` and
    /// friends); everything else flows through a session.
    async fn send_raw(
        &self,
        session: Option<&SessionId>,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError>;
}

/// Ergonomic, typed wrapper over [`CdpClient::send_raw`]. Kept as a free
/// function rather than a trait method so the trait itself stays
/// object-safe.
pub async fn send<C: CdpCommand>(
    client: &dyn CdpClient,
    session: Option<&SessionId>,
    params: C,
) -> Result<C::Response, CdpError> {
    let raw_params = serde_json::to_value(params)?;
    let raw_result = client.send_raw(session, C::METHOD, raw_params).await?;
    Ok(serde_json::from_value(raw_result)?)
}
