//! Stand-in [`CdpClient`] used until this binary grows a real browser
//! transport. Every command fails with [`CdpError::Closed`] instead of
//! hanging, so a request against a thread that could never have attached
//! (nothing in this binary speaks CDP yet) surfaces as an ordinary DAP
//! error response rather than stalling the event loop.

use adapter_core::cdp::client::{CdpClient, CdpError};
use adapter_core::cdp::messages::SessionId;
use async_trait::async_trait;

pub struct NullCdpClient;

#[async_trait(?Send)]
impl CdpClient for NullCdpClient {
    async fn send_raw(
        &self,
        _session: Option<&SessionId>,
        _method: &str,
        _params: serde_json::Value,
    ) -> Result<serde_json::Value, CdpError> {
        Err(CdpError::Closed)
    }
}
