//! DAP <-> CDP translation engine.
//!
//! This crate owns the ten components that sit between a Debug Adapter
//! Protocol client and a Chrome DevTools Protocol runtime: source map
//! parsing, path resolution, the source registry, script
//! skip/blackbox decisions, one Thread per CDP execution context, the CDP
//! target tree, breakpoint reconciliation (with its offline predictor),
//! lazy stack-trace materialization, and remote-object-to-variable
//! rendering.
//!
//! It deliberately does not open a socket, spawn a browser, or frame
//! messages over stdio — see [`cdp::client::CdpClient`] for the seam an
//! embedder plugs a real transport into, and the `adapter-cli` crate in
//! this workspace for a minimal reference one used by integration tests.

pub mod breakpoints;
pub mod cdp;
pub mod context;
pub mod dap;
pub mod error;
pub mod path_resolver;
pub mod session;
pub mod skip_files;
pub mod source_container;
pub mod sourcemap;
pub mod stack_trace;
pub mod target_manager;
pub mod thread;
pub mod variables;

pub use context::AdapterContext;
pub use error::{AdapterError, AdapterResult};
pub use session::AdapterSession;
