//! Reference stdio/TCP DAP transport for `adapter-core`'s translation
//! engine. Exists so this workspace's integration tests have something to
//! drive end to end over the wire; it never opens a CDP connection of its
//! own (see [`cdp_null::NullCdpClient`]), so it is not a usable debug
//! adapter on its own.

mod cdp_null;
mod dispatch;
mod transport;

use std::cell::Cell;
use std::io::{BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::rc::Rc;

use adapter_core::dap::ProtocolMessage;
use adapter_core::path_resolver::{SourcePathResolver, SourcePathResolverOptions};
use adapter_core::AdapterSession;
use clap::Parser;
use tokio::task::LocalSet;

use crate::cdp_null::NullCdpClient;

#[derive(Parser)]
#[command(name = "adapter-cli", about = "Reference stdio/TCP transport for adapter-core")]
struct Args {
    /// Serve DAP over a TCP socket on this port instead of stdio.
    #[arg(long)]
    port: Option<u16>,

    /// Root directory authored sources are resolved relative to.
    #[arg(long)]
    web_root: Option<PathBuf>,
}

fn main() {
    simple_logger::SimpleLogger::new().env().init().ok();
    let args = Args::parse();

    let resolver = SourcePathResolver::new(SourcePathResolverOptions {
        web_root: args.web_root,
        base_url: None,
        source_map_path_overrides: Vec::new(),
    });
    let session = AdapterSession::new(Rc::new(NullCdpClient), resolver, &[]);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to start the reference adapter's runtime");
    let local = LocalSet::new();

    match args.port {
        Some(port) => local.block_on(&runtime, serve_tcp(session, port)),
        None => local.block_on(&runtime, serve_stdio(session)),
    }
}

async fn serve_stdio(session: AdapterSession) {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();
    pump(&session, &mut reader, &mut writer).await;
}

async fn serve_tcp(session: AdapterSession, port: u16) {
    let listener = match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("failed to bind 127.0.0.1:{port}: {e}");
            return;
        }
    };
    log::info!("listening on 127.0.0.1:{port}");

    match listener.accept() {
        Ok((stream, peer)) => {
            log::info!("client connected from {peer}");
            let mut reader = BufReader::new(stream.try_clone().expect("failed to clone socket"));
            let mut writer = stream;
            pump(&session, &mut reader, &mut writer).await;
        }
        Err(e) => log::error!("failed to accept a connection: {e}"),
    }
}

/// One DAP conversation: read requests, dispatch each against `session`,
/// write back whatever `dispatch` produces, stamping every outgoing message
/// with the next sequence number in send order.
async fn pump<R: std::io::BufRead, W: Write>(session: &AdapterSession, reader: &mut R, writer: &mut W) {
    let seq = Cell::new(0i64);
    loop {
        let message = match transport::read_message(reader) {
            Ok(Some(m)) => m,
            Ok(None) => break,
            Err(e) => {
                log::error!("failed to read a DAP message: {e}");
                break;
            }
        };
        let ProtocolMessage::Request(request) = message else {
            log::warn!("ignoring a non-request message from the client");
            continue;
        };
        let is_disconnect = request.command == "disconnect";

        for mut out in dispatch::dispatch(session, request).await {
            let next = seq.get() + 1;
            seq.set(next);
            dispatch::stamp_seq(&mut out, next);
            if let Err(e) = transport::write_message(writer, &out) {
                log::error!("failed to write a DAP message: {e}");
                return;
            }
        }

        if is_disconnect {
            break;
        }
    }
}
