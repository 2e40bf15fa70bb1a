pub use crate::config::KickConfig;
pub use crate::error::{KickError, Result};
pub use crate::events::{Dispatcher, EventBus, EventKind, EventSink, KickEvent};
pub use crate::http::HttpUserFetcher;
pub use crate::models::{
    Author, Chatroom, Message, MessageDeletedEventData, PartialAuthor, PartialLivestream,
    PartialMessage, PartialUser, PinnedMessage, User, UserBannedEventData, UserUnbannedEventData,
};
pub use crate::payload::{Cached, Payload};
pub use crate::protocol::{ControlFrame, DecodedFrame, Envelope, decode_frame};
pub use crate::pusher::{PollOutcome, PusherWebSocket, Transport, WebSocketTransport};
pub use crate::resolver::{Registry, Resolver, ResolverHandle, UserFetcher};

use anyhow::Context;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry as TracingRegistry};

use std::path::Path;
use std::sync::Mutex;

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod models;
pub mod payload;
pub mod protocol;
pub mod pusher;
pub mod resolver;

static TRACING_GUARDS: OnceCell<Mutex<Vec<WorkerGuard>>> = OnceCell::new();
static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global tracing subscriber once per process.
///
/// Logs go to stdout, and additionally to a daily rolling `kick.*.log` file
/// when `logs_dir` is given. The filter comes from `RUST_LOG`, defaulting to
/// `info`. Calls after the first successful one are no-ops.
pub fn init_tracing(logs_dir: Option<&Path>) -> Result<()> {
    TRACING_INIT
        .get_or_try_init(|| -> Result<()> {
            let (non_blocking_stdout, stdout_guard) =
                tracing_appender::non_blocking(std::io::stdout());
            let mut guards = vec![stdout_guard];

            let file_writer = match logs_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create logs directory: {:?}", dir))?;
                    let file_appender = RollingFileAppender::builder()
                        .rotation(Rotation::DAILY)
                        .filename_prefix("kick")
                        .filename_suffix("log")
                        .build(dir)
                        .map_err(|e| KickError::LoggingSetup(e.to_string()))?;
                    let (non_blocking_file, file_guard) =
                        tracing_appender::non_blocking(file_appender);
                    guards.push(file_guard);
                    Some(non_blocking_file)
                }
                None => None,
            };

            let stdout_layer = Layer::new()
                .with_writer(non_blocking_stdout)
                .with_ansi(true)
                .with_target(true);

            let file_layer = file_writer.map(|writer| {
                Layer::new()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
            });

            TracingRegistry::default()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .with(stdout_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| KickError::LoggingSetup(e.to_string()))?;

            TRACING_GUARDS.set(Mutex::new(guards)).ok();
            Ok(())
        })
        .map(|_| ())
}
