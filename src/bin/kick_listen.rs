use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use kick::{
    Chatroom, Dispatcher, EventBus, HttpUserFetcher, KickConfig, KickEvent, PusherWebSocket,
    Registry, Resolver,
};
use tokio::sync::broadcast::error::RecvError;

/// Listen to Kick chatrooms and channels and log every event
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Chatroom id to subscribe to (repeatable)
    #[clap(long = "chatroom", value_name = "ID")]
    chatrooms: Vec<i64>,

    /// Channel slug to watch for livestream and follow events (repeatable)
    #[clap(long = "watch", value_name = "SLUG")]
    watch: Vec<String>,

    /// Directory for application logs
    #[clap(long, value_name = "PATH")]
    logs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = KickConfig::from_env()?;
    if let Some(logs_dir) = args.logs_dir {
        config.logs_dir = Some(logs_dir);
    }
    kick::init_tracing(config.logs_dir.as_deref())?;

    let fetcher = Arc::new(HttpUserFetcher::new(&config.api_base_url));
    let registry = Arc::new(Registry::with_fetcher(fetcher));
    let bus = Arc::new(EventBus::new(config.event_buffer));
    let mut events = bus.subscribe();

    let ws = PusherWebSocket::connect(&config, Dispatcher::new(registry.clone(), bus.clone())).await?;

    for chatroom_id in &args.chatrooms {
        registry.add_chatroom(Chatroom::new(*chatroom_id, None));
        ws.subscribe_to_chatroom(*chatroom_id).await?;
        tracing::info!("Subscribed to chatroom {}", chatroom_id);
    }

    for slug in &args.watch {
        let user = registry.watch_user(registry.fetch_user(slug).await?);
        ws.watch_channel(user.id()).await?;
        tracing::info!(
            "Watching channel {} ({} followers)",
            user.slug(),
            user.followers_count()
        );
    }

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event logger lagged, skipped {} events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    ws.start().await?;
    tracing::info!("Connection closed");

    Ok(())
}

fn log_event(event: &KickEvent) {
    match event {
        KickEvent::PayloadReceive { .. } | KickEvent::RawPayloadReceive(_) => {}
        KickEvent::Message(message) => {
            let author = message
                .author()
                .ok()
                .and_then(|a| a.username().ok())
                .unwrap_or("?");
            tracing::info!(
                "[{}] {}: {}",
                message.chatroom_id().unwrap_or_default(),
                author,
                message.content().unwrap_or_default()
            );
        }
        KickEvent::Follow(user) | KickEvent::Unfollow(user) => {
            tracing::info!(
                "{}: {} now has {} followers",
                event.name(),
                user.slug(),
                user.followers_count()
            );
        }
        other => tracing::info!("{}: {:?}", other.name(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_collect_repeated_flags() {
        let args = Args::try_parse_from([
            "kick_listen",
            "--chatroom",
            "5",
            "--chatroom",
            "6",
            "--watch",
            "xqc",
            "--logs-dir",
            "/tmp/kick",
        ])
        .unwrap();

        assert_eq!(args.chatrooms, vec![5, 6]);
        assert_eq!(args.watch, vec!["xqc".to_string()]);
        assert_eq!(args.logs_dir, Some(PathBuf::from("/tmp/kick")));
    }

    #[test]
    fn test_args_reject_non_numeric_chatroom() {
        assert!(Args::try_parse_from(["kick_listen", "--chatroom", "abc"]).is_err());
    }

    #[test]
    fn test_args_have_no_channel_flag() {
        assert!(Args::try_parse_from(["kick_listen", "--channel", "5"]).is_err());
    }
}
