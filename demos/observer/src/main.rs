//! Headless observer: joins a room, logs every client event, and leaves
//! on Ctrl-C.
//!
//! ```text
//! cargo run -p sketchwire-observer -- ws://localhost:8080/ws/draw lobby [name]
//! ```
//!
//! Set `RUST_LOG` to change verbosity (default `sketchwire=debug,info`).

use sketchwire::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sketchwire=debug,info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(url), Some(room)) = (args.next(), args.next()) else {
        eprintln!("usage: sketchwire-observer <ws-url> <room> [name]");
        std::process::exit(2);
    };
    let name = args.next().unwrap_or_else(|| "observer".to_string());

    let (client, mut events) = GameClient::builder()
        .server_url(url)
        .room_name(room)
        .participant_name(name)
        .connect()?;
    info!(client_id = %client.local().client_id, "observer started");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c, leaving");
                if let Err(e) = client.leave().await {
                    warn!(error = %e, "leave failed");
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(ClientEvent::Stopped) => break,
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "observer fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    info!("observer stopped");
    Ok(())
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::Connected => info!("connected"),
        ClientEvent::ConnectionLost { reason } => {
            warn!(reason = reason.as_deref().unwrap_or("closed"), "connection lost");
        }
        ClientEvent::PhaseChanged { transition, flags } => info!(
            from = %transition.from,
            to = %transition.to,
            drawing = flags.drawing_permitted,
            chat = flags.chat_enabled,
            "phase changed"
        ),
        ClientEvent::CountdownUpdated { remaining_millis } => {
            if remaining_millis % 1000 == 0 {
                info!(seconds = remaining_millis / 1000, "countdown");
            }
        }
        ClientEvent::CanvasChanged => {}
        ClientEvent::RosterUpdated(roster) => {
            for row in roster {
                info!(rank = row.rank, name = %row.name, score = row.score, drawing = row.is_drawing, "roster");
            }
        }
        ClientEvent::ParticipantStateUpdated { state, .. } => info!(
            drawing = state.drawing_participant_name.as_deref().unwrap_or("-"),
            word = state.word_to_guess.as_deref().unwrap_or("-"),
            "participant state"
        ),
        ClientEvent::FeedAppended(FeedItem::Chat(chat)) => {
            info!(from = %chat.from_participant_name, "{}", chat.message);
        }
        ClientEvent::FeedAppended(FeedItem::Announcement(announcement)) => {
            info!(kind = ?announcement.kind, "{}", announcement.message);
        }
        ClientEvent::WordsOffered(words) => info!(?words, "words offered"),
        ClientEvent::ApplicationError(error) => warn!(
            kind = ?error.kind,
            detail = error.detail.as_deref().unwrap_or("-"),
            "server error"
        ),
        ClientEvent::Stopped => {}
    }
}
