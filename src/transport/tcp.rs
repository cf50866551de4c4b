//! Thin line-oriented TCP gateway.
//!
//! This is deliberately a dumb pipe; all dialog logic lives behind the
//! [`Transport`] seam. Protocol, one line per message:
//!
//! ```text
//! client -> IDENT <id> <handle>          (first line, identifies the peer)
//! client -> <any text>                   (text event; /start and /done included)
//! client -> /photo <ref> [caption]       (photo event)
//! client -> /video <ref>                 (video event)
//! server -> TEXT <text>
//! server -> PHOTO <ref> :<caption>
//! server -> VIDEO <ref> :<caption>
//! ```
//!
//! A send to a participant with no live connection fails with
//! `NotConnected` and is recorded by the dispatcher as a delivery failure.

use crate::dialog::{MediaRef, ParticipantId};
use crate::engine::Engine;
use crate::transport::{EventKind, InboundEvent, Transport, TransportError};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};

const MAX_LINE_LENGTH: usize = 8192;
const OUTBOUND_QUEUE: usize = 64;

type PeerMap = Arc<DashMap<ParticipantId, mpsc::Sender<String>>>;

/// Outbound half of the gateway: routes formatted lines to the live
/// connection of the recipient, if any.
pub struct TcpTransport {
    peers: PeerMap,
}

impl TcpTransport {
    async fn send_line(&self, to: ParticipantId, line: String) -> Result<(), TransportError> {
        let Some(tx) = self.peers.get(&to).map(|entry| entry.value().clone()) else {
            return Err(TransportError::NotConnected(to));
        };
        tx.send(line)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send_text(&self, to: ParticipantId, text: &str) -> Result<(), TransportError> {
        self.send_line(to, format!("TEXT {text}")).await
    }

    async fn send_photo(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.send_line(to, format!("PHOTO {media_ref} :{caption}")).await
    }

    async fn send_video(
        &self,
        to: ParticipantId,
        media_ref: &MediaRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.send_line(to, format!("VIDEO {media_ref} :{caption}")).await
    }
}

/// Accepts connections and pumps their events into the engine.
pub struct Gateway {
    listener: TcpListener,
    peers: PeerMap,
}

impl Gateway {
    /// Bind the gateway listener. Failure here is fatal at process scope.
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %addr, "Gateway listening");
        Ok(Self {
            listener,
            peers: Arc::new(DashMap::new()),
        })
    }

    /// The outbound transport backed by this gateway's connections.
    pub fn transport(&self) -> Arc<TcpTransport> {
        Arc::new(TcpTransport {
            peers: Arc::clone(&self.peers),
        })
    }

    /// Accept loop. Runs until the listener fails.
    pub async fn run(self, engine: Arc<Engine>) -> std::io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let peers = Arc::clone(&self.peers);
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                handle_connection(stream, addr, peers, engine).await;
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    peers: PeerMap,
    engine: Arc<Engine>,
) {
    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let (mut sink, mut lines) = framed.split();

    // The first line must identify the participant.
    let ident = match lines.next().await {
        Some(Ok(line)) => line,
        Some(Err(err)) => {
            debug!(peer = %addr, error = %err, "Failed to read identification line");
            return;
        }
        None => return,
    };
    let Some((participant_id, handle)) = parse_ident(&ident) else {
        let _ = sink.send("ERR expected: IDENT <id> <handle>".to_string()).await;
        return;
    };

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    peers.insert(participant_id, tx.clone());
    info!(participant = participant_id, handle = %handle, peer = %addr, "Participant connected");

    // One task owns the sink; sends are queued through the channel.
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if sink.send(line).await.is_err() {
                break;
            }
        }
    });

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(participant = participant_id, error = %err, "Read error, closing connection");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = InboundEvent {
            participant_id,
            handle: handle.clone(),
            kind: parse_event_line(&line),
        };
        if let Err(err) = engine.handle_event(event).await {
            warn!(participant = participant_id, error = %err, "Event processing failed");
        }
    }

    // Only unregister our own sender; a reconnect may have replaced it.
    peers.remove_if(&participant_id, |_, sender| sender.same_channel(&tx));
    writer.abort();
    info!(participant = participant_id, "Participant disconnected");
}

/// Parse the `IDENT <id> <handle>` line.
fn parse_ident(line: &str) -> Option<(ParticipantId, String)> {
    let mut parts = line.trim().split_whitespace();
    if parts.next()? != "IDENT" {
        return None;
    }
    let id: ParticipantId = parts.next()?.parse().ok()?;
    let handle = parts.next()?.to_string();
    Some((id, handle))
}

/// Map a raw line to an event kind.
fn parse_event_line(line: &str) -> EventKind {
    if let Some(rest) = line.strip_prefix("/photo ") {
        let mut parts = rest.trim().splitn(2, ' ');
        let media_ref = parts.next().unwrap_or_default().to_string();
        if media_ref.is_empty() {
            return EventKind::Text(line.to_string());
        }
        let caption = parts
            .next()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        return EventKind::Photo { media_ref, caption };
    }
    if let Some(rest) = line.strip_prefix("/video ") {
        let media_ref = rest.trim().to_string();
        if !media_ref.is_empty() {
            return EventKind::Video { media_ref };
        }
    }
    EventKind::Text(line.to_string())
}
