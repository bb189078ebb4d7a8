use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::state::{AppState, SyncMessage};

/// Subscribe to every sync event of the server's tab.
pub fn subscribe(state: &AppState) -> broadcast::Receiver<SyncMessage> {
    state.events().receiver()
}

/// Encode a sync message as an SSE event named after its type.
pub fn to_event(message: &SyncMessage) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(data) => Some(Event::default().event(message.kind.as_str()).data(data)),
        Err(err) => {
            warn!(error = %err, "failed to encode sync event");
            None
        }
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<SyncMessage>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(message) => {
                            let Some(event) = to_event(&message) else { continue };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Clients re-read state on the next event anyway.
                            debug!(skipped, "sync SSE stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Sync SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
