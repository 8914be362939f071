//! Control plane: a websocket status channel plus `record`/`halt` commands.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::debug;

use crate::recorder::{Recorder, RecorderStatus};

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Frame {
    #[serde(rename = "status")]
    Status {
        #[serde(flatten)]
        status: RecorderStatus,
    },
    #[serde(rename = "command-reply")]
    CommandReply { message: String },
}

/// Build the HTTP application: the `/api/ingest` control websocket plus a
/// static file server over `web_rootdir`.
pub fn router(recorder: Arc<Recorder>, web_rootdir: &str) -> Router {
    Router::new()
        .route("/api/ingest", get(ingest_handler))
        .fallback_service(ServeDir::new(web_rootdir))
        .with_state(recorder)
}

async fn ingest_handler(ws: WebSocketUpgrade, State(recorder): State<Arc<Recorder>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, recorder))
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let body = serde_json::to_string(frame).expect("status/command-reply frames always serialize");
    socket.send(Message::Text(body.into())).await
}

async fn handle_socket(mut socket: WebSocket, recorder: Arc<Recorder>) {
    let mut status_rx = recorder.subscribe();
    let shutdown = recorder.shutdown_token();

    let initial = Frame::Status {
        status: recorder.status().await,
    };
    if send_frame(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "going away".into(),
                    })))
                    .await;
                return;
            }
            status = status_rx.recv() => {
                match status {
                    Ok(status) => {
                        if send_frame(&mut socket, &Frame::Status { status }).await.is_err() {
                            return;
                        }
                    }
                    // Drop-oldest: a lagged subscriber simply resumes from
                    // whatever frame arrives next; status is idempotent so
                    // losing an intermediate frame is acceptable.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "status subscriber lagged, dropping oldest frames");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: 1001,
                                reason: "going away".into(),
                            })))
                            .await;
                        return;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_command(&recorder, text.trim()).await;
                        if send_frame(&mut socket, &Frame::CommandReply { message: reply }).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}

async fn handle_command(recorder: &Recorder, command: &str) -> String {
    match command {
        "record" => {
            if recorder.request_recording().await {
                "ok".to_string()
            } else {
                "state error: curently recording".to_string()
            }
        }
        "halt" => {
            if recorder.request_halt().await {
                "ok".to_string()
            } else {
                "state error: curently not recording".to_string()
            }
        }
        other => format!("invalid command: '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::segment::SegmentArchive;
    use rstest::rstest;
    use std::collections::HashMap;

    fn test_recorder() -> Arc<Recorder> {
        let mut raw = HashMap::new();
        raw.insert("DRIFT_RING_CAPACITY".to_string(), "4".to_string());
        let config = Config::from_map(raw);
        let archive = SegmentArchive::new(std::env::temp_dir());
        Recorder::new(config, archive, None).unwrap()
    }

    #[rstest]
    #[case("record", "ok")]
    #[case("halt", "state error: curently not recording")]
    #[case("", "invalid command: ''")]
    #[case("bogus", "invalid command: 'bogus'")]
    #[tokio::test]
    async fn handle_command_replies_from_fresh_recorder(#[case] command: &str, #[case] expected: &str) {
        let recorder = test_recorder();
        let reply = handle_command(&recorder, command).await;
        assert_eq!(reply, expected);
    }

    #[tokio::test]
    async fn halt_after_record_replies_ok() {
        let recorder = test_recorder();
        assert_eq!(handle_command(&recorder, "record").await, "ok");
        assert_eq!(handle_command(&recorder, "halt").await, "ok");
    }

    #[tokio::test]
    async fn double_record_reports_state_error() {
        let recorder = test_recorder();
        assert_eq!(handle_command(&recorder, "record").await, "ok");
        assert_eq!(handle_command(&recorder, "record").await, "state error: curently recording");
    }
}
