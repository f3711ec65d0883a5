use crate::plugin::{AUTHOR, DESCRIPTION, NAME, Reply};
use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub handled: bool,
    pub replies: Vec<serde_json::Value>,
}

pub async fn plugin_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": NAME,
        "author": AUTHOR,
        "description": DESCRIPTION,
        "version": env!("CARGO_PKG_VERSION"),
        "commands": state.plugin.names(),
        "option_file": state.settings.option_path().exists(),
        "downloading": state.plugin.downloading().len(),
    }))
}

/// Runs one chat command. Replies are broadcast on `/events` as they are
/// produced and returned together once the handler finishes.
pub async fn run_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Reply>();
    let events = state.tx.clone();

    let forward = tokio::spawn(async move {
        let mut replies = Vec::new();
        while let Some(reply) = reply_rx.recv().await {
            let value = serde_json::to_value(&reply).unwrap_or_default();
            let _ = events.send(
                serde_json::json!({
                    "type": "reply",
                    "reply": value
                })
                .to_string(),
            );
            replies.push(value);
        }
        replies
    });

    let handled = state.plugin.handle(&request.text, &reply_tx).await;
    drop(reply_tx);
    let replies = forward.await.unwrap_or_default();

    Json(CommandResponse { handled, replies })
}

pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.tx.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).map(|msg| match msg {
        Ok(msg) => Ok(Event::default().data(msg)),
        Err(_) => Ok(Event::default().comment("keepalive")),
    });

    Sse::new(stream).keep_alive(axum::response::sse::KeepAlive::default())
}
