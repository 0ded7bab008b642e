//! Roomsync session & presence coordinator

mod broadcast;
mod config;
mod error;
mod handlers;
mod presence;
mod protocol;
mod registry;
mod state;
mod store;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use config::Config;
use futures::{SinkExt, StreamExt};
use handlers::InactivityReaper;
use protocol::{ClientMessage, ServerMessage};
use state::AppState;
use std::sync::Arc;
use store::MemoryStore;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The in-memory store stands in for the external document store
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        config.clone(),
        store.clone(),
        store.clone(),
        store,
    ));

    InactivityReaper::new(state.clone()).spawn();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Roomsync coordinator started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);

    axum::serve(listener, app).await.unwrap();
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>Roomsync Coordinator</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "roomsync-server",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let conn_id = handlers::handle_connection(state.clone(), tx.clone()).await;

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_client_message(&state, &conn_id, &tx, msg).await;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    handlers::handle_disconnect(state, &conn_id).await;
    send_task.abort();
}

async fn handle_client_message(
    state: &Arc<AppState>,
    conn_id: &str,
    sender: &mpsc::UnboundedSender<ServerMessage>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::JoinRoom {
            room_id,
            user_name,
            user_id,
            is_creator,
        } => {
            let result = handlers::handle_join_room(
                state, conn_id, &room_id, &user_name, &user_id, is_creator,
            )
            .await;
            reply(sender, &room_id, result);
        }
        ClientMessage::ToggleEditability { room_id, user_id } => {
            let result = handlers::handle_toggle_editability(state, &room_id, &user_id).await;
            reply(sender, &room_id, result);
        }
        ClientMessage::ToggleEditorMode { room_id, user_id } => {
            let result = handlers::handle_toggle_editor_mode(state, &room_id, &user_id).await;
            reply(sender, &room_id, result);
        }
        ClientMessage::SendMessage {
            room_id,
            user_id,
            message,
        } => {
            handlers::handle_send_message(state, &room_id, &user_id, &message).await;
        }
        ClientMessage::TypingStart {
            room_id,
            user_id,
            user_name,
        } => {
            handlers::handle_typing_start(state, conn_id, &room_id, &user_id, &user_name);
        }
        ClientMessage::TypingStop { room_id, user_id } => {
            handlers::handle_typing_stop(state, conn_id, &room_id, &user_id);
        }
        ClientMessage::ChangeTheme { room_id, theme } => {
            handlers::handle_change_theme(state, &room_id, &theme).await;
        }
    }
}

/// Send a request/response ack, converting errors to their wire form.
fn reply(
    sender: &mpsc::UnboundedSender<ServerMessage>,
    room_id: &str,
    result: Result<ServerMessage, error::SessionError>,
) {
    match result {
        Ok(ack) => {
            let _ = sender.send(ack);
        }
        Err(e) => {
            tracing::warn!(room_id = %room_id, error = %e, "Session request failed");
            let _ = sender.send(ServerMessage::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            });
        }
    }
}
