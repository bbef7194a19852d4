use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::AppState;

/// WebSocket 升级入口，每个连接订阅全局广播
pub async fn websocket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: broadcast::Sender<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcaster.subscribe();

    // 下行：广播到当前连接
    let mut send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // 上行：收到文本帧即广播给所有连接
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                // 没有订阅者时发送失败，属正常情况
                let _ = broadcaster.send(format!("📢 {}", text));
            }
        }
    });

    // 任一方向断开就关闭整个连接
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}
