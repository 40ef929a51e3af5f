//! End-to-end: job events reach a real WebSocket client.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{bash_worker, write_temp_script};
use csvtx_api::ws::EventForwarder;
use csvtx_core::job_options::JobOptions;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn websocket_client_receives_job_events_in_order() {
    let script = write_temp_script("echo '[1/2] 第一行'\necho '[2/2] 第二行'\n");
    let state = common::test_state(bash_worker(&script));

    let forwarder = EventForwarder::new(Arc::clone(&state.ws_manager));
    tokio::spawn(forwarder.run(state.event_bus.subscribe()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = common::build_test_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .expect("connect");

    // Registration happens after the upgrade completes.
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.ws_manager.connection_count().await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection registered");

    let ticket = state
        .supervisor
        .start(JobOptions::new("/data/in.csv", "/data/out.csv"))
        .expect("start job");

    let mut types = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(frame) = socket.next().await {
            let Message::Text(text) = frame.expect("frame") else {
                continue;
            };
            let json: serde_json::Value = serde_json::from_str(&text).expect("json frame");
            assert_eq!(json["job_id"], ticket.job_id());
            let kind = json["type"].as_str().expect("type").to_string();
            let done = kind == "completed";
            types.push(kind);
            if done {
                break;
            }
        }
    })
    .await
    .expect("completed within 10s");

    assert_eq!(
        types,
        ["started", "log_line", "progress", "log_line", "progress", "completed"]
    );
}
