//! Change stream endpoints
//!
//! `GET /events/stream` holds a Server-Sent Events connection open for as long
//! as the client stays connected (or until the configured idle timeout). The
//! first event is always `connected`; every later one is a `change`.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Router,
    routing::get,
};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::domain::StreamMessage;

/// Create the events router
pub fn create_events_router() -> Router<AppState> {
    Router::new()
        .route("/stream", get(stream_changes))
        .route("/status", get(stream_status))
}

/// GET /events/stream
pub async fn stream_changes(
    State(state): State<AppState>,
) -> impl IntoResponse {
    let subscription = state.registry().subscribe();
    debug!(subscription_id = %subscription.id(), "Change stream opened");

    let events = subscription.map(|message| Ok::<_, Infallible>(to_sse_event(&message)));
    let stream: BoxStream<'static, Result<Event, Infallible>> = match state.stream.idle_timeout {
        Some(timeout) => events.take_until(tokio::time::sleep(timeout)).boxed(),
        None => events.boxed(),
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.stream.keep_alive))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub status: &'static str,
    pub connected_clients: usize,
}

/// GET /events/status
pub async fn stream_status(State(state): State<AppState>) -> Json<StreamStatus> {
    Json(StreamStatus {
        status: "active",
        connected_clients: state.registry().count(),
    })
}

fn to_sse_event(message: &StreamMessage) -> Event {
    let mut event = Event::default().event(message.event_name());
    if let Some(id) = message.message_id() {
        event = event.id(id);
    }

    event.json_data(message).unwrap_or_else(|e| {
        warn!(error = %e, event = message.event_name(), "Failed to encode stream message");
        Event::default()
            .event(message.event_name())
            .comment("encoding failed")
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures::StreamExt;
    use tower::ServiceExt;

    use crate::api::create_router;
    use crate::api::state::StreamSettings;
    use crate::api::test_support::{body_json, test_app};
    use crate::domain::{ChangeEvent, ChangeKind};

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_until<S>(body: &mut S, needle: &str) -> String
    where
        S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
    {
        let mut seen = String::new();
        while !seen.contains(needle) {
            let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
                .await
                .expect("stream stalled")
                .expect("stream ended")
                .unwrap();
            seen.push_str(&String::from_utf8_lossy(&chunk));
        }
        seen
    }

    #[tokio::test]
    async fn test_status_counts_live_streams() {
        let app = test_app(10);
        let router = create_router(app.state.clone(), None);

        let response = router.clone().oneshot(get("/events/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({ "status": "active", "connectedClients": 0 }));

        let _held = app.state.registry().subscribe();
        let json = body_json(router.oneshot(get("/events/status")).await.unwrap()).await;
        assert_eq!(json["connectedClients"], 1);
    }

    #[tokio::test]
    async fn test_stream_sends_connected_then_change() {
        let app = test_app(10);
        let router = create_router(app.state.clone(), None);

        let response = router.oneshot(get("/events/stream")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let mut body = response.into_body().into_data_stream();
        let first = read_until(&mut body, "\n\n").await;
        assert!(first.starts_with("event: connected"));
        assert_eq!(app.state.registry().count(), 1);

        app.state.events.publish(
            ChangeEvent::new("LAND_USE", "Land use", ChangeKind::Insert, "survey-bureau")
                .with_entity("e-1", "7", "Farmland"),
        );

        let change = read_until(&mut body, "event: change").await;
        assert!(change.contains("\"changeKind\":\"INSERT\""));
        assert!(change.contains("\"entityCode\":\"7\""));
        assert!(change.contains("id: "));

        drop(body);
        assert_eq!(app.state.registry().count(), 0);
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_stream() {
        let app = test_app(10);
        let mut state = app.state.clone();
        state.stream = Arc::new(StreamSettings {
            idle_timeout: Some(Duration::from_millis(50)),
            keep_alive: Duration::from_secs(15),
        });
        let router = create_router(state.clone(), None);

        let response = router.oneshot(get("/events/stream")).await.unwrap();
        let mut body = response.into_body().into_data_stream();

        read_until(&mut body, "event: connected").await;
        let end = tokio::time::timeout(Duration::from_secs(2), async {
            while body.next().await.is_some() {}
        })
        .await;
        assert!(end.is_ok());

        drop(body);
        assert_eq!(state.registry().count(), 0);
    }
}
