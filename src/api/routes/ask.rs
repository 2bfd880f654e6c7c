use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use tokio_stream::{wrappers::UnboundedReceiverStream, Stream, StreamExt};

use crate::api::state::AppState;
use crate::domain::{QuerySession, StructuredMessage};
use crate::infrastructure::{BufferedChannel, StreamingChannel};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub site: Option<String>,
    #[serde(default)]
    pub prev: Vec<String>,
    #[serde(default)]
    pub last_ans: Vec<String>,
    pub query_id: Option<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    /// Remaining top-level keys, e.g. `query_type` or `business_vertical`.
    /// A key present in both places takes the `params` value.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AskRequest {
    pub fn into_session(self) -> QuerySession {
        let mut session = QuerySession::new(self.query)
            .with_streaming(self.streaming)
            .with_history(self.prev, self.last_ans);
        if let Some(query_id) = self.query_id {
            session = session.with_session_id(query_id);
        }
        if let Some(site) = self.site {
            session = session.with_site(site);
        }
        self.extra
            .into_iter()
            .chain(self.params)
            .fold(session, |session, (key, value)| match value {
                serde_json::Value::Null => session,
                serde_json::Value::String(s) => session.with_param(key, s),
                other => session.with_param(key, other.to_string()),
            })
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub query_id: String,
    pub messages: Vec<StructuredMessage>,
}

pub async fn ask_handler(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    if request.query.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "query must not be empty").into_response();
    }

    let session = request.into_session();
    if session.streaming {
        return stream_answer(state, session).into_response();
    }

    let channel = BufferedChannel::new();
    state.query_handler.handle(&session, &channel).await;

    Json(AskResponse {
        query_id: session.session_id,
        messages: channel.into_messages(),
    })
    .into_response()
}

/// The handler runs on its own task; the SSE stream ends when it drops the
/// channel.
fn stream_answer(
    state: AppState,
    session: QuerySession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (channel, rx) = StreamingChannel::new();
    let handler = state.query_handler.clone();

    tokio::spawn(async move {
        handler.handle(&session, &channel).await;
    });

    let events = UnboundedReceiverStream::new(rx).map(|message| Ok(to_event(&message)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(message: &StructuredMessage) -> Event {
    Event::default()
        .event("message")
        .json_data(message)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode message");
            Event::default().event("error").data("failed to encode message")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_into_session() {
        let request: AskRequest = serde_json::from_value(json!({
            "query": "I run an online supplement store",
            "site": "zenti.com",
            "prev": ["What documents do I need to apply?"],
            "last_ans": ["List of required documents..."],
            "query_id": "test_1",
            "query_type": "approval",
            "urgency": null,
            "budget": 5000
        }))
        .unwrap();

        let session = request.into_session();
        assert_eq!(session.session_id, "test_1");
        assert_eq!(session.site.as_deref(), Some("zenti.com"));
        assert!(!session.streaming);
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.param("query_type"), Some("approval"));
        assert_eq!(session.param("budget"), Some("5000"));
        assert_eq!(session.param("urgency"), None);
        assert!(!session.params.contains_key("prev"));
    }

    #[test]
    fn test_nested_params_are_merged() {
        let request: AskRequest = serde_json::from_value(json!({
            "query": "Why was my account terminated?",
            "query_type": "general",
            "params": {"query_type": "termination", "current_status": "on MATCH list"}
        }))
        .unwrap();

        let session = request.into_session();
        assert_eq!(session.param("query_type"), Some("termination"));
        assert_eq!(session.param("current_status"), Some("on MATCH list"));
        assert!(!session.params.contains_key("params"));
    }

    #[test]
    fn test_missing_query_id_gets_generated() {
        let request: AskRequest = serde_json::from_value(json!({"query": "hi"})).unwrap();
        let session = request.into_session();
        assert!(!session.session_id.is_empty());
        assert!(session.turns.is_empty());
    }
}
