use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message as WsMessage, WebSocket};

use crate::config::ServiceConfig;
use crate::error::{ApiError, Result};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const SOCKET_TICK: Duration = Duration::from_secs(5);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change pushed by the service.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub record: Value,
    pub old_record: Option<Value>,
}

impl ChangeEvent {
    pub fn decode_record<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.record.clone())?)
    }
}

#[derive(Serialize)]
struct OutFrame<'a> {
    topic: &'a str,
    event: &'a str,
    payload: Value,
    #[serde(rename = "ref")]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct InFrame {
    #[serde(default)]
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
}

/// A live change feed for one table (optionally one filtered slice of it).
/// Events are read with [`try_recv`](Self::try_recv); dropping the
/// subscription leaves the channel and closes the socket.
pub struct Subscription {
    topic: String,
    events: Receiver<ChangeEvent>,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn open(config: &ServiceConfig, table: &str, filter: Option<&str>) -> Result<Self> {
        let topic = topic_for(table, filter);
        let (mut socket, _response) = tungstenite::connect(config.realtime_url())?;
        set_read_timeout(&socket, JOIN_TIMEOUT);

        let join = OutFrame {
            topic: &topic,
            event: "phx_join",
            payload: json!({}),
            reference: "1".to_string(),
        };
        send_frame(&mut socket, &join)?;
        wait_for_join(&mut socket, &topic)?;
        info!("subscribed to {topic}");
        set_read_timeout(&socket, SOCKET_TICK);

        let (tx, rx) = mpsc::channel();
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();
        let reader_topic = topic.clone();
        thread::Builder::new()
            .name(format!("realtime-{table}"))
            .spawn(move || reader_loop(socket, reader_topic, tx, flag))?;

        Ok(Self {
            topic,
            events: rx,
            closed,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Non-blocking poll. `None` when nothing is waiting or the stream has
    /// ended.
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

fn topic_for(table: &str, filter: Option<&str>) -> String {
    match filter {
        Some(filter) => format!("realtime:public:{table}:{filter}"),
        None => format!("realtime:public:{table}"),
    }
}

fn send_frame(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>, frame: &OutFrame) -> Result<()> {
    let text = serde_json::to_string(frame)
        .map_err(|err| ApiError::Channel(format!("failed to encode frame: {err}")))?;
    socket.send(WsMessage::Text(text))?;
    Ok(())
}

fn set_read_timeout(socket: &WebSocket<MaybeTlsStream<TcpStream>>, timeout: Duration) {
    let stream = match socket.get_ref() {
        MaybeTlsStream::Plain(stream) => Some(stream),
        MaybeTlsStream::Rustls(tls) => Some(tls.get_ref()),
        _ => None,
    };
    if let Some(stream) = stream {
        if let Err(err) = stream.set_read_timeout(Some(timeout)) {
            warn!("failed to set realtime read timeout: {err}");
        }
    }
}

/// The server acks a join with a `phx_reply` on the same topic. Anything
/// else arriving first is ignored.
fn wait_for_join(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>, topic: &str) -> Result<()> {
    let deadline = Instant::now() + JOIN_TIMEOUT;
    while Instant::now() < deadline {
        let message = match socket.read() {
            Ok(message) => message,
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => continue,
            Err(err) => return Err(err.into()),
        };
        let WsMessage::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<InFrame>(&text) else {
            continue;
        };
        if frame.event == "phx_reply" && frame.topic == topic {
            let status = frame.payload.get("status").and_then(Value::as_str);
            return if status == Some("ok") {
                Ok(())
            } else {
                Err(ApiError::Channel(format!("join rejected: {}", frame.payload)))
            };
        }
    }
    Err(ApiError::Channel(format!("no join reply for {topic}")))
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// Reads frames until the subscription is dropped or the socket dies.
/// The read timeout doubles as the tick for heartbeats and the stop flag.
fn reader_loop(
    mut socket: WebSocket<MaybeTlsStream<TcpStream>>,
    topic: String,
    tx: Sender<ChangeEvent>,
    closed: Arc<AtomicBool>,
) {
    let mut reference: u64 = 2;
    let mut last_heartbeat = Instant::now();

    loop {
        if closed.load(Ordering::Relaxed) {
            let leave = OutFrame {
                topic: &topic,
                event: "phx_leave",
                payload: json!({}),
                reference: reference.to_string(),
            };
            let _ = send_frame(&mut socket, &leave);
            let _ = socket.close(None);
            break;
        }

        if last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
            let beat = OutFrame {
                topic: "phoenix",
                event: "heartbeat",
                payload: json!({}),
                reference: reference.to_string(),
            };
            reference += 1;
            last_heartbeat = Instant::now();
            if send_frame(&mut socket, &beat).is_err() {
                debug!("realtime socket closed while sending heartbeat on {topic}");
                break;
            }
        }

        match socket.read() {
            Ok(WsMessage::Text(text)) => {
                if let Some(event) = parse_change(&text) {
                    if tx.send(event).is_err() {
                        // receiver gone without the flag being set
                        closed.store(true, Ordering::Relaxed);
                    }
                }
            }
            Ok(WsMessage::Ping(payload)) => {
                let _ = socket.send(WsMessage::Pong(payload));
            }
            Ok(WsMessage::Close(_)) => {
                debug!("realtime server closed {topic}");
                break;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                break;
            }
            Err(err) => {
                warn!("realtime socket error on {topic}: {err}");
                break;
            }
        }
    }
}

fn parse_change(text: &str) -> Option<ChangeEvent> {
    let frame: InFrame = serde_json::from_str(text).ok()?;
    let kind = match frame.event.as_str() {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        _ => return None,
    };
    let table = frame
        .payload
        .get("table")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| table_from_topic(&frame.topic));
    let record = frame.payload.get("record").cloned().unwrap_or(Value::Null);
    let old_record = frame
        .payload
        .get("old_record")
        .cloned()
        .filter(|value| !value.is_null());
    Some(ChangeEvent {
        kind,
        table,
        record,
        old_record,
    })
}

fn table_from_topic(topic: &str) -> String {
    topic.split(':').nth(2).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn topic_includes_optional_filter() {
        assert_eq!(topic_for("notifications", None), "realtime:public:notifications");
        assert_eq!(
            topic_for("messages", Some("chat_id=eq.42")),
            "realtime:public:messages:chat_id=eq.42"
        );
    }

    #[test]
    fn parses_insert_frames() {
        let text = r#"{
            "topic": "realtime:public:messages:chat_id=eq.42",
            "event": "INSERT",
            "payload": {
                "schema": "public",
                "table": "messages",
                "type": "INSERT",
                "commit_timestamp": "2025-04-02T09:30:00Z",
                "record": {"id": 1, "content": "hi"}
            },
            "ref": null
        }"#;
        let event = parse_change(text).unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.table, "messages");
        assert_eq!(event.record["content"], "hi");
        assert!(event.old_record.is_none());
    }

    #[test]
    fn parses_delete_frames_with_old_record() {
        let text = r#"{
            "topic": "realtime:public:likes",
            "event": "DELETE",
            "payload": {
                "table": "likes",
                "old_record": {"id": 7}
            },
            "ref": null
        }"#;
        let event = parse_change(text).unwrap();
        assert_eq!(event.kind, ChangeKind::Delete);
        assert_eq!(event.old_record.unwrap()["id"], 7);
    }

    #[test]
    fn falls_back_to_topic_for_table_name() {
        let text = r#"{
            "topic": "realtime:public:notifications",
            "event": "INSERT",
            "payload": {"record": {"id": 9}}
        }"#;
        let event = parse_change(text).unwrap();
        assert_eq!(event.table, "notifications");
    }

    #[test]
    fn ignores_protocol_frames() {
        let reply = r#"{
            "topic": "realtime:public:messages",
            "event": "phx_reply",
            "payload": {"status": "ok", "response": {}},
            "ref": "1"
        }"#;
        assert!(parse_change(reply).is_none());
        let heartbeat = r#"{"topic": "phoenix", "event": "heartbeat", "payload": {}}"#;
        assert!(parse_change(heartbeat).is_none());
    }
}
