//! HTTP event-stream transport.
//!
//! Opens a `text/event-stream` response and forwards each event's data.
//! The connection is opened once on spawn and again on every reopen request;
//! failures are reported, never retried here. A server that stops answering
//! counts as a failure once the response or idle timeout runs out.

use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::sse::SseDecoder;
use super::{Reopen, SourceError, Transport, TransportEvent};

/// Connection settings for an [`EventStreamSource`].
#[derive(Clone)]
pub struct StreamOptions {
    /// Limit on establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Limit on waiting for response headers.
    pub response_timeout: Duration,
    /// Longest gap between body chunks before the stream counts as dead.
    pub idle_timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub token: Option<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
            token: None,
        }
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A transport reading server-sent events over HTTP.
///
/// Spawns a background task that owns the connection and makes events
/// available via `poll()`.
///
/// ```no_run
/// use portfolio_pulse::{EventStreamSource, StreamOptions, Transport};
///
/// # tokio_test::block_on(async {
/// let mut source = EventStreamSource::spawn(
///     "http://127.0.0.1:8000/api/portfolio/stream",
///     StreamOptions::default(),
/// )
/// .unwrap();
/// while let Some(event) = source.poll() {
///     println!("{:?}", event);
/// }
/// # });
/// ```
#[derive(Debug)]
pub struct EventStreamSource {
    receiver: mpsc::Receiver<TransportEvent>,
    commands: mpsc::UnboundedSender<()>,
    description: String,
}

/// Reopen capability for an [`EventStreamSource`].
#[derive(Debug, Clone)]
pub struct ReopenHandle {
    commands: mpsc::UnboundedSender<()>,
}

impl Reopen for ReopenHandle {
    fn request_reopen(&mut self) {
        if self.commands.send(()).is_err() {
            debug!("Reopen requested after the stream task ended");
        }
    }
}

/// How a connected stream ended.
enum StreamEnd {
    Closed,
    Failed(String),
    Reopen,
    Shutdown,
}

impl EventStreamSource {
    /// Spawn the connection task. Must be called within a tokio runtime.
    pub fn spawn(url: &str, options: StreamOptions) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .build()?;
        let (tx, rx) = mpsc::channel(256);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        tokio::spawn(run(client, url.to_string(), options, tx, cmd_rx));

        Ok(Self {
            receiver: rx,
            commands: cmd_tx,
            description: format!("stream: {}", url),
        })
    }
}

async fn open(
    client: &reqwest::Client,
    url: &str,
    options: &StreamOptions,
) -> Result<reqwest::Response, SourceError> {
    let mut request = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");
    if let Some(token) = &options.token {
        request = request.bearer_auth(token);
    }

    let response = timeout(options.response_timeout, request.send())
        .await
        .map_err(|_| SourceError::Timeout)??;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    Ok(response)
}

async fn run(
    client: reqwest::Client,
    url: String,
    options: StreamOptions,
    events: mpsc::Sender<TransportEvent>,
    mut commands: mpsc::UnboundedReceiver<()>,
) {
    let mut open_requested = true;

    loop {
        if !open_requested && commands.recv().await.is_none() {
            break;
        }
        open_requested = false;
        // Collapse requests that queued up while we were busy
        while commands.try_recv().is_ok() {}

        debug!(url = %url, "Opening event stream");
        let response = match open(&client, &url, &options).await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Failed to open event stream");
                if events.send(TransportEvent::Error(err.to_string())).await.is_err() {
                    break;
                }
                continue;
            }
        };

        info!(url = %url, "Event stream open");
        if events.send(TransportEvent::Open).await.is_err() {
            break;
        }

        let mut decoder = SseDecoder::new();
        let mut body = Box::pin(response.bytes_stream());
        let end = loop {
            tokio::select! {
                chunk = timeout(options.idle_timeout, body.next()) => match chunk {
                    Ok(Some(Ok(bytes))) => {
                        let decoded = match decoder.feed(&bytes) {
                            Ok(decoded) => decoded,
                            Err(err) => break StreamEnd::Failed(err.to_string()),
                        };
                        let mut receiver_gone = false;
                        for event in decoded {
                            if let Some(retry) = event.retry {
                                debug!(retry_ms = retry, "Ignoring server retry hint");
                            }
                            if events.send(TransportEvent::Message(event.data)).await.is_err() {
                                receiver_gone = true;
                                break;
                            }
                        }
                        if receiver_gone {
                            break StreamEnd::Shutdown;
                        }
                    }
                    Ok(Some(Err(err))) => break StreamEnd::Failed(SourceError::from(err).to_string()),
                    Ok(None) => break StreamEnd::Closed,
                    Err(_) => {
                        let idle_ms = options.idle_timeout.as_millis() as u64;
                        break StreamEnd::Failed(SourceError::Idle(idle_ms).to_string());
                    }
                },
                cmd = commands.recv() => match cmd {
                    Some(()) => break StreamEnd::Reopen,
                    None => break StreamEnd::Shutdown,
                },
            }
        };

        let report = match end {
            StreamEnd::Closed => {
                info!(url = %url, "Event stream closed by server");
                TransportEvent::Closed
            }
            StreamEnd::Failed(message) => {
                warn!(url = %url, error = %message, "Event stream failed");
                TransportEvent::Error(message)
            }
            StreamEnd::Reopen => {
                debug!(url = %url, "Reopening live stream on request");
                open_requested = true;
                continue;
            }
            StreamEnd::Shutdown => break,
        };
        if events.send(report).await.is_err() {
            break;
        }
    }
    debug!(url = %url, "Event stream task finished");
}

impl Transport for EventStreamSource {
    fn poll(&mut self) -> Option<TransportEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => None,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn reopen_handle(&self) -> Box<dyn Reopen> {
        Box::new(ReopenHandle {
            commands: self.commands.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn options() -> StreamOptions {
        StreamOptions {
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(2),
            idle_timeout: Duration::from_secs(2),
            token: None,
        }
    }

    /// Serve one canned HTTP response per accepted connection.
    async fn serve(responses: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/stream", addr)
    }

    /// Accept one connection, write `prefix`, then hold the socket open.
    async fn serve_and_hang(prefix: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(prefix.as_bytes()).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });
        format!("http://{}/stream", addr)
    }

    /// Answer one connection with `response` and hand back the raw request.
    async fn serve_recording(response: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        (format!("http://{}/stream", addr), rx)
    }

    async fn next_event(source: &mut EventStreamSource) -> TransportEvent {
        for _ in 0..200 {
            if let Some(event) = source.poll() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no transport event received");
    }

    const SSE_OK: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\ndata: {\"total_value_usd\":1}\n\ndata: {\"total_value_usd\":2}\n\n";

    #[tokio::test]
    async fn test_stream_source_delivers_open_messages_and_close() {
        let url = serve(vec![SSE_OK]).await;
        let mut source = EventStreamSource::spawn(&url, options()).unwrap();

        assert_eq!(next_event(&mut source).await, TransportEvent::Open);
        assert_eq!(
            next_event(&mut source).await,
            TransportEvent::Message("{\"total_value_usd\":1}".to_string())
        );
        assert_eq!(
            next_event(&mut source).await,
            TransportEvent::Message("{\"total_value_usd\":2}".to_string())
        );
        assert_eq!(next_event(&mut source).await, TransportEvent::Closed);
    }

    #[tokio::test]
    async fn test_stream_source_reports_bad_status() {
        let url = serve(vec![
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ])
        .await;
        let mut source = EventStreamSource::spawn(&url, options()).unwrap();

        match next_event(&mut source).await {
            TransportEvent::Error(message) => assert!(message.contains("503")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_source_times_out_waiting_for_headers() {
        let url = serve_and_hang("").await;
        let mut source = EventStreamSource::spawn(
            &url,
            StreamOptions {
                response_timeout: Duration::from_millis(200),
                ..options()
            },
        )
        .unwrap();

        match next_event(&mut source).await {
            TransportEvent::Error(message) => assert!(message.contains("timed out")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_source_fails_when_body_goes_quiet() {
        let url = serve_and_hang(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\ndata: {\"total_value_usd\":1}\n\n",
        )
        .await;
        let mut source = EventStreamSource::spawn(
            &url,
            StreamOptions {
                idle_timeout: Duration::from_millis(200),
                ..options()
            },
        )
        .unwrap();

        assert_eq!(next_event(&mut source).await, TransportEvent::Open);
        assert_eq!(
            next_event(&mut source).await,
            TransportEvent::Message("{\"total_value_usd\":1}".to_string())
        );
        match next_event(&mut source).await {
            TransportEvent::Error(message) => assert!(message.contains("No data received")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_source_sends_bearer_token() {
        let (url, request) = serve_recording(SSE_OK).await;
        let mut source = EventStreamSource::spawn(
            &url,
            StreamOptions {
                token: Some("s3cret".to_string()),
                ..options()
            },
        )
        .unwrap();

        assert_eq!(next_event(&mut source).await, TransportEvent::Open);
        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.contains("authorization: bearer s3cret"));
        assert!(request.contains("accept: text/event-stream"));
    }

    #[tokio::test]
    async fn test_stream_source_omits_authorization_without_token() {
        let (url, request) = serve_recording(SSE_OK).await;
        let mut source = EventStreamSource::spawn(&url, options()).unwrap();

        assert_eq!(next_event(&mut source).await, TransportEvent::Open);
        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_stream_source_reopens_on_request() {
        let url = serve(vec![SSE_OK, SSE_OK]).await;
        let mut source = EventStreamSource::spawn(&url, options()).unwrap();

        // Drain the first connection
        loop {
            if next_event(&mut source).await == TransportEvent::Closed {
                break;
            }
        }

        source.reopen_handle().request_reopen();
        assert_eq!(next_event(&mut source).await, TransportEvent::Open);
    }

    #[tokio::test]
    async fn test_stream_source_description() {
        let source = EventStreamSource::spawn(
            "http://localhost:9/stream",
            StreamOptions {
                connect_timeout: Duration::from_millis(50),
                ..options()
            },
        )
        .unwrap();
        assert_eq!(source.description(), "stream: http://localhost:9/stream");
    }

    #[test]
    fn test_options_debug_redacts_token() {
        let options = StreamOptions {
            token: Some("s3cret".to_string()),
            ..StreamOptions::default()
        };
        let rendered = format!("{:?}", options);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
