//! TCP server for the prediction protocol.
//!
//! Binds to the configured address and answers JSONL messages, one thread per
//! connection. Every connection shares the same loaded model.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use griya_config::ServerSettings;
use griya_protocol::{
    error_codes, ClientMessage, ErrorMessage, PongMessage, ResultMessage, SchemaResultMessage,
    ServerMessage, WelcomeMessage, PROTOCOL_VERSION,
};

use crate::service::Service;

/// Maximum consecutive parse failures before disconnecting a client.
pub const MAX_PARSE_FAILURES: u32 = 5;

/// Connections idle this long are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Operational counters, shared with every connection thread.
#[derive(Clone, Default)]
pub struct ServerMetrics {
    pub submissions: Arc<AtomicU64>,
    /// Connections closed due to parse failure limit.
    pub connections_closed_parse_failures: Arc<AtomicU64>,
    /// Connections closed due to oversized message.
    pub connections_closed_oversize: Arc<AtomicU64>,
    /// Connections refused due to connection limit.
    pub connections_refused_limit: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_connections: usize,
    max_message_bytes: usize,
}

/// The prediction server - owns the listener thread.
pub struct PredictionServer {
    listener_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    bound_addr: Option<SocketAddr>,
    active: Arc<AtomicUsize>,
    metrics: ServerMetrics,
}

impl PredictionServer {
    pub fn new() -> Self {
        Self {
            listener_handle: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            bound_addr: None,
            active: Arc::new(AtomicUsize::new(0)),
            metrics: ServerMetrics::default(),
        }
    }

    /// Bind and start accepting. Returns the bound address.
    pub fn start(&mut self, service: Service, settings: &ServerSettings) -> io::Result<SocketAddr> {
        if let Some(addr) = self.bound_addr {
            return Ok(addr);
        }

        let listener = TcpListener::bind(&settings.bind)?;
        let addr = listener.local_addr()?;
        // Non-blocking so the loop can check the shutdown flag
        listener.set_nonblocking(true)?;

        self.shutdown.store(false, Ordering::SeqCst);
        self.bound_addr = Some(addr);

        let shutdown = Arc::clone(&self.shutdown);
        let active = Arc::clone(&self.active);
        let metrics = self.metrics.clone();
        let limits = Limits {
            max_connections: settings.max_connections,
            max_message_bytes: settings.max_message_bytes,
        };

        self.listener_handle = Some(thread::spawn(move || {
            run_listener(listener, shutdown, service, limits, active, metrics);
        }));

        log::info!("Prediction server listening on {}", addr);
        Ok(addr)
    }

    /// Stop accepting. Open connections finish on their own.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
        self.bound_addr = None;
        log::info!("Prediction server stopped");
    }

    /// Block until the listener exits.
    pub fn wait(&mut self) {
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.listener_handle.is_some() && !self.shutdown.load(Ordering::SeqCst)
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.bound_addr
    }

    pub fn connection_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }
}

impl Default for PredictionServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PredictionServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Releases a connection slot when the handler thread ends.
struct ConnectionSlot(Arc<AtomicUsize>);

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn run_listener(
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    service: Service,
    limits: Limits,
    active: Arc<AtomicUsize>,
    metrics: ServerMetrics,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((mut stream, addr)) => {
                if active.load(Ordering::SeqCst) >= limits.max_connections {
                    log::warn!(
                        "Connection refused from {}: limit of {} reached",
                        addr,
                        limits.max_connections
                    );
                    metrics.connections_refused_limit.fetch_add(1, Ordering::Relaxed);
                    let _ = send_error(
                        &mut stream,
                        String::new(),
                        error_codes::TOO_MANY_CONNECTIONS,
                        format!("connection limit of {} reached", limits.max_connections),
                    );
                    continue;
                }

                log::debug!("Accepted connection from {}", addr);
                active.fetch_add(1, Ordering::SeqCst);
                let slot = ConnectionSlot(Arc::clone(&active));
                let service = service.clone();
                let conn_metrics = metrics.clone();

                thread::spawn(move || {
                    let _slot = slot;
                    if let Err(e) = handle_connection(stream, &service, limits, &conn_metrics) {
                        log::warn!("Connection error from {}: {}", addr, e);
                    }
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
                break;
            }
        }
    }
}

enum Line {
    Complete(String),
    TooLarge(usize),
    Eof,
}

/// Read one newline-terminated line, never buffering more than `limit + 1` bytes.
fn read_line_bounded<R: BufRead>(reader: &mut R, limit: usize, buf: &mut Vec<u8>) -> io::Result<Line> {
    buf.clear();
    let n = reader.by_ref().take((limit as u64).saturating_add(1)).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(Line::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > limit {
        return Ok(Line::TooLarge(buf.len()));
    }
    Ok(Line::Complete(String::from_utf8_lossy(buf).into_owned()))
}

fn discard_rest_of_line<R: BufRead>(reader: &mut R, cap: usize) -> io::Result<()> {
    let mut discarded = 0;
    while discarded < cap {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            return Ok(());
        }
        if let Some(pos) = chunk.iter().position(|&b| b == b'\n') {
            reader.consume(pos + 1);
            return Ok(());
        }
        let len = chunk.len();
        reader.consume(len);
        discarded += len;
    }
    Ok(())
}

fn handle_connection(
    mut stream: TcpStream,
    service: &Service,
    limits: Limits,
    metrics: &ServerMetrics,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(IDLE_TIMEOUT))?;
    stream.set_write_timeout(Some(Duration::from_secs(10)))?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut buf = Vec::new();
    let mut parse_failures: u32 = 0;

    loop {
        let line = match read_line_bounded(&mut reader, limits.max_message_bytes, &mut buf) {
            Ok(Line::Complete(line)) => line,
            Ok(Line::TooLarge(len)) => {
                // Drain what the client already sent so the reply is not lost to a reset
                let _ = discard_rest_of_line(&mut reader, limits.max_message_bytes.saturating_mul(16));
                send_error(
                    &mut stream,
                    String::new(),
                    error_codes::MESSAGE_TOO_LARGE,
                    format!("line exceeds {} bytes", limits.max_message_bytes),
                )?;
                log::warn!("Client sent oversized message ({}+ bytes), disconnecting", len);
                metrics.connections_closed_oversize.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            Ok(Line::Eof) => return Ok(()),
            Err(ref e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                log::debug!("Closing idle connection");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if line.trim().is_empty() {
            continue;
        }

        let msg: ClientMessage = match serde_json::from_str(&line) {
            Ok(m) => {
                parse_failures = 0;
                m
            }
            Err(e) => {
                parse_failures += 1;
                log::debug!("Malformed message ({}/{}): {}", parse_failures, MAX_PARSE_FAILURES, e);
                send_error(&mut stream, salvage_id(&line), error_codes::PARSE_ERROR, e.to_string())?;

                if parse_failures >= MAX_PARSE_FAILURES {
                    log::warn!("Client exceeded parse failure limit, disconnecting");
                    metrics.connections_closed_parse_failures.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                continue;
            }
        };

        if let ClientMessage::Hello(ref hello) = msg {
            if hello.protocol_version > PROTOCOL_VERSION {
                send_error(
                    &mut stream,
                    hello.id.clone(),
                    error_codes::UNSUPPORTED_VERSION,
                    format!(
                        "protocol version {} is not supported (server speaks {})",
                        hello.protocol_version, PROTOCOL_VERSION
                    ),
                )?;
                return Ok(());
            }
        }

        if matches!(msg, ClientMessage::Submit(_)) {
            metrics.submissions.fetch_add(1, Ordering::Relaxed);
        }
        log::debug!("Handling message id={:?}", msg.id());
        let response = handle_message(msg, service);
        send_message(&mut stream, &response)?;
    }
}

/// Answer a well-formed message.
pub fn handle_message(msg: ClientMessage, service: &Service) -> ServerMessage {
    match msg {
        ClientMessage::Hello(hello) => ServerMessage::Welcome(WelcomeMessage {
            id: hello.id,
            protocol_version: hello.protocol_version.min(PROTOCOL_VERSION),
            model_fingerprint: service.model().fingerprint().to_string(),
            capabilities: vec!["submit".to_string(), "schema".to_string(), "ping".to_string()],
        }),
        ClientMessage::Submit(submit) => ServerMessage::Result(ResultMessage {
            id: submit.id,
            result: service.submit(submit.record),
        }),
        ClientMessage::Schema(schema) => {
            let report = service.schema_report();
            ServerMessage::SchemaResult(SchemaResultMessage {
                id: schema.id,
                expected_columns: report.expected_columns,
                verdict: report.verdict,
                declared_encoding: report.declared_encoding,
                fingerprint: report.fingerprint,
            })
        }
        ClientMessage::Ping(ping) => ServerMessage::Pong(PongMessage { id: ping.id }),
    }
}

/// Best-effort request id from a line that failed to parse as a message.
fn salvage_id(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from))
        .unwrap_or_default()
}

fn send_message(stream: &mut TcpStream, msg: &ServerMessage) -> io::Result<()> {
    let json = serde_json::to_string(msg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(stream, "{}", json)?;
    stream.flush()
}

fn send_error(stream: &mut TcpStream, id: String, code: &str, message: String) -> io::Result<()> {
    let msg = ServerMessage::Error(ErrorMessage { id, code: code.to_string(), message });
    send_message(stream, &msg)
}
