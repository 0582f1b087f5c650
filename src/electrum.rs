/*
    Electrum Stratum protocol client.

    Newline-delimited JSON-RPC 2.0 over TCP or TLS. A single background
    task reads lines from the socket and dispatches them: lines with an
    id resolve the caller awaiting that id, lines with only a method
    are subscription notifications fanned out to registered listeners.

    Protocol reference:
        https://electrumx.readthedocs.io/en/latest/protocol.html
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::network;

const PROTOCOL_VERSION: &str = "1.4";
const CLIENT_NAME: &str = "MeowcoinWallet";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ElectrumError {
    #[error("not connected to a server")]
    NotConnected,

    #[error("connection closed")]
    Disconnected,

    #[error("request timed out")]
    Timeout,

    #[error("could not connect to any known server")]
    NoServerAvailable,

    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

/// Versions negotiated with the connected server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
    pub server_version: String,
    pub protocol_version: String,
    /// Last height seen via the headers subscription; 0 until one
    /// arrives.
    pub block_height: i64,
}

/// One entry of `blockchain.scripthash.get_history`. Height 0 means
/// unconfirmed, -1 unconfirmed with an unconfirmed parent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryItem {
    pub tx_hash: String,
    pub height: i64,
    #[serde(default)]
    pub fee: Option<i64>,
}

/// One entry of `blockchain.scripthash.listunspent`. Values are
/// satoshi.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnspentOutput {
    pub tx_hash: String,
    pub tx_pos: u32,
    pub value: i64,
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockHeader {
    pub height: i64,
    #[serde(default)]
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MerkleProof {
    pub merkle: Vec<String>,
    pub block_height: i64,
    pub pos: u32,
}

#[derive(Deserialize)]
struct Balance {
    confirmed: i64,
    unconfirmed: i64,
}

/// Byte stream the client runs over. Blanket-implemented so TCP and
/// TLS sockets are interchangeable behind one object type.
trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

type PendingSlot = oneshot::Sender<Result<Value, ElectrumError>>;

struct Inner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingSlot>>,
    // Subscriptions outlive reconnects; the server-side registrations
    // do not, so callers must re-subscribe after a reconnect.
    subscriptions: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    state: Mutex<ConnectionState>,
    server_info: Mutex<Option<ServerInfo>>,
    writer: AsyncMutex<Option<WriteHalf<Box<dyn Transport>>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    // Set while an explicit disconnect is tearing the socket down so
    // the read loop exit does not trigger an automatic reconnect.
    closing: AtomicBool,
    request_timeout: Duration,
}

/// Async Electrum client. Cheap to clone; all clones share one
/// connection. Any number of tasks may issue requests concurrently,
/// each awaits its own response slot.
#[derive(Clone)]
pub struct ElectrumClient {
    inner: Arc<Inner>,
}

/// Removes the pending-request entry when the awaiting future is
/// dropped, so cancelled or timed-out requests do not leak slots.
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending.lock().unwrap().remove(&self.id);
    }
}

impl Default for ElectrumClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ElectrumClient {
    pub fn new() -> Self {
        Self::with_request_timeout(REQUEST_TIMEOUT)
    }

    fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                pending: Mutex::new(HashMap::new()),
                subscriptions: Mutex::new(HashMap::new()),
                state: Mutex::new(ConnectionState::Disconnected),
                server_info: Mutex::new(None),
                writer: AsyncMutex::new(None),
                reader: Mutex::new(None),
                closing: AtomicBool::new(false),
                request_timeout,
            }),
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap()
    }

    pub fn server_info(&self) -> Option<ServerInfo> {
        self.inner.server_info.lock().unwrap().clone()
    }

    /// Connect to the first known server that answers, trying the TLS
    /// port before the plaintext port of each.
    pub async fn connect(&self) -> Result<(), ElectrumError> {
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }
        self.set_state(ConnectionState::Connecting);

        for server in &network::ELECTRUM_SERVERS {
            match self.connect_to_server(server.host, server.ssl_port, true).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!("TLS connect to {} failed: {}", server.host, e),
            }
            match self.connect_to_server(server.host, server.tcp_port, false).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::warn!("TCP connect to {} failed: {}", server.host, e),
            }
        }

        tracing::error!("could not connect to any Electrum server");
        self.set_state(ConnectionState::Error);
        Err(ElectrumError::NoServerAvailable)
    }

    /// Connect to a user-supplied server instead of the known list.
    pub async fn connect_to_custom_server(
        &self,
        host: &str,
        port: u16,
        use_ssl: bool,
    ) -> Result<(), ElectrumError> {
        self.set_state(ConnectionState::Connecting);
        match self.connect_to_server(host, port, use_ssl).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.set_state(ConnectionState::Error);
                Err(e)
            }
        }
    }

    // Boxed return type breaks the async recursion cycle
    // (connect_to_server -> read_loop -> reconnect -> connect ->
    // connect_to_server) so the compiler can prove the futures Send.
    fn connect_to_server<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        use_ssl: bool,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<(), ElectrumError>> + Send + 'a>,
    > {
        Box::pin(async move {
        let tcp = timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port)))
            .await
            .map_err(|_| ElectrumError::Timeout)??;

        let stream: Box<dyn Transport> = if use_ssl {
            // The community servers run self-signed certificates.
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?;
            let stream = tokio_native_tls::TlsConnector::from(connector)
                .connect(host, tcp)
                .await?;
            Box::new(stream)
        } else {
            Box::new(tcp)
        };

        let (read_half, write_half) = tokio::io::split(stream);
        *self.inner.writer.lock().await = Some(write_half);
        self.inner.closing.store(false, Ordering::SeqCst);

        let handle = tokio::spawn(self.clone().read_loop(read_half));
        if let Some(old) = self.inner.reader.lock().unwrap().replace(handle) {
            old.abort();
        }

        match self.handshake(host, port).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.disconnect().await;
                Err(e)
            }
        }
        })
    }

    /// Negotiate the protocol version. The connection only counts as
    /// established once the server has answered.
    async fn handshake(&self, host: &str, port: u16) -> Result<(), ElectrumError> {
        let result = self
            .request("server.version", json!([CLIENT_NAME, PROTOCOL_VERSION]))
            .await?;
        let (server_version, protocol_version): (String, String) = parse(result)?;

        tracing::info!(
            "connected to {}:{} ({}, protocol {})",
            host,
            port,
            server_version,
            protocol_version
        );
        *self.inner.server_info.lock().unwrap() = Some(ServerInfo {
            host: host.to_string(),
            port,
            server_version,
            protocol_version,
            block_height: 0,
        });
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    /// Close the connection. Every pending request fails with
    /// `Disconnected`; no caller is left hanging.
    pub async fn disconnect(&self) {
        self.inner.closing.store(true, Ordering::SeqCst);
        if let Some(reader) = self.inner.reader.lock().unwrap().take() {
            reader.abort();
        }
        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        self.fail_pending();
        *self.inner.server_info.lock().unwrap() = None;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Tear the connection down and replay the connect sequence.
    /// Active subscriptions are not re-registered with the new server;
    /// callers must re-subscribe.
    pub async fn reconnect(&self) -> Result<(), ElectrumError> {
        self.disconnect().await;
        self.set_state(ConnectionState::Reconnecting);
        tokio::time::sleep(RECONNECT_BACKOFF).await;
        self.connect().await
    }

    /// Send a JSON-RPC request and await its response. Resolves
    /// exactly once per call; concurrent callers never block each
    /// other. Times out after 30 seconds.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ElectrumError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (slot, response) = oneshot::channel();
        self.inner.pending.lock().unwrap().insert(id, slot);
        let guard = PendingGuard {
            inner: &self.inner,
            id,
        };

        let line = serde_json::to_string(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .expect("request object serializes") + "\n";

        {
            let mut writer = self.inner.writer.lock().await;
            let writer = writer.as_mut().ok_or(ElectrumError::NotConnected)?;
            writer.write_all(line.as_bytes()).await?;
        }
        tracing::debug!("-> {}", line.trim_end());

        let outcome = match timeout(self.inner.request_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ElectrumError::Disconnected),
            Err(_) => Err(ElectrumError::Timeout),
        };
        drop(guard);
        outcome
    }

    async fn read_loop(self, read_half: ReadHalf<Box<dyn Transport>>) {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => self.dispatch_line(&line),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("read loop error: {}", e);
                    break;
                }
            }
        }

        if self.inner.closing.load(Ordering::SeqCst) {
            return;
        }

        self.fail_pending();
        self.set_state(ConnectionState::Error);
        tracing::warn!("connection lost, reconnecting in {:?}", RECONNECT_DELAY);
        let client = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_DELAY).await;
            if let Err(e) = client.reconnect().await {
                tracing::error!("automatic reconnect failed: {}", e);
            }
        });
    }

    fn dispatch_line(&self, line: &str) {
        tracing::trace!("<- {}", line);
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("unparseable server line: {}", e);
                return;
            }
        };

        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            let slot = self.inner.pending.lock().unwrap().remove(&id);
            let Some(slot) = slot else {
                tracing::debug!("response for unknown id {}", id);
                return;
            };
            let outcome = match message.get("error") {
                Some(error) if !error.is_null() => Err(ElectrumError::Server {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                }),
                _ => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
            };
            let _ = slot.send(outcome);
        } else if let Some(method) = message.get("method").and_then(Value::as_str) {
            let params = message.get("params").cloned().unwrap_or(Value::Null);
            if method == "blockchain.headers.subscribe" {
                // Header pushes carry the new tip; track it before the
                // fan-out so server_info is current when listeners wake.
                let height = params
                    .get(0)
                    .and_then(|header| header.get("height"))
                    .and_then(Value::as_i64);
                if let Some(height) = height {
                    if let Some(info) = self.inner.server_info.lock().unwrap().as_mut() {
                        info.block_height = height;
                    }
                }
            }
            let mut subscriptions = self.inner.subscriptions.lock().unwrap();
            if let Some(listeners) = subscriptions.get_mut(method) {
                listeners.retain(|listener| listener.send(params.clone()).is_ok());
            }
        }
    }

    fn fail_pending(&self) {
        let pending: Vec<PendingSlot> = {
            let mut map = self.inner.pending.lock().unwrap();
            map.drain().map(|(_, slot)| slot).collect()
        };
        for slot in pending {
            let _ = slot.send(Err(ElectrumError::Disconnected));
        }
    }

    fn set_state(&self, next: ConnectionState) {
        *self.inner.state.lock().unwrap() = next;
    }

    fn register_subscription(&self, method: &str) -> mpsc::UnboundedReceiver<Value> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner
            .subscriptions
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push(sender);
        receiver
    }

    // Typed method wrappers. Script hashes are produced by
    // `script::electrum_script_hash`.

    /// Confirmed and unconfirmed balance of a script hash, in satoshi.
    pub async fn get_balance(&self, script_hash: &str) -> Result<(i64, i64), ElectrumError> {
        let result = self
            .request("blockchain.scripthash.get_balance", json!([script_hash]))
            .await?;
        let balance: Balance = parse(result)?;
        Ok((balance.confirmed, balance.unconfirmed))
    }

    pub async fn get_history(&self, script_hash: &str) -> Result<Vec<HistoryItem>, ElectrumError> {
        let result = self
            .request("blockchain.scripthash.get_history", json!([script_hash]))
            .await?;
        parse(result)
    }

    pub async fn list_unspent(
        &self,
        script_hash: &str,
    ) -> Result<Vec<UnspentOutput>, ElectrumError> {
        let result = self
            .request("blockchain.scripthash.listunspent", json!([script_hash]))
            .await?;
        parse(result)
    }

    /// Subscribe to status changes of a script hash. Returns the
    /// current status (None for never-used scripts) and a receiver of
    /// raw notification params.
    pub async fn subscribe_script_hash(
        &self,
        script_hash: &str,
    ) -> Result<(Option<String>, mpsc::UnboundedReceiver<Value>), ElectrumError> {
        let receiver = self.register_subscription("blockchain.scripthash.subscribe");
        let result = self
            .request("blockchain.scripthash.subscribe", json!([script_hash]))
            .await?;
        let status = match result {
            Value::Null => None,
            Value::String(status) => Some(status),
            other => return Err(ElectrumError::MalformedResponse(other.to_string())),
        };
        Ok((status, receiver))
    }

    /// Subscribe to new block headers. Returns the current tip and a
    /// receiver of raw notification params (an array whose first
    /// element is the header object).
    pub async fn subscribe_headers(
        &self,
    ) -> Result<(BlockHeader, mpsc::UnboundedReceiver<Value>), ElectrumError> {
        let receiver = self.register_subscription("blockchain.headers.subscribe");
        let result = self.request("blockchain.headers.subscribe", json!([])).await?;
        let header: BlockHeader = parse(result)?;
        if let Some(info) = self.inner.server_info.lock().unwrap().as_mut() {
            info.block_height = header.height;
        }
        Ok((header, receiver))
    }

    /// Fetch a transaction by display-order id. Verbose requests
    /// return the server's decoded object, otherwise a hex string.
    pub async fn get_transaction(
        &self,
        tx_id: &str,
        verbose: bool,
    ) -> Result<Value, ElectrumError> {
        self.request("blockchain.transaction.get", json!([tx_id, verbose]))
            .await
    }

    /// Broadcast raw transaction hex. Returns the transaction id the
    /// server accepted it under.
    pub async fn broadcast_transaction(&self, raw_tx_hex: &str) -> Result<String, ElectrumError> {
        let result = self
            .request("blockchain.transaction.broadcast", json!([raw_tx_hex]))
            .await?;
        parse(result)
    }

    /// Estimated fee in coin per kilobyte for confirmation within
    /// `blocks` blocks. Negative when the server has no estimate.
    pub async fn estimate_fee(&self, blocks: u32) -> Result<f64, ElectrumError> {
        let result = self.request("blockchain.estimatefee", json!([blocks])).await?;
        parse(result)
    }

    pub async fn get_block_header(&self, height: u64) -> Result<String, ElectrumError> {
        let result = self.request("blockchain.block.header", json!([height])).await?;
        parse(result)
    }

    /// Merkle branch proving a transaction's inclusion in its block.
    pub async fn get_merkle_proof(
        &self,
        tx_id: &str,
        height: u64,
    ) -> Result<MerkleProof, ElectrumError> {
        let result = self
            .request("blockchain.transaction.get_merkle", json!([tx_id, height]))
            .await?;
        parse(result)
    }

    /// Keep-alive. Returns false instead of an error so callers can
    /// poll it from a timer.
    pub async fn ping(&self) -> bool {
        self.request("server.ping", json!([])).await.is_ok()
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ElectrumError> {
    serde_json::from_value(value).map_err(|e| ElectrumError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::tcp::OwnedWriteHalf;
    use tokio::net::TcpListener;

    async fn write_line(writer: &mut OwnedWriteHalf, message: &Value) {
        let line = serde_json::to_string(message).unwrap() + "\n";
        writer.write_all(line.as_bytes()).await.unwrap();
    }

    /// One-connection mock server. Replies per method; "hold" delays
    /// its reply until the next "release" to exercise out-of-order
    /// response correlation.
    async fn spawn_mock() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = socket.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let mut held: Option<Value> = None;

            while let Ok(Some(line)) = lines.next_line().await {
                let request: Value = serde_json::from_str(&line).unwrap();
                let id = request["id"].clone();
                let params = request["params"].clone();
                match request["method"].as_str().unwrap() {
                    "server.version" => {
                        let reply =
                            json!({"jsonrpc": "2.0", "id": id, "result": ["MockServer", "1.4"]});
                        write_line(&mut write_half, &reply).await;
                    }
                    "echo" => {
                        let reply = json!({"jsonrpc": "2.0", "id": id, "result": params});
                        write_line(&mut write_half, &reply).await;
                    }
                    "fail" => {
                        let reply = json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": {"code": 2, "message": "boom"}
                        });
                        write_line(&mut write_half, &reply).await;
                    }
                    "hold" => {
                        held = Some(json!({"jsonrpc": "2.0", "id": id, "result": "held"}));
                    }
                    "release" => {
                        let reply = json!({"jsonrpc": "2.0", "id": id, "result": "released"});
                        write_line(&mut write_half, &reply).await;
                        if let Some(held) = held.take() {
                            write_line(&mut write_half, &held).await;
                        }
                    }
                    "hang" => {}
                    "drop" => return,
                    "blockchain.headers.subscribe" => {
                        let reply = json!({
                            "jsonrpc": "2.0", "id": id,
                            "result": {"height": 100, "hex": "00"}
                        });
                        write_line(&mut write_half, &reply).await;
                        let push = json!({
                            "jsonrpc": "2.0",
                            "method": "blockchain.headers.subscribe",
                            "params": [{"height": 101, "hex": "01"}]
                        });
                        write_line(&mut write_half, &push).await;
                    }
                    "blockchain.scripthash.subscribe" => {
                        let reply = json!({"jsonrpc": "2.0", "id": id, "result": "status0"});
                        write_line(&mut write_half, &reply).await;
                        let push = json!({
                            "jsonrpc": "2.0",
                            "method": "blockchain.scripthash.subscribe",
                            "params": [params[0], "status1"]
                        });
                        write_line(&mut write_half, &push).await;
                    }
                    other => {
                        let reply = json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": {"code": -32601, "message": format!("unknown {other}")}
                        });
                        write_line(&mut write_half, &reply).await;
                    }
                }
            }
        });
        port
    }

    async fn connected_client() -> ElectrumClient {
        let port = spawn_mock().await;
        let client = ElectrumClient::new();
        client
            .connect_to_custom_server("127.0.0.1", port, false)
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn handshake_populates_server_info() {
        let client = connected_client().await;
        assert_eq!(client.state(), ConnectionState::Connected);

        let info = client.server_info().unwrap();
        assert_eq!(info.server_version, "MockServer");
        assert_eq!(info.protocol_version, "1.4");
        assert_eq!(info.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn request_round_trips_params() {
        let client = connected_client().await;
        let result = client.request("echo", json!([1, "two"])).await.unwrap();
        assert_eq!(result, json!([1, "two"]));
    }

    #[tokio::test]
    async fn responses_correlate_out_of_order() {
        let client = connected_client().await;

        let held = {
            let client = client.clone();
            tokio::spawn(async move { client.request("hold", json!([])).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let released = client.request("release", json!([])).await.unwrap();
        assert_eq!(released, json!("released"));
        assert_eq!(held.await.unwrap().unwrap(), json!("held"));
    }

    #[tokio::test]
    async fn server_errors_are_typed() {
        let client = connected_client().await;
        let err = client.request("fail", json!([])).await.unwrap_err();
        match err {
            ElectrumError::Server { code, message } => {
                assert_eq!(code, 2);
                assert_eq!(message, "boom");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscription_notifications_fan_out() {
        let client = connected_client().await;
        let (status, mut updates) = client.subscribe_script_hash("ab".repeat(32).as_str())
            .await
            .unwrap();
        assert_eq!(status.as_deref(), Some("status0"));

        let params = updates.recv().await.unwrap();
        assert_eq!(params[0], json!("ab".repeat(32)));
        assert_eq!(params[1], json!("status1"));
    }

    #[tokio::test]
    async fn header_pushes_update_block_height() {
        let client = connected_client().await;
        let (tip, mut updates) = client.subscribe_headers().await.unwrap();
        assert_eq!(tip.height, 100);
        assert_eq!(client.server_info().unwrap().block_height, 100);

        let params = updates.recv().await.unwrap();
        assert_eq!(params[0]["height"], json!(101));
        assert_eq!(client.server_info().unwrap().block_height, 101);
    }

    #[tokio::test]
    async fn timed_out_request_releases_its_pending_slot() {
        let port = spawn_mock().await;
        let client = ElectrumClient::with_request_timeout(Duration::from_millis(100));
        client
            .connect_to_custom_server("127.0.0.1", port, false)
            .await
            .unwrap();

        let result = client.request("hang", json!([])).await;
        assert!(matches!(result, Err(ElectrumError::Timeout)));
        assert_eq!(client.pending_len(), 0);

        // The connection is still usable afterwards.
        let echoed = client.request("echo", json!(["still alive"])).await.unwrap();
        assert_eq!(echoed, json!(["still alive"]));
    }

    #[tokio::test]
    async fn cancelled_request_releases_its_pending_slot() {
        let client = connected_client().await;

        let in_flight = {
            let client = client.clone();
            tokio::spawn(async move { client.request("hang", json!([])).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.pending_len(), 1);

        in_flight.abort();
        let _ = in_flight.await;
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn disconnect_rejects_pending_requests() {
        let client = connected_client().await;

        let pending = {
            let client = client.clone();
            tokio::spawn(async move { client.request("hang", json!([])).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        client.disconnect().await;
        assert!(matches!(
            pending.await.unwrap(),
            Err(ElectrumError::Disconnected)
        ));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.server_info().is_none());
    }

    #[tokio::test]
    async fn closed_socket_rejects_pending_requests() {
        let client = connected_client().await;
        let result = client.request("drop", json!([])).await;
        assert!(matches!(result, Err(ElectrumError::Disconnected)));
    }

    #[tokio::test]
    async fn request_without_connection_fails_fast() {
        let client = ElectrumClient::new();
        assert!(matches!(
            client.request("server.ping", json!([])).await,
            Err(ElectrumError::NotConnected)
        ));
    }
}
