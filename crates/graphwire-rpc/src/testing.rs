//! In-memory transport for tests.
//!
//! [`MockTransport`] answers unary calls with a handler closure and hands
//! every opened transaction stream to the test as a [`MockStream`], so the
//! test plays the server side of the conversation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::credential::{CallMetadata, Credential};
use crate::error::{DriverError, DriverResult};
use crate::proto::{self, stream_state, transaction_res, transaction_res_part, transaction_server};
use crate::transport::{Connector, ResponseStream, Transport, UnaryRequest, UnaryResponse};

/// How long [`MockTransport::accept`] and [`MockStream::next_request`] wait.
const WAIT: Duration = Duration::from_secs(5);

type UnaryHandler =
    dyn Fn(&CallMetadata, &UnaryRequest) -> DriverResult<UnaryResponse> + Send + Sync;
type StreamGuard = dyn Fn(&CallMetadata) -> DriverResult<()> + Send + Sync;

/// A scripted server.
pub struct MockTransport {
    address: String,
    handler: Box<UnaryHandler>,
    stream_guard: Option<Box<StreamGuard>>,
    calls: Mutex<Vec<(CallMetadata, UnaryRequest)>>,
    accepted_tx: UnboundedSender<MockStream>,
    accepted_rx: tokio::sync::Mutex<UnboundedReceiver<MockStream>>,
}

impl MockTransport {
    pub fn new<F>(address: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CallMetadata, &UnaryRequest) -> DriverResult<UnaryResponse> + Send + Sync + 'static,
    {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        Self {
            address: address.into(),
            handler: Box::new(handler),
            stream_guard: None,
            calls: Mutex::new(Vec::new()),
            accepted_tx,
            accepted_rx: tokio::sync::Mutex::new(accepted_rx),
        }
    }

    /// Decide per attempt whether a transaction stream may open.
    pub fn with_stream_guard<G>(mut self, guard: G) -> Self
    where
        G: Fn(&CallMetadata) -> DriverResult<()> + Send + Sync + 'static,
    {
        self.stream_guard = Some(Box::new(guard));
        self
    }

    /// Every unary call received so far, in order.
    pub fn calls(&self) -> Vec<(CallMetadata, UnaryRequest)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, request)| request.name() == method)
            .count()
    }

    /// The next transaction stream a client opened.
    pub async fn accept(&self) -> Option<MockStream> {
        let mut accepted = self.accepted_rx.lock().await;
        tokio::time::timeout(WAIT, accepted.recv()).await.ok().flatten()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn address(&self) -> &str {
        &self.address
    }

    async fn unary(
        &self,
        metadata: &CallMetadata,
        request: UnaryRequest,
    ) -> DriverResult<UnaryResponse> {
        let response = (self.handler)(metadata, &request);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((metadata.clone(), request));
        response
    }

    async fn transaction(
        &self,
        metadata: &CallMetadata,
        requests: UnboundedReceiver<proto::TransactionClient>,
    ) -> DriverResult<ResponseStream> {
        if let Some(guard) = &self.stream_guard {
            guard(metadata)?;
        }
        let (responses, inbound) = mpsc::unbounded_channel();
        let stream = MockStream {
            metadata: metadata.clone(),
            requests,
            responses,
        };
        self.accepted_tx
            .send(stream)
            .map_err(|_| DriverError::Transport("mock server gone".into()))?;
        Ok(futures::stream::unfold(inbound, |mut inbound| async move {
            inbound.recv().await.map(|message| (message, inbound))
        })
        .boxed())
    }
}

/// The server side of one transaction stream.
///
/// Dropping it ends the inbound stream, as a server hang-up would.
pub struct MockStream {
    metadata: CallMetadata,
    requests: UnboundedReceiver<proto::TransactionClient>,
    responses: UnboundedSender<DriverResult<proto::TransactionServer>>,
}

impl MockStream {
    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    /// Wait for the client's next message. `None` once the client closed.
    pub async fn next_request(&mut self) -> Option<proto::TransactionClient> {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .ok()
            .flatten()
    }

    /// The next already-sent client message, without waiting.
    pub fn try_next_request(&mut self) -> Option<proto::TransactionClient> {
        self.requests.try_recv().ok()
    }

    pub fn send(&self, req_id: u64, server: transaction_server::Server) {
        let _ = self.responses.send(Ok(proto::TransactionServer {
            req_id,
            server: Some(server),
        }));
    }

    pub fn reply(&self, req_id: u64, res: transaction_res::Res) {
        self.send(
            req_id,
            transaction_server::Server::Res(proto::TransactionRes { res: Some(res) }),
        );
    }

    pub fn part(&self, req_id: u64, res: transaction_res_part::Res) {
        self.send(
            req_id,
            transaction_server::Server::ResPart(proto::TransactionResPart { res: Some(res) }),
        );
    }

    pub fn continue_(&self, req_id: u64) {
        self.stream_state(req_id, stream_state::State::Continue);
    }

    pub fn done(&self, req_id: u64) {
        self.stream_state(req_id, stream_state::State::Done);
    }

    fn stream_state(&self, req_id: u64, state: stream_state::State) {
        self.send(
            req_id,
            transaction_server::Server::StreamState(proto::StreamState {
                state: state as i32,
            }),
        );
    }

    pub fn error(&self, req_id: u64, code: &str, message: &str) {
        self.send(
            req_id,
            transaction_server::Server::Error(proto::ServerError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        );
    }

    /// Break the whole stream.
    pub fn fail(&self, error: DriverError) {
        let _ = self.responses.send(Err(error));
    }
}

/// Hands out registered mock transports by address.
///
/// Connecting to an unregistered address fails with a transport error.
#[derive(Default)]
pub struct MockConnector {
    transports: Mutex<HashMap<String, Arc<MockTransport>>>,
    connects: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, transport: Arc<MockTransport>) {
        self.transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(transport.address().to_string(), transport);
    }

    pub fn unregister(&self, address: &str) {
        self.transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address);
    }

    /// Addresses passed to `connect`, in order.
    pub fn connects(&self) -> Vec<String> {
        self.connects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connector for MockConnector {
    fn connect(&self, address: &str, _credential: &Credential) -> DriverResult<Arc<dyn Transport>> {
        self.connects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address.to_string());
        let transport = self
            .transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
            .ok_or_else(|| DriverError::Transport(format!("{address}: connection refused")))?;
        Ok(transport)
    }
}
