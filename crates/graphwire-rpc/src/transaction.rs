//! Request multiplexing over one transaction stream.
//!
//! An [`RpcTransaction`] owns one bidirectional stream. Callers send requests
//! tagged with a fresh correlation id; a single reader task routes every
//! inbound envelope to the caller waiting on that id.
//!
//! ```text
//!  execute() ─┐                                   ┌─► oneshot   (unary)
//!  stream()  ─┼─► [lock: id++, register, send] ─► │
//!  cancel    ─┘        outbound mpsc              └─► mpsc      (streamed)
//!                                                        ▲
//!  server ──────────────► reader task ── by req_id ──────┘
//! ```
//!
//! The lock is held only for id allocation, registration and the
//! non-blocking send. Nobody awaits while holding it.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{DriverError, DriverResult};
use crate::proto::{self, stream_state, transaction_req, transaction_res, transaction_server};
use crate::stub::ServerStub;
use crate::transport::ResponseStream;

enum StreamEvent {
    Part(proto::TransactionResPart),
    /// The server paused; the consumer must ask for more.
    Continue,
    Done,
    Failed(DriverError),
}

enum Pending {
    Single(oneshot::Sender<DriverResult<proto::TransactionRes>>),
    Stream(mpsc::UnboundedSender<StreamEvent>),
}

impl Pending {
    fn is_stream(&self) -> bool {
        matches!(self, Pending::Stream(_))
    }

    fn fail(self, error: DriverError) {
        // The caller may have gone away; nothing to do then.
        match self {
            Pending::Single(reply) => {
                let _ = reply.send(Err(error));
            }
            Pending::Stream(events) => {
                let _ = events.send(StreamEvent::Failed(error));
            }
        }
    }
}

struct State {
    next_id: u64,
    pending: HashMap<u64, Pending>,
    /// `None` once the transaction is closed.
    outbound: Option<mpsc::UnboundedSender<proto::TransactionClient>>,
}

impl State {
    fn envelope(req_id: u64, req: transaction_req::Req) -> proto::TransactionClient {
        proto::TransactionClient {
            req_id,
            req: Some(proto::TransactionReq { req: Some(req) }),
        }
    }
}

struct Shared {
    state: Mutex<State>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate an id, register `pending` under it and send the request.
    fn submit(&self, req: transaction_req::Req, pending: Pending) -> DriverResult<u64> {
        let mut state = self.lock();
        let Some(outbound) = state.outbound.clone() else {
            return Err(DriverError::TransactionClosed);
        };
        let req_id = state.next_id;
        state.next_id += 1;
        state.pending.insert(req_id, pending);
        if outbound.send(State::envelope(req_id, req)).is_err() {
            drop(state);
            self.fail_all(DriverError::TransactionClosed);
            return Err(DriverError::TransactionClosed);
        }
        trace!(req_id, "request sent");
        Ok(req_id)
    }

    /// Send a follow-up for an existing id. Best effort.
    fn control(&self, req_id: u64, req: transaction_req::Req) -> DriverResult<()> {
        let state = self.lock();
        let outbound = state.outbound.as_ref().ok_or(DriverError::TransactionClosed)?;
        outbound
            .send(State::envelope(req_id, req))
            .map_err(|_| DriverError::TransactionClosed)
    }

    /// Forget a streamed request and tell the server to stop producing it.
    /// A request whose terminal marker was already routed is left alone.
    fn abandon(&self, req_id: u64) {
        let mut state = self.lock();
        if state.pending.remove(&req_id).is_none() {
            return;
        }
        if let Some(outbound) = &state.outbound {
            let _ = outbound.send(State::envelope(
                req_id,
                transaction_req::Req::CancelReq(proto::CancelReq {}),
            ));
            debug!(req_id, "streamed request abandoned");
        }
    }

    /// Close the transaction and fail every pending request with `error`.
    fn fail_all(&self, error: DriverError) {
        let pending = {
            let mut state = self.lock();
            state.outbound = None;
            std::mem::take(&mut state.pending)
        };
        if !pending.is_empty() {
            debug!(count = pending.len(), %error, "failing pending requests");
        }
        for entry in pending.into_values() {
            entry.fail(error.clone());
        }
    }

    fn is_open(&self) -> bool {
        self.lock().outbound.is_some()
    }

    /// Route one inbound envelope. An `Err` means the stream is desynchronised.
    fn dispatch(&self, envelope: proto::TransactionServer) -> DriverResult<()> {
        use transaction_server::Server;

        let req_id = envelope.req_id;
        let mut state = self.lock();
        let is_stream = match state.pending.get(&req_id) {
            Some(entry) => entry.is_stream(),
            None => {
                debug!(req_id, "discarding message for unknown request");
                return Ok(());
            }
        };

        let Some(server) = envelope.server else {
            if let Some(entry) = state.pending.remove(&req_id) {
                entry.fail(DriverError::Protocol(format!(
                    "empty message for request {req_id}"
                )));
            }
            return Ok(());
        };

        match (server, is_stream) {
            (Server::Error(error), _) => {
                if let Some(entry) = state.pending.remove(&req_id) {
                    entry.fail(DriverError::from_server(&error.code, &error.message));
                }
            }
            (Server::Res(res), false) => {
                if let Some(Pending::Single(reply)) = state.pending.remove(&req_id) {
                    let _ = reply.send(Ok(res));
                }
            }
            (Server::ResPart(part), true) => {
                if let Some(Pending::Stream(events)) = state.pending.get(&req_id) {
                    let _ = events.send(StreamEvent::Part(part));
                }
            }
            (Server::StreamState(marker), true) => {
                let (event, terminal) = match stream_state::State::try_from(marker.state) {
                    Ok(stream_state::State::Continue) => (StreamEvent::Continue, false),
                    Ok(stream_state::State::Done) => (StreamEvent::Done, true),
                    Err(_) => {
                        return Err(DriverError::Protocol(format!(
                            "unknown stream state {} for request {req_id}",
                            marker.state
                        )));
                    }
                };
                if let Some(Pending::Stream(events)) = state.pending.get(&req_id) {
                    let _ = events.send(event);
                }
                if terminal {
                    state.pending.remove(&req_id);
                }
            }
            (_, true) => {
                return Err(DriverError::Protocol(format!(
                    "unary reply for streamed request {req_id}"
                )));
            }
            (_, false) => {
                return Err(DriverError::Protocol(format!(
                    "streamed reply for unary request {req_id}"
                )));
            }
        }
        Ok(())
    }
}

async fn demultiplex(shared: Arc<Shared>, mut inbound: ResponseStream) {
    while let Some(message) = inbound.next().await {
        let outcome = message.and_then(|envelope| shared.dispatch(envelope));
        if let Err(error) = outcome {
            warn!(%error, "transaction stream failed");
            shared.fail_all(error);
            return;
        }
    }
    debug!("transaction stream ended by server");
    shared.fail_all(DriverError::TransactionClosed);
}

/// The client half of one open transaction stream.
pub struct RpcTransaction {
    shared: Arc<Shared>,
    reader: JoinHandle<()>,
}

impl RpcTransaction {
    /// Open a new transaction stream on `stub`.
    pub async fn open(stub: &ServerStub) -> DriverResult<Self> {
        let (outbound, inbound) = stub.submit_stream().await?;
        debug!(address = %stub.address(), "transaction stream opened");
        Ok(Self::start(outbound, inbound))
    }

    /// Start multiplexing over an already opened stream.
    pub fn start(
        outbound: mpsc::UnboundedSender<proto::TransactionClient>,
        inbound: ResponseStream,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                next_id: 1,
                pending: HashMap::new(),
                outbound: Some(outbound),
            }),
        });
        let reader = tokio::spawn(demultiplex(shared.clone(), inbound));
        Self { shared, reader }
    }

    /// Send `req` and wait for its single reply.
    ///
    /// `projection` extracts the expected response variant; a server error
    /// for this request fails with the server's classification.
    pub async fn execute<T>(
        &self,
        req: transaction_req::Req,
        projection: impl FnOnce(transaction_res::Res) -> DriverResult<T>,
    ) -> DriverResult<T> {
        let (reply, response) = oneshot::channel();
        let req_id = self.shared.submit(req, Pending::Single(reply))?;
        let res = response
            .await
            .map_err(|_| DriverError::TransactionClosed)??;
        let inner = res
            .res
            .ok_or_else(|| DriverError::Protocol(format!("empty reply for request {req_id}")))?;
        projection(inner)
    }

    /// Send `req` and return its reply parts as a lazy stream.
    pub fn stream(&self, req: transaction_req::Req) -> DriverResult<ResponseParts> {
        let (events_tx, events) = mpsc::unbounded_channel();
        let req_id = self.shared.submit(req, Pending::Stream(events_tx))?;
        Ok(ResponseParts {
            req_id,
            shared: self.shared.clone(),
            events,
            finished: false,
        })
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Close the stream. Pending requests fail with `TransactionClosed`.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        self.shared.fail_all(DriverError::TransactionClosed);
        self.reader.abort();
    }
}

impl Drop for RpcTransaction {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reply parts of one streamed request, pulled on demand.
///
/// More parts are requested from the server only when the consumer reads
/// past the buffered batch. Dropping the stream before it ends cancels the
/// request on the server.
pub struct ResponseParts {
    req_id: u64,
    shared: Arc<Shared>,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    finished: bool,
}

impl ResponseParts {
    pub fn req_id(&self) -> u64 {
        self.req_id
    }
}

impl Stream for ResponseParts {
    type Item = DriverResult<proto::TransactionResPart>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.finished {
                return Poll::Ready(None);
            }
            let event = match this.events.poll_recv(cx) {
                Poll::Ready(event) => event,
                Poll::Pending => return Poll::Pending,
            };
            match event {
                Some(StreamEvent::Part(part)) => return Poll::Ready(Some(Ok(part))),
                Some(StreamEvent::Continue) => {
                    let more = transaction_req::Req::StreamReq(proto::StreamReq {});
                    if let Err(error) = this.shared.control(this.req_id, more) {
                        this.finished = true;
                        return Poll::Ready(Some(Err(error)));
                    }
                }
                Some(StreamEvent::Done) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Some(StreamEvent::Failed(error)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(error)));
                }
                None => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(DriverError::TransactionClosed)));
                }
            }
        }
    }
}

impl Drop for ResponseParts {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.abandon(self.req_id);
        }
    }
}
