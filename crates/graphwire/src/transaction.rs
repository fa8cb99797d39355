//! Transactions: the user-facing lifecycle over one multiplexed stream.
//!
//! A transaction is OPEN until it commits, rolls back, is closed, its stream
//! breaks, or its session closes. Every operation on a closed transaction
//! fails without touching the network.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use graphwire_rpc::proto::{self, transaction_req, transaction_res};
use graphwire_rpc::{DriverError, DriverResult, RpcTransaction};
use tracing::debug;

use crate::concept::ConceptManager;
use crate::operation::{Operation, StreamOperation, unexpected};
use crate::options::Options;
use crate::query::QueryManager;
use crate::session::SessionCore;

/// Whether a transaction may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Read,
    Write,
}

impl TransactionType {
    pub fn is_read(self) -> bool {
        self == TransactionType::Read
    }

    pub fn is_write(self) -> bool {
        self == TransactionType::Write
    }

    pub fn to_proto(self) -> proto::TransactionType {
        match self {
            TransactionType::Read => proto::TransactionType::Read,
            TransactionType::Write => proto::TransactionType::Write,
        }
    }
}

/// An open transaction.
pub struct Transaction {
    session: Arc<SessionCore>,
    rpc: RpcTransaction,
    transaction_type: TransactionType,
    options: Options,
}

impl Transaction {
    pub(crate) async fn open(
        session: Arc<SessionCore>,
        transaction_type: TransactionType,
        options: Options,
    ) -> DriverResult<Self> {
        let route = session.route();
        let rpc = RpcTransaction::open(&route.stub).await?;

        let latency_millis = route.network_latency.as_millis().min(i32::MAX as u128) as i32;
        let open = transaction_req::Req::OpenReq(proto::OpenReq {
            session_id: route.session_id,
            transaction_type: transaction_type.to_proto() as i32,
            options: Some(options.to_proto()),
            network_latency_millis: latency_millis,
        });
        rpc.execute(open, |res| match res {
            transaction_res::Res::OpenRes(_) => Ok(()),
            _ => Err(unexpected("open_res")),
        })
        .await?;

        debug!(address = %route.stub.address(), ?transaction_type, "transaction opened");
        Ok(Self {
            session,
            rpc,
            transaction_type,
            options,
        })
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open() && self.rpc.is_open()
    }

    fn check(&self) -> DriverResult<()> {
        if !self.session.is_open() {
            self.rpc.close();
            return Err(DriverError::SessionClosed);
        }
        if !self.rpc.is_open() {
            return Err(DriverError::TransactionClosed);
        }
        Ok(())
    }

    /// Run an operation answered by a single reply.
    pub async fn run<O: Operation>(&self, op: O) -> DriverResult<O::Output> {
        self.check()?;
        self.rpc
            .execute(op.encode(), move |res| op.decode(res))
            .await
    }

    /// Run an operation answered by a stream, decoding parts into items.
    ///
    /// Parts are fetched as the returned stream is read. Dropping it early
    /// cancels the request on the server.
    pub fn stream<O: StreamOperation>(
        &self,
        op: O,
    ) -> DriverResult<BoxStream<'static, DriverResult<O::Item>>> {
        self.check()?;
        let parts = self.rpc.stream(op.encode())?;
        let items = parts.flat_map(move |part| {
            let decoded = part.and_then(|part| {
                let res = part.res.ok_or_else(|| unexpected("response part"))?;
                op.decode_part(res)
            });
            match decoded {
                Ok(items) => stream::iter(items.into_iter().map(Ok)).left_stream(),
                Err(e) => stream::once(async move { Err(e) }).right_stream(),
            }
        });
        // The first failure ends the stream.
        let items = items.scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });
        Ok(items.boxed())
    }

    /// Commit and close. The transaction is closed whatever the outcome.
    pub async fn commit(&self) -> DriverResult<()> {
        self.check()?;
        let outcome = self
            .rpc
            .execute(
                transaction_req::Req::CommitReq(proto::CommitReq {}),
                |res| match res {
                    transaction_res::Res::CommitRes(_) => Ok(()),
                    _ => Err(unexpected("commit_res")),
                },
            )
            .await;
        self.rpc.close();
        outcome
    }

    /// Roll back and close. Delivery of the rollback is best effort.
    pub async fn rollback(&self) -> DriverResult<()> {
        if !self.rpc.is_open() {
            return Ok(());
        }
        let outcome = self
            .rpc
            .execute(
                transaction_req::Req::RollbackReq(proto::RollbackReq {}),
                |res| match res {
                    transaction_res::Res::RollbackRes(_) => Ok(()),
                    _ => Err(unexpected("rollback_res")),
                },
            )
            .await;
        if let Err(e) = outcome {
            debug!(error = %e, "rollback not acknowledged");
        }
        self.rpc.close();
        Ok(())
    }

    /// Close without committing. Closing twice is a no-op.
    pub fn close(&self) {
        self.rpc.close();
    }

    pub fn concepts(&self) -> ConceptManager<'_> {
        ConceptManager::new(self)
    }

    pub fn query(&self) -> QueryManager<'_> {
        QueryManager::new(self)
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("transaction_type", &self.transaction_type)
            .field("open", &self.is_open())
            .finish()
    }
}
