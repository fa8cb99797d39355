//! Query execution within a transaction.

use futures::stream::BoxStream;
use graphwire_rpc::proto::{self, transaction_req, transaction_res, transaction_res_part};
use graphwire_rpc::DriverResult;

use crate::concept::{ConceptMap, Numeric};
use crate::operation::{Streamed, Unary, unexpected};
use crate::options::Options;
use crate::transaction::Transaction;

/// Runs query text against a transaction.
///
/// Queries use the transaction's options unless [`QueryManager::with_options`]
/// overrides them.
pub struct QueryManager<'a> {
    tx: &'a Transaction,
    options: Option<Options>,
}

fn decode_done(res: transaction_res::Res) -> DriverResult<()> {
    match res {
        transaction_res::Res::QueryManagerRes(_) => Ok(()),
        _ => Err(unexpected("query_manager_res")),
    }
}

fn decode_aggregate(res: transaction_res::Res) -> DriverResult<Numeric> {
    match res {
        transaction_res::Res::QueryManagerRes(res) => res
            .aggregate
            .as_ref()
            .map(Numeric::from_proto)
            .ok_or_else(|| unexpected("aggregate"))?,
        _ => Err(unexpected("query_manager_res")),
    }
}

fn decode_answers(part: transaction_res_part::Res) -> DriverResult<Vec<ConceptMap>> {
    match part {
        transaction_res_part::Res::QueryManagerResPart(part) => {
            part.answers.iter().map(ConceptMap::from_proto).collect()
        }
        _ => Err(unexpected("query_manager_res_part")),
    }
}

impl<'a> QueryManager<'a> {
    pub(crate) fn new(tx: &'a Transaction) -> Self {
        Self { tx, options: None }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    fn request(&self, query: &str, kind: proto::QueryKind) -> transaction_req::Req {
        let options = self.options.as_ref().unwrap_or_else(|| self.tx.options());
        transaction_req::Req::QueryManagerReq(proto::QueryManagerReq {
            options: Some(options.to_proto()),
            query: query.to_string(),
            kind: kind as i32,
        })
    }

    async fn unary(&self, query: &str, kind: proto::QueryKind) -> DriverResult<()> {
        self.tx
            .run(Unary::new(self.request(query, kind), decode_done))
            .await
    }

    fn answers(
        &self,
        query: &str,
        kind: proto::QueryKind,
    ) -> DriverResult<BoxStream<'static, DriverResult<ConceptMap>>> {
        self.tx
            .stream(Streamed::new(self.request(query, kind), decode_answers))
    }

    pub async fn define(&self, query: &str) -> DriverResult<()> {
        self.unary(query, proto::QueryKind::Define).await
    }

    pub async fn undefine(&self, query: &str) -> DriverResult<()> {
        self.unary(query, proto::QueryKind::Undefine).await
    }

    pub async fn delete(&self, query: &str) -> DriverResult<()> {
        self.unary(query, proto::QueryKind::Delete).await
    }

    /// Answers of a match query, fetched as the stream is read.
    pub fn match_(&self, query: &str) -> DriverResult<BoxStream<'static, DriverResult<ConceptMap>>> {
        self.answers(query, proto::QueryKind::Match)
    }

    pub fn insert(&self, query: &str) -> DriverResult<BoxStream<'static, DriverResult<ConceptMap>>> {
        self.answers(query, proto::QueryKind::Insert)
    }

    pub fn update(&self, query: &str) -> DriverResult<BoxStream<'static, DriverResult<ConceptMap>>> {
        self.answers(query, proto::QueryKind::Update)
    }

    pub async fn match_aggregate(&self, query: &str) -> DriverResult<Numeric> {
        let req = self.request(query, proto::QueryKind::MatchAggregate);
        self.tx.run(Unary::new(req, decode_aggregate)).await
    }
}
