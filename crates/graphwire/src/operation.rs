//! The seam between concept code and the transaction stream.
//!
//! An operation knows how to encode itself as a transaction request and how
//! to decode the reply. [`crate::Transaction::run`] and
//! [`crate::Transaction::stream`] are the only ways operations reach the
//! wire.

use graphwire_rpc::proto::{transaction_req, transaction_res, transaction_res_part};
use graphwire_rpc::{DriverError, DriverResult};

/// A request answered by exactly one reply.
pub trait Operation: Send {
    type Output;

    fn encode(&self) -> transaction_req::Req;

    fn decode(&self, res: transaction_res::Res) -> DriverResult<Self::Output>;
}

/// A request answered by a stream of parts.
pub trait StreamOperation: Send + 'static {
    type Item: Send + 'static;

    fn encode(&self) -> transaction_req::Req;

    /// Decode one part into zero or more items.
    fn decode_part(&self, part: transaction_res_part::Res) -> DriverResult<Vec<Self::Item>>;
}

/// An [`Operation`] made of a request and a decode function.
pub struct Unary<T> {
    req: transaction_req::Req,
    decode: fn(transaction_res::Res) -> DriverResult<T>,
}

impl<T> Unary<T> {
    pub fn new(req: transaction_req::Req, decode: fn(transaction_res::Res) -> DriverResult<T>) -> Self {
        Self { req, decode }
    }
}

impl<T> Operation for Unary<T> {
    type Output = T;

    fn encode(&self) -> transaction_req::Req {
        self.req.clone()
    }

    fn decode(&self, res: transaction_res::Res) -> DriverResult<T> {
        (self.decode)(res)
    }
}

/// A [`StreamOperation`] made of a request and a part decode function.
pub struct Streamed<T> {
    req: transaction_req::Req,
    decode: fn(transaction_res_part::Res) -> DriverResult<Vec<T>>,
}

impl<T> Streamed<T> {
    pub fn new(
        req: transaction_req::Req,
        decode: fn(transaction_res_part::Res) -> DriverResult<Vec<T>>,
    ) -> Self {
        Self { req, decode }
    }
}

impl<T: Send + 'static> StreamOperation for Streamed<T> {
    type Item = T;

    fn encode(&self) -> transaction_req::Req {
        self.req.clone()
    }

    fn decode_part(&self, part: transaction_res_part::Res) -> DriverResult<Vec<T>> {
        (self.decode)(part)
    }
}

pub(crate) fn unexpected(expected: &str) -> DriverError {
    DriverError::Protocol(format!("expected {expected} in reply"))
}
