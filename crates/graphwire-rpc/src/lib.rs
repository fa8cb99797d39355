//! graphwire-rpc: the RPC layer of the graphwire driver.
//!
//! Builds authenticated channels to cluster servers, wraps each server in a
//! [`ServerStub`] that renews its token transparently, and multiplexes many
//! logical requests over one transaction stream.
//!
//! # Architecture
//!
//! ```text
//! Credential ──► Connector ──► Transport (gRPC channel, one per address)
//!                                  │
//!                              ServerStub
//!                                  ├── token renewal guard (single-flight)
//!                                  ├── unary RPCs (users, databases, sessions)
//!                                  └── submit_stream()
//!                                         │
//!                                   RpcTransaction
//!                                         ├── execute()  → one reply
//!                                         ├── stream()   → ResponseParts
//!                                         └── reader task (demultiplexer)
//! ```

pub mod credential;
pub mod error;
pub mod grpc;
pub mod proto;
pub mod stub;
pub mod transaction;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use credential::{CallMetadata, Credential, Secret};
pub use error::{DriverError, DriverResult, ErrorKind};
pub use grpc::{GrpcConnector, GrpcTransport, build_channel};
pub use stub::ServerStub;
pub use transaction::{ResponseParts, RpcTransaction};
pub use transport::{Connector, ResponseStream, Transport, UnaryRequest, UnaryResponse};
