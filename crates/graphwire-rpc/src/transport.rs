//! The seam between server stubs and the network.
//!
//! A [`Transport`] carries unary calls and opens transaction streams for one
//! server address. [`crate::grpc::GrpcTransport`] is the production
//! implementation; tests plug in [`crate::testing::MockTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::credential::{CallMetadata, Credential};
use crate::error::{DriverError, DriverResult};
use crate::proto;

/// Inbound half of a transaction stream.
pub type ResponseStream = BoxStream<'static, DriverResult<proto::TransactionServer>>;

macro_rules! unary_rpcs {
    ($($variant:ident($req:ident => $res:ident) = $name:literal;)*) => {
        /// Every unary request the driver can send.
        #[derive(Debug, Clone, PartialEq)]
        pub enum UnaryRequest {
            $($variant(proto::$req),)*
        }

        /// The reply to a [`UnaryRequest`], same variant name.
        #[derive(Debug, Clone, PartialEq)]
        pub enum UnaryResponse {
            $($variant(proto::$res),)*
        }

        impl UnaryRequest {
            /// RPC method name on the `GraphWire` service.
            pub fn name(&self) -> &'static str {
                match self {
                    $(UnaryRequest::$variant(_) => $name,)*
                }
            }
        }

        impl UnaryResponse {
            pub fn name(&self) -> &'static str {
                match self {
                    $(UnaryResponse::$variant(_) => $name,)*
                }
            }
        }

        $(
            impl From<proto::$req> for UnaryRequest {
                fn from(request: proto::$req) -> Self {
                    UnaryRequest::$variant(request)
                }
            }

            impl From<proto::$res> for UnaryResponse {
                fn from(response: proto::$res) -> Self {
                    UnaryResponse::$variant(response)
                }
            }

            impl TryFrom<UnaryResponse> for proto::$res {
                type Error = DriverError;

                fn try_from(response: UnaryResponse) -> DriverResult<Self> {
                    match response {
                        UnaryResponse::$variant(inner) => Ok(inner),
                        #[allow(unreachable_patterns)]
                        other => Err(DriverError::Protocol(format!(
                            "expected {} reply, got {}",
                            $name,
                            other.name()
                        ))),
                    }
                }
            }
        )*
    };
}

unary_rpcs! {
    ConnectionOpen(ConnectionOpenReq => ConnectionOpenRes) = "connection_open";
    ServersAll(ServersAllReq => ServersAllRes) = "servers_all";
    UserToken(UserTokenReq => UserTokenRes) = "user_token";
    UsersAll(UsersAllReq => UsersAllRes) = "users_all";
    UsersContains(UsersContainsReq => UsersContainsRes) = "users_contains";
    UsersCreate(UsersCreateReq => UsersCreateRes) = "users_create";
    UsersDelete(UsersDeleteReq => UsersDeleteRes) = "users_delete";
    UsersPasswordSet(UsersPasswordSetReq => UsersPasswordSetRes) = "users_password_set";
    UsersGet(UsersGetReq => UsersGetRes) = "users_get";
    UserPasswordUpdate(UserPasswordUpdateReq => UserPasswordUpdateRes) = "user_password_update";
    DatabasesAll(DatabasesAllReq => DatabasesAllRes) = "databases_all";
    DatabasesContains(DatabasesContainsReq => DatabasesContainsRes) = "databases_contains";
    DatabasesCreate(DatabasesCreateReq => DatabasesCreateRes) = "databases_create";
    DatabasesGet(DatabasesGetReq => DatabasesGetRes) = "databases_get";
    DatabaseSchema(DatabaseSchemaReq => DatabaseSchemaRes) = "database_schema";
    DatabaseDelete(DatabaseDeleteReq => DatabaseDeleteRes) = "database_delete";
    SessionOpen(SessionOpenReq => SessionOpenRes) = "session_open";
    SessionClose(SessionCloseReq => SessionCloseRes) = "session_close";
    SessionPulse(SessionPulseReq => SessionPulseRes) = "session_pulse";
}

/// A network path to one server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The server address this transport talks to.
    fn address(&self) -> &str;

    /// Perform one unary call.
    async fn unary(
        &self,
        metadata: &CallMetadata,
        request: UnaryRequest,
    ) -> DriverResult<UnaryResponse>;

    /// Open a bidirectional transaction stream.
    ///
    /// Messages pushed into the sender paired with `requests` go out in order;
    /// the returned stream yields the server's envelopes in arrival order.
    async fn transaction(
        &self,
        metadata: &CallMetadata,
        requests: UnboundedReceiver<proto::TransactionClient>,
    ) -> DriverResult<ResponseStream>;
}

/// Builds transports for server addresses.
pub trait Connector: Send + Sync {
    fn connect(&self, address: &str, credential: &Credential) -> DriverResult<Arc<dyn Transport>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_know_their_method_name() {
        let request: UnaryRequest = proto::DatabasesGetReq {
            name: "social".into(),
        }
        .into();
        assert_eq!(request.name(), "databases_get");
    }

    #[test]
    fn mismatched_reply_is_a_protocol_error() {
        let reply = UnaryResponse::from(proto::ServersAllRes::default());
        let err = proto::UserTokenRes::try_from(reply).unwrap_err();
        assert!(matches!(err, DriverError::Protocol(ref m) if m.contains("servers_all")));

        let reply = UnaryResponse::from(proto::UserTokenRes {
            token: "t".into(),
        });
        assert_eq!(proto::UserTokenRes::try_from(reply).unwrap().token, "t");
    }
}
