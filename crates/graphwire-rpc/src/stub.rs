//! Server stub: one transport, one credential, one token.
//!
//! Every call goes through [`ServerStub::with_token_renewal`]. When the server
//! rejects the held token, the stub discards it, fetches a fresh one and
//! retries the call once. Renewal is single-flight: callers that fail on the
//! same token generation wait for one renewal and share its result.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::credential::{CallMetadata, Credential};
use crate::error::{DriverError, DriverResult, ErrorKind};
use crate::proto;
use crate::transport::{Connector, ResponseStream, Transport, UnaryRequest, UnaryResponse};

/// Protocol version announced by `connection_open`.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Default)]
struct TokenState {
    token: Option<String>,
    /// Bumped every time a renewal stores a new token.
    generation: u64,
}

/// Typed RPC access to one server.
pub struct ServerStub {
    address: String,
    credential: Credential,
    transport: Arc<dyn Transport>,
    token: RwLock<TokenState>,
    renewal: Mutex<()>,
}

macro_rules! unary_rpc {
    ($(#[$doc:meta])* $name:ident($req:ident) -> $res:ident) => {
        $(#[$doc])*
        pub async fn $name(&self, request: proto::$req) -> DriverResult<proto::$res> {
            self.submit_unary(request).await
        }
    };
}

impl ServerStub {
    pub fn new(credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self {
            address: transport.address().to_string(),
            credential,
            transport,
            token: RwLock::new(TokenState::default()),
            renewal: Mutex::new(()),
        }
    }

    /// Build the transport for `address` and wrap it in a stub.
    pub fn connect(
        address: &str,
        credential: Credential,
        connector: &dyn Connector,
    ) -> DriverResult<Self> {
        let transport = connector.connect(address, &credential)?;
        Ok(Self::new(credential, transport))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Probe the server and fetch the initial token.
    ///
    /// A server without a token service (or without the handshake RPC)
    /// answers `Unsupported`; the stub then keeps authenticating with the
    /// password. Any other failure propagates.
    pub async fn open(&self) -> DriverResult<()> {
        let (metadata, _) = self.metadata().await;
        let probe = self
            .transport
            .unary(
                &metadata,
                proto::ConnectionOpenReq {
                    protocol_version: PROTOCOL_VERSION,
                }
                .into(),
            )
            .await;
        match probe {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                debug!(address = %self.address, "server has no connection handshake");
            }
            Err(e) => return Err(e),
        }

        let _renewal = self.renewal.lock().await;
        match self.fetch_token().await {
            Ok(token) => {
                let generation = self.store_token(token).await;
                debug!(address = %self.address, generation, "acquired initial token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                debug!(address = %self.address, "server does not issue tokens");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a token is currently held.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.token.is_some()
    }

    async fn metadata(&self) -> (CallMetadata, u64) {
        let state = self.token.read().await;
        (
            CallMetadata::for_credential(&self.credential, state.token.as_deref()),
            state.generation,
        )
    }

    /// Run `call`, renewing the token and retrying once if it was rejected.
    ///
    /// The retried attempt's outcome is returned as is, including a second
    /// token rejection.
    pub async fn with_token_renewal<T, F, Fut>(&self, call: F) -> DriverResult<T>
    where
        F: Fn(CallMetadata) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let (metadata, generation) = self.metadata().await;
        match call(metadata).await {
            Err(e) if e.is_token_invalid() => {
                warn!(address = %self.address, "token rejected, renewing");
                self.renew_token(generation).await?;
                let (metadata, _) = self.metadata().await;
                call(metadata).await
            }
            outcome => outcome,
        }
    }

    async fn renew_token(&self, stale_generation: u64) -> DriverResult<()> {
        let _renewal = self.renewal.lock().await;
        if self.token.read().await.generation != stale_generation {
            debug!(address = %self.address, "token already renewed by a concurrent call");
            return Ok(());
        }

        self.token.write().await.token = None;
        let token = self.fetch_token().await?;
        let generation = self.store_token(token).await;
        info!(address = %self.address, generation, "token renewed");
        Ok(())
    }

    /// Install a fresh token. Callers hold `renewal`.
    async fn store_token(&self, token: String) -> u64 {
        let mut state = self.token.write().await;
        state.token = Some(token);
        state.generation += 1;
        state.generation
    }

    /// Exchange the password for a token. Never uses the held token.
    async fn fetch_token(&self) -> DriverResult<String> {
        let metadata = CallMetadata::for_credential(&self.credential, None);
        let response = self
            .transport
            .unary(
                &metadata,
                proto::UserTokenReq {
                    username: self.credential.username().to_string(),
                }
                .into(),
            )
            .await?;
        let response = proto::UserTokenRes::try_from(response)?;
        Ok(response.token)
    }

    /// Send one unary request through the renewal guard.
    pub async fn submit_unary<Req, Res>(&self, request: Req) -> DriverResult<Res>
    where
        Req: Into<UnaryRequest>,
        Res: TryFrom<UnaryResponse, Error = DriverError>,
    {
        let request = request.into();
        let transport = &self.transport;
        let response = self
            .with_token_renewal(|metadata| {
                let request = request.clone();
                async move { transport.unary(&metadata, request).await }
            })
            .await?;
        Res::try_from(response)
    }

    /// Open a transaction stream through the renewal guard.
    ///
    /// Each attempt gets a fresh outbound channel, so nothing is queued on a
    /// stream the server refused.
    pub async fn submit_stream(
        &self,
    ) -> DriverResult<(UnboundedSender<proto::TransactionClient>, ResponseStream)> {
        let transport = &self.transport;
        self.with_token_renewal(|metadata| async move {
            let (requests, outbound) = mpsc::unbounded_channel();
            let responses = transport.transaction(&metadata, outbound).await?;
            Ok((requests, responses))
        })
        .await
    }

    unary_rpc!(servers_all(ServersAllReq) -> ServersAllRes);
    unary_rpc!(users_all(UsersAllReq) -> UsersAllRes);
    unary_rpc!(users_contains(UsersContainsReq) -> UsersContainsRes);
    unary_rpc!(users_create(UsersCreateReq) -> UsersCreateRes);
    unary_rpc!(users_delete(UsersDeleteReq) -> UsersDeleteRes);
    unary_rpc!(users_password_set(UsersPasswordSetReq) -> UsersPasswordSetRes);
    unary_rpc!(users_get(UsersGetReq) -> UsersGetRes);
    unary_rpc!(user_password_update(UserPasswordUpdateReq) -> UserPasswordUpdateRes);
    unary_rpc!(databases_all(DatabasesAllReq) -> DatabasesAllRes);
    unary_rpc!(databases_contains(DatabasesContainsReq) -> DatabasesContainsRes);
    unary_rpc!(databases_create(DatabasesCreateReq) -> DatabasesCreateRes);
    unary_rpc!(
        /// Replica discovery for one database.
        databases_get(DatabasesGetReq) -> DatabasesGetRes
    );
    unary_rpc!(database_schema(DatabaseSchemaReq) -> DatabaseSchemaRes);
    unary_rpc!(database_delete(DatabaseDeleteReq) -> DatabaseDeleteRes);
    unary_rpc!(session_open(SessionOpenReq) -> SessionOpenRes);
    unary_rpc!(session_close(SessionCloseReq) -> SessionCloseRes);
    unary_rpc!(session_pulse(SessionPulseReq) -> SessionPulseRes);
}

impl std::fmt::Debug for ServerStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerStub")
            .field("address", &self.address)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}
