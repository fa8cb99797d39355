//! tonic-backed transport.
//!
//! The `GraphWire` service client is written directly against
//! [`tonic::client::Grpc`] with the prost codec, so no generated code is
//! involved.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::MetadataValue;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use crate::credential::{CallMetadata, Credential};
use crate::error::{DriverError, DriverResult};
use crate::proto;
use crate::transport::{Connector, ResponseStream, Transport, UnaryRequest, UnaryResponse};

const SERVICE: &str = "/graphwire.protocol.GraphWire";

/// Build a lazily-connecting channel to `address`.
///
/// With TLS enabled the server is verified against the credential's root CA
/// when one is set, otherwise against the platform trust store. A root CA
/// that cannot be read fails immediately.
pub fn build_channel(address: &str, credential: &Credential) -> DriverResult<Channel> {
    let uri = endpoint_uri(address, credential.tls_enabled());
    let mut endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|e| DriverError::Configuration(format!("invalid address {uri}: {e}")))?;

    if credential.tls_enabled() {
        let tls = match credential.tls_root_ca() {
            Some(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    DriverError::Configuration(format!(
                        "cannot read TLS root CA {}: {e}",
                        path.display()
                    ))
                })?;
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
            None => ClientTlsConfig::new().with_native_roots(),
        };
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| DriverError::Configuration(format!("TLS setup for {uri}: {e}")))?;
    }

    debug!(%uri, tls = credential.tls_enabled(), "built channel");
    Ok(endpoint.connect_lazy())
}

fn endpoint_uri(address: &str, tls: bool) -> String {
    if address.contains("://") {
        address.to_string()
    } else if tls {
        format!("https://{address}")
    } else {
        format!("http://{address}")
    }
}

/// One server reached over gRPC.
pub struct GrpcTransport {
    address: String,
    channel: Channel,
}

impl GrpcTransport {
    pub fn new(address: impl Into<String>, channel: Channel) -> Self {
        Self {
            address: address.into(),
            channel,
        }
    }

    async fn call<Req, Res>(
        &self,
        method: &str,
        metadata: &CallMetadata,
        message: Req,
    ) -> DriverResult<Res>
    where
        Req: prost::Message + Send + Sync + 'static,
        Res: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.ready().await?;
        let path = method_path(method)?;
        let request = with_metadata(tonic::Request::new(message), metadata)?;
        let response = grpc
            .unary(request, path, ProstCodec::<Req, Res>::default())
            .await?;
        Ok(response.into_inner())
    }

    async fn ready(&self) -> DriverResult<tonic::client::Grpc<Channel>> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| DriverError::Transport(format!("{}: {e}", self.address)))?;
        Ok(grpc)
    }
}

fn method_path(method: &str) -> DriverResult<PathAndQuery> {
    PathAndQuery::try_from(format!("{SERVICE}/{method}"))
        .map_err(|e| DriverError::Configuration(format!("invalid method {method}: {e}")))
}

fn with_metadata<T>(
    mut request: tonic::Request<T>,
    metadata: &CallMetadata,
) -> DriverResult<tonic::Request<T>> {
    for (key, value) in metadata.pairs() {
        let value = MetadataValue::try_from(value)
            .map_err(|_| DriverError::Configuration(format!("{key} is not valid ASCII metadata")))?;
        request.metadata_mut().insert(key, value);
    }
    Ok(request)
}

#[async_trait]
impl Transport for GrpcTransport {
    fn address(&self) -> &str {
        &self.address
    }

    async fn unary(
        &self,
        metadata: &CallMetadata,
        request: UnaryRequest,
    ) -> DriverResult<UnaryResponse> {
        let method = request.name();
        macro_rules! dispatch {
            ($($variant:ident),* $(,)?) => {
                match request {
                    $(UnaryRequest::$variant(message) => {
                        UnaryResponse::$variant(self.call(method, metadata, message).await?)
                    })*
                }
            };
        }
        let response = dispatch!(
            ConnectionOpen,
            ServersAll,
            UserToken,
            UsersAll,
            UsersContains,
            UsersCreate,
            UsersDelete,
            UsersPasswordSet,
            UsersGet,
            UserPasswordUpdate,
            DatabasesAll,
            DatabasesContains,
            DatabasesCreate,
            DatabasesGet,
            DatabaseSchema,
            DatabaseDelete,
            SessionOpen,
            SessionClose,
            SessionPulse,
        );
        Ok(response)
    }

    async fn transaction(
        &self,
        metadata: &CallMetadata,
        requests: UnboundedReceiver<proto::TransactionClient>,
    ) -> DriverResult<ResponseStream> {
        let mut grpc = self.ready().await?;
        let path = method_path("transaction")?;
        let outbound = futures::stream::unfold(requests, |mut requests| async move {
            requests.recv().await.map(|message| (message, requests))
        });
        let request = with_metadata(tonic::Request::new(outbound), metadata)?;
        let response = grpc
            .streaming(
                request,
                path,
                ProstCodec::<proto::TransactionClient, proto::TransactionServer>::default(),
            )
            .await?;
        Ok(response
            .into_inner()
            .map(|message| message.map_err(DriverError::from))
            .boxed())
    }
}

/// Connects to servers over gRPC.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrpcConnector;

impl Connector for GrpcConnector {
    fn connect(&self, address: &str, credential: &Credential) -> DriverResult<Arc<dyn Transport>> {
        let channel = build_channel(address, credential)?;
        Ok(Arc::new(GrpcTransport::new(address, channel)))
    }
}
