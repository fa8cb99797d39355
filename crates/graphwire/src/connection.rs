//! Connection: the entry point of the driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use graphwire_cluster::ClusterRouter;
use graphwire_rpc::{Connector, Credential, DriverError, DriverResult, GrpcConnector};
use tracing::info;

use crate::database::DatabaseManager;
use crate::options::Options;
use crate::session::{Session, SessionCore, SessionType};
use crate::user::UserManager;

/// Tunables that are not sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// How often open sessions are kept alive.
    pub pulse_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pulse_interval: Duration::from_secs(5),
        }
    }
}

/// A connection to a cluster.
pub struct Connection {
    router: Arc<ClusterRouter>,
    config: ConnectionConfig,
    sessions: Mutex<Vec<Weak<SessionCore>>>,
    open: AtomicBool,
}

impl Connection {
    /// Connect over gRPC to the cluster reachable through `addresses`.
    pub async fn open(addresses: &[String], credential: Credential) -> DriverResult<Self> {
        Self::open_with(
            addresses,
            credential,
            Arc::new(GrpcConnector),
            ConnectionConfig::default(),
        )
        .await
    }

    pub async fn open_with(
        addresses: &[String],
        credential: Credential,
        connector: Arc<dyn Connector>,
        config: ConnectionConfig,
    ) -> DriverResult<Self> {
        let router = ClusterRouter::connect(addresses, credential, connector).await?;
        info!(
            username = router.credential().username(),
            members = router.addresses().len(),
            "connection opened"
        );
        Ok(Self {
            router: Arc::new(router),
            config,
            sessions: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
        })
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Cluster member addresses.
    pub fn addresses(&self) -> Vec<String> {
        self.router.addresses()
    }

    pub fn databases(&self) -> DatabaseManager {
        DatabaseManager::new(self.router.clone())
    }

    pub fn users(&self) -> UserManager {
        UserManager::new(self.router.clone())
    }

    pub async fn session(
        &self,
        database: &str,
        session_type: SessionType,
        options: Options,
    ) -> DriverResult<Session> {
        if !self.is_open() {
            return Err(DriverError::Unavailable("connection is closed".into()));
        }
        let session = Session::open(
            self.router.clone(),
            database,
            session_type,
            options,
            self.config.pulse_interval,
        )
        .await?;

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|core| core.strong_count() > 0);
        sessions.push(session.core());
        Ok(session)
    }

    /// Close every session opened through this connection. Idempotent.
    pub async fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let sessions: Vec<_> = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .filter_map(|core| core.upgrade())
            .collect();
        for core in &sessions {
            core.close().await;
        }
        info!(sessions = sessions.len(), "connection closed");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addresses", &self.addresses())
            .field("open", &self.is_open())
            .finish()
    }
}
