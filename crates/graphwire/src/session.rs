//! Sessions: a server-side context for transactions on one database.
//!
//! An open session is kept alive by a pulse task. A server that forgets the
//! session closes it locally too; the next action observes `SessionClosed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use graphwire_cluster::ClusterRouter;
use graphwire_rpc::proto;
use graphwire_rpc::{DriverError, DriverResult, ServerStub};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::options::Options;
use crate::transaction::{Transaction, TransactionType};

/// What a session may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    Data,
    Schema,
}

impl SessionType {
    pub fn is_data(self) -> bool {
        self == SessionType::Data
    }

    pub fn is_schema(self) -> bool {
        self == SessionType::Schema
    }

    pub fn to_proto(self) -> proto::SessionType {
        match self {
            SessionType::Data => proto::SessionType::Data,
            SessionType::Schema => proto::SessionType::Schema,
        }
    }
}

/// Where the session currently lives.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub(crate) session_id: Vec<u8>,
    pub(crate) stub: Arc<ServerStub>,
    /// Round trip of the open call minus the server's own processing time.
    pub(crate) network_latency: Duration,
}

pub(crate) struct SessionCore {
    database: String,
    session_type: SessionType,
    options: Options,
    router: Arc<ClusterRouter>,
    route: Mutex<Route>,
    open: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl SessionCore {
    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> DriverResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DriverError::SessionClosed)
        }
    }

    pub(crate) fn route(&self) -> Route {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn mark_closed(&self) -> bool {
        let was_open = self.open.swap(false, Ordering::SeqCst);
        if was_open {
            let _ = self.shutdown.send(true);
        }
        was_open
    }

    /// Close locally, then tell the server. Idempotent.
    pub(crate) async fn close(&self) {
        if !self.mark_closed() {
            return;
        }
        let route = self.route();
        let request = proto::SessionCloseReq {
            session_id: route.session_id,
        };
        if let Err(e) = route.stub.session_close(request).await {
            debug!(database = %self.database, error = %e, "session close not delivered");
        }
        info!(database = %self.database, "session closed");
    }

    /// Reopen the session on the current primary after a routing failure.
    async fn reroute(&self) -> DriverResult<()> {
        self.router.discover(&self.database).await?;
        let route = open_route(
            &self.router,
            &self.database,
            self.session_type,
            &self.options,
        )
        .await?;
        info!(
            database = %self.database,
            address = %route.stub.address(),
            "session moved to new primary"
        );
        // The old server expires the abandoned session on its idle timeout.
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route;
        Ok(())
    }

    /// One keep-alive round trip. Returns false once the session is gone.
    async fn pulse_once(&self) -> bool {
        let route = self.route();
        let request = proto::SessionPulseReq {
            session_id: route.session_id,
        };
        match route.stub.session_pulse(request).await {
            Ok(res) if res.alive => {
                debug!(database = %self.database, "session pulse");
                true
            }
            Ok(_) => {
                warn!(database = %self.database, "server no longer knows the session");
                false
            }
            Err(e) => {
                warn!(database = %self.database, error = %e, "session pulse failed");
                true
            }
        }
    }
}

async fn open_route(
    router: &ClusterRouter,
    database: &str,
    session_type: SessionType,
    options: &Options,
) -> DriverResult<Route> {
    let request = proto::SessionOpenReq {
        database: database.to_string(),
        session_type: session_type.to_proto() as i32,
        options: Some(options.to_proto()),
    };
    let open = |stub: Arc<ServerStub>| {
        let request = request.clone();
        async move {
            let started = Instant::now();
            let res = stub.session_open(request).await?;
            let server_time = Duration::from_millis(res.server_duration_millis.max(0) as u64);
            Ok(Route {
                session_id: res.session_id,
                network_latency: started.elapsed().saturating_sub(server_time),
                stub,
            })
        }
    };
    if session_type.is_data() && options.read_any_replica == Some(true) {
        router.run_any(database, open).await
    } else {
        router.run_primary(database, open).await
    }
}

async fn pulse(core: Weak<SessionCore>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let Some(core) = core.upgrade() else { break };
                if !core.pulse_once().await {
                    core.mark_closed();
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// An open session on one database.
///
/// Dropping an open session closes it in the background.
pub struct Session {
    core: Arc<SessionCore>,
}

impl Session {
    pub(crate) async fn open(
        router: Arc<ClusterRouter>,
        database: &str,
        session_type: SessionType,
        options: Options,
        pulse_interval: Duration,
    ) -> DriverResult<Self> {
        let route = open_route(&router, database, session_type, &options).await?;
        info!(
            database,
            ?session_type,
            address = %route.stub.address(),
            latency = ?route.network_latency,
            "session opened"
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let core = Arc::new(SessionCore {
            database: database.to_string(),
            session_type,
            options,
            router,
            route: Mutex::new(route),
            open: AtomicBool::new(true),
            shutdown,
        });
        tokio::spawn(pulse(Arc::downgrade(&core), pulse_interval, shutdown_rx));
        Ok(Self { core })
    }

    pub(crate) fn core(&self) -> Weak<SessionCore> {
        Arc::downgrade(&self.core)
    }

    pub fn database(&self) -> &str {
        &self.core.database
    }

    pub fn session_type(&self) -> SessionType {
        self.core.session_type
    }

    pub fn options(&self) -> &Options {
        &self.core.options
    }

    pub fn is_open(&self) -> bool {
        self.core.is_open()
    }

    /// Address of the server holding the session.
    pub fn address(&self) -> String {
        self.core.route().stub.address().to_string()
    }

    /// Open a transaction.
    ///
    /// If the session's server turns out not to be the primary (or is gone),
    /// the session reopens on the corrected primary and the open is retried
    /// once.
    pub async fn transaction(
        &self,
        transaction_type: TransactionType,
        options: Options,
    ) -> DriverResult<Transaction> {
        self.core.ensure_open()?;
        match Transaction::open(self.core.clone(), transaction_type, options.clone()).await {
            Err(e) if e.is_routing() => {
                warn!(database = %self.core.database, error = %e, "transaction open misrouted, reopening session");
                self.core.reroute().await?;
                Transaction::open(self.core.clone(), transaction_type, options)
                    .await
                    .map_err(|e| {
                        if e.is_routing() {
                            DriverError::Unavailable(format!(
                                "{}: transaction open failed after rerouting ({e})",
                                self.core.database
                            ))
                        } else {
                            e
                        }
                    })
            }
            outcome => outcome,
        }
    }

    /// Close the session. Closing twice is a no-op.
    pub async fn close(&self) {
        self.core.close().await;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.core.is_open() {
            return;
        }
        let core = self.core.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { core.close().await });
            }
            Err(_) => {
                core.mark_closed();
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.core.database)
            .field("session_type", &self.core.session_type)
            .field("open", &self.core.is_open())
            .finish()
    }
}
