//! Cluster router: replica-aware routing with bounded correction.
//!
//! Operations run against the primary (writes, schema) or the preferred
//! replica (reads). A routing failure triggers one discovery round and one
//! retry against the corrected primary; a second failure is surfaced as
//! `Unavailable`.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use graphwire_rpc::proto;
use graphwire_rpc::{Connector, Credential, DriverError, DriverResult, ServerStub};
use tracing::{debug, info, warn};

use crate::replica::{ClusterDatabase, Replica, ReplicaCache};

/// Database whose primary serves user management and database creation.
pub const SYSTEM_DATABASE: &str = "_system";

/// Routes operations to the right server of a cluster.
pub struct ClusterRouter {
    credential: Credential,
    connector: Arc<dyn Connector>,
    members: RwLock<BTreeSet<String>>,
    stubs: RwLock<BTreeMap<String, Arc<ServerStub>>>,
    replicas: ReplicaCache,
}

impl ClusterRouter {
    /// Connect through the first reachable seed and learn the member list.
    pub async fn connect(
        seeds: &[String],
        credential: Credential,
        connector: Arc<dyn Connector>,
    ) -> DriverResult<Self> {
        if seeds.is_empty() {
            return Err(DriverError::Configuration(
                "at least one server address is required".into(),
            ));
        }
        let router = Self {
            credential,
            connector,
            members: RwLock::new(seeds.iter().cloned().collect()),
            stubs: RwLock::new(BTreeMap::new()),
            replicas: ReplicaCache::new(),
        };

        let mut failures = Vec::new();
        for seed in seeds {
            let servers = match router.stub(seed).await {
                Ok(stub) => stub.servers_all(proto::ServersAllReq {}).await,
                Err(e) => Err(e),
            };
            match servers {
                Ok(servers) => {
                    info!(seed = %seed, members = servers.addresses.len(), "connected to cluster");
                    router.sync_members(servers.addresses).await;
                    return Ok(router);
                }
                // Bad credentials are not a seed problem.
                Err(e) if e.kind() == graphwire_rpc::ErrorKind::Authentication => return Err(e),
                Err(e) => {
                    warn!(seed = %seed, error = %e, "seed unreachable");
                    failures.push(format!("{seed}: {e}"));
                }
            }
        }
        Err(DriverError::Unavailable(format!(
            "no seed address reachable ({})",
            failures.join("; ")
        )))
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Known member addresses, sorted.
    pub fn addresses(&self) -> Vec<String> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn cached(&self, database: &str) -> Option<ClusterDatabase> {
        self.replicas.get(database)
    }

    /// Offer a replica view learned outside discovery, e.g. from a listing.
    pub fn observe(&self, view: ClusterDatabase) -> bool {
        self.replicas.observe(view)
    }

    /// Drop the cached view of a deleted database.
    pub fn forget(&self, database: &str) {
        self.replicas.remove(database);
    }

    /// Replace the member list. Stubs of removed members are dropped; new
    /// members get stubs now, or on first use if they are unreachable.
    pub async fn sync_members(&self, addresses: Vec<String>) {
        let members: BTreeSet<String> = addresses.into_iter().collect();
        let added: Vec<String> = {
            let mut current = self.members.write().unwrap_or_else(PoisonError::into_inner);
            let added = members.difference(&current).cloned().collect();
            *current = members.clone();
            added
        };
        self.stubs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|address, _| {
                let keep = members.contains(address);
                if !keep {
                    debug!(%address, "dropping stub of departed member");
                }
                keep
            });
        for address in added {
            if let Err(e) = self.stub(&address).await {
                warn!(%address, error = %e, "new member unreachable");
            }
        }
    }

    /// The opened stub for `address`, connecting on first use.
    pub async fn stub(&self, address: &str) -> DriverResult<Arc<ServerStub>> {
        if let Some(stub) = self
            .stubs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
        {
            return Ok(stub.clone());
        }

        let stub = Arc::new(ServerStub::connect(
            address,
            self.credential.clone(),
            self.connector.as_ref(),
        )?);
        stub.open().await?;
        debug!(%address, "server stub opened");

        let mut stubs = self.stubs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(stubs.entry(address.to_string()).or_insert(stub).clone())
    }

    /// Ask reachable members for the replica view of `database`.
    ///
    /// The answer goes through the term rule of [`ReplicaCache::observe`]; the
    /// returned view is whatever the cache holds afterwards.
    pub async fn discover(&self, database: &str) -> DriverResult<ClusterDatabase> {
        let mut failures = Vec::new();
        for address in self.addresses() {
            let reply = match self.stub(&address).await {
                Ok(stub) => {
                    stub.databases_get(proto::DatabasesGetReq {
                        name: database.to_string(),
                    })
                    .await
                }
                Err(e) => Err(e),
            };
            match reply {
                Ok(reply) => {
                    let view = reply.database.ok_or_else(|| {
                        DriverError::Protocol(format!("{address} sent no replicas for {database}"))
                    })?;
                    self.replicas.observe(ClusterDatabase::from_proto(&view)?);
                    return self.replicas.get(database).ok_or_else(|| {
                        DriverError::Unavailable(format!("no replica view for {database}"))
                    });
                }
                Err(e) if e.is_routing() => {
                    debug!(%address, database, error = %e, "discovery failed on member");
                    failures.push(format!("{address}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }
        Err(DriverError::Unavailable(format!(
            "no member answered discovery for {database} ({})",
            failures.join("; ")
        )))
    }

    async fn seek_primary(&self, database: &str, refresh: bool) -> DriverResult<Replica> {
        let view = match self.replicas.get(database) {
            Some(view) if !refresh && view.primary().is_some() => view,
            _ => self.discover(database).await?,
        };
        view.primary()
            .cloned()
            .ok_or_else(|| DriverError::UnknownLeader(format!("{database} has no primary")))
    }

    async fn primary_stub(&self, database: &str, refresh: bool) -> DriverResult<Arc<ServerStub>> {
        let primary = self.seek_primary(database, refresh).await?;
        self.stub(&primary.address).await
    }

    /// Run `op` on the primary of `database`.
    ///
    /// One routing failure re-resolves the primary and retries; a second one
    /// fails with `Unavailable`. Other errors are returned untouched.
    pub async fn run_primary<T, F, Fut>(&self, database: &str, op: F) -> DriverResult<T>
    where
        F: Fn(Arc<ServerStub>) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let first = match self.primary_stub(database, false).await {
            Ok(stub) => op(stub).await,
            Err(e) => Err(e),
        };
        let error = match first {
            Err(e) if e.is_routing() => e,
            outcome => return outcome,
        };
        warn!(database, error = %error, "primary routing failed, re-resolving");
        self.retry_on_primary(database, op).await
    }

    /// Run `op` on the preferred replica of `database`, or its primary.
    ///
    /// A routing failure falls back to the freshly discovered primary once.
    pub async fn run_any<T, F, Fut>(&self, database: &str, op: F) -> DriverResult<T>
    where
        F: Fn(Arc<ServerStub>) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let first = match self.read_target(database).await {
            Ok(replica) => match self.stub(&replica.address).await {
                Ok(stub) => op(stub).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        let error = match first {
            Err(e) if e.is_routing() => e,
            outcome => return outcome,
        };
        warn!(database, error = %error, "read routing failed, falling back to primary");
        self.retry_on_primary(database, op).await
    }

    /// Run `op` on the primary of the system database.
    pub async fn run_system<T, F, Fut>(&self, op: F) -> DriverResult<T>
    where
        F: Fn(Arc<ServerStub>) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        self.run_primary(SYSTEM_DATABASE, op).await
    }

    async fn read_target(&self, database: &str) -> DriverResult<Replica> {
        let view = match self.replicas.get(database) {
            Some(view) => view,
            None => self.discover(database).await?,
        };
        view.preferred()
            .or_else(|| view.primary())
            .cloned()
            .ok_or_else(|| DriverError::UnknownLeader(format!("{database} has no primary")))
    }

    async fn retry_on_primary<T, F, Fut>(&self, database: &str, op: F) -> DriverResult<T>
    where
        F: Fn(Arc<ServerStub>) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let retried = match self.primary_stub(database, true).await {
            Ok(stub) => op(stub).await,
            Err(e) => Err(e),
        };
        match retried {
            Err(e) if e.is_routing() => Err(DriverError::Unavailable(format!(
                "{database}: primary still unreachable after re-resolving ({e})"
            ))),
            outcome => outcome,
        }
    }
}

impl std::fmt::Debug for ClusterRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterRouter")
            .field("members", &self.addresses())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwire_rpc::testing::{MockConnector, MockTransport};
    use graphwire_rpc::{ErrorKind, UnaryRequest, UnaryResponse};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MEMBERS: [&str; 3] = ["a:1729", "b:1729", "c:1729"];

    /// What the simulated cluster currently believes.
    struct Cluster {
        primary: String,
        term: u64,
        preferred: Option<String>,
        discoveries: AtomicUsize,
    }

    impl Cluster {
        fn view(&self) -> proto::DatabaseReplicas {
            proto::DatabaseReplicas {
                name: "social".into(),
                replicas: MEMBERS
                    .iter()
                    .map(|address| proto::ReplicaInfo {
                        address: address.to_string(),
                        primary: *address == self.primary,
                        preferred: self.preferred.as_deref() == Some(*address),
                        term: self.term,
                    })
                    .collect(),
            }
        }
    }

    fn server(address: &'static str, cluster: Arc<Mutex<Cluster>>) -> Arc<MockTransport> {
        Arc::new(MockTransport::new(address, move |_, request| {
            let cluster = cluster.lock().unwrap();
            let reply: UnaryResponse = match request {
                UnaryRequest::ConnectionOpen(_) => proto::ConnectionOpenRes {}.into(),
                UnaryRequest::ServersAll(_) => proto::ServersAllRes {
                    addresses: MEMBERS.iter().map(|a| a.to_string()).collect(),
                }
                .into(),
                UnaryRequest::DatabasesGet(_) => {
                    cluster.discoveries.fetch_add(1, Ordering::SeqCst);
                    proto::DatabasesGetRes {
                        database: Some(cluster.view()),
                    }
                    .into()
                }
                UnaryRequest::DatabaseSchema(_) if cluster.primary == address => {
                    proto::DatabaseSchemaRes {
                        schema: address.to_string(),
                    }
                    .into()
                }
                UnaryRequest::DatabaseSchema(_) => {
                    return Err(DriverError::from_server("RPL1", "not the primary"));
                }
                _ => return Err(DriverError::Unsupported("not scripted".into())),
            };
            Ok(reply)
        }))
    }

    fn cluster(primary: &str, term: u64) -> Arc<Mutex<Cluster>> {
        Arc::new(Mutex::new(Cluster {
            primary: primary.to_string(),
            term,
            preferred: None,
            discoveries: AtomicUsize::new(0),
        }))
    }

    fn connector(cluster: &Arc<Mutex<Cluster>>) -> Arc<MockConnector> {
        let connector = Arc::new(MockConnector::new());
        for address in MEMBERS {
            connector.register(server(address, cluster.clone()));
        }
        connector
    }

    async fn router(connector: Arc<MockConnector>) -> ClusterRouter {
        ClusterRouter::connect(
            &["a:1729".to_string()],
            Credential::new("admin", "password"),
            connector,
        )
        .await
        .unwrap()
    }

    async fn schema_on(stub: Arc<ServerStub>) -> DriverResult<String> {
        let res = stub
            .database_schema(proto::DatabaseSchemaReq {
                name: "social".into(),
            })
            .await?;
        Ok(res.schema)
    }

    // ── Membership ─────────────────────────────────────────────────

    #[tokio::test]
    async fn connect_learns_members_from_seed() {
        let cluster = cluster("a:1729", 1);
        let router = router(connector(&cluster)).await;
        assert_eq!(router.addresses(), MEMBERS.map(String::from).to_vec());
    }

    #[tokio::test]
    async fn connect_skips_unreachable_seeds() {
        let cluster = cluster("a:1729", 1);
        let connector = connector(&cluster);
        let router = ClusterRouter::connect(
            &["down:1729".to_string(), "b:1729".to_string()],
            Credential::new("admin", "password"),
            connector.clone(),
        )
        .await
        .unwrap();
        assert_eq!(connector.connects()[0], "down:1729");
        assert!(!router.addresses().contains(&"down:1729".to_string()));
    }

    #[tokio::test]
    async fn connect_without_reachable_seed_is_unavailable() {
        let connector = Arc::new(MockConnector::new());
        let err = ClusterRouter::connect(
            &["down:1729".to_string()],
            Credential::new("admin", "password"),
            connector,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Availability);
    }

    #[tokio::test]
    async fn departed_members_lose_their_stubs() {
        let cluster = cluster("a:1729", 1);
        let router = router(connector(&cluster)).await;
        let before = router.stub("c:1729").await.unwrap();

        router
            .sync_members(vec!["a:1729".into(), "b:1729".into()])
            .await;
        assert_eq!(router.addresses(), vec!["a:1729", "b:1729"]);

        router.sync_members(MEMBERS.map(String::from).to_vec()).await;
        let after = router.stub("c:1729").await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    // ── Primary routing ────────────────────────────────────────────

    #[tokio::test]
    async fn run_primary_targets_discovered_primary() {
        let cluster = cluster("b:1729", 1);
        let router = router(connector(&cluster)).await;

        let schema = router.run_primary("social", schema_on).await.unwrap();
        assert_eq!(schema, "b:1729");
    }

    #[tokio::test]
    async fn leader_change_is_corrected_with_one_retry() {
        let cluster = cluster("a:1729", 1);
        let router = router(connector(&cluster)).await;
        assert_eq!(router.run_primary("social", schema_on).await.unwrap(), "a:1729");

        {
            let mut state = cluster.lock().unwrap();
            state.primary = "c:1729".into();
            state.term = 2;
        }
        let before = cluster.lock().unwrap().discoveries.load(Ordering::SeqCst);

        assert_eq!(router.run_primary("social", schema_on).await.unwrap(), "c:1729");
        let after = cluster.lock().unwrap().discoveries.load(Ordering::SeqCst);
        assert_eq!(after - before, 1);
        assert_eq!(router.cached("social").unwrap().term(), 2);
    }

    #[tokio::test]
    async fn second_routing_failure_is_unavailable() {
        let cluster = cluster("a:1729", 1);
        let router = router(connector(&cluster)).await;
        router.discover("social").await.unwrap();

        // The cluster now rejects every write but still reports term 1.
        cluster.lock().unwrap().primary = "nobody:1729".into();
        let attempts = AtomicUsize::new(0);

        let err = router
            .run_primary("social", |stub| {
                attempts.fetch_add(1, Ordering::SeqCst);
                schema_on(stub)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Availability);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn logical_errors_are_not_retried() {
        let cluster = cluster("a:1729", 1);
        let router = router(connector(&cluster)).await;
        let attempts = AtomicUsize::new(0);

        let err = router
            .run_primary("social", |_stub| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DriverError::from_server("DBS01", "no such database")) }
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("DBS01"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    // ── Read routing ───────────────────────────────────────────────

    #[tokio::test]
    async fn run_any_prefers_preferred_replica_then_falls_back() {
        let cluster = cluster("a:1729", 1);
        cluster.lock().unwrap().preferred = Some("b:1729".into());
        let router = router(connector(&cluster)).await;
        let visited = Mutex::new(Vec::new());

        // b is not the primary, so the schema read fails there and is retried on a.
        let schema = router
            .run_any("social", |stub| {
                visited.lock().unwrap().push(stub.address().to_string());
                schema_on(stub)
            })
            .await
            .unwrap();
        assert_eq!(schema, "a:1729");
        assert_eq!(*visited.lock().unwrap(), vec!["b:1729", "a:1729"]);
    }
}
