//! Database management.

use std::sync::Arc;

use graphwire_cluster::{ClusterDatabase, ClusterRouter, Replica};
use graphwire_rpc::proto;
use graphwire_rpc::{DriverResult, ServerStub};
use tracing::info;

/// Lists, creates and looks up databases.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    router: Arc<ClusterRouter>,
}

impl DatabaseManager {
    pub(crate) fn new(router: Arc<ClusterRouter>) -> Self {
        Self { router }
    }

    /// Every database with its replica view.
    pub async fn all(&self) -> DriverResult<Vec<Database>> {
        let res = self
            .router
            .run_system(|stub: Arc<ServerStub>| async move {
                stub.databases_all(proto::DatabasesAllReq {}).await
            })
            .await?;
        res.databases
            .iter()
            .map(|view| -> DriverResult<Database> {
                let view = ClusterDatabase::from_proto(view)?;
                self.router.observe(view.clone());
                Ok(Database::new(self.router.clone(), view))
            })
            .collect()
    }

    pub async fn contains(&self, name: &str) -> DriverResult<bool> {
        let res = self
            .router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::DatabasesContainsReq {
                    name: name.to_string(),
                };
                async move { stub.databases_contains(request).await }
            })
            .await?;
        Ok(res.contains)
    }

    pub async fn create(&self, name: &str) -> DriverResult<()> {
        self.router
            .run_system(|stub: Arc<ServerStub>| {
                let request = proto::DatabasesCreateReq {
                    name: name.to_string(),
                };
                async move { stub.databases_create(request).await }
            })
            .await?;
        info!(database = name, "database created");
        Ok(())
    }

    /// Look up `name`, refreshing its replica view.
    pub async fn get(&self, name: &str) -> DriverResult<Database> {
        let view = self.router.discover(name).await?;
        Ok(Database::new(self.router.clone(), view))
    }
}

/// A database and the replica view it was fetched with.
#[derive(Debug, Clone)]
pub struct Database {
    router: Arc<ClusterRouter>,
    view: ClusterDatabase,
}

impl Database {
    fn new(router: Arc<ClusterRouter>, view: ClusterDatabase) -> Self {
        Self { router, view }
    }

    pub fn name(&self) -> &str {
        self.view.name()
    }

    /// Schema definition text.
    pub async fn schema(&self) -> DriverResult<String> {
        let res = self
            .router
            .run_any(self.name(), |stub: Arc<ServerStub>| {
                let request = proto::DatabaseSchemaReq {
                    name: self.name().to_string(),
                };
                async move { stub.database_schema(request).await }
            })
            .await?;
        Ok(res.schema)
    }

    pub async fn delete(&self) -> DriverResult<()> {
        self.router
            .run_primary(self.name(), |stub: Arc<ServerStub>| {
                let request = proto::DatabaseDeleteReq {
                    name: self.name().to_string(),
                };
                async move { stub.database_delete(request).await }
            })
            .await?;
        self.router.forget(self.name());
        info!(database = self.name(), "database deleted");
        Ok(())
    }

    pub fn replicas(&self) -> &[Replica] {
        self.view.replicas()
    }

    pub fn primary_replica(&self) -> Option<&Replica> {
        self.view.primary()
    }

    pub fn preferred_replica(&self) -> Option<&Replica> {
        self.view.preferred()
    }
}
