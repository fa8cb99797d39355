//! Replica views and the term-ordered replica cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use graphwire_rpc::proto;
use graphwire_rpc::{DriverError, DriverResult};
use tracing::debug;

/// One server's copy of a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub address: String,
    /// Leadership epoch the server reported for this database.
    pub term: u64,
    pub primary: bool,
    /// Preferred for reads.
    pub preferred: bool,
}

impl From<&proto::ReplicaInfo> for Replica {
    fn from(info: &proto::ReplicaInfo) -> Self {
        Self {
            address: info.address.clone(),
            term: info.term,
            primary: info.primary,
            preferred: info.preferred,
        }
    }
}

/// The replica set of one database as reported by one discovery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDatabase {
    name: String,
    replicas: Vec<Replica>,
}

impl ClusterDatabase {
    /// Build a view, rejecting one that names more than one primary.
    pub fn new(name: impl Into<String>, replicas: Vec<Replica>) -> DriverResult<Self> {
        let name = name.into();
        let primaries = replicas.iter().filter(|r| r.primary).count();
        if primaries > 1 {
            return Err(DriverError::Protocol(format!(
                "database {name} reported {primaries} primary replicas"
            )));
        }
        Ok(Self { name, replicas })
    }

    pub fn from_proto(database: &proto::DatabaseReplicas) -> DriverResult<Self> {
        Self::new(
            database.name.clone(),
            database.replicas.iter().map(Replica::from).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    pub fn primary(&self) -> Option<&Replica> {
        self.replicas.iter().find(|r| r.primary)
    }

    /// The preferred secondary, if the cluster marked one.
    pub fn preferred(&self) -> Option<&Replica> {
        self.replicas.iter().find(|r| r.preferred && !r.primary)
    }

    /// Highest term any replica reported.
    pub fn term(&self) -> u64 {
        self.replicas.iter().map(|r| r.term).max().unwrap_or(0)
    }
}

/// Latest accepted replica view per database.
///
/// Views only move forward in term; see [`ReplicaCache::observe`].
#[derive(Debug, Default)]
pub struct ReplicaCache {
    views: RwLock<HashMap<String, ClusterDatabase>>,
}

impl ReplicaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, database: &str) -> Option<ClusterDatabase> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(database)
            .cloned()
    }

    /// Record a discovery result. Returns whether the view was accepted.
    ///
    /// A view replaces the cached one only when its term is higher, or when
    /// the terms are equal and the cached view knows no primary yet.
    pub fn observe(&self, view: ClusterDatabase) -> bool {
        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        let accept = match views.get(view.name()) {
            None => true,
            Some(cached) if view.term() > cached.term() => true,
            Some(cached) if view.term() == cached.term() => {
                cached.primary().is_none() && view.primary().is_some()
            }
            Some(_) => false,
        };
        if accept {
            debug!(
                database = view.name(),
                term = view.term(),
                primary = view.primary().map(|r| r.address.as_str()).unwrap_or("-"),
                "replica view updated"
            );
            views.insert(view.name().to_string(), view);
        } else {
            debug!(database = view.name(), term = view.term(), "ignoring stale replica view");
        }
        accept
    }

    pub fn remove(&self, database: &str) {
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(database);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(address: &str, term: u64, primary: bool) -> Replica {
        Replica {
            address: address.to_string(),
            term,
            primary,
            preferred: false,
        }
    }

    fn view(primary: &str, term: u64) -> ClusterDatabase {
        let replicas = ["a:1729", "b:1729", "c:1729"]
            .into_iter()
            .map(|address| replica(address, term, address == primary))
            .collect();
        ClusterDatabase::new("social", replicas).unwrap()
    }

    #[test]
    fn stale_terms_never_regress_the_cache() {
        let cache = ReplicaCache::new();
        let terms = [(3, "a:1729"), (1, "b:1729"), (5, "c:1729"), (2, "a:1729")];
        for (term, primary) in terms {
            cache.observe(view(primary, term));
        }

        let cached = cache.get("social").unwrap();
        assert_eq!(cached.term(), 5);
        assert_eq!(cached.primary().unwrap().address, "c:1729");
    }

    #[test]
    fn equal_term_only_fills_a_missing_primary() {
        let cache = ReplicaCache::new();
        let leaderless = ClusterDatabase::new(
            "social",
            vec![replica("a:1729", 4, false), replica("b:1729", 4, false)],
        )
        .unwrap();
        assert!(cache.observe(leaderless));

        assert!(cache.observe(view("b:1729", 4)));
        assert!(!cache.observe(view("a:1729", 4)), "same term must not move the primary");
        assert_eq!(cache.get("social").unwrap().primary().unwrap().address, "b:1729");
    }

    #[test]
    fn two_primaries_are_rejected() {
        let err = ClusterDatabase::new(
            "social",
            vec![replica("a:1729", 2, true), replica("b:1729", 2, true)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), graphwire_rpc::ErrorKind::Protocol);
    }

    #[test]
    fn preferred_secondary_excludes_primary() {
        let mut replicas = vec![replica("a:1729", 1, true), replica("b:1729", 1, false)];
        replicas[0].preferred = true;
        replicas[1].preferred = true;
        let db = ClusterDatabase::new("social", replicas).unwrap();
        assert_eq!(db.preferred().unwrap().address, "b:1729");
    }

    #[test]
    fn from_proto_copies_replica_fields() {
        let db = ClusterDatabase::from_proto(&proto::DatabaseReplicas {
            name: "social".into(),
            replicas: vec![proto::ReplicaInfo {
                address: "a:1729".into(),
                primary: true,
                preferred: false,
                term: 7,
            }],
        })
        .unwrap();
        assert_eq!(db.name(), "social");
        assert_eq!(db.term(), 7);
        assert_eq!(db.primary().unwrap().address, "a:1729");
    }
}
