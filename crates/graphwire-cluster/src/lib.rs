//! graphwire-cluster: routing across the replicas of a cluster.
//!
//! # Architecture
//!
//! ```text
//! ClusterRouter
//!   ├── members + one ServerStub per address (synced from servers_all)
//!   ├── ReplicaCache (database → ClusterDatabase, term never goes back)
//!   ├── run_primary()  writes/schema, one corrective retry
//!   ├── run_any()      reads on the preferred replica, primary fallback
//!   └── discover()     databases_get on reachable members
//! ```

pub mod replica;
pub mod router;

pub use replica::{ClusterDatabase, Replica, ReplicaCache};
pub use router::{ClusterRouter, SYSTEM_DATABASE};
