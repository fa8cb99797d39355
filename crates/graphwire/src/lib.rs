//! graphwire: client driver for graphwire clusters.
//!
//! # Architecture
//!
//! ```text
//! Connection ──► ClusterRouter (graphwire-cluster)
//!   ├── databases() → DatabaseManager / Database
//!   ├── users()     → UserManager / User
//!   └── session()   → Session ── pulse task
//!                        └── transaction() → Transaction ── RpcTransaction
//!                                               ├── concepts() → ConceptManager
//!                                               ├── query()    → QueryManager
//!                                               └── run()/stream() ◄── Type, Thing operations
//! ```
//!
//! ```no_run
//! # async fn demo() -> graphwire::DriverResult<()> {
//! use graphwire::{Connection, Credential, Options, SessionType, TransactionType};
//!
//! let connection = Connection::open(
//!     &["localhost:1729".to_string()],
//!     Credential::new("admin", "password"),
//! )
//! .await?;
//! let session = connection.session("social", SessionType::Schema, Options::new()).await?;
//! let tx = session.transaction(TransactionType::Write, Options::new()).await?;
//! tx.concepts().put_entity_type("person").await?;
//! tx.commit().await?;
//! session.close().await;
//! connection.close().await;
//! # Ok(())
//! # }
//! ```

pub mod concept;
pub mod connection;
pub mod database;
pub mod operation;
pub mod options;
pub mod query;
pub mod session;
pub mod transaction;
pub mod user;

pub use concept::{Concept, ConceptManager, ConceptMap, Numeric, Rule};
pub use connection::{Connection, ConnectionConfig};
pub use database::{Database, DatabaseManager};
pub use graphwire_cluster::Replica;
pub use graphwire_rpc::{Credential, DriverError, DriverResult, ErrorKind};
pub use options::Options;
pub use query::QueryManager;
pub use session::{Session, SessionType};
pub use transaction::{Transaction, TransactionType};
pub use user::{User, UserManager};
