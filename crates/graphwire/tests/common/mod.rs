//! A scripted two-member cluster for driver-level tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use graphwire::{Connection, ConnectionConfig, Credential, DriverError};
use graphwire_rpc::proto::{self, transaction_req, transaction_res};
use graphwire_rpc::testing::{MockConnector, MockStream, MockTransport};
use graphwire_rpc::{UnaryRequest, UnaryResponse};

pub const MEMBERS: [&str; 2] = ["a:1729", "b:1729"];
pub const DATABASE: &str = "social";

/// What every simulated member agrees on.
pub struct ClusterState {
    pub primary: String,
    pub term: u64,
    /// Answer to session pulses.
    pub alive: bool,
    pub databases: BTreeSet<String>,
    pub users: BTreeSet<String>,
    sessions_opened: usize,
}

impl ClusterState {
    fn view(&self, name: &str) -> proto::DatabaseReplicas {
        proto::DatabaseReplicas {
            name: name.to_string(),
            replicas: MEMBERS
                .iter()
                .map(|address| proto::ReplicaInfo {
                    address: address.to_string(),
                    primary: *address == self.primary,
                    preferred: false,
                    term: self.term,
                })
                .collect(),
        }
    }
}

pub struct TestCluster {
    pub state: Arc<Mutex<ClusterState>>,
    pub connector: Arc<MockConnector>,
    servers: Vec<Arc<MockTransport>>,
}

fn not_primary() -> DriverError {
    DriverError::from_server("RPL1", "not the primary")
}

fn handle(
    address: &'static str,
    state: &Mutex<ClusterState>,
    request: &UnaryRequest,
) -> Result<UnaryResponse, DriverError> {
    let mut state = state.lock().unwrap();
    let is_primary = state.primary == address;
    let reply: UnaryResponse = match request {
        UnaryRequest::ConnectionOpen(_) => proto::ConnectionOpenRes {}.into(),
        UnaryRequest::UserToken(req) => proto::UserTokenRes {
            token: format!("token-for-{}", req.username),
        }
        .into(),
        UnaryRequest::ServersAll(_) => proto::ServersAllRes {
            addresses: MEMBERS.iter().map(|a| a.to_string()).collect(),
        }
        .into(),
        UnaryRequest::DatabasesGet(req) => proto::DatabasesGetRes {
            database: Some(state.view(&req.name)),
        }
        .into(),
        UnaryRequest::DatabasesAll(_) => proto::DatabasesAllRes {
            databases: state.databases.iter().map(|name| state.view(name)).collect(),
        }
        .into(),
        UnaryRequest::DatabasesContains(req) => proto::DatabasesContainsRes {
            contains: state.databases.contains(&req.name),
        }
        .into(),
        UnaryRequest::DatabasesCreate(req) if is_primary => {
            state.databases.insert(req.name.clone());
            proto::DatabasesCreateRes {}.into()
        }
        UnaryRequest::DatabaseSchema(req) => proto::DatabaseSchemaRes {
            schema: format!("define {} sub entity;", req.name),
        }
        .into(),
        UnaryRequest::DatabaseDelete(req) if is_primary => {
            state.databases.remove(&req.name);
            proto::DatabaseDeleteRes {}.into()
        }
        UnaryRequest::UsersAll(_) => proto::UsersAllRes {
            users: state
                .users
                .iter()
                .map(|username| proto::UserInfo {
                    username: username.clone(),
                    password_expiry_seconds: None,
                })
                .collect(),
        }
        .into(),
        UnaryRequest::UsersContains(req) => proto::UsersContainsRes {
            contains: state.users.contains(&req.username),
        }
        .into(),
        UnaryRequest::UsersCreate(req) if is_primary => {
            state.users.insert(req.username.clone());
            proto::UsersCreateRes {}.into()
        }
        UnaryRequest::UsersDelete(req) if is_primary => {
            state.users.remove(&req.username);
            proto::UsersDeleteRes {}.into()
        }
        UnaryRequest::UsersGet(req) => proto::UsersGetRes {
            user: state.users.get(&req.username).map(|username| proto::UserInfo {
                username: username.clone(),
                password_expiry_seconds: Some(3600),
            }),
        }
        .into(),
        UnaryRequest::UserPasswordUpdate(_) if is_primary => proto::UserPasswordUpdateRes {}.into(),
        UnaryRequest::SessionOpen(_) if is_primary => {
            state.sessions_opened += 1;
            proto::SessionOpenRes {
                session_id: format!("{address}/{}", state.sessions_opened).into_bytes(),
                server_duration_millis: 0,
            }
            .into()
        }
        UnaryRequest::SessionPulse(_) => proto::SessionPulseRes { alive: state.alive }.into(),
        UnaryRequest::SessionClose(_) => proto::SessionCloseRes {}.into(),
        UnaryRequest::DatabasesCreate(_)
        | UnaryRequest::DatabaseDelete(_)
        | UnaryRequest::UsersCreate(_)
        | UnaryRequest::UsersDelete(_)
        | UnaryRequest::UserPasswordUpdate(_)
        | UnaryRequest::SessionOpen(_) => return Err(not_primary()),
        _ => return Err(DriverError::Unsupported("not scripted".into())),
    };
    Ok(reply)
}

impl TestCluster {
    pub fn new(primary: &str) -> Self {
        let state = Arc::new(Mutex::new(ClusterState {
            primary: primary.to_string(),
            term: 1,
            alive: true,
            databases: [DATABASE.to_string()].into_iter().collect(),
            users: ["admin".to_string()].into_iter().collect(),
            sessions_opened: 0,
        }));
        let connector = Arc::new(MockConnector::new());
        let servers: Vec<_> = MEMBERS
            .iter()
            .map(|&address| {
                let unary_state = state.clone();
                let stream_state = state.clone();
                let server = Arc::new(
                    MockTransport::new(address, move |_, request| {
                        handle(address, &unary_state, request)
                    })
                    .with_stream_guard(move |_| {
                        if stream_state.lock().unwrap().primary == address {
                            Ok(())
                        } else {
                            Err(not_primary())
                        }
                    }),
                );
                connector.register(server.clone());
                server
            })
            .collect();
        Self {
            state,
            connector,
            servers,
        }
    }

    pub fn server(&self, address: &str) -> Arc<MockTransport> {
        self.servers
            .iter()
            .find(|server| graphwire_rpc::Transport::address(server.as_ref()) == address)
            .cloned()
            .unwrap()
    }

    /// Elect `address` as primary for `term`.
    pub fn elect(&self, address: &str, term: u64) {
        let mut state = self.state.lock().unwrap();
        state.primary = address.to_string();
        state.term = term;
    }

    pub fn set_alive(&self, alive: bool) {
        self.state.lock().unwrap().alive = alive;
    }

    pub fn calls(&self, method: &str) -> usize {
        self.servers.iter().map(|server| server.call_count(method)).sum()
    }

    pub async fn connect(&self) -> Connection {
        self.connect_with(ConnectionConfig {
            pulse_interval: Duration::from_secs(3600),
        })
        .await
    }

    pub async fn connect_with(&self, config: ConnectionConfig) -> Connection {
        Connection::open_with(
            &[MEMBERS[0].to_string()],
            Credential::new("admin", "password"),
            self.connector.clone(),
            config,
        )
        .await
        .unwrap()
    }
}

pub fn request(message: &proto::TransactionClient) -> &transaction_req::Req {
    message
        .req
        .as_ref()
        .and_then(|req| req.req.as_ref())
        .expect("request body")
}

/// Accept the next transaction stream on `server` and acknowledge its open.
pub async fn accept_transaction(server: &MockTransport) -> MockStream {
    let mut stream = server.accept().await.expect("transaction stream");
    let open = stream.next_request().await.expect("open request");
    assert!(matches!(request(&open), transaction_req::Req::OpenReq(_)));
    stream.reply(open.req_id, transaction_res::Res::OpenRes(proto::OpenRes {}));
    stream
}

pub fn entity_type(label: &str) -> proto::Type {
    proto::Type {
        label: label.to_string(),
        encoding: proto::TypeEncoding::EntityType as i32,
        ..Default::default()
    }
}

/// One answer binding `$x` to a person with iid `[n]`.
pub fn person_answer(n: u8) -> proto::ConceptMap {
    proto::ConceptMap {
        map: [(
            "x".to_string(),
            proto::Concept {
                concept: Some(proto::concept::Concept::Thing(proto::Thing {
                    iid: vec![n],
                    thing_type: Some(entity_type("person")),
                    value: None,
                    inferred: false,
                })),
            },
        )]
        .into_iter()
        .collect(),
    }
}
