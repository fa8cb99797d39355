//! Protobuf messages of the `graphwire.protocol` package.
//!
//! Declared with prost derives so the crate builds without `protoc`.
//! Field tags are part of the wire contract; never renumber them.

#![allow(clippy::derive_partial_eq_without_eq)]

use std::collections::HashMap;

// ── Connection ─────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionOpenReq {
    #[prost(uint32, tag = "1")]
    pub protocol_version: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectionOpenRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServersAllReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServersAllRes {
    #[prost(string, repeated, tag = "1")]
    pub addresses: Vec<String>,
}

// ── Users ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserInfo {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(int64, optional, tag = "2")]
    pub password_expiry_seconds: Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserTokenReq {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserTokenRes {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersAllReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersAllRes {
    #[prost(message, repeated, tag = "1")]
    pub users: Vec<UserInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersContainsReq {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersContainsRes {
    #[prost(bool, tag = "1")]
    pub contains: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersCreateReq {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersCreateRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersDeleteReq {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersDeleteRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersPasswordSetReq {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersPasswordSetRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersGetReq {
    #[prost(string, tag = "1")]
    pub username: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UsersGetRes {
    #[prost(message, optional, tag = "1")]
    pub user: Option<UserInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserPasswordUpdateReq {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password_old: String,
    #[prost(string, tag = "3")]
    pub password_new: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserPasswordUpdateRes {}

// ── Databases and replicas ─────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReplicaInfo {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(bool, tag = "2")]
    pub primary: bool,
    #[prost(bool, tag = "3")]
    pub preferred: bool,
    #[prost(uint64, tag = "4")]
    pub term: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseReplicas {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub replicas: Vec<ReplicaInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesAllReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesAllRes {
    #[prost(message, repeated, tag = "1")]
    pub databases: Vec<DatabaseReplicas>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesContainsReq {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesContainsRes {
    #[prost(bool, tag = "1")]
    pub contains: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesCreateReq {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesCreateRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesGetReq {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabasesGetRes {
    #[prost(message, optional, tag = "1")]
    pub database: Option<DatabaseReplicas>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseSchemaReq {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseSchemaRes {
    #[prost(string, tag = "1")]
    pub schema: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseDeleteReq {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DatabaseDeleteRes {}

// ── Options and sessions ───────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Options {
    #[prost(bool, optional, tag = "1")]
    pub infer: Option<bool>,
    #[prost(bool, optional, tag = "2")]
    pub trace_inference: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub explain: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub parallel: Option<bool>,
    #[prost(int32, optional, tag = "5")]
    pub prefetch_size: Option<i32>,
    #[prost(bool, optional, tag = "6")]
    pub prefetch: Option<bool>,
    #[prost(int32, optional, tag = "7")]
    pub session_idle_timeout_millis: Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub transaction_timeout_millis: Option<i32>,
    #[prost(int32, optional, tag = "9")]
    pub schema_lock_acquire_timeout_millis: Option<i32>,
    #[prost(bool, optional, tag = "10")]
    pub read_any_replica: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SessionType {
    Data = 0,
    Schema = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionOpenReq {
    #[prost(string, tag = "1")]
    pub database: String,
    #[prost(enumeration = "SessionType", tag = "2")]
    pub session_type: i32,
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionOpenRes {
    #[prost(bytes = "vec", tag = "1")]
    pub session_id: Vec<u8>,
    #[prost(int32, tag = "2")]
    pub server_duration_millis: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionCloseReq {
    #[prost(bytes = "vec", tag = "1")]
    pub session_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionCloseRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionPulseReq {
    #[prost(bytes = "vec", tag = "1")]
    pub session_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionPulseRes {
    #[prost(bool, tag = "1")]
    pub alive: bool,
}

// ── Concepts ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TypeEncoding {
    ThingType = 0,
    EntityType = 1,
    RelationType = 2,
    AttributeType = 3,
    RoleType = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ValueType {
    Object = 0,
    Boolean = 1,
    Long = 2,
    Double = 3,
    String = 4,
    DateTime = 5,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Type {
    #[prost(string, tag = "1")]
    pub label: String,
    #[prost(string, tag = "2")]
    pub scope: String,
    #[prost(enumeration = "TypeEncoding", tag = "3")]
    pub encoding: i32,
    #[prost(enumeration = "ValueType", tag = "4")]
    pub value_type: i32,
    #[prost(bool, tag = "5")]
    pub is_root: bool,
    #[prost(bool, tag = "6")]
    pub is_abstract: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttributeValue {
    #[prost(oneof = "attribute_value::Value", tags = "1, 2, 3, 4, 5")]
    pub value: Option<attribute_value::Value>,
}

pub mod attribute_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(bool, tag = "1")]
        Boolean(bool),
        #[prost(int64, tag = "2")]
        Long(i64),
        #[prost(double, tag = "3")]
        Double(f64),
        #[prost(string, tag = "4")]
        String(String),
        /// Milliseconds since the Unix epoch, UTC.
        #[prost(int64, tag = "5")]
        DateTime(i64),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Thing {
    #[prost(bytes = "vec", tag = "1")]
    pub iid: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub thing_type: Option<Type>,
    #[prost(message, optional, tag = "3")]
    pub value: Option<AttributeValue>,
    #[prost(bool, tag = "4")]
    pub inferred: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rule {
    #[prost(string, tag = "1")]
    pub label: String,
    #[prost(string, tag = "2")]
    pub when: String,
    #[prost(string, tag = "3")]
    pub then: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Concept {
    #[prost(oneof = "concept::Concept", tags = "1, 2")]
    pub concept: Option<concept::Concept>,
}

pub mod concept {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Concept {
        #[prost(message, tag = "1")]
        Thing(super::Thing),
        #[prost(message, tag = "2")]
        Type(super::Type),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConceptMap {
    #[prost(map = "string, message", tag = "1")]
    pub map: HashMap<String, Concept>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Numeric {
    #[prost(oneof = "numeric::Value", tags = "1, 2, 3")]
    pub value: Option<numeric::Value>,
}

pub mod numeric {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(int64, tag = "1")]
        LongValue(i64),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(bool, tag = "3")]
        Nan(bool),
    }
}

// ── Concept manager ────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutTypeReq {
    #[prost(string, tag = "1")]
    pub label: String,
    #[prost(enumeration = "ValueType", tag = "2")]
    pub value_type: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypeRes {
    #[prost(message, optional, tag = "1")]
    pub thing_type: Option<Type>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetTypeReq {
    #[prost(string, tag = "1")]
    pub label: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetThingReq {
    #[prost(bytes = "vec", tag = "1")]
    pub iid: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThingRes {
    #[prost(message, optional, tag = "1")]
    pub thing: Option<Thing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRuleReq {
    #[prost(string, tag = "1")]
    pub label: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RuleRes {
    #[prost(message, optional, tag = "1")]
    pub rule: Option<Rule>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConceptManagerReq {
    #[prost(oneof = "concept_manager_req::Req", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub req: Option<concept_manager_req::Req>,
}

pub mod concept_manager_req {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Req {
        #[prost(message, tag = "1")]
        PutEntityType(super::PutTypeReq),
        #[prost(message, tag = "2")]
        PutRelationType(super::PutTypeReq),
        #[prost(message, tag = "3")]
        PutAttributeType(super::PutTypeReq),
        #[prost(message, tag = "4")]
        GetThingType(super::GetTypeReq),
        #[prost(message, tag = "5")]
        GetThing(super::GetThingReq),
        #[prost(message, tag = "6")]
        PutRule(super::Rule),
        #[prost(message, tag = "7")]
        GetRule(super::GetRuleReq),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConceptManagerRes {
    #[prost(oneof = "concept_manager_res::Res", tags = "1, 2, 3")]
    pub res: Option<concept_manager_res::Res>,
}

pub mod concept_manager_res {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Res {
        #[prost(message, tag = "1")]
        Type(super::TypeRes),
        #[prost(message, tag = "2")]
        Thing(super::ThingRes),
        #[prost(message, tag = "3")]
        Rule(super::RuleRes),
    }
}

// ── Query manager ──────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryManagerReq {
    #[prost(message, optional, tag = "1")]
    pub options: Option<Options>,
    #[prost(string, tag = "2")]
    pub query: String,
    #[prost(enumeration = "QueryKind", tag = "3")]
    pub kind: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum QueryKind {
    Define = 0,
    Undefine = 1,
    Match = 2,
    MatchAggregate = 3,
    Insert = 4,
    Delete = 5,
    Update = 6,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryManagerRes {
    #[prost(message, optional, tag = "1")]
    pub aggregate: Option<Numeric>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryManagerResPart {
    #[prost(message, repeated, tag = "1")]
    pub answers: Vec<ConceptMap>,
}

// ── Thing operations ───────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RolePlayerReq {
    #[prost(message, optional, tag = "1")]
    pub role_type: Option<Type>,
    #[prost(message, optional, tag = "2")]
    pub player: Option<Thing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPlayersReq {
    #[prost(message, repeated, tag = "1")]
    pub role_types: Vec<Type>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmptyReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThingReq {
    #[prost(bytes = "vec", tag = "1")]
    pub iid: Vec<u8>,
    #[prost(oneof = "thing_req::Req", tags = "2, 3, 4, 5, 6")]
    pub req: Option<thing_req::Req>,
}

pub mod thing_req {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Req {
        #[prost(message, tag = "2")]
        Delete(super::EmptyReq),
        #[prost(message, tag = "3")]
        RelationAddPlayer(super::RolePlayerReq),
        #[prost(message, tag = "4")]
        RelationRemovePlayer(super::RolePlayerReq),
        #[prost(message, tag = "5")]
        RelationGetPlayers(super::GetPlayersReq),
        #[prost(message, tag = "6")]
        RelationGetPlayersByRoleType(super::EmptyReq),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThingOpRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RolePlayer {
    #[prost(message, optional, tag = "1")]
    pub role_type: Option<Type>,
    #[prost(message, optional, tag = "2")]
    pub player: Option<Thing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ThingResPart {
    #[prost(message, repeated, tag = "1")]
    pub things: Vec<Thing>,
    #[prost(message, repeated, tag = "2")]
    pub role_players: Vec<RolePlayer>,
}

// ── Type operations ────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypeReq {
    #[prost(string, tag = "1")]
    pub label: String,
    #[prost(string, tag = "2")]
    pub scope: String,
    #[prost(oneof = "type_req::Req", tags = "3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub req: Option<type_req::Req>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetLabelReq {
    #[prost(string, tag = "1")]
    pub label: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetOwnersReq {
    #[prost(bool, tag = "1")]
    pub only_key: bool,
}

pub mod type_req {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Req {
        #[prost(message, tag = "3")]
        Delete(super::EmptyReq),
        #[prost(message, tag = "4")]
        SetLabel(super::SetLabelReq),
        #[prost(message, tag = "5")]
        GetSupertypes(super::EmptyReq),
        #[prost(message, tag = "6")]
        GetSubtypes(super::EmptyReq),
        #[prost(message, tag = "7")]
        GetInstances(super::EmptyReq),
        #[prost(message, tag = "8")]
        Create(super::EmptyReq),
        #[prost(message, tag = "9")]
        AttributePut(super::AttributeValue),
        #[prost(message, tag = "10")]
        AttributeGet(super::AttributeValue),
        #[prost(message, tag = "11")]
        AttributeGetOwners(super::GetOwnersReq),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypeOpRes {
    /// Set by `create`, `attribute_put` and (when present) `attribute_get`.
    #[prost(message, optional, tag = "1")]
    pub thing: Option<Thing>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypeResPart {
    #[prost(message, repeated, tag = "1")]
    pub types: Vec<Type>,
    #[prost(message, repeated, tag = "2")]
    pub things: Vec<Thing>,
}

// ── Transaction stream ─────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TransactionType {
    Read = 0,
    Write = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenReq {
    #[prost(bytes = "vec", tag = "1")]
    pub session_id: Vec<u8>,
    #[prost(enumeration = "TransactionType", tag = "2")]
    pub transaction_type: i32,
    #[prost(message, optional, tag = "3")]
    pub options: Option<Options>,
    #[prost(int32, tag = "4")]
    pub network_latency_millis: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommitRes {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RollbackRes {}

/// Asks the server for the next batch of a paused streamed reply.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamReq {}

/// Tells the server to stop producing parts for a streamed reply.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelReq {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionReq {
    #[prost(oneof = "transaction_req::Req", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub req: Option<transaction_req::Req>,
}

pub mod transaction_req {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Req {
        #[prost(message, tag = "1")]
        OpenReq(super::OpenReq),
        #[prost(message, tag = "2")]
        CommitReq(super::CommitReq),
        #[prost(message, tag = "3")]
        RollbackReq(super::RollbackReq),
        #[prost(message, tag = "4")]
        StreamReq(super::StreamReq),
        #[prost(message, tag = "5")]
        CancelReq(super::CancelReq),
        #[prost(message, tag = "6")]
        ConceptManagerReq(super::ConceptManagerReq),
        #[prost(message, tag = "7")]
        QueryManagerReq(super::QueryManagerReq),
        #[prost(message, tag = "8")]
        ThingReq(super::ThingReq),
        #[prost(message, tag = "9")]
        TypeReq(super::TypeReq),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionRes {
    #[prost(oneof = "transaction_res::Res", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub res: Option<transaction_res::Res>,
}

pub mod transaction_res {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Res {
        #[prost(message, tag = "1")]
        OpenRes(super::OpenRes),
        #[prost(message, tag = "2")]
        CommitRes(super::CommitRes),
        #[prost(message, tag = "3")]
        RollbackRes(super::RollbackRes),
        #[prost(message, tag = "4")]
        ConceptManagerRes(super::ConceptManagerRes),
        #[prost(message, tag = "5")]
        QueryManagerRes(super::QueryManagerRes),
        #[prost(message, tag = "6")]
        ThingRes(super::ThingOpRes),
        #[prost(message, tag = "7")]
        TypeRes(super::TypeOpRes),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionResPart {
    #[prost(oneof = "transaction_res_part::Res", tags = "1, 2, 3")]
    pub res: Option<transaction_res_part::Res>,
}

pub mod transaction_res_part {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Res {
        #[prost(message, tag = "1")]
        QueryManagerResPart(super::QueryManagerResPart),
        #[prost(message, tag = "2")]
        ThingResPart(super::ThingResPart),
        #[prost(message, tag = "3")]
        TypeResPart(super::TypeResPart),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamState {
    #[prost(enumeration = "stream_state::State", tag = "1")]
    pub state: i32,
}

pub mod stream_state {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum State {
        /// The server paused; send a `StreamReq` to receive more parts.
        Continue = 0,
        /// No more parts follow for this request.
        Done = 1,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerError {
    #[prost(string, tag = "1")]
    pub code: String,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionClient {
    #[prost(uint64, tag = "1")]
    pub req_id: u64,
    #[prost(message, optional, tag = "2")]
    pub req: Option<TransactionReq>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionServer {
    #[prost(uint64, tag = "1")]
    pub req_id: u64,
    #[prost(oneof = "transaction_server::Server", tags = "2, 3, 4, 5")]
    pub server: Option<transaction_server::Server>,
}

pub mod transaction_server {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Server {
        #[prost(message, tag = "2")]
        Res(super::TransactionRes),
        #[prost(message, tag = "3")]
        ResPart(super::TransactionResPart),
        #[prost(message, tag = "4")]
        StreamState(super::StreamState),
        #[prost(message, tag = "5")]
        Error(super::ServerError),
    }
}
