//! Schema and instance lookups within a transaction.

use graphwire_rpc::proto::{self, concept_manager_req, concept_manager_res, transaction_req, transaction_res};
use graphwire_rpc::{DriverError, DriverResult};

use crate::concept::thing::Thing;
use crate::concept::thing_type::{Type, TypeKind};
use crate::concept::value::ValueKind;
use crate::concept::Rule;
use crate::operation::{Unary, unexpected};
use crate::transaction::Transaction;

/// Entry point for schema types, rules and things by iid.
pub struct ConceptManager<'a> {
    tx: &'a Transaction,
}

fn request(req: concept_manager_req::Req) -> transaction_req::Req {
    transaction_req::Req::ConceptManagerReq(proto::ConceptManagerReq { req: Some(req) })
}

fn manager_res(res: transaction_res::Res) -> DriverResult<concept_manager_res::Res> {
    match res {
        transaction_res::Res::ConceptManagerRes(res) => {
            res.res.ok_or_else(|| unexpected("concept manager result"))
        }
        _ => Err(unexpected("concept_manager_res")),
    }
}

fn decode_type(res: transaction_res::Res) -> DriverResult<Option<Type>> {
    match manager_res(res)? {
        concept_manager_res::Res::Type(res) => res.thing_type.as_ref().map(Type::from_proto).transpose(),
        _ => Err(unexpected("type")),
    }
}

fn decode_thing(res: transaction_res::Res) -> DriverResult<Option<Thing>> {
    match manager_res(res)? {
        concept_manager_res::Res::Thing(res) => res.thing.as_ref().map(Thing::from_proto).transpose(),
        _ => Err(unexpected("thing")),
    }
}

fn decode_rule(res: transaction_res::Res) -> DriverResult<Option<Rule>> {
    match manager_res(res)? {
        concept_manager_res::Res::Rule(res) => Ok(res.rule.as_ref().map(Rule::from_proto)),
        _ => Err(unexpected("rule")),
    }
}

impl<'a> ConceptManager<'a> {
    pub(crate) fn new(tx: &'a Transaction) -> Self {
        Self { tx }
    }

    async fn put_type(&self, req: concept_manager_req::Req) -> DriverResult<Type> {
        self.tx
            .run(Unary::new(request(req), decode_type))
            .await?
            .ok_or_else(|| unexpected("put type"))
    }

    async fn root(&self, label: &str) -> DriverResult<Type> {
        self.get_thing_type(label)
            .await?
            .ok_or_else(|| DriverError::Protocol(format!("root type {label} missing")))
    }

    pub async fn get_root_thing_type(&self) -> DriverResult<Type> {
        self.root("thing").await
    }

    pub async fn get_root_entity_type(&self) -> DriverResult<Type> {
        self.root("entity").await
    }

    pub async fn get_root_relation_type(&self) -> DriverResult<Type> {
        self.root("relation").await
    }

    pub async fn get_root_attribute_type(&self) -> DriverResult<Type> {
        self.root("attribute").await
    }

    pub async fn put_entity_type(&self, label: &str) -> DriverResult<Type> {
        self.put_type(concept_manager_req::Req::PutEntityType(proto::PutTypeReq {
            label: label.to_string(),
            value_type: proto::ValueType::Object as i32,
        }))
        .await
    }

    pub async fn put_relation_type(&self, label: &str) -> DriverResult<Type> {
        self.put_type(concept_manager_req::Req::PutRelationType(proto::PutTypeReq {
            label: label.to_string(),
            value_type: proto::ValueType::Object as i32,
        }))
        .await
    }

    pub async fn put_attribute_type(&self, label: &str, kind: ValueKind) -> DriverResult<Type> {
        if !kind.is_writable() {
            return Err(DriverError::InvalidArgument(format!(
                "attribute type {label} needs a concrete value kind"
            )));
        }
        self.put_type(concept_manager_req::Req::PutAttributeType(proto::PutTypeReq {
            label: label.to_string(),
            value_type: kind.to_proto() as i32,
        }))
        .await
    }

    pub async fn get_thing_type(&self, label: &str) -> DriverResult<Option<Type>> {
        let req = request(concept_manager_req::Req::GetThingType(proto::GetTypeReq {
            label: label.to_string(),
        }));
        self.tx.run(Unary::new(req, decode_type)).await
    }

    async fn get_type_of_kind(
        &self,
        label: &str,
        matches: fn(TypeKind) -> bool,
    ) -> DriverResult<Option<Type>> {
        Ok(self
            .get_thing_type(label)
            .await?
            .filter(|ty| matches(ty.kind)))
    }

    pub async fn get_entity_type(&self, label: &str) -> DriverResult<Option<Type>> {
        self.get_type_of_kind(label, |kind| kind == TypeKind::Entity).await
    }

    pub async fn get_relation_type(&self, label: &str) -> DriverResult<Option<Type>> {
        self.get_type_of_kind(label, |kind| kind == TypeKind::Relation).await
    }

    pub async fn get_attribute_type(&self, label: &str) -> DriverResult<Option<Type>> {
        self.get_type_of_kind(label, |kind| matches!(kind, TypeKind::Attribute(_)))
            .await
    }

    pub async fn get_thing(&self, iid: &[u8]) -> DriverResult<Option<Thing>> {
        let req = request(concept_manager_req::Req::GetThing(proto::GetThingReq {
            iid: iid.to_vec(),
        }));
        self.tx.run(Unary::new(req, decode_thing)).await
    }

    pub async fn put_rule(&self, label: &str, when: &str, then: &str) -> DriverResult<Rule> {
        let rule = Rule {
            label: label.to_string(),
            when: when.to_string(),
            then: then.to_string(),
        };
        let req = request(concept_manager_req::Req::PutRule(rule.to_proto()));
        self.tx
            .run(Unary::new(req, decode_rule))
            .await?
            .ok_or_else(|| unexpected("rule"))
    }

    pub async fn get_rule(&self, label: &str) -> DriverResult<Option<Rule>> {
        let req = request(concept_manager_req::Req::GetRule(proto::GetRuleReq {
            label: label.to_string(),
        }));
        self.tx.run(Unary::new(req, decode_rule)).await
    }
}
