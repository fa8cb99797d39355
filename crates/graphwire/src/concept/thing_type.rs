//! Types and their transaction-bound operations.

use std::fmt;

use futures::stream::BoxStream;
use graphwire_rpc::proto::{self, transaction_req, transaction_res, transaction_res_part, type_req};
use graphwire_rpc::{DriverError, DriverResult};

use crate::concept::thing::Thing;
use crate::concept::value::{Value, ValueKind};
use crate::operation::{Streamed, Unary, unexpected};
use crate::transaction::Transaction;

/// A type label, scoped for role types (`marriage:spouse`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub scope: Option<String>,
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scope: None,
            name: name.into(),
        }
    }

    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The kind of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The root `thing` type.
    Thing,
    Entity,
    Relation,
    Attribute(ValueKind),
    Role,
}

/// A schema type. Immutable; operations take the transaction explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub label: Label,
    pub kind: TypeKind,
    pub is_root: bool,
    pub is_abstract: bool,
}

impl Type {
    pub fn from_proto(proto: &proto::Type) -> DriverResult<Self> {
        let kind = match proto::TypeEncoding::try_from(proto.encoding) {
            Ok(proto::TypeEncoding::ThingType) => TypeKind::Thing,
            Ok(proto::TypeEncoding::EntityType) => TypeKind::Entity,
            Ok(proto::TypeEncoding::RelationType) => TypeKind::Relation,
            Ok(proto::TypeEncoding::AttributeType) => {
                TypeKind::Attribute(ValueKind::from_proto(proto.value_type)?)
            }
            Ok(proto::TypeEncoding::RoleType) => TypeKind::Role,
            Err(_) => {
                return Err(DriverError::Protocol(format!(
                    "unknown type encoding {}",
                    proto.encoding
                )));
            }
        };
        let label = if proto.scope.is_empty() {
            Label::new(proto.label.clone())
        } else {
            Label::scoped(proto.scope.clone(), proto.label.clone())
        };
        Ok(Self {
            label,
            kind,
            is_root: proto.is_root,
            is_abstract: proto.is_abstract,
        })
    }

    pub fn to_proto(&self) -> proto::Type {
        let (encoding, value_type) = match self.kind {
            TypeKind::Thing => (proto::TypeEncoding::ThingType, ValueKind::Object),
            TypeKind::Entity => (proto::TypeEncoding::EntityType, ValueKind::Object),
            TypeKind::Relation => (proto::TypeEncoding::RelationType, ValueKind::Object),
            TypeKind::Attribute(kind) => (proto::TypeEncoding::AttributeType, kind),
            TypeKind::Role => (proto::TypeEncoding::RoleType, ValueKind::Object),
        };
        proto::Type {
            label: self.label.name.clone(),
            scope: self.label.scope.clone().unwrap_or_default(),
            encoding: encoding as i32,
            value_type: value_type.to_proto() as i32,
            is_root: self.is_root,
            is_abstract: self.is_abstract,
        }
    }

    /// Value kind of an attribute type.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self.kind {
            TypeKind::Attribute(kind) => Some(kind),
            _ => None,
        }
    }

    fn request(&self, req: type_req::Req) -> transaction_req::Req {
        transaction_req::Req::TypeReq(proto::TypeReq {
            label: self.label.name.clone(),
            scope: self.label.scope.clone().unwrap_or_default(),
            req: Some(req),
        })
    }

    fn writable_kind(&self, value: &Value) -> DriverResult<()> {
        match self.value_kind() {
            Some(kind) if kind.is_writable() && kind == value.kind() => Ok(()),
            Some(kind) => Err(DriverError::InvalidArgument(format!(
                "cannot use a {} value with {} attribute type {}",
                value.kind(),
                kind,
                self.label
            ))),
            None => Err(DriverError::InvalidArgument(format!(
                "{} is not an attribute type",
                self.label
            ))),
        }
    }

    pub async fn delete(&self, tx: &Transaction) -> DriverResult<()> {
        let req = self.request(type_req::Req::Delete(proto::EmptyReq {}));
        tx.run(Unary::new(req, decode_unit)).await
    }

    /// Relabel the type; returns the relabelled value.
    pub async fn set_label(&self, tx: &Transaction, label: &str) -> DriverResult<Type> {
        let req = self.request(type_req::Req::SetLabel(proto::SetLabelReq {
            label: label.to_string(),
        }));
        tx.run(Unary::new(req, decode_unit)).await?;
        let mut renamed = self.clone();
        renamed.label.name = label.to_string();
        Ok(renamed)
    }

    pub fn get_supertypes(
        &self,
        tx: &Transaction,
    ) -> DriverResult<BoxStream<'static, DriverResult<Type>>> {
        let req = self.request(type_req::Req::GetSupertypes(proto::EmptyReq {}));
        tx.stream(Streamed::new(req, decode_types))
    }

    pub fn get_subtypes(
        &self,
        tx: &Transaction,
    ) -> DriverResult<BoxStream<'static, DriverResult<Type>>> {
        let req = self.request(type_req::Req::GetSubtypes(proto::EmptyReq {}));
        tx.stream(Streamed::new(req, decode_types))
    }

    pub fn get_instances(
        &self,
        tx: &Transaction,
    ) -> DriverResult<BoxStream<'static, DriverResult<Thing>>> {
        let req = self.request(type_req::Req::GetInstances(proto::EmptyReq {}));
        tx.stream(Streamed::new(req, decode_things))
    }

    /// Create an instance of an entity or relation type.
    pub async fn create(&self, tx: &Transaction) -> DriverResult<Thing> {
        if !matches!(self.kind, TypeKind::Entity | TypeKind::Relation) {
            return Err(DriverError::InvalidArgument(format!(
                "{} is not an entity or relation type",
                self.label
            )));
        }
        let req = self.request(type_req::Req::Create(proto::EmptyReq {}));
        tx.run(Unary::new(req, decode_thing))
            .await?
            .ok_or_else(|| unexpected("created thing"))
    }

    /// Put an attribute of this type with `value`.
    pub async fn put(&self, tx: &Transaction, value: impl Into<Value>) -> DriverResult<Thing> {
        let value = value.into();
        self.writable_kind(&value)?;
        let req = self.request(type_req::Req::AttributePut(value.to_proto()));
        tx.run(Unary::new(req, decode_thing))
            .await?
            .ok_or_else(|| unexpected("attribute"))
    }

    /// The attribute of this type holding `value`, if one exists.
    pub async fn get(&self, tx: &Transaction, value: impl Into<Value>) -> DriverResult<Option<Thing>> {
        let value = value.into();
        self.writable_kind(&value)?;
        let req = self.request(type_req::Req::AttributeGet(value.to_proto()));
        tx.run(Unary::new(req, decode_thing)).await
    }

    /// Types that own attributes of this type, optionally only as keys.
    pub fn get_owners(
        &self,
        tx: &Transaction,
        only_key: bool,
    ) -> DriverResult<BoxStream<'static, DriverResult<Type>>> {
        let Some(kind) = self.value_kind() else {
            return Err(DriverError::InvalidArgument(format!(
                "{} is not an attribute type",
                self.label
            )));
        };
        if only_key && !kind.is_keyable() {
            return Err(DriverError::InvalidArgument(format!(
                "{kind} attributes cannot be keys"
            )));
        }
        let req = self.request(type_req::Req::AttributeGetOwners(proto::GetOwnersReq { only_key }));
        tx.stream(Streamed::new(req, decode_types))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

fn decode_unit(res: transaction_res::Res) -> DriverResult<()> {
    match res {
        transaction_res::Res::TypeRes(_) => Ok(()),
        _ => Err(unexpected("type_res")),
    }
}

fn decode_thing(res: transaction_res::Res) -> DriverResult<Option<Thing>> {
    match res {
        transaction_res::Res::TypeRes(res) => res.thing.as_ref().map(Thing::from_proto).transpose(),
        _ => Err(unexpected("type_res")),
    }
}

fn decode_types(part: transaction_res_part::Res) -> DriverResult<Vec<Type>> {
    match part {
        transaction_res_part::Res::TypeResPart(part) => {
            part.types.iter().map(Type::from_proto).collect()
        }
        _ => Err(unexpected("type_res_part")),
    }
}

fn decode_things(part: transaction_res_part::Res) -> DriverResult<Vec<Thing>> {
    match part {
        transaction_res_part::Res::TypeResPart(part) => {
            part.things.iter().map(Thing::from_proto).collect()
        }
        _ => Err(unexpected("type_res_part")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(kind: ValueKind) -> Type {
        Type {
            label: Label::new("age"),
            kind: TypeKind::Attribute(kind),
            is_root: false,
            is_abstract: false,
        }
    }

    #[test]
    fn role_labels_carry_their_scope() {
        let wire = proto::Type {
            label: "spouse".into(),
            scope: "marriage".into(),
            encoding: proto::TypeEncoding::RoleType as i32,
            ..Default::default()
        };
        let role = Type::from_proto(&wire).unwrap();
        assert_eq!(role.kind, TypeKind::Role);
        assert_eq!(role.label.to_string(), "marriage:spouse");
        assert_eq!(role.to_proto(), wire);
    }

    #[test]
    fn attribute_kind_comes_from_value_type() {
        let wire = proto::Type {
            label: "name".into(),
            encoding: proto::TypeEncoding::AttributeType as i32,
            value_type: proto::ValueType::String as i32,
            ..Default::default()
        };
        let ty = Type::from_proto(&wire).unwrap();
        assert_eq!(ty.value_kind(), Some(ValueKind::String));
    }

    #[test]
    fn values_must_match_attribute_kind() {
        let age = attribute(ValueKind::Long);
        assert!(age.writable_kind(&Value::Long(3)).is_ok());

        let err = age.writable_kind(&Value::from("three")).unwrap_err();
        assert_eq!(err.kind(), graphwire_rpc::ErrorKind::InvalidArgument);

        let root = attribute(ValueKind::Object);
        assert!(root.writable_kind(&Value::Long(3)).is_err());
    }

    #[test]
    fn unknown_encoding_is_a_protocol_error() {
        let wire = proto::Type {
            label: "x".into(),
            encoding: 99,
            ..Default::default()
        };
        assert!(Type::from_proto(&wire).is_err());
    }
}
