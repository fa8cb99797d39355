//! Things (instances) and their transaction-bound operations.

use std::collections::HashMap;
use std::fmt;

use futures::TryStreamExt;
use futures::stream::BoxStream;
use graphwire_rpc::proto::{self, thing_req, transaction_req, transaction_res, transaction_res_part};
use graphwire_rpc::{DriverError, DriverResult};

use crate::concept::thing_type::{Type, TypeKind};
use crate::concept::value::Value;
use crate::operation::{Streamed, Unary, unexpected};
use crate::transaction::Transaction;

/// An entity, relation or attribute instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    pub iid: Vec<u8>,
    pub thing_type: Type,
    /// Set for attributes.
    pub value: Option<Value>,
    pub inferred: bool,
}

impl Thing {
    pub fn from_proto(proto: &proto::Thing) -> DriverResult<Self> {
        let thing_type = proto
            .thing_type
            .as_ref()
            .ok_or_else(|| DriverError::Protocol("thing without a type".into()))?;
        Ok(Self {
            iid: proto.iid.clone(),
            thing_type: Type::from_proto(thing_type)?,
            value: proto.value.as_ref().map(Value::from_proto).transpose()?,
            inferred: proto.inferred,
        })
    }

    pub fn to_proto(&self) -> proto::Thing {
        proto::Thing {
            iid: self.iid.clone(),
            thing_type: Some(self.thing_type.to_proto()),
            value: self.value.as_ref().map(Value::to_proto),
            inferred: self.inferred,
        }
    }

    /// The iid as lowercase hex, prefixed with `0x`.
    pub fn iid_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.iid))
    }

    pub fn is_relation(&self) -> bool {
        self.thing_type.kind == TypeKind::Relation
    }

    fn request(&self, req: thing_req::Req) -> transaction_req::Req {
        transaction_req::Req::ThingReq(proto::ThingReq {
            iid: self.iid.clone(),
            req: Some(req),
        })
    }

    fn ensure_relation(&self) -> DriverResult<()> {
        if self.is_relation() {
            Ok(())
        } else {
            Err(DriverError::InvalidArgument(format!(
                "{} is not a relation",
                self.iid_hex()
            )))
        }
    }

    fn role_player(role_type: &Type, player: &Thing) -> DriverResult<proto::RolePlayerReq> {
        if role_type.kind != TypeKind::Role {
            return Err(DriverError::InvalidArgument(format!(
                "{} is not a role type",
                role_type.label
            )));
        }
        Ok(proto::RolePlayerReq {
            role_type: Some(role_type.to_proto()),
            player: Some(player.to_proto()),
        })
    }

    pub async fn delete(&self, tx: &Transaction) -> DriverResult<()> {
        let req = self.request(thing_req::Req::Delete(proto::EmptyReq {}));
        tx.run(Unary::new(req, decode_unit)).await
    }

    /// Add `player` to this relation in `role_type`.
    pub async fn add_player(
        &self,
        tx: &Transaction,
        role_type: &Type,
        player: &Thing,
    ) -> DriverResult<()> {
        self.ensure_relation()?;
        let req = self.request(thing_req::Req::RelationAddPlayer(Self::role_player(
            role_type, player,
        )?));
        tx.run(Unary::new(req, decode_unit)).await
    }

    pub async fn remove_player(
        &self,
        tx: &Transaction,
        role_type: &Type,
        player: &Thing,
    ) -> DriverResult<()> {
        self.ensure_relation()?;
        let req = self.request(thing_req::Req::RelationRemovePlayer(Self::role_player(
            role_type, player,
        )?));
        tx.run(Unary::new(req, decode_unit)).await
    }

    /// Players of this relation, restricted to `role_types` unless empty.
    pub fn get_players(
        &self,
        tx: &Transaction,
        role_types: &[Type],
    ) -> DriverResult<BoxStream<'static, DriverResult<Thing>>> {
        self.ensure_relation()?;
        let req = self.request(thing_req::Req::RelationGetPlayers(proto::GetPlayersReq {
            role_types: role_types.iter().map(Type::to_proto).collect(),
        }));
        tx.stream(Streamed::new(req, decode_players))
    }

    /// Players of this relation grouped by role label.
    pub async fn get_players_by_role_type(
        &self,
        tx: &Transaction,
    ) -> DriverResult<HashMap<String, Vec<Thing>>> {
        self.ensure_relation()?;
        let req = self.request(thing_req::Req::RelationGetPlayersByRoleType(proto::EmptyReq {}));
        let mut role_players = tx.stream(Streamed::new(req, decode_role_players))?;

        let mut by_role: HashMap<String, Vec<Thing>> = HashMap::new();
        while let Some((role_type, player)) = role_players.try_next().await? {
            by_role
                .entry(role_type.label.to_string())
                .or_default()
                .push(player);
        }
        Ok(by_role)
    }
}

impl fmt::Display for Thing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} isa {}", self.iid_hex(), self.thing_type)?;
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

fn decode_unit(res: transaction_res::Res) -> DriverResult<()> {
    match res {
        transaction_res::Res::ThingRes(_) => Ok(()),
        _ => Err(unexpected("thing_res")),
    }
}

fn decode_players(part: transaction_res_part::Res) -> DriverResult<Vec<Thing>> {
    match part {
        transaction_res_part::Res::ThingResPart(part) => {
            part.things.iter().map(Thing::from_proto).collect()
        }
        _ => Err(unexpected("thing_res_part")),
    }
}

fn decode_role_players(part: transaction_res_part::Res) -> DriverResult<Vec<(Type, Thing)>> {
    match part {
        transaction_res_part::Res::ThingResPart(part) => part
            .role_players
            .iter()
            .map(|rp| -> DriverResult<(Type, Thing)> {
                let role_type = rp.role_type.as_ref().ok_or_else(|| unexpected("role type"))?;
                let player = rp.player.as_ref().ok_or_else(|| unexpected("player"))?;
                Ok((Type::from_proto(role_type)?, Thing::from_proto(player)?))
            })
            .collect(),
        _ => Err(unexpected("thing_res_part")),
    }
}
