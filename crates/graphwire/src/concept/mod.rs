//! Concepts: immutable values decoded from the wire.
//!
//! Operations that need the server take the [`crate::Transaction`] as an
//! explicit argument; concept values hold no connection state.

mod manager;
mod thing;
mod thing_type;
mod value;

use std::collections::HashMap;
use std::fmt;

use graphwire_rpc::proto::{self, concept, numeric};
use graphwire_rpc::{DriverError, DriverResult};

pub use manager::ConceptManager;
pub use thing::Thing;
pub use thing_type::{Label, Type, TypeKind};
pub use value::{Value, ValueKind};

/// An inference rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub label: String,
    pub when: String,
    pub then: String,
}

impl Rule {
    pub fn from_proto(proto: &proto::Rule) -> Self {
        Self {
            label: proto.label.clone(),
            when: proto.when.clone(),
            then: proto.then.clone(),
        }
    }

    pub fn to_proto(&self) -> proto::Rule {
        proto::Rule {
            label: self.label.clone(),
            when: self.when.clone(),
            then: self.then.clone(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}: when {{ {} }} then {{ {} }}", self.label, self.when, self.then)
    }
}

/// A type or a thing.
#[derive(Debug, Clone, PartialEq)]
pub enum Concept {
    Type(Type),
    Thing(Thing),
}

impl Concept {
    pub fn from_proto(proto: &proto::Concept) -> DriverResult<Self> {
        match &proto.concept {
            Some(concept::Concept::Type(ty)) => Ok(Concept::Type(Type::from_proto(ty)?)),
            Some(concept::Concept::Thing(thing)) => Ok(Concept::Thing(Thing::from_proto(thing)?)),
            None => Err(DriverError::Protocol("empty concept".into())),
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Concept::Type(ty) => Some(ty),
            Concept::Thing(_) => None,
        }
    }

    pub fn as_thing(&self) -> Option<&Thing> {
        match self {
            Concept::Thing(thing) => Some(thing),
            Concept::Type(_) => None,
        }
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concept::Type(ty) => write!(f, "{ty}"),
            Concept::Thing(thing) => write!(f, "{thing}"),
        }
    }
}

/// One answer of a match query: variable name to concept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptMap {
    map: HashMap<String, Concept>,
}

impl ConceptMap {
    pub fn from_proto(proto: &proto::ConceptMap) -> DriverResult<Self> {
        let map = proto
            .map
            .iter()
            .map(|(variable, concept)| Ok((variable.clone(), Concept::from_proto(concept)?)))
            .collect::<DriverResult<_>>()?;
        Ok(Self { map })
    }

    pub fn get(&self, variable: &str) -> Option<&Concept> {
        self.map.get(variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Display for ConceptMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut variables: Vec<_> = self.map.keys().collect();
        variables.sort();
        f.write_str("{")?;
        for (i, variable) in variables.into_iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, " ${variable} {}", self.map[variable])?;
        }
        f.write_str(" }")
    }
}

/// The result of an aggregate query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Long(i64),
    Double(f64),
    /// The aggregate is undefined, e.g. the mean of nothing.
    NaN,
}

impl Numeric {
    pub fn from_proto(proto: &proto::Numeric) -> DriverResult<Self> {
        match proto.value {
            Some(numeric::Value::LongValue(v)) => Ok(Numeric::Long(v)),
            Some(numeric::Value::DoubleValue(v)) => Ok(Numeric::Double(v)),
            Some(numeric::Value::Nan(_)) => Ok(Numeric::NaN),
            None => Err(DriverError::Protocol("empty numeric".into())),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Long(v) => v as f64,
            Numeric::Double(v) => v,
            Numeric::NaN => f64::NAN,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Long(v) => write!(f, "{v}"),
            Numeric::Double(v) => write!(f, "{v}"),
            Numeric::NaN => f.write_str("NaN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_type(label: &str) -> proto::Type {
        proto::Type {
            label: label.into(),
            encoding: proto::TypeEncoding::EntityType as i32,
            ..Default::default()
        }
    }

    #[test]
    fn concept_map_decodes_every_variable() {
        let wire = proto::ConceptMap {
            map: [
                (
                    "p".to_string(),
                    proto::Concept {
                        concept: Some(concept::Concept::Thing(proto::Thing {
                            iid: vec![1],
                            thing_type: Some(entity_type("person")),
                            value: None,
                            inferred: false,
                        })),
                    },
                ),
                (
                    "t".to_string(),
                    proto::Concept {
                        concept: Some(concept::Concept::Type(entity_type("person"))),
                    },
                ),
            ]
            .into_iter()
            .collect(),
        };
        let answer = ConceptMap::from_proto(&wire).unwrap();
        assert_eq!(answer.len(), 2);
        assert_eq!(answer.get("t").unwrap().as_type().unwrap().label.name, "person");
        assert_eq!(answer.get("p").unwrap().as_thing().unwrap().iid, vec![1]);
        assert_eq!(answer.to_string(), "{ $p 0x01 isa person; $t person }");
    }

    #[test]
    fn empty_concept_is_a_protocol_error() {
        let wire = proto::ConceptMap {
            map: [("x".to_string(), proto::Concept { concept: None })]
                .into_iter()
                .collect(),
        };
        assert!(ConceptMap::from_proto(&wire).is_err());
    }

    #[test]
    fn numeric_variants() {
        let nan = proto::Numeric {
            value: Some(numeric::Value::Nan(true)),
        };
        assert_eq!(Numeric::from_proto(&nan).unwrap().to_string(), "NaN");
        let long = proto::Numeric {
            value: Some(numeric::Value::LongValue(12)),
        };
        assert_eq!(Numeric::from_proto(&long).unwrap(), Numeric::Long(12));
        assert_eq!(Numeric::Long(12).as_f64(), 12.0);
    }
}
