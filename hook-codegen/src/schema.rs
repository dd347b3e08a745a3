use std::fmt;

use serde_json::{Map, Number, Value};

/// The kinds of value a `FieldType` can describe.
/// Declaration order is the canonical order of union members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Boolean,
    Number,
    String,
    Array,
    Object,
    Null,
}

/// Structural type of a JSON value, or of every value seen so far at one position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// Nothing observed yet. Identity of `merge`.
    Unknown,
    Null,
    Boolean,
    Number,
    String,
    Array(Box<FieldType>),
    Object(ObjectType),
    /// At least two members, at most one per `Kind`, sorted by `Kind`.
    /// Build through `merge` or `union_of` to keep that shape.
    Union(Vec<FieldType>),
}

/// A field type plus whether some contributing object lacked the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSlot {
    pub field_type: FieldType,
    pub optional: bool,
}

impl FieldSlot {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: false,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: true,
        }
    }
}

/// Fields of an object type, in first-seen order.
/// Equality ignores the order: two objects are equal when they hold the same names with equal
/// slots.
#[derive(Clone, Debug, Default)]
pub struct ObjectType {
    fields: Vec<(String, FieldSlot)>,
}

impl ObjectType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any previous slot under the same name.
    pub fn with_field(mut self, name: impl Into<String>, slot: FieldSlot) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = slot,
            None => self.fields.push((name, slot)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSlot> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, slot)| slot)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSlot)> {
        self.fields.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields on both sides merge their types and stay optional if either side was.
    /// Fields on one side only become optional. Our fields keep their position, new ones are
    /// appended in the order `other` has them.
    pub fn merge(self, other: ObjectType) -> ObjectType {
        let mut theirs = other.fields;
        let mut fields = Vec::with_capacity(self.fields.len() + theirs.len());

        for (name, ours) in self.fields {
            match theirs.iter().position(|(other_name, _)| *other_name == name) {
                Some(index) => {
                    let (_, their_slot) = theirs.remove(index);
                    let slot = FieldSlot {
                        field_type: ours.field_type.merge(their_slot.field_type),
                        optional: ours.optional || their_slot.optional,
                    };
                    fields.push((name, slot));
                }
                None => fields.push((name, FieldSlot::optional(ours.field_type))),
            }
        }

        fields.extend(
            theirs
                .into_iter()
                .map(|(name, slot)| (name, FieldSlot::optional(slot.field_type))),
        );

        ObjectType { fields }
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, slot)| other.get(name) == Some(slot))
    }
}

impl Eq for ObjectType {}

impl FieldType {
    /// `None` for `Unknown` and `Union`, which describe zero or several kinds.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            FieldType::Unknown | FieldType::Union(_) => None,
            FieldType::Null => Some(Kind::Null),
            FieldType::Boolean => Some(Kind::Boolean),
            FieldType::Number => Some(Kind::Number),
            FieldType::String => Some(Kind::String),
            FieldType::Array(_) => Some(Kind::Array),
            FieldType::Object(_) => Some(Kind::Object),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldType::Unknown)
    }

    /// Build the smallest type describing all of `types`.
    pub fn union_of(types: impl IntoIterator<Item = FieldType>) -> FieldType {
        types
            .into_iter()
            .fold(FieldType::Unknown, |acc, field_type| acc.merge(field_type))
    }

    /// Combine two types into one describing values of either.
    ///
    /// The operation is commutative and associative up to object field order, and idempotent.
    /// Values of the same kind merge structurally, values of different kinds form a union that
    /// holds at most one member per kind.
    pub fn merge(self, other: FieldType) -> FieldType {
        match (self, other) {
            (FieldType::Unknown, other) | (other, FieldType::Unknown) => other,
            (FieldType::Null, FieldType::Null) => FieldType::Null,
            (FieldType::Boolean, FieldType::Boolean) => FieldType::Boolean,
            (FieldType::Number, FieldType::Number) => FieldType::Number,
            (FieldType::String, FieldType::String) => FieldType::String,
            (FieldType::Array(ours), FieldType::Array(theirs)) => {
                FieldType::Array(Box::new(ours.merge(*theirs)))
            }
            (FieldType::Object(ours), FieldType::Object(theirs)) => {
                FieldType::Object(ours.merge(theirs))
            }
            (ours, theirs) => {
                let mut members = ours.into_members();
                for incoming in theirs.into_members() {
                    let kind = incoming.kind();
                    match members.iter().position(|member| member.kind() == kind) {
                        Some(index) => {
                            let existing = members.remove(index);
                            members.push(existing.merge(incoming));
                        }
                        None => members.push(incoming),
                    }
                }
                FieldType::from_members(members)
            }
        }
    }

    fn into_members(self) -> Vec<FieldType> {
        match self {
            FieldType::Unknown => Vec::new(),
            FieldType::Union(members) => members,
            other => vec![other],
        }
    }

    fn from_members(mut members: Vec<FieldType>) -> FieldType {
        members.sort_by_key(FieldType::kind);
        match members.len() {
            0 => FieldType::Unknown,
            1 => members.remove(0),
            _ => FieldType::Union(members),
        }
    }

    /// JSON values which, unified together, describe exactly this type.
    /// Every union member and every optional field's absence is represented.
    pub fn example_values(&self) -> Vec<Value> {
        match self {
            FieldType::Unknown => Vec::new(),
            FieldType::Null => vec![Value::Null],
            FieldType::Boolean => vec![Value::Bool(true)],
            FieldType::Number => vec![Value::Number(Number::from(0))],
            FieldType::String => vec![Value::String(String::new())],
            FieldType::Array(element) => vec![Value::Array(element.example_values())],
            FieldType::Union(members) => members.iter().flat_map(Self::example_values).collect(),
            FieldType::Object(object) => {
                let per_field: Vec<(&str, bool, Vec<Value>)> = object
                    .fields()
                    .map(|(name, slot)| (name, slot.optional, slot.field_type.example_values()))
                    .filter(|(_, _, examples)| !examples.is_empty())
                    .collect();

                let width = per_field
                    .iter()
                    .map(|(_, _, examples)| examples.len())
                    .max()
                    .unwrap_or(1);

                let mut values: Vec<Value> = (0..width)
                    .map(|i| {
                        Value::Object(
                            per_field
                                .iter()
                                .map(|(name, _, examples)| {
                                    (name.to_string(), examples[i % examples.len()].clone())
                                })
                                .collect::<Map<String, Value>>(),
                        )
                    })
                    .collect();

                if per_field.iter().any(|(_, optional, _)| *optional) {
                    values.push(Value::Object(
                        per_field
                            .iter()
                            .filter(|(_, optional, _)| !optional)
                            .map(|(name, _, examples)| (name.to_string(), examples[0].clone()))
                            .collect(),
                    ));
                }

                values
            }
        }
    }
}

impl From<&Value> for FieldType {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(items) => {
                FieldType::Array(Box::new(FieldType::union_of(items.iter().map(FieldType::from))))
            }
            Value::Object(map) => FieldType::Object(ObjectType {
                fields: map
                    .iter()
                    .map(|(name, value)| (name.clone(), FieldSlot::required(value.into())))
                    .collect(),
            }),
        }
    }
}

/// Compact notation, used in logs and test failures: `{a: number, b?: string | null}`.
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Unknown => write!(f, "unknown"),
            FieldType::Null => write!(f, "null"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Number => write!(f, "number"),
            FieldType::String => write!(f, "string"),
            FieldType::Array(element) if matches!(**element, FieldType::Union(_)) => {
                write!(f, "({element})[]")
            }
            FieldType::Array(element) => write!(f, "{element}[]"),
            FieldType::Object(object) => {
                write!(f, "{{")?;
                for (i, (name, slot)) in object.fields().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let marker = if slot.optional { "?" } else { "" };
                    write!(f, "{name}{marker}: {}", slot.field_type)?;
                }
                write!(f, "}}")
            }
            FieldType::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}
