use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Comparison operator of a query condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

/// A field value an entity exposes to queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    U32(u32),
    Bool(bool),
    Decimal(Decimal),
    List(Vec<Value>),
}

impl Value {
    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::U32(a), Value::U32(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// A single predicate on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub op: Op,
    pub value: Value,
}

impl Cond {
    pub fn matches(&self, actual: &Value) -> bool {
        match self.op {
            Op::In => match &self.value {
                Value::List(items) => items.iter().any(|item| item == actual),
                _ => false,
            },
            Op::Eq => actual == &self.value,
            Op::Neq => actual != &self.value,
            op => match actual.compare(&self.value) {
                Some(ordering) => match op {
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Gte => ordering != Ordering::Less,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Lte => ordering != Ordering::Greater,
                    Op::Eq | Op::Neq | Op::In => false,
                },
                None => false,
            },
        }
    }
}

/// Entities that can be filtered by field name.
pub trait Queryable {
    /// Returns the current value of `field`, or `None` if the entity has no
    /// such field.
    fn field(&self, field: &str) -> Option<Value>;
}

/// A conjunction of field predicates.
///
/// Built fluently: `Conds::new().eq("state", 1u32).lt("scannable_at", now)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conds(BTreeMap<&'static str, Cond>);

impl Conds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &'static str, op: Op, value: impl Into<Value>) -> Self {
        self.0.insert(
            field,
            Cond {
                op,
                value: value.into(),
            },
        );
        self
    }

    pub fn eq(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Eq, value)
    }

    pub fn neq(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Neq, value)
    }

    pub fn gt(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Gt, value)
    }

    pub fn gte(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Gte, value)
    }

    pub fn lt(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Lt, value)
    }

    pub fn lte(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::Lte, value)
    }

    pub fn is_in(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.with(field, Op::In, value)
    }

    /// Adds every predicate of `other`, which wins on shared fields.
    pub fn and(mut self, other: &Conds) -> Self {
        self.0
            .extend(other.0.iter().map(|(field, cond)| (*field, cond.clone())));
        self
    }

    pub fn get(&self, field: &str) -> Option<&Cond> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates every predicate against `entity`. Unknown fields never match.
    pub fn matches<Q: Queryable + ?Sized>(&self, entity: &Q) -> bool {
        self.0.iter().all(|(field, cond)| {
            entity
                .field(field)
                .is_some_and(|actual| cond.matches(&actual))
        })
    }
}
