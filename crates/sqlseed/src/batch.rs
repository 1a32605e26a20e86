//! Per-chunk statement batches
//!
//! A [`Batch`] is filled by the line handler for every line of one chunk and
//! executed as a unit right after the chunk has been parsed. Statements run
//! in the order they were queued.

use uuid::Uuid;

/// A positional statement argument, forwarded to the driver as-is.
///
/// Every variant is nullable so a NULL still reaches the database with the
/// parameter type the statement expects.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Double(Option<f64>),
    Text(Option<String>),
    Bytes(Option<Vec<u8>>),
    Uuid(Option<Uuid>),
    Json(Option<serde_json::Value>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Bool(v) => v.is_none(),
            SqlValue::Int(v) => v.is_none(),
            SqlValue::BigInt(v) => v.is_none(),
            SqlValue::Double(v) => v.is_none(),
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Bytes(v) => v.is_none(),
            SqlValue::Uuid(v) => v.is_none(),
            SqlValue::Json(v) => v.is_none(),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(Some(value.into()))
                }
            }

            impl From<Option<$ty>> for SqlValue {
                fn from(value: Option<$ty>) -> Self {
                    SqlValue::$variant(value.map(Into::into))
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i32 => Int,
    i64 => BigInt,
    f64 => Double,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    serde_json::Value => Json,
}

/// One queued write statement and its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedQuery {
    query: String,
    arguments: Vec<SqlValue>,
}

impl QueuedQuery {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn arguments(&self) -> &[SqlValue] {
        &self.arguments
    }
}

/// Statements produced from one chunk of input lines
#[derive(Debug, Default)]
pub struct Batch {
    queued: Vec<QueuedQuery>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a statement using `$1..$n` placeholders.
    ///
    /// ```
    /// use sqlseed::{Batch, SqlValue};
    ///
    /// let mut batch = Batch::new();
    /// batch.queue(
    ///     r#"INSERT INTO "User" ("id", "name") VALUES ($1, $2)"#,
    ///     vec![SqlValue::from(1i32), SqlValue::from("Ada")],
    /// );
    /// assert_eq!(batch.len(), 1);
    /// ```
    pub fn queue<Q, A>(&mut self, query: Q, arguments: A) -> &QueuedQuery
    where
        Q: Into<String>,
        A: IntoIterator<Item = SqlValue>,
    {
        self.queued.push(QueuedQuery {
            query: query.into(),
            arguments: arguments.into_iter().collect(),
        });
        &self.queued[self.queued.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueuedQuery> {
        self.queued.iter()
    }

    pub fn queries(&self) -> &[QueuedQuery] {
        &self.queued
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a QueuedQuery;
    type IntoIter = std::slice::Iter<'a, QueuedQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
