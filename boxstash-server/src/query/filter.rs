//! Document-style filter parsing and SQL rendering
//!
//! Accepts the filter shape the frontend and handlers already speak
//! (`{"name": {"$regex": "drill"}, "$or": [...]}`), validates it against a
//! [`Schema`] and renders parameterised predicates onto a
//! [`QueryBuilder`].

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::schema::{ColumnType, Field, Schema};
use crate::models::ValidationError;

/// A filter value coerced to its column's type
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Text(String),
    Uuid(Uuid),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s),
            Self::Uuid(u) => Some(u.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Timestamp(t) => Some(t.to_rfc3339()),
            Self::Date(d) => Some(d.to_string()),
        }
    }
}

/// Operator applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Eq(Scalar),
    Ne(Scalar),
    Gt(Scalar),
    Gte(Scalar),
    Lt(Scalar),
    Lte(Scalar),
    In(Vec<Scalar>),
    Nin(Vec<Scalar>),
    /// Case-insensitive substring match, already converted to a LIKE pattern
    Like(String),
    Exists(bool),
}

/// Parsed filter tree
#[derive(Debug, Clone)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Predicate { field: &'static Field, op: Op },
}

impl Filter {
    /// Filter matching every row
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Parse a filter document against a collection schema.
    ///
    /// Unknown fields and operators are rejected rather than guessed at.
    pub fn parse(schema: &Schema, doc: &Value) -> Result<Self, ValidationError> {
        let obj = doc.as_object().ok_or(ValidationError::InvalidFormat {
            field: "filter",
            reason: "filter must be a JSON object",
        })?;

        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            match key.as_str() {
                "$or" => parts.push(Self::Or(Self::parse_list(schema, value)?)),
                "$and" => parts.push(Self::And(Self::parse_list(schema, value)?)),
                op if op.starts_with('$') => {
                    return Err(ValidationError::UnknownOperator {
                        operator: op.to_owned(),
                    })
                }
                _ => {
                    let field = schema
                        .field(key)
                        .ok_or_else(|| ValidationError::UnknownField { field: key.clone() })?;
                    parts.extend(parse_field(field, value)?);
                }
            }
        }

        if parts.len() == 1 {
            Ok(parts.remove(0))
        } else {
            Ok(Self::And(parts))
        }
    }

    fn parse_list(schema: &Schema, value: &Value) -> Result<Vec<Self>, ValidationError> {
        let docs = value.as_array().ok_or(ValidationError::InvalidFormat {
            field: "filter",
            reason: "$or / $and expect an array of filter documents",
        })?;
        docs.iter().map(|doc| Self::parse(schema, doc)).collect()
    }

    /// Combine two filters with AND, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), other) | (other, Self::And(mut a)) => {
                a.push(other);
                Self::And(a)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    /// Render the predicate onto a query builder.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        match self {
            Self::And(parts) => push_joined(qb, parts, " AND ", "TRUE"),
            Self::Or(parts) => push_joined(qb, parts, " OR ", "FALSE"),
            Self::Predicate { field, op } => {
                if field.ty == ColumnType::TextArray {
                    push_array_predicate(qb, field.column, op);
                } else {
                    push_scalar_predicate(qb, field, op);
                }
            }
        }
    }
}

fn push_joined(
    qb: &mut QueryBuilder<'static, Postgres>,
    parts: &[Filter],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        part.push_sql(qb);
    }
    qb.push(")");
}

fn parse_field(field: &'static Field, value: &Value) -> Result<Vec<Filter>, ValidationError> {
    let predicate = |op| Filter::Predicate { field, op };

    match value {
        Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
            parse_operators(field, ops)?
                .into_iter()
                .map(|op| Ok(predicate(op)))
                .collect()
        }
        Value::Object(_) => Err(ValidationError::InvalidFormat {
            field: field.name,
            reason: "nested documents are not supported",
        }),
        Value::Array(_) => Err(ValidationError::InvalidFormat {
            field: field.name,
            reason: "use $in to match a list of values",
        }),
        scalar => Ok(vec![predicate(Op::Eq(coerce(field, scalar)?))]),
    }
}

fn parse_operators(field: &'static Field, ops: &Map<String, Value>) -> Result<Vec<Op>, ValidationError> {
    if ops.contains_key("$options") && !ops.contains_key("$regex") {
        return Err(ValidationError::InvalidFormat {
            field: field.name,
            reason: "$options is only valid with $regex",
        });
    }

    let mut parsed = Vec::with_capacity(ops.len());
    for (op, arg) in ops {
        let op = match op.as_str() {
            "$eq" => Op::Eq(coerce(field, arg)?),
            "$ne" => Op::Ne(coerce(field, arg)?),
            "$gt" => Op::Gt(comparable(field, arg)?),
            "$gte" => Op::Gte(comparable(field, arg)?),
            "$lt" => Op::Lt(comparable(field, arg)?),
            "$lte" => Op::Lte(comparable(field, arg)?),
            "$in" => Op::In(coerce_list(field, arg)?),
            "$nin" => Op::Nin(coerce_list(field, arg)?),
            "$regex" => {
                let pattern = arg.as_str().ok_or(ValidationError::InvalidFormat {
                    field: field.name,
                    reason: "$regex expects a string",
                })?;
                Op::Like(like_pattern(pattern))
            }
            "$exists" => Op::Exists(arg.as_bool().ok_or(ValidationError::InvalidFormat {
                field: field.name,
                reason: "$exists expects a boolean",
            })?),
            // Case-insensitivity is always on
            "$options" => continue,
            other => {
                return Err(ValidationError::UnknownOperator {
                    operator: other.to_owned(),
                })
            }
        };
        parsed.push(op);
    }
    Ok(parsed)
}

fn comparable(field: &'static Field, value: &Value) -> Result<Scalar, ValidationError> {
    if field.ty == ColumnType::TextArray {
        return Err(ValidationError::InvalidFormat {
            field: field.name,
            reason: "comparison operators are not supported on list fields",
        });
    }
    match coerce(field, value)? {
        Scalar::Null => Err(ValidationError::InvalidFormat {
            field: field.name,
            reason: "cannot compare against null",
        }),
        scalar => Ok(scalar),
    }
}

fn coerce_list(field: &'static Field, value: &Value) -> Result<Vec<Scalar>, ValidationError> {
    let values = value.as_array().ok_or(ValidationError::InvalidFormat {
        field: field.name,
        reason: "$in / $nin expect an array",
    })?;
    values
        .iter()
        .map(|v| match coerce(field, v)? {
            Scalar::Null => Err(ValidationError::InvalidFormat {
                field: field.name,
                reason: "null is not allowed in $in / $nin",
            }),
            scalar => Ok(scalar),
        })
        .collect()
}

/// Coerce a JSON value to the field's column type.
fn coerce(field: &'static Field, value: &Value) -> Result<Scalar, ValidationError> {
    let invalid = |reason| ValidationError::InvalidFormat {
        field: field.name,
        reason,
    };

    if value.is_null() {
        return Ok(Scalar::Null);
    }
    if value.is_object() || value.is_array() {
        return Err(invalid("expected a scalar value"));
    }

    let text = value
        .as_str()
        .map(str::to_owned)
        .unwrap_or_else(|| value.to_string());

    match field.ty {
        ColumnType::Text | ColumnType::TextArray => Ok(Scalar::Text(text)),
        ColumnType::Uuid => Uuid::parse_str(&text)
            .map(Scalar::Uuid)
            .map_err(|_| invalid("expected a UUID")),
        ColumnType::Int => value
            .as_i64()
            .or_else(|| text.parse().ok())
            .map(Scalar::Int)
            .ok_or_else(|| invalid("expected an integer")),
        ColumnType::Float => value
            .as_f64()
            .or_else(|| text.parse().ok())
            .map(Scalar::Float)
            .ok_or_else(|| invalid("expected a number")),
        ColumnType::Bool => value
            .as_bool()
            .or_else(|| text.parse().ok())
            .map(Scalar::Bool)
            .ok_or_else(|| invalid("expected a boolean")),
        ColumnType::Timestamp => DateTime::parse_from_rfc3339(&text)
            .map(|t| Scalar::Timestamp(t.with_timezone(&Utc)))
            .map_err(|_| invalid("expected an RFC 3339 timestamp")),
        ColumnType::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Scalar::Date)
            .map_err(|_| invalid("expected a YYYY-MM-DD date")),
    }
}

/// Turn a search term into a substring LIKE pattern, escaping `%`, `_` and `\`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_bind(qb: &mut QueryBuilder<'static, Postgres>, value: &Scalar) {
    match value.clone() {
        Scalar::Null => qb.push("NULL"),
        Scalar::Text(v) => qb.push_bind(v),
        Scalar::Uuid(v) => qb.push_bind(v),
        Scalar::Int(v) => qb.push_bind(v),
        Scalar::Float(v) => qb.push_bind(v),
        Scalar::Bool(v) => qb.push_bind(v),
        Scalar::Timestamp(v) => qb.push_bind(v),
        Scalar::Date(v) => qb.push_bind(v),
    };
}

fn push_list(qb: &mut QueryBuilder<'static, Postgres>, values: &[Scalar]) {
    qb.push("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_bind(qb, value);
    }
    qb.push(")");
}

fn push_scalar_predicate(qb: &mut QueryBuilder<'static, Postgres>, field: &Field, op: &Op) {
    let column = field.column;
    let comparison = |qb: &mut QueryBuilder<'static, Postgres>, sql_op: &str, value: &Scalar| {
        qb.push(column).push(sql_op);
        push_bind(qb, value);
    };

    match op {
        Op::Eq(Scalar::Null) | Op::Exists(false) => {
            qb.push(column).push(" IS NULL");
        }
        Op::Ne(Scalar::Null) | Op::Exists(true) => {
            qb.push(column).push(" IS NOT NULL");
        }
        Op::Eq(v) => comparison(qb, " = ", v),
        Op::Ne(v) => comparison(qb, " IS DISTINCT FROM ", v),
        Op::Gt(v) => comparison(qb, " > ", v),
        Op::Gte(v) => comparison(qb, " >= ", v),
        Op::Lt(v) => comparison(qb, " < ", v),
        Op::Lte(v) => comparison(qb, " <= ", v),
        Op::In(values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Op::In(values) => {
            qb.push(column).push(" IN ");
            push_list(qb, values);
        }
        Op::Nin(values) if values.is_empty() => {
            qb.push("TRUE");
        }
        Op::Nin(values) => {
            qb.push("(").push(column).push(" IS NULL OR ").push(column).push(" NOT IN ");
            push_list(qb, values);
            qb.push(")");
        }
        Op::Like(pattern) => {
            qb.push(column);
            if field.ty != ColumnType::Text {
                qb.push("::text");
            }
            qb.push(" ILIKE ").push_bind(pattern.clone());
        }
    }
}

fn push_array_predicate(qb: &mut QueryBuilder<'static, Postgres>, column: &'static str, op: &Op) {
    let texts = |values: &[Scalar]| -> Vec<String> {
        values.iter().cloned().filter_map(Scalar::into_text).collect()
    };

    match op {
        Op::Eq(Scalar::Null) | Op::Exists(false) => {
            qb.push(column).push(" IS NULL");
        }
        Op::Ne(Scalar::Null) | Op::Exists(true) => {
            qb.push(column).push(" IS NOT NULL");
        }
        Op::Eq(v) => {
            push_bind(qb, v);
            qb.push(" = ANY(").push(column).push(")");
        }
        Op::Ne(v) => {
            qb.push("NOT (");
            push_bind(qb, v);
            qb.push(" = ANY(").push(column).push("))");
        }
        Op::In(values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Op::In(values) => {
            qb.push(column).push(" && ").push_bind(texts(values));
        }
        Op::Nin(values) if values.is_empty() => {
            qb.push("TRUE");
        }
        Op::Nin(values) => {
            qb.push("NOT (").push(column).push(" && ").push_bind(texts(values)).push(")");
        }
        Op::Like(pattern) => {
            qb.push("EXISTS (SELECT 1 FROM unnest(")
                .push(column)
                .push(") AS elem WHERE elem ILIKE ")
                .push_bind(pattern.clone())
                .push(")");
        }
        // Rejected while parsing
        Op::Gt(_) | Op::Gte(_) | Op::Lt(_) | Op::Lte(_) => {
            qb.push("FALSE");
        }
    }
}
