//! Fluent find builder over a [`Collection`]
//!
//! ```ignore
//! let items = Find::<ItemRecord>::new(filter)
//!     .sort("updatedAt", Order::Desc)
//!     .limit(20)
//!     .skip(40)
//!     .populate("box")
//!     .exec(&pool)
//!     .await?;
//! ```

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::filter::Filter;
use super::schema::Schema;
use crate::db::DbError;
use crate::models::{Pagination, ValidationError};

/// A table that can be queried through [`Find`]
#[async_trait]
pub trait Collection: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    fn schema() -> &'static Schema;

    /// Load a related record into already fetched rows.
    async fn populate(rows: &mut [Self], path: &str, pool: &PgPool) -> Result<(), DbError> {
        let _ = (rows, pool);
        Err(ValidationError::UnknownField {
            field: path.to_owned(),
        }
        .into())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Deferred query: nothing hits the database until [`Find::exec`] or [`Find::count`]
pub struct Find<T> {
    filter: Filter,
    sort: Vec<(&'static str, Order)>,
    limit: Option<i64>,
    skip: Option<i64>,
    populate: Vec<&'static str>,
    _collection: PhantomData<fn() -> T>,
}

impl<T: Collection> Find<T> {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            limit: None,
            skip: None,
            populate: Vec::new(),
            _collection: PhantomData,
        }
    }

    pub fn all() -> Self {
        Self::new(Filter::all())
    }

    pub fn sort(mut self, field: &'static str, order: Order) -> Self {
        self.sort.push((field, order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Shorthand for `limit` + `skip` from a page.
    pub fn page(self, page: Pagination) -> Self {
        self.limit(page.limit()).skip(page.offset())
    }

    pub fn populate(mut self, path: &'static str) -> Self {
        self.populate.push(path);
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" WHERE ");
        self.filter.push_sql(qb);
    }

    /// Build the SELECT statement.
    pub fn build(&self) -> Result<QueryBuilder<'static, Postgres>, ValidationError> {
        let schema = T::schema();
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", schema.table));
        self.push_where(&mut qb);

        for (i, (name, order)) in self.sort.iter().enumerate() {
            let field = schema
                .field(name)
                .ok_or_else(|| ValidationError::UnknownField {
                    field: (*name).to_owned(),
                })?;
            qb.push(if i == 0 { " ORDER BY " } else { ", " });
            qb.push(field.column).push(" ").push(order.as_sql());
        }

        if let Some(limit) = self.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if let Some(skip) = self.skip {
            qb.push(" OFFSET ").push_bind(skip);
        }
        Ok(qb)
    }

    /// Run the query, then load every requested relation.
    pub async fn exec(self, pool: &PgPool) -> Result<Vec<T>, DbError> {
        let mut qb = self.build()?;
        let mut rows: Vec<T> = qb.build_query_as::<T>().fetch_all(pool).await?;

        for path in &self.populate {
            T::populate(&mut rows, path, pool).await?;
        }
        Ok(rows)
    }

    /// Count rows matching the filter, ignoring sort and paging.
    pub async fn count(&self, pool: &PgPool) -> Result<i64, DbError> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::schema().table));
        self.push_where(&mut qb);
        let total: i64 = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::schema::fixtures::GADGETS;
    use serde_json::json;

    #[derive(Debug, FromRow)]
    #[allow(dead_code)]
    struct Gadget {
        name: String,
    }

    impl Collection for Gadget {
        fn schema() -> &'static Schema {
            &GADGETS
        }
    }

    #[test]
    fn builds_select_with_sort_and_paging() {
        let filter = Filter::parse(&GADGETS, &json!({"name": {"$regex": "saw"}})).unwrap();
        let qb = Find::<Gadget>::new(filter)
            .sort("quantity", Order::Desc)
            .sort("name", Order::Asc)
            .page(Pagination::new(3, 10))
            .build()
            .unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM gadgets WHERE name ILIKE $1 ORDER BY quantity DESC, name ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn all_matches_everything() {
        let qb = Find::<Gadget>::all().build().unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM gadgets WHERE TRUE");
    }

    #[test]
    fn sort_field_is_validated() {
        let err = Find::<Gadget>::all()
            .sort("secret", Order::Asc)
            .build()
            .err().unwrap();
        assert!(matches!(err, ValidationError::UnknownField { .. }));
    }
}
