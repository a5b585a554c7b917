//! Field schemas for filterable collections
//!
//! Each collection declares which API fields may appear in a filter
//! document, the column they map to and how their values are coerced.

/// Column type, drives value coercion and operator support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Uuid,
    Int,
    Float,
    Bool,
    Timestamp,
    Date,
    TextArray,
}

/// A filterable field
#[derive(Debug)]
pub struct Field {
    /// camelCase name used by the API
    pub name: &'static str,
    /// snake_case column name
    pub column: &'static str,
    pub ty: ColumnType,
    /// Extra names accepted in filter documents
    pub aliases: &'static [&'static str],
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            column,
            ty,
            aliases: &[],
        }
    }

    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn matches(&self, key: &str) -> bool {
        self.name == key || self.column == key || self.aliases.contains(&key)
    }
}

/// Table plus its filterable fields
#[derive(Debug)]
pub struct Schema {
    pub table: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Look a field up by API name, column name or alias.
    pub fn field(&self, key: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.matches(key))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::GADGETS;

    #[test]
    fn lookup_by_name_column_or_alias() {
        assert_eq!(GADGETS.field("shelfId").unwrap().column, "shelf_id");
        assert_eq!(GADGETS.field("shelf_id").unwrap().column, "shelf_id");
        assert_eq!(GADGETS.field("shelf").unwrap().column, "shelf_id");
        assert_eq!(GADGETS.field("_id").unwrap().column, "id");
        assert!(GADGETS.field("password").is_none());
    }
}
