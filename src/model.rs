//! Schema model shared by the parser and the converter.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Relationships whose endpoints name a table that was never declared.
    pub fn unresolved_relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(|r| {
            self.table(&r.from_table).is_none() || self.table(&r.to_table).is_none()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    /// Declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub typ: String,
    /// Column settings as written, e.g. `primary key`, `note: 'text'`.
    pub attributes: Vec<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, typ: impl Into<String>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            attributes,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case("pk") || a.eq_ignore_ascii_case("primary key"))
    }

    /// Settings joined for diagnostics.
    pub fn settings(&self) -> String {
        self.attributes.join(",")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub from_table: String,
    pub from_field: String,
    pub to_table: String,
    pub to_field: String,
    pub cardinality: Cardinality,
}

impl Relationship {
    /// `"user_id > id"`
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.from_field,
            self.cardinality.operator(),
            self.to_field
        )
    }

    pub fn touches(&self, table: &str, column: &str) -> bool {
        (self.from_table == table && self.from_field == column)
            || (self.to_table == table && self.to_field == column)
    }
}

/// Cardinality read left to right: `ManyToOne` means many rows of the
/// left table point at one row of the right table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OneToOne,   // -
    OneToMany,  // <
    ManyToOne,  // >
    ManyToMany, // <>
}

impl Cardinality {
    pub const ALL: [Cardinality; 4] = [
        Self::OneToOne,
        Self::OneToMany,
        Self::ManyToOne,
        Self::ManyToMany,
    ];

    pub fn operator(self) -> &'static str {
        match self {
            Self::OneToOne => "-",
            Self::OneToMany => "<",
            Self::ManyToOne => ">",
            Self::ManyToMany => "<>",
        }
    }

    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "-" => Some(Self::OneToOne),
            "<" => Some(Self::OneToMany),
            ">" => Some(Self::ManyToOne),
            "<>" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}
