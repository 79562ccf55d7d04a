//! The three access tiers of the campaign-finance store.
//!
//! `schema_creator` owns structural DDL, `etl_user` reads and writes data,
//! `dashboard_user` reads only. The tier table is the single source of truth:
//! both the provisioner and the live `verify` check derive from it, so the
//! applied grants can never drift from the checked expectations.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPrivilege {
    Create,
    Usage,
}

impl SchemaPrivilege {
    pub fn as_sql(self) -> &'static str {
        match self {
            SchemaPrivilege::Create => "CREATE",
            SchemaPrivilege::Usage => "USAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePrivilege {
    Select,
    Insert,
    Update,
}

impl TablePrivilege {
    pub fn as_sql(self) -> &'static str {
        match self {
            TablePrivilege::Select => "SELECT",
            TablePrivilege::Insert => "INSERT",
            TablePrivilege::Update => "UPDATE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePrivilege {
    Usage,
    Select,
}

impl SequencePrivilege {
    pub fn as_sql(self) -> &'static str {
        match self {
            SequencePrivilege::Usage => "USAGE",
            SequencePrivilege::Select => "SELECT",
        }
    }
}

/// Declarative description of one login role and everything it may touch.
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub name: &'static str,
    pub schema: &'static [SchemaPrivilege],
    pub tables: &'static [TablePrivilege],
    pub sequences: &'static [SequencePrivilege],
}

impl RoleSpec {
    pub fn writes_data(&self) -> bool {
        self.tables
            .iter()
            .any(|p| matches!(p, TablePrivilege::Insert | TablePrivilege::Update))
    }

    pub fn creates_objects(&self) -> bool {
        self.schema.contains(&SchemaPrivilege::Create)
    }
}

pub const SCHEMA_CREATOR: RoleSpec = RoleSpec {
    name: "schema_creator",
    schema: &[SchemaPrivilege::Create],
    tables: &[],
    sequences: &[],
};

pub const ETL_USER: RoleSpec = RoleSpec {
    name: "etl_user",
    schema: &[SchemaPrivilege::Usage],
    tables: &[
        TablePrivilege::Select,
        TablePrivilege::Insert,
        TablePrivilege::Update,
    ],
    // Serial primary keys are backed by sequences; INSERT must advance them.
    sequences: &[SequencePrivilege::Usage, SequencePrivilege::Select],
};

pub const DASHBOARD_USER: RoleSpec = RoleSpec {
    name: "dashboard_user",
    schema: &[SchemaPrivilege::Usage],
    tables: &[TablePrivilege::Select],
    sequences: &[],
};

pub const ACCESS_TIERS: [RoleSpec; 3] = [SCHEMA_CREATOR, ETL_USER, DASHBOARD_USER];
