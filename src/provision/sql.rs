//! DDL/DCL statement builders.
//!
//! Role and grant statements cannot take bind parameters, so identifiers and
//! literals go through the quoting helpers below instead of string pasting.

use super::tiers::{SchemaPrivilege, SequencePrivilege, TablePrivilege};

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a literal. Backslashes force the E'' form so the result is
/// safe regardless of the server's `standard_conforming_strings` setting.
pub fn quote_literal(value: &str) -> String {
    if value.contains('\\') {
        format!(
            "E'{}'",
            value.replace('\\', "\\\\").replace('\'', "''")
        )
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

pub fn create_role(name: &str, password: &str) -> String {
    format!(
        "CREATE ROLE {} WITH LOGIN PASSWORD {}",
        quote_ident(name),
        quote_literal(password)
    )
}

/// Converge an existing role onto the managed properties.
pub fn alter_role(name: &str, password: &str) -> String {
    format!(
        "ALTER ROLE {} WITH LOGIN PASSWORD {}",
        quote_ident(name),
        quote_literal(password)
    )
}

pub fn grant_connect(database: &str, role: &str) -> String {
    format!(
        "GRANT CONNECT ON DATABASE {} TO {}",
        quote_ident(database),
        quote_ident(role)
    )
}

pub fn grant_on_schema(schema: &str, privileges: &[SchemaPrivilege], role: &str) -> String {
    let verbs: Vec<_> = privileges.iter().map(|p| p.as_sql()).collect();
    format!(
        "GRANT {} ON SCHEMA {} TO {}",
        verbs.join(", "),
        quote_ident(schema),
        quote_ident(role)
    )
}

/// Covers tables existing at execution time only; future tables are handled
/// by [`default_table_privileges`].
pub fn grant_on_existing_tables(
    schema: &str,
    privileges: &[TablePrivilege],
    role: &str,
) -> String {
    let verbs: Vec<_> = privileges.iter().map(|p| p.as_sql()).collect();
    format!(
        "GRANT {} ON ALL TABLES IN SCHEMA {} TO {}",
        verbs.join(", "),
        quote_ident(schema),
        quote_ident(role)
    )
}

pub fn grant_on_existing_sequences(
    schema: &str,
    privileges: &[SequencePrivilege],
    role: &str,
) -> String {
    let verbs: Vec<_> = privileges.iter().map(|p| p.as_sql()).collect();
    format!(
        "GRANT {} ON ALL SEQUENCES IN SCHEMA {} TO {}",
        verbs.join(", "),
        quote_ident(schema),
        quote_ident(role)
    )
}

/// Standing rule: tables created later by `owner` inherit the same grants.
/// Default privileges only fire for objects created by the named owner role,
/// so the provisioner registers one rule per object-creating principal.
pub fn default_table_privileges(
    owner: &str,
    schema: &str,
    privileges: &[TablePrivilege],
    role: &str,
) -> String {
    let verbs: Vec<_> = privileges.iter().map(|p| p.as_sql()).collect();
    format!(
        "ALTER DEFAULT PRIVILEGES FOR ROLE {} IN SCHEMA {} GRANT {} ON TABLES TO {}",
        quote_ident(owner),
        quote_ident(schema),
        verbs.join(", "),
        quote_ident(role)
    )
}

pub fn default_sequence_privileges(
    owner: &str,
    schema: &str,
    privileges: &[SequencePrivilege],
    role: &str,
) -> String {
    let verbs: Vec<_> = privileges.iter().map(|p| p.as_sql()).collect();
    format!(
        "ALTER DEFAULT PRIVILEGES FOR ROLE {} IN SCHEMA {} GRANT {} ON SEQUENCES TO {}",
        quote_ident(owner),
        quote_ident(schema),
        verbs.join(", "),
        quote_ident(role)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::tiers::{ETL_USER, SchemaPrivilege};

    #[test]
    fn quoting_escapes_embedded_characters() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("p4ss"), "'p4ss'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
        assert_eq!(quote_literal("a\\b'c"), "E'a\\\\b''c'");
    }

    #[test]
    fn role_statements_quote_both_parts() {
        assert_eq!(
            create_role("etl_user", "s3cret"),
            "CREATE ROLE \"etl_user\" WITH LOGIN PASSWORD 's3cret'"
        );
        assert_eq!(
            alter_role("etl_user", "s3cret"),
            "ALTER ROLE \"etl_user\" WITH LOGIN PASSWORD 's3cret'"
        );
    }

    #[test]
    fn grant_statements_join_privilege_verbs_in_order() {
        assert_eq!(
            grant_connect("campaign_finance", "dashboard_user"),
            "GRANT CONNECT ON DATABASE \"campaign_finance\" TO \"dashboard_user\""
        );
        assert_eq!(
            grant_on_schema("public", &[SchemaPrivilege::Create], "schema_creator"),
            "GRANT CREATE ON SCHEMA \"public\" TO \"schema_creator\""
        );
        assert_eq!(
            grant_on_existing_tables("public", ETL_USER.tables, "etl_user"),
            "GRANT SELECT, INSERT, UPDATE ON ALL TABLES IN SCHEMA \"public\" TO \"etl_user\""
        );
        assert_eq!(
            grant_on_existing_sequences("public", ETL_USER.sequences, "etl_user"),
            "GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA \"public\" TO \"etl_user\""
        );
    }

    #[test]
    fn default_privilege_rules_name_the_owner_role() {
        assert_eq!(
            default_table_privileges("schema_creator", "public", ETL_USER.tables, "etl_user"),
            "ALTER DEFAULT PRIVILEGES FOR ROLE \"schema_creator\" IN SCHEMA \"public\" \
             GRANT SELECT, INSERT, UPDATE ON TABLES TO \"etl_user\""
        );
        assert_eq!(
            default_sequence_privileges("admin", "public", ETL_USER.sequences, "etl_user"),
            "ALTER DEFAULT PRIVILEGES FOR ROLE \"admin\" IN SCHEMA \"public\" \
             GRANT USAGE, SELECT ON SEQUENCES TO \"etl_user\""
        );
    }
}
