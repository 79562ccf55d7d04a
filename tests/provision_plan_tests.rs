use finflow::provision::tiers::{ACCESS_TIERS, DASHBOARD_USER, ETL_USER, SCHEMA_CREATOR};
use finflow::provision::{ProvisionPlan, TARGET_SCHEMA};
use std::collections::HashMap;

fn plan() -> ProvisionPlan {
    let mut passwords = HashMap::new();
    passwords.insert(SCHEMA_CREATOR.name, "creator-pw".to_string());
    passwords.insert(ETL_USER.name, "etl-pw".to_string());
    passwords.insert(DASHBOARD_USER.name, "dash-pw".to_string());
    ProvisionPlan::new(
        "campaign_finance".to_string(),
        vec!["pipeline_admin".to_string(), "schema_creator".to_string()],
        passwords,
    )
}

#[test]
fn every_tier_starts_with_a_connect_grant() {
    let plan = plan();
    for spec in &ACCESS_TIERS {
        let stmts = plan.grant_statements(spec);
        assert_eq!(
            stmts[0],
            format!(
                "GRANT CONNECT ON DATABASE \"campaign_finance\" TO \"{}\"",
                spec.name
            )
        );
    }
}

#[test]
fn rerun_emits_alter_instead_of_create() {
    let plan = plan();
    for spec in &ACCESS_TIERS {
        let fresh = plan.role_statement(spec, false);
        let rerun = plan.role_statement(spec, true);
        assert!(fresh.starts_with("CREATE ROLE"));
        assert!(rerun.starts_with("ALTER ROLE"));
        // both converge onto the same managed properties
        assert!(fresh.contains("WITH LOGIN PASSWORD"));
        assert!(rerun.contains("WITH LOGIN PASSWORD"));
    }
}

#[test]
fn future_object_rules_cover_every_configured_owner() {
    let plan = plan();
    let stmts = plan.grant_statements(&ETL_USER);
    for owner in ["pipeline_admin", "schema_creator"] {
        assert!(stmts.iter().any(|s| {
            s.contains(&format!("FOR ROLE \"{owner}\""))
                && s.contains("ON TABLES TO \"etl_user\"")
                && s.contains("SELECT, INSERT, UPDATE")
        }));
        assert!(stmts.iter().any(|s| {
            s.contains(&format!("FOR ROLE \"{owner}\""))
                && s.contains("ON SEQUENCES TO \"etl_user\"")
                && s.contains("USAGE, SELECT")
        }));
    }
}

#[test]
fn dashboard_rules_grant_select_only_on_future_tables() {
    let plan = plan();
    let stmts = plan.grant_statements(&DASHBOARD_USER);
    let defaults: Vec<_> = stmts
        .iter()
        .filter(|s| s.starts_with("ALTER DEFAULT PRIVILEGES"))
        .collect();
    assert_eq!(defaults.len(), 2); // one per owner, tables only
    for stmt in defaults {
        assert!(stmt.contains("GRANT SELECT ON TABLES TO \"dashboard_user\""));
    }
}

#[test]
fn all_grants_target_the_public_schema() {
    let plan = plan();
    assert_eq!(TARGET_SCHEMA, "public");
    for spec in &ACCESS_TIERS {
        for stmt in plan.grant_statements(spec) {
            if stmt.contains("SCHEMA") {
                assert!(stmt.contains("\"public\""), "wrong schema in: {stmt}");
            }
        }
    }
}
