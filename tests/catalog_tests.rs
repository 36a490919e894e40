use tempfile::tempdir;
use MemBase::api::{Payload, Value};
use MemBase::catalog::{Alter, BulkRows, TableManager};
use MemBase::error::StoreError;

// Helper to open a fresh catalog over a temporary directory
fn temp_catalog() -> (tempfile::TempDir, TableManager) {
    let dir = tempdir().unwrap();
    let manager = TableManager::open(dir.path()).unwrap();
    (dir, manager)
}

fn families(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_open_creates_missing_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("tables");
    assert!(!nested.exists());

    let manager = TableManager::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert!(manager.table_names().is_empty());

    drop(dir); // Cleanup
}

#[test]
fn test_create_persists_snapshot() {
    let (dir, mut manager) = temp_catalog();

    manager.create_table("users", &families(&["info", "meta"])).unwrap();
    assert!(dir.path().join("users.hfile").exists());
    assert_eq!(manager.table_names(), vec!["users".to_string()]);

    // Duplicate names are refused
    let result = manager.create_table("users", &[]);
    assert!(matches!(result, Err(StoreError::TableExists(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();

    {
        let mut manager = TableManager::open(dir.path()).unwrap();
        manager.create_table("users", &families(&["info"])).unwrap();
        manager.put("users", "r1", "info", "name", "Ana").unwrap();
        manager.put("users", "r1", "info", "age", "30").unwrap();
        manager.disable("users").unwrap();
    }

    {
        let manager = TableManager::open(dir.path()).unwrap();
        // The enabled flag persisted
        assert!(!manager.is_enabled("users").unwrap());

        let rows = manager.scan("users").unwrap();
        assert_eq!(rows.len(), 2);
        let age = rows.iter().find(|r| r.qualifier == "info:age").unwrap();
        assert_eq!(age.payload, Payload::Int(30));
    }

    drop(dir); // Cleanup
}

#[test]
fn test_open_skips_corrupt_snapshot() {
    let dir = tempdir().unwrap();

    {
        let mut manager = TableManager::open(dir.path()).unwrap();
        manager.create_table("good", &families(&["info"])).unwrap();
    }
    std::fs::write(dir.path().join("bad.hfile"), b"not a snapshot").unwrap();

    let manager = TableManager::open(dir.path()).unwrap();
    assert_eq!(manager.table_names(), vec!["good".to_string()]);

    drop(dir); // Cleanup
}

#[test]
fn test_drop_requires_disabled() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();

    // Enabled tables refuse to drop
    let result = manager.drop_table("users");
    assert!(matches!(result, Err(StoreError::TableEnabled(_))));
    assert!(result.unwrap_err().is_action_required());
    assert!(dir.path().join("users.hfile").exists());

    manager.disable("users").unwrap();
    manager.drop_table("users").unwrap();
    assert!(manager.table_names().is_empty());
    assert!(!dir.path().join("users.hfile").exists());

    drop(dir); // Cleanup
}

#[test]
fn test_drop_all_uses_full_match() {
    let (dir, mut manager) = temp_catalog();
    for name in ["t1", "t2", "team"] {
        manager.create_table(name, &families(&["info"])).unwrap();
    }
    manager.disable("t1").unwrap();
    manager.disable("t2").unwrap();

    // "t." fully matches t1 and t2 but not team
    let report = manager.drop_all("t.").unwrap();
    assert_eq!(report.len(), 2);
    assert!(report.iter().all(|line| line.starts_with("Dropped table")));
    assert_eq!(manager.table_names(), vec!["team".to_string()]);

    // Enabled matches are reported, not dropped
    let report = manager.drop_all("team").unwrap();
    assert!(report[0].starts_with("Action required:"));
    assert_eq!(manager.table_names(), vec!["team".to_string()]);

    let report = manager.drop_all("nothing.*").unwrap();
    assert_eq!(report, vec!["No tables match 'nothing.*'".to_string()]);

    // Broken patterns are refused
    assert!(manager.drop_all("(").is_err());

    drop(dir); // Cleanup
}

#[test]
fn test_put_requires_enabled_table_and_known_family() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();

    let result = manager.put("users", "r1", "ghost", "x", "1");
    assert!(matches!(result, Err(StoreError::FamilyNotFound(_))));

    manager.disable("users").unwrap();
    let result = manager.put("users", "r1", "info", "x", "1");
    assert!(matches!(result, Err(StoreError::TableDisabled(_))));
    assert!(result.unwrap_err().is_action_required());

    drop(dir); // Cleanup
}

#[test]
fn test_get_filters_by_row_family_column() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info", "meta"])).unwrap();
    manager.put("users", "r1", "info", "name", "Ana").unwrap();
    manager.put("users", "r1", "meta", "flag", "true").unwrap();
    manager.put("users", "r2", "info", "name", "Bea").unwrap();

    let rows = manager.get("users", "r1", None, None).unwrap();
    assert_eq!(rows.len(), 2);

    let rows = manager.get("users", "r1", Some("info"), Some("name")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].qualifier, "info:name");
    assert_eq!(rows[0].payload, Payload::Str("Ana".to_string()));

    // Blank row keys are refused
    assert!(manager.get("users", "  ", None, None).is_err());

    drop(dir); // Cleanup
}

#[test]
fn test_delete_single_version_then_cell() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();
    manager.put("users", "r1", "info", "age", "1").unwrap();
    manager.put("users", "r1", "info", "age", "2").unwrap();

    let stamps: Vec<i64> = manager
        .table("users")
        .unwrap()
        .family("info")
        .unwrap()
        .column("age")
        .unwrap()
        .search("r1")
        .unwrap()
        .versions()
        .iter()
        .map(Value::timestamp)
        .collect();
    assert_eq!(stamps.len(), 2);

    manager.delete("users", "r1", "info", "age", stamps[1]).unwrap();
    let rows = manager.get("users", "r1", None, None).unwrap();
    assert_eq!(rows[0].payload, Payload::Int(1));

    // Removing the last version removes the cell
    manager.delete("users", "r1", "info", "age", stamps[0]).unwrap();
    assert!(manager.get("users", "r1", None, None).unwrap().is_empty());
    assert_eq!(manager.count("users").unwrap(), 0);

    // A second delete has nothing to hit
    let result = manager.delete("users", "r1", "info", "age", stamps[0]);
    assert!(matches!(result, Err(StoreError::RowNotFound(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_delete_rejects_unknown_timestamp() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();
    manager.put("users", "r1", "info", "age", "1").unwrap();

    let result = manager.delete("users", "r1", "info", "age", 42);
    assert!(matches!(result, Err(StoreError::VersionNotFound { .. })));
    let result = manager.delete("users", "r1", "info", "ghost", 42);
    assert!(matches!(result, Err(StoreError::ColumnNotFound(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_delete_all_clears_row_everywhere() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info", "meta"])).unwrap();
    manager.put("users", "r1", "info", "name", "Ana").unwrap();
    manager.put("users", "r1", "meta", "flag", "true").unwrap();
    manager.put("users", "r2", "info", "name", "Bea").unwrap();

    let removed = manager.delete_all("users", "r1").unwrap();
    assert_eq!(removed, 2);
    assert_eq!(manager.count("users").unwrap(), 1);
    assert!(manager.get("users", "r1", None, None).unwrap().is_empty());

    let result = manager.delete_all("users", "r1");
    assert!(matches!(result, Err(StoreError::RowNotFound(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_truncate_keeps_family_set() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info", "meta"])).unwrap();
    manager.put("users", "r1", "info", "name", "Ana").unwrap();
    manager.put("users", "r2", "meta", "flag", "true").unwrap();
    assert_eq!(manager.count("users").unwrap(), 2);

    manager.truncate("users").unwrap();
    assert_eq!(manager.count("users").unwrap(), 0);
    let description = manager.describe("users").unwrap();
    assert_eq!(description.column_families, vec!["info", "meta"]);
    assert!(description.enabled);
    assert!(dir.path().join("users.hfile").exists());

    // Truncate is a mutation, so it needs an enabled table
    manager.disable("users").unwrap();
    let result = manager.truncate("users");
    assert!(matches!(result, Err(StoreError::TableDisabled(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_alter_family_modes() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();

    manager.alter("users", Alter::AddFamily("meta".to_string())).unwrap();
    assert_eq!(
        manager.describe("users").unwrap().column_families,
        vec!["info", "meta"]
    );

    let result = manager.alter("users", Alter::AddFamily("meta".to_string()));
    assert!(matches!(result, Err(StoreError::FamilyExists(_))));

    manager
        .alter(
            "users",
            Alter::RenameFamily {
                from: "meta".to_string(),
                to: "extra".to_string(),
            },
        )
        .unwrap();
    assert_eq!(
        manager.describe("users").unwrap().column_families,
        vec!["info", "extra"]
    );

    let result = manager.alter(
        "users",
        Alter::RenameFamily {
            from: "extra".to_string(),
            to: "info".to_string(),
        },
    );
    assert!(matches!(result, Err(StoreError::FamilyExists(_))));

    manager
        .alter("users", Alter::RemoveFamily("extra".to_string()))
        .unwrap();
    // The last non-default family cannot go
    let result = manager.alter("users", Alter::RemoveFamily("info".to_string()));
    assert!(matches!(result, Err(StoreError::LastFamily(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_alter_index_modes() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();
    manager.put("users", "r1", "info", "name", "Ana").unwrap();

    manager.alter("users", Alter::Index(None)).unwrap();
    assert!(manager.table("users").unwrap().is_indexed());
    manager.alter("users", Alter::Index(None)).unwrap();
    assert!(!manager.table("users").unwrap().is_indexed());

    manager.alter("users", Alter::Index(Some(true))).unwrap();
    assert!(manager.table("users").unwrap().is_indexed());

    // The indexed flag persists and the tree comes back on reload
    let dir_path = manager.directory().to_path_buf();
    drop(manager);
    let manager = TableManager::open(&dir_path).unwrap();
    let column = manager
        .table("users")
        .unwrap()
        .family("info")
        .unwrap()
        .column("name")
        .unwrap();
    assert!(column.is_indexed());
    assert!(column.index().is_some());

    drop(dir); // Cleanup
}

#[test]
fn test_alter_requires_enabled() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();
    manager.disable("users").unwrap();

    let result = manager.alter("users", Alter::AddFamily("meta".to_string()));
    assert!(matches!(result, Err(StoreError::TableDisabled(_))));

    drop(dir); // Cleanup
}

#[test]
fn test_insert_many_ignores_unknown_tables() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info"])).unwrap();

    let data: BulkRows = serde_json::from_value(serde_json::json!({
        "users": {
            "r1": {"info": {"name": "Ana", "age": 30}},
            "r2": {"info": {"name": "Bea"}}
        },
        "ghost": {
            "r9": {"info": {"name": "Nobody"}}
        }
    }))
    .unwrap();

    let written = manager.insert_many(&data).unwrap();
    assert_eq!(written, 2);
    assert_eq!(manager.count("users").unwrap(), 2);
    let rows = manager.get("users", "r1", Some("info"), Some("age")).unwrap();
    assert_eq!(rows[0].payload, Payload::Int(30));

    drop(dir); // Cleanup
}

#[test]
fn test_describe_stamps_name() {
    let (dir, mut manager) = temp_catalog();
    manager.create_table("users", &families(&["info", "meta"])).unwrap();

    let description = manager.describe("users").unwrap();
    assert_eq!(description.name, "users");
    assert_eq!(description.row_keys, 0);
    assert_eq!(description.families_display(), "['info','meta']");

    assert!(matches!(
        manager.describe("ghost"),
        Err(StoreError::TableNotFound(_))
    ));

    drop(dir); // Cleanup
}
