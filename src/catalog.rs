use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use regex::Regex;

use crate::api::{MetaRow, Payload, Table, TableDescription};
use crate::error::{Result, StoreError};
use crate::storage::{HFile, HFileReader, HFILE_EXT};

/// Bulk-insert payload shape: table -> row key -> family -> column -> value.
pub type BulkRows =
    BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, serde_json::Value>>>>;

/// One `alter` request. The dispatcher guarantees the modes are mutually
/// exclusive before the catalog sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum Alter {
    RemoveFamily(String),
    AddFamily(String),
    RenameFamily { from: String, to: String },
    /// `None` toggles table-wide indexed mode, `Some` sets it explicitly.
    Index(Option<bool>),
}

/// Directory-backed registry of named tables. Every mutation snapshots the
/// affected table to `<name>.hfile` in the directory, so the files on disk
/// are authoritative at startup.
pub struct TableManager {
    directory: PathBuf,
    tables: BTreeMap<String, Table>,
}

impl TableManager {
    /// Open the catalog at `directory`: create it when absent, otherwise
    /// load every `.hfile` snapshot found there. Snapshots that fail to
    /// decode are skipped rather than failing the whole catalog.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let mut tables = BTreeMap::new();
        if directory.exists() {
            for entry in fs::read_dir(&directory)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().map_or(false, |ext| ext == HFILE_EXT) {
                    let name = match path.file_stem().and_then(|stem| stem.to_str()) {
                        Some(stem) => stem.to_string(),
                        None => continue,
                    };
                    match HFileReader::read(&path) {
                        Ok(table) => {
                            tables.insert(name, table);
                        }
                        Err(err) => warn!("skipping snapshot {}: {}", path.display(), err),
                    }
                }
            }
            info!(
                "loaded {} table(s) from {}",
                tables.len(),
                directory.display()
            );
        } else {
            fs::create_dir_all(&directory)?;
            info!("created table directory {}", directory.display());
        }
        Ok(TableManager { directory, tables })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    /// Mutations gated on the lifecycle flag go through here.
    fn enabled_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        let table = self
            .tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))?;
        if !table.is_enabled() {
            return Err(StoreError::TableDisabled(name.to_string()));
        }
        Ok(table)
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", name, HFILE_EXT))
    }

    /// Persist one table's snapshot; runs after every mutation.
    fn persist(&self, name: &str) -> Result<()> {
        let table = self.table(name)?;
        HFile::write(self.snapshot_path(name), table)?;
        debug!("persisted snapshot for '{}'", name);
        Ok(())
    }

    /// Create a table with the given family names. Existing names are
    /// refused: a table goes away only through `drop`.
    pub fn create_table(&mut self, name: &str, families: &[String]) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(StoreError::TableExists(name.to_string()));
        }
        self.tables.insert(name.to_string(), Table::new(families));
        self.persist(name)
    }

    /// Destroy a table, snapshot file included. Only legal while disabled.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let table = self.table(name)?;
        if table.is_enabled() {
            return Err(StoreError::TableEnabled(name.to_string()));
        }
        self.tables.remove(name);
        let path = self.snapshot_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        info!("dropped table '{}'", name);
        Ok(())
    }

    /// Drop every table whose name fully matches `pattern`; one report line
    /// per outcome.
    pub fn drop_all(&mut self, pattern: &str) -> Result<Vec<String>> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
            StoreError::InvalidArgument {
                what: "regex",
                value: format!("{} ({})", pattern, err),
            }
        })?;
        let matched: Vec<String> = self
            .tables
            .keys()
            .filter(|name| regex.is_match(name))
            .cloned()
            .collect();
        if matched.is_empty() {
            return Ok(vec![format!("No tables match '{}'", pattern)]);
        }
        let mut report = Vec::new();
        for name in matched {
            match self.drop_table(&name) {
                Ok(()) => report.push(format!("Dropped table '{}'", name)),
                Err(err) if err.is_action_required() => {
                    report.push(format!("Action required: {}", err))
                }
                Err(err) => report.push(format!("Error: {}", err)),
            }
        }
        Ok(report)
    }

    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.table_mut(name)?.set_enabled(true);
        self.persist(name)
    }

    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.table_mut(name)?.set_enabled(false);
        self.persist(name)
    }

    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        Ok(self.table(name)?.is_enabled())
    }

    /// `put`: coercing write to `family:column` under `row`.
    pub fn put(
        &mut self,
        name: &str,
        row: &str,
        family: &str,
        column: &str,
        value: &str,
    ) -> Result<()> {
        let table = self.enabled_table_mut(name)?;
        if !table.insert_or_update_row(row, family, column, value) {
            return Err(StoreError::FamilyNotFound(family.to_string()));
        }
        self.persist(name)
    }

    /// `get`: metadata rows for one row key, optionally narrowed to a
    /// family and column.
    pub fn get(
        &self,
        name: &str,
        row: &str,
        family: Option<&str>,
        column: Option<&str>,
    ) -> Result<Vec<MetaRow>> {
        if row.trim().is_empty() {
            return Err(StoreError::InvalidArgument {
                what: "row key",
                value: row.to_string(),
            });
        }
        Ok(self.table(name)?.enumerate_row(row, family, column))
    }

    /// `scan`: the full metadata dump of one table.
    pub fn scan(&self, name: &str) -> Result<Vec<MetaRow>> {
        Ok(self.table(name)?.enumerate_with_metadata())
    }

    /// `delete`: remove the value written at `timestamp` under
    /// `family:column` for `row`. An emptied cell disappears entirely.
    pub fn delete(
        &mut self,
        name: &str,
        row: &str,
        family: &str,
        column: &str,
        timestamp: i64,
    ) -> Result<()> {
        let table = self.enabled_table_mut(name)?;
        let family_name = family.trim().to_string();
        let fam = table
            .family_mut(&family_name)
            .ok_or_else(|| StoreError::FamilyNotFound(family_name.clone()))?;
        let qualifier = fam.qualifier(column);
        let col = fam
            .column_mut(column)
            .ok_or_else(|| StoreError::ColumnNotFound(column.to_string()))?;
        if col.search(row).is_none() {
            return Err(StoreError::RowNotFound(row.to_string()));
        }
        if !col.remove_version(row, timestamp) {
            return Err(StoreError::VersionNotFound {
                qualifier,
                timestamp,
            });
        }
        self.persist(name)
    }

    /// `delete_all`: drop the row from every family and column; returns the
    /// number of cells removed.
    pub fn delete_all(&mut self, name: &str, row: &str) -> Result<usize> {
        let table = self.enabled_table_mut(name)?;
        let mut removed = 0;
        for family in table.families_mut() {
            removed += family.remove_row(row);
        }
        if removed == 0 {
            return Err(StoreError::RowNotFound(row.to_string()));
        }
        self.persist(name)?;
        Ok(removed)
    }

    /// `count`: distinct row keys across all families.
    pub fn count(&self, name: &str) -> Result<usize> {
        Ok(self.table(name)?.row_count())
    }

    /// `truncate`: disable, drop, re-create with the same family set. The
    /// rebuilt table starts enabled and empty.
    pub fn truncate(&mut self, name: &str) -> Result<()> {
        self.enabled_table_mut(name)?.set_enabled(false);
        let families: Vec<String> = self
            .table(name)?
            .family_names()
            .iter()
            .map(|family| family.to_string())
            .collect();
        self.drop_table(name)?;
        self.create_table(name, &families)
    }

    /// `alter`: family add/remove/rename or index control, always against an
    /// enabled table.
    pub fn alter(&mut self, name: &str, request: Alter) -> Result<()> {
        let table = self.enabled_table_mut(name)?;
        match request {
            Alter::RemoveFamily(family) => {
                let family = family.trim().to_string();
                if family.is_empty() {
                    return Err(StoreError::InvalidArgument {
                        what: "column family",
                        value: family,
                    });
                }
                if table.family(&family).is_none() {
                    return Err(StoreError::FamilyNotFound(family));
                }
                if table.family_names().len() <= 1 {
                    return Err(StoreError::LastFamily(family));
                }
                table.remove_family(&family);
            }
            Alter::AddFamily(family) => {
                let family = family.trim().to_string();
                if family.is_empty() {
                    return Err(StoreError::InvalidArgument {
                        what: "column family",
                        value: family,
                    });
                }
                if table.family(&family).is_some() {
                    return Err(StoreError::FamilyExists(family));
                }
                table.add_column_family(&family, &[]);
            }
            Alter::RenameFamily { from, to } => {
                let from = from.trim().to_string();
                let to = to.trim().to_string();
                if to.is_empty() {
                    return Err(StoreError::InvalidArgument {
                        what: "column family",
                        value: to,
                    });
                }
                if table.family(&from).is_none() {
                    return Err(StoreError::FamilyNotFound(from));
                }
                if table.family(&to).is_some() {
                    return Err(StoreError::FamilyExists(to));
                }
                table.rename_family(&from, &to);
            }
            Alter::Index(mode) => {
                let target = mode.unwrap_or(!table.is_indexed());
                if target {
                    table.enable_index();
                } else {
                    table.disable_index();
                }
            }
        }
        self.persist(name)
    }

    /// `describe`, with the catalog-held name stamped in.
    pub fn describe(&self, name: &str) -> Result<TableDescription> {
        let mut description = self.table(name)?.describe();
        description.name = name.to_string();
        Ok(description)
    }

    /// Bulk insert across tables; unknown table names are skipped without
    /// error. Returns the number of rows written; each touched table is
    /// persisted.
    pub fn insert_many(&mut self, data: &BulkRows) -> Result<usize> {
        let mut written = 0;
        for (table_name, rows) in data {
            let table = match self.tables.get_mut(table_name) {
                Some(table) => table,
                None => continue,
            };
            let typed: BTreeMap<String, BTreeMap<String, BTreeMap<String, Payload>>> = rows
                .iter()
                .map(|(row, families)| {
                    let families = families
                        .iter()
                        .map(|(family, columns)| {
                            let columns = columns
                                .iter()
                                .map(|(column, value)| {
                                    (column.clone(), Payload::from_json(value))
                                })
                                .collect();
                            (family.clone(), columns)
                        })
                        .collect();
                    (row.clone(), families)
                })
                .collect();
            written += table.insert_many(&typed);
            self.persist(table_name)?;
        }
        Ok(written)
    }
}
