use std::{fs, time::Instant};

use log::debug;

use crate::api::{MetaRow, TableDescription};
use crate::catalog::{Alter, BulkRows, TableManager};
use crate::command::{parse_command, FlagValue, ParsedCommand};
use crate::error::StoreError;
use crate::result::{status_line, Reply, ResultSet};

/// Maps parsed commands onto the catalog. Validates required flags, measures
/// elapsed time across the catalog call, and renders every failure as a
/// diagnostic string instead of letting it escape.
pub struct Dispatcher {
    manager: TableManager,
}

impl Dispatcher {
    pub fn new(manager: TableManager) -> Self {
        Dispatcher { manager }
    }

    pub fn manager(&self) -> &TableManager {
        &self.manager
    }

    /// Execute one command line. Blank input yields an empty status.
    pub fn execute(&mut self, line: &str) -> Reply {
        let parsed = match parse_command(line) {
            Some(parsed) => parsed,
            None => return Reply::Status(String::new()),
        };
        let operation = parsed.operation.to_ascii_lowercase();
        let start = Instant::now();
        match self.run(&operation, &parsed, start) {
            Ok(reply) => reply,
            Err(err) => {
                debug!("command '{}' failed: {}", operation, err);
                Reply::Status(render_error(&err))
            }
        }
    }

    fn run(
        &mut self,
        operation: &str,
        cmd: &ParsedCommand,
        start: Instant,
    ) -> Result<Reply, StoreError> {
        match operation {
            "list" => {
                let mut set = ResultSet::new(["Tables"]);
                for name in self.manager.table_names() {
                    set.push_row([name]);
                }
                Ok(rows_reply(set, start))
            }
            "scan" => {
                let table = require_text(cmd, "table")?;
                let rows = self.manager.scan(table)?;
                Ok(rows_reply(meta_result(rows), start))
            }
            "create" => {
                let table = require_text(cmd, "table")?;
                let families = require_list(cmd, "column_families")?;
                self.manager.create_table(table, &families)?;
                Ok(status0(start))
            }
            "drop" => {
                let table = require_text(cmd, "table")?;
                self.manager.drop_table(table)?;
                Ok(status0(start))
            }
            "drop_all" => {
                let pattern = require_text(cmd, "regex")?;
                let mut lines = self.manager.drop_all(pattern)?;
                lines.push(status_line(0, start.elapsed()));
                Ok(Reply::Status(lines.join("\n")))
            }
            "enable" => {
                let table = require_text(cmd, "table")?;
                self.manager.enable(table)?;
                Ok(status0(start))
            }
            "disable" => {
                let table = require_text(cmd, "table")?;
                self.manager.disable(table)?;
                Ok(status0(start))
            }
            "is_enabled" => {
                let table = require_text(cmd, "table")?;
                let enabled = self.manager.is_enabled(table)?;
                Ok(Reply::Status(format!(
                    "{}\n{}",
                    enabled,
                    status_line(0, start.elapsed())
                )))
            }
            "put" => {
                let table = require_text(cmd, "table")?;
                let row = require_text(cmd, "row")?;
                let column = require_text(cmd, "column")?;
                let value = require_text(cmd, "value")?;
                let (family, column) = split_qualifier(column);
                self.manager.put(table, row, family, column, value)?;
                Ok(Reply::Status(status_line(1, start.elapsed())))
            }
            "get" => {
                let table = require_text(cmd, "table")?;
                let row = require_text(cmd, "row")?;
                let (family, column) = match cmd.text("column") {
                    Some(qualifier) => {
                        let (family, column) = split_qualifier(qualifier);
                        (Some(family), Some(column))
                    }
                    None => (None, None),
                };
                let rows = self.manager.get(table, row, family, column)?;
                Ok(rows_reply(meta_result(rows), start))
            }
            "delete" => {
                let table = require_text(cmd, "table")?;
                let row = require_text(cmd, "row")?;
                let column = require_text(cmd, "column_name")?;
                let raw_timestamp = require_text(cmd, "timestamp")?;
                let timestamp: i64 =
                    raw_timestamp
                        .parse()
                        .map_err(|_| StoreError::InvalidArgument {
                            what: "timestamp",
                            value: raw_timestamp.to_string(),
                        })?;
                let (family, column) = split_qualifier(column);
                self.manager.delete(table, row, family, column, timestamp)?;
                Ok(Reply::Status(status_line(1, start.elapsed())))
            }
            "delete_all" => {
                let table = require_text(cmd, "table")?;
                let row = require_text(cmd, "row")?;
                let removed = self.manager.delete_all(table, row)?;
                Ok(Reply::Status(status_line(removed, start.elapsed())))
            }
            "count" => {
                let table = require_text(cmd, "table")?;
                let count = self.manager.count(table)?;
                Ok(Reply::Status(status_line(count, start.elapsed())))
            }
            "truncate" => {
                let table = require_text(cmd, "table")?;
                self.manager.truncate(table)?;
                Ok(status0(start))
            }
            "alter" => {
                let table = require_text(cmd, "table")?;
                let request = alter_request(cmd)?;
                self.manager.alter(table, request)?;
                Ok(status0(start))
            }
            "describe" => {
                let table = require_text(cmd, "table")?;
                let description = self.manager.describe(table)?;
                Ok(rows_reply(describe_result(&description), start))
            }
            "insert_many" => {
                let file = require_text(cmd, "file")?;
                let text = fs::read_to_string(file)?;
                let data: BulkRows = serde_json::from_str(&text)?;
                let written = self.manager.insert_many(&data)?;
                Ok(Reply::Status(status_line(written, start.elapsed())))
            }
            other => Err(StoreError::UnknownCommand(other.to_string())),
        }
    }
}

fn render_error(err: &StoreError) -> String {
    if err.is_action_required() {
        format!("Action required: {}", err)
    } else {
        format!("Error: {}", err)
    }
}

/// `family:column` split; an unqualified name addresses the default family.
fn split_qualifier(qualifier: &str) -> (&str, &str) {
    match qualifier.split_once(':') {
        Some((family, column)) => (family, column),
        None => ("", qualifier),
    }
}

fn require_text<'a>(cmd: &'a ParsedCommand, key: &str) -> Result<&'a str, StoreError> {
    match cmd.flags.get(key) {
        Some(FlagValue::Text(value)) => Ok(value.as_str()),
        Some(_) => Err(StoreError::InvalidArgument {
            what: "flag value",
            value: format!("-{}", key),
        }),
        None => Err(StoreError::MissingFlag(key.to_string())),
    }
}

/// A list-valued flag; a bare string counts as a one-element list.
fn require_list(cmd: &ParsedCommand, key: &str) -> Result<Vec<String>, StoreError> {
    match cmd.flags.get(key) {
        Some(FlagValue::List(items)) => Ok(items.clone()),
        Some(FlagValue::Text(value)) => Ok(vec![value.clone()]),
        Some(_) => Err(StoreError::InvalidArgument {
            what: "flag value",
            value: format!("-{}", key),
        }),
        None => Err(StoreError::MissingFlag(key.to_string())),
    }
}

/// Decode the `alter` flag set into a single request; the modes are
/// mutually exclusive.
fn alter_request(cmd: &ParsedCommand) -> Result<Alter, StoreError> {
    let has_delete = cmd.has("delete");
    let has_cf = cmd.has("cf");
    if has_delete && has_cf {
        return Err(StoreError::InvalidArgument {
            what: "alter request",
            value: "both '-delete' and '-cf' given".to_string(),
        });
    }
    if has_delete {
        let family = require_text(cmd, "delete")?;
        return Ok(Alter::RemoveFamily(family.to_string()));
    }
    if has_cf {
        let family = require_text(cmd, "cf")?.to_string();
        return match cmd.text("method") {
            Some("delete") => Ok(Alter::RemoveFamily(family)),
            Some("rename") => {
                let to = require_text(cmd, "new_cf")?.to_string();
                Ok(Alter::RenameFamily { from: family, to })
            }
            Some("add") | None => Ok(Alter::AddFamily(family)),
            Some(other) => Err(StoreError::InvalidArgument {
                what: "alter method",
                value: other.to_string(),
            }),
        };
    }
    if cmd.has("index") {
        let mode = match cmd.text("index") {
            Some(value) if value.eq_ignore_ascii_case("true") => Some(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Some(false),
            Some(other) => {
                return Err(StoreError::InvalidArgument {
                    what: "index mode",
                    value: other.to_string(),
                })
            }
            // A bare `-index` toggles
            None => None,
        };
        return Ok(Alter::Index(mode));
    }
    Err(StoreError::InvalidArgument {
        what: "alter request",
        value: "expected one of '-delete', '-cf' or '-index'".to_string(),
    })
}

fn rows_reply(set: ResultSet, start: Instant) -> Reply {
    Reply::Rows {
        set,
        elapsed: start.elapsed(),
    }
}

fn status0(start: Instant) -> Reply {
    Reply::Status(status_line(0, start.elapsed()))
}

fn meta_result(rows: Vec<MetaRow>) -> ResultSet {
    let mut set = ResultSet::new(["Row Key", "CF:Column", "Timestamp", "Value"]);
    for row in rows {
        set.push_row([
            row.row_key,
            row.qualifier,
            row.timestamp.to_string(),
            row.payload.to_string(),
        ]);
    }
    set
}

fn describe_result(description: &TableDescription) -> ResultSet {
    let mut set = ResultSet::new([
        "Row keys",
        "Column Families",
        "isEnable",
        "Max number of versions",
        "Min number of versions",
        "Is indexed",
        "Name",
    ]);
    set.push_row([
        description.row_keys.to_string(),
        description.families_display(),
        description.enabled.to_string(),
        description.max_versions.to_string(),
        description.min_versions.to_string(),
        description.indexed.to_string(),
        description.name.clone(),
    ]);
    set
}
