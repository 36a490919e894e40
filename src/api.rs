use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RowKey = String;

/// Microseconds since the Unix epoch.
pub type Timestamp = i64;

fn now_micros() -> Timestamp {
    chrono::Utc::now().timestamp_micros()
}

/// A typed scalar stored in a cell. Raw command-line values are coerced at
/// the write boundary; display strings are produced only at render time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Payload {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Payload {
    /// Coerce a raw string: a run of digits becomes an integer, a numeric
    /// with a single decimal point becomes a float, `true`/`false` (any
    /// case) become booleans, everything else stays a string.
    pub fn coerce(raw: &str) -> Payload {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<i64>() {
                return Payload::Int(n);
            }
            // Digit runs too long for i64 stay strings.
            return Payload::Str(raw.to_string());
        }
        if raw.contains('.') {
            let without_dot = raw.replacen('.', "", 1);
            if !without_dot.is_empty() && without_dot.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(f) = raw.parse::<f64>() {
                    return Payload::Float(f);
                }
            }
        }
        if raw.eq_ignore_ascii_case("true") {
            return Payload::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Payload::Bool(false);
        }
        Payload::Str(raw.to_string())
    }

    /// Conversion for bulk-insert JSON. Strings go through the same coercion
    /// as `put`; arrays and other composites are stringified.
    pub fn from_json(value: &serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Bool(b) => Payload::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Payload::Int(i),
                None => Payload::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Payload::coerce(s),
            other => Payload::Str(other.to_string()),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Float(x) => write!(f, "{}", x),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Str(s) => write!(f, "{}", s),
        }
    }
}

/// One immutable version: a payload plus the wall-clock instant it was
/// written.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Value {
    timestamp: Timestamp,
    payload: Payload,
}

impl Value {
    pub fn new(payload: Payload) -> Self {
        Value {
            timestamp: now_micros(),
            payload,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn version(&self) -> (Timestamp, &Payload) {
        (self.timestamp, &self.payload)
    }
}

/// Append-only version history for one (family, column, row). The newest
/// value is always the current read. Cells carry their row key so indexed
/// columns can keep them in a plain sequence.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Cell {
    row_key: RowKey,
    values: Vec<Value>,
}

impl Cell {
    pub fn new(payload: Payload, row_key: impl Into<RowKey>) -> Self {
        Cell {
            row_key: row_key.into(),
            values: vec![Value::new(payload)],
        }
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// Append a new version; it becomes the current value.
    pub fn update(&mut self, payload: Payload) {
        self.values.push(Value::new(payload));
    }

    pub fn current(&self) -> Option<&Payload> {
        self.values.last().map(Value::payload)
    }

    pub fn current_version(&self) -> Option<(Timestamp, &Payload)> {
        self.values.last().map(Value::version)
    }

    pub fn version_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn versions(&self) -> &[Value] {
        &self.values
    }

    /// Remove the version written at exactly `timestamp`. The owning column
    /// discards the cell when the history empties.
    pub(crate) fn remove_version(&mut self, timestamp: Timestamp) -> bool {
        let before = self.values.len();
        self.values.retain(|v| v.timestamp() != timestamp);
        self.values.len() != before
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Cell) -> bool {
        self.row_key == other.row_key
    }
}

impl PartialEq<str> for Cell {
    fn eq(&self, other: &str) -> bool {
        self.row_key == other
    }
}

impl PartialEq<&str> for Cell {
    fn eq(&self, other: &&str) -> bool {
        self.row_key == *other
    }
}

#[derive(Debug, Clone)]
struct IndexNode {
    key: RowKey,
    pos: usize,
    left: Option<Box<IndexNode>>,
    right: Option<Box<IndexNode>>,
}

/// Ordered index over a column's cell sequence. Nodes hold (row key,
/// sequence position) pairs, so the tree never shares ownership with the
/// cells. Balanced by median selection at build time; later inserts are
/// plain BST inserts with no rebalancing.
#[derive(Debug, Clone, Default)]
pub struct IndexTree {
    root: Option<Box<IndexNode>>,
}

impl IndexTree {
    /// Sort the (key, position) pairs, take the median as root, recurse on
    /// both halves.
    pub fn build(cells: &[Cell]) -> Self {
        let mut entries: Vec<(RowKey, usize)> = cells
            .iter()
            .enumerate()
            .map(|(pos, cell)| (cell.row_key().to_string(), pos))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        IndexTree {
            root: Self::from_sorted(&entries),
        }
    }

    fn from_sorted(entries: &[(RowKey, usize)]) -> Option<Box<IndexNode>> {
        if entries.is_empty() {
            return None;
        }
        let mid = entries.len() / 2;
        let (key, pos) = entries[mid].clone();
        Some(Box::new(IndexNode {
            key,
            pos,
            left: Self::from_sorted(&entries[..mid]),
            right: Self::from_sorted(&entries[mid + 1..]),
        }))
    }

    /// Standard BST lookup; returns the cell's position in the sequence.
    pub fn search(&self, row_key: &str) -> Option<usize> {
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            match row_key.cmp(n.key.as_str()) {
                Ordering::Equal => return Some(n.pos),
                Ordering::Less => node = n.left.as_deref(),
                Ordering::Greater => node = n.right.as_deref(),
            }
        }
        None
    }

    /// Standard BST insert, no rebalancing.
    pub fn add(&mut self, row_key: &str, pos: usize) {
        Self::add_node(&mut self.root, row_key, pos);
    }

    fn add_node(node: &mut Option<Box<IndexNode>>, row_key: &str, pos: usize) {
        match node {
            None => {
                *node = Some(Box::new(IndexNode {
                    key: row_key.to_string(),
                    pos,
                    left: None,
                    right: None,
                }));
            }
            Some(n) => match row_key.cmp(n.key.as_str()) {
                Ordering::Equal => n.pos = pos,
                Ordering::Less => Self::add_node(&mut n.left, row_key, pos),
                Ordering::Greater => Self::add_node(&mut n.right, row_key, pos),
            },
        }
    }

    /// In-order walk of the indexed keys. Used to check that the tree and
    /// the cell sequence agree.
    pub fn keys(&self) -> Vec<&str> {
        let mut out = Vec::new();
        Self::walk(self.root.as_deref(), &mut out);
        out
    }

    fn walk<'a>(node: Option<&'a IndexNode>, out: &mut Vec<&'a str>) {
        if let Some(n) = node {
            Self::walk(n.left.as_deref(), out);
            out.push(n.key.as_str());
            Self::walk(n.right.as_deref(), out);
        }
    }
}

/// A named mapping from row key to cell. Runs either as a plain sequence
/// scanned linearly or, in indexed mode, with a BST over the row keys that
/// is kept in step with the sequence.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
    indexed: bool,
    #[serde(skip)]
    tree: Option<IndexTree>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            cells: Vec::new(),
            indexed: false,
            tree: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn index(&self) -> Option<&IndexTree> {
        self.tree.as_ref()
    }

    /// Toggle indexed mode, building the tree when turned on and discarding
    /// it when turned off.
    pub fn set_indexed(&mut self, indexed: bool) {
        self.indexed = indexed;
        self.tree = if indexed {
            Some(IndexTree::build(&self.cells))
        } else {
            None
        };
    }

    /// Snapshots never carry the tree; rebuild it after deserializing when
    /// the column was saved in indexed mode.
    pub(crate) fn restore_index(&mut self) {
        if self.indexed {
            self.tree = Some(IndexTree::build(&self.cells));
        }
    }

    fn position(&self, row_key: &str) -> Option<usize> {
        match &self.tree {
            Some(tree) => tree.search(row_key),
            None => self.cells.iter().position(|c| c.row_key() == row_key),
        }
    }

    pub fn search(&self, row_key: &str) -> Option<&Cell> {
        self.position(row_key).map(|pos| &self.cells[pos])
    }

    /// Append a version to an existing cell, or create the cell and register
    /// it with the index.
    pub fn insert(&mut self, row_key: &str, payload: Payload) {
        if let Some(pos) = self.position(row_key) {
            self.cells[pos].update(payload);
            return;
        }
        self.cells.push(Cell::new(payload, row_key));
        let pos = self.cells.len() - 1;
        if let Some(tree) = &mut self.tree {
            tree.add(row_key, pos);
        }
    }

    /// Same contract as `insert`; the write entry point used by the coercing
    /// family-level upsert.
    pub fn upsert(&mut self, row_key: &str, payload: Payload) {
        self.insert(row_key, payload);
    }

    /// Remove the version written at `timestamp` under `row_key`. A cell
    /// whose history empties is discarded and the index rebuilt, since tree
    /// nodes address cells by position.
    pub fn remove_version(&mut self, row_key: &str, timestamp: Timestamp) -> bool {
        let pos = match self.position(row_key) {
            Some(pos) => pos,
            None => return false,
        };
        if !self.cells[pos].remove_version(timestamp) {
            return false;
        }
        if self.cells[pos].is_empty() {
            self.cells.remove(pos);
            if self.indexed {
                self.tree = Some(IndexTree::build(&self.cells));
            }
        }
        true
    }

    /// Remove the whole history for `row_key`; true when a cell existed.
    pub fn remove_row(&mut self, row_key: &str) -> bool {
        let before = self.cells.len();
        self.cells.retain(|c| c.row_key() != row_key);
        if self.cells.len() == before {
            return false;
        }
        if self.indexed {
            self.tree = Some(IndexTree::build(&self.cells));
        }
        true
    }

    /// (row key, current payload) pairs in sequence order.
    pub fn enumerate(&self) -> Vec<(RowKey, Payload)> {
        self.cells
            .iter()
            .filter_map(|c| c.current().map(|p| (c.row_key().to_string(), p.clone())))
            .collect()
    }

    /// (row key, timestamp, current payload) triples in sequence order.
    pub fn enumerate_with_metadata(&self) -> Vec<(RowKey, Timestamp, Payload)> {
        self.cells
            .iter()
            .filter_map(|c| {
                c.current_version()
                    .map(|(ts, p)| (c.row_key().to_string(), ts, p.clone()))
            })
            .collect()
    }

    pub fn max_version_count(&self) -> usize {
        self.cells.iter().map(Cell::version_count).max().unwrap_or(0)
    }

    pub fn min_version_count(&self) -> usize {
        self.cells.iter().map(Cell::version_count).min().unwrap_or(0)
    }
}

/// One `scan`/`get` output row: the current version of one cell plus its
/// display qualifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaRow {
    pub row_key: RowKey,
    pub qualifier: String,
    pub timestamp: Timestamp,
    pub payload: Payload,
}

/// A named group of columns. The empty-string name is the default family
/// and renders unqualified column names. The indexed flag cascades to every
/// column, auto-created ones included.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColumnFamily {
    name: String,
    columns: BTreeMap<String, Column>,
    indexed: bool,
}

impl ColumnFamily {
    pub fn new(name: &str) -> Self {
        ColumnFamily {
            name: name.trim().to_string(),
            columns: BTreeMap::new(),
            indexed: false,
        }
    }

    pub fn with_columns(name: &str, columns: &[String]) -> Self {
        let mut family = ColumnFamily::new(name);
        for column in columns {
            family.insert_column(column);
        }
        family
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Display qualifier for a column of this family: `family:column`, or
    /// just `column` for the default family.
    pub fn qualifier(&self, column: &str) -> String {
        if self.name.is_empty() {
            column.to_string()
        } else {
            format!("{}:{}", self.name, column)
        }
    }

    /// Create an empty column, inheriting the family's indexed mode.
    pub fn insert_column(&mut self, name: &str) {
        let mut column = Column::new(name);
        if self.indexed {
            column.set_indexed(true);
        }
        self.columns.insert(name.to_string(), column);
    }

    fn column_entry(&mut self, name: &str) -> &mut Column {
        let indexed = self.indexed;
        self.columns.entry(name.to_string()).or_insert_with(|| {
            let mut column = Column::new(name);
            if indexed {
                column.set_indexed(true);
            }
            column
        })
    }

    /// Write one row across the given columns, creating columns on demand.
    /// Returns the number of cells written.
    pub fn insert_row(&mut self, row_key: &str, values: &BTreeMap<String, Payload>) -> usize {
        for (column, payload) in values {
            self.column_entry(column).insert(row_key, payload.clone());
        }
        values.len()
    }

    /// Point read: every column's cell for the row.
    pub fn search_row(&self, row_key: &str) -> BTreeMap<String, Option<&Cell>> {
        self.columns
            .iter()
            .map(|(name, column)| (name.clone(), column.search(row_key)))
            .collect()
    }

    /// Point read restricted to one column.
    pub fn search_cell(&self, row_key: &str, column: &str) -> Option<&Cell> {
        self.columns.get(column).and_then(|c| c.search(row_key))
    }

    /// Nested view: row key -> qualifier -> current value.
    pub fn enumerate(&self) -> BTreeMap<RowKey, BTreeMap<String, Payload>> {
        let mut rows: BTreeMap<RowKey, BTreeMap<String, Payload>> = BTreeMap::new();
        for column in self.columns.values() {
            for (row_key, payload) in column.enumerate() {
                rows.entry(row_key)
                    .or_default()
                    .insert(self.qualifier(column.name()), payload);
            }
        }
        rows
    }

    /// Flat metadata rows, one per cell.
    pub fn enumerate_with_metadata(&self) -> Vec<MetaRow> {
        let mut rows = Vec::new();
        for column in self.columns.values() {
            for (row_key, timestamp, payload) in column.enumerate_with_metadata() {
                rows.push(MetaRow {
                    row_key,
                    qualifier: self.qualifier(column.name()),
                    timestamp,
                    payload,
                });
            }
        }
        rows
    }

    /// Metadata rows for a single row key, optionally one column.
    pub fn enumerate_row(&self, row_key: &str, column: Option<&str>) -> Vec<MetaRow> {
        let mut rows = Vec::new();
        match column {
            Some(name) => {
                if let Some(column) = self.columns.get(name) {
                    if let Some((timestamp, payload)) =
                        column.search(row_key).and_then(Cell::current_version)
                    {
                        rows.push(MetaRow {
                            row_key: row_key.to_string(),
                            qualifier: self.qualifier(name),
                            timestamp,
                            payload: payload.clone(),
                        });
                    }
                }
            }
            None => {
                for column in self.columns.values() {
                    if let Some((timestamp, payload)) =
                        column.search(row_key).and_then(Cell::current_version)
                    {
                        rows.push(MetaRow {
                            row_key: row_key.to_string(),
                            qualifier: self.qualifier(column.name()),
                            timestamp,
                            payload: payload.clone(),
                        });
                    }
                }
            }
        }
        rows
    }

    /// Coercing upsert used by `put`; auto-creates the column.
    pub fn insert_or_update(&mut self, row_key: &str, column: &str, raw: &str) {
        let payload = Payload::coerce(raw);
        self.column_entry(column).upsert(row_key, payload);
    }

    /// Cascade indexed mode to every column.
    pub fn set_indexed(&mut self, indexed: bool) {
        self.indexed = indexed;
        for column in self.columns.values_mut() {
            column.set_indexed(indexed);
        }
    }

    pub fn max_version_count(&self) -> usize {
        self.columns
            .values()
            .map(Column::max_version_count)
            .max()
            .unwrap_or(0)
    }

    pub fn min_version_count(&self) -> usize {
        self.columns
            .values()
            .map(Column::min_version_count)
            .min()
            .unwrap_or(0)
    }

    /// Remove every cell for the row across all columns; returns how many
    /// cells went away.
    pub fn remove_row(&mut self, row_key: &str) -> usize {
        let mut removed = 0;
        for column in self.columns.values_mut() {
            if column.remove_row(row_key) {
                removed += 1;
            }
        }
        removed
    }

    pub(crate) fn restore_indexes(&mut self) {
        for column in self.columns.values_mut() {
            column.restore_index();
        }
    }
}

/// The one-row summary behind `describe`. The catalog stamps the name.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub name: String,
    pub row_keys: usize,
    pub column_families: Vec<String>,
    pub enabled: bool,
    pub max_versions: usize,
    pub min_versions: usize,
    pub indexed: bool,
}

impl TableDescription {
    /// Display form of the family list: `['a','b']`.
    pub fn families_display(&self) -> String {
        let quoted: Vec<String> = self
            .column_families
            .iter()
            .map(|name| format!("'{}'", name))
            .collect();
        format!("[{}]", quoted.join(","))
    }
}

/// An ordered set of column families (the default family always sits at
/// index 0) plus the lifecycle and index flags.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Table {
    column_families: Vec<ColumnFamily>,
    enabled: bool,
    indexed: bool,
}

impl Table {
    /// Build a table from family names. Blank names collapse into the
    /// default family; duplicates are kept once.
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Table {
            column_families: vec![ColumnFamily::new("")],
            enabled: true,
            indexed: false,
        };
        for name in families {
            let name = name.as_ref().trim();
            if !name.is_empty() && table.family(name).is_none() {
                table.column_families.push(ColumnFamily::new(name));
            }
        }
        table
    }

    /// UUID-shaped key for rows inserted without one.
    pub fn generate_row_key() -> RowKey {
        Uuid::new_v4().to_string()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn families(&self) -> &[ColumnFamily] {
        &self.column_families
    }

    pub(crate) fn families_mut(&mut self) -> impl Iterator<Item = &mut ColumnFamily> {
        self.column_families.iter_mut()
    }

    pub fn family(&self, name: &str) -> Option<&ColumnFamily> {
        let name = name.trim();
        self.column_families.iter().find(|f| f.name() == name)
    }

    pub(crate) fn family_mut(&mut self, name: &str) -> Option<&mut ColumnFamily> {
        let name = name.trim();
        self.column_families.iter_mut().find(|f| f.name() == name)
    }

    /// Non-default family names in declaration order.
    pub fn family_names(&self) -> Vec<&str> {
        self.column_families
            .iter()
            .map(ColumnFamily::name)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Insert one row under a freshly generated key; returns the key.
    pub fn insert_one(&mut self, row_data: &BTreeMap<String, BTreeMap<String, Payload>>) -> RowKey {
        let row_key = Self::generate_row_key();
        for family in &mut self.column_families {
            if let Some(values) = row_data.get(family.name()) {
                family.insert_row(&row_key, values);
            }
        }
        row_key
    }

    /// Coercing write into `family:column`; false when the family is absent.
    pub fn insert_or_update_row(
        &mut self,
        row_key: &str,
        family: &str,
        column: &str,
        raw: &str,
    ) -> bool {
        match self.family_mut(family) {
            Some(f) => {
                f.insert_or_update(row_key, column, raw);
                true
            }
            None => false,
        }
    }

    /// Append a new family, inheriting table-wide indexed mode.
    pub fn add_column_family(&mut self, name: &str, columns: &[String]) {
        let mut family = ColumnFamily::with_columns(name, columns);
        if self.indexed {
            family.set_indexed(true);
        }
        self.column_families.push(family);
    }

    /// The default family survives removal unconditionally.
    pub(crate) fn remove_family(&mut self, name: &str) -> bool {
        let name = name.trim().to_string();
        let before = self.column_families.len();
        self.column_families
            .retain(|f| f.is_default() || f.name() != name);
        self.column_families.len() != before
    }

    pub(crate) fn rename_family(&mut self, from: &str, to: &str) -> bool {
        match self.family_mut(from) {
            Some(family) => {
                family.set_name(to);
                true
            }
            None => false,
        }
    }

    /// Switch on indexed mode table-wide and cascade to every column.
    pub fn enable_index(&mut self) {
        self.indexed = true;
        for family in &mut self.column_families {
            family.set_indexed(true);
        }
    }

    pub fn disable_index(&mut self) {
        self.indexed = false;
        for family in &mut self.column_families {
            family.set_indexed(false);
        }
    }

    /// Union of the per-family nested views.
    pub fn enumerate(&self) -> BTreeMap<RowKey, BTreeMap<String, Payload>> {
        let mut rows: BTreeMap<RowKey, BTreeMap<String, Payload>> = BTreeMap::new();
        for family in &self.column_families {
            for (row_key, values) in family.enumerate() {
                rows.entry(row_key).or_default().extend(values);
            }
        }
        rows
    }

    /// Flat metadata rows across all families; each row appears once.
    pub fn enumerate_with_metadata(&self) -> Vec<MetaRow> {
        let mut rows: Vec<MetaRow> = Vec::new();
        for family in &self.column_families {
            for row in family.enumerate_with_metadata() {
                if !rows.contains(&row) {
                    rows.push(row);
                }
            }
        }
        rows
    }

    /// Metadata rows for one row key, optionally narrowed to a family and
    /// column.
    pub fn enumerate_row(
        &self,
        row_key: &str,
        family: Option<&str>,
        column: Option<&str>,
    ) -> Vec<MetaRow> {
        let mut rows: Vec<MetaRow> = Vec::new();
        for f in &self.column_families {
            if let Some(name) = family {
                if f.name() != name.trim() {
                    continue;
                }
            }
            for row in f.enumerate_row(row_key, column) {
                if !rows.contains(&row) {
                    rows.push(row);
                }
            }
        }
        rows
    }

    /// Distinct row keys across every family and column.
    pub fn row_count(&self) -> usize {
        self.enumerate().len()
    }

    pub fn max_version_count(&self) -> usize {
        self.column_families
            .iter()
            .map(ColumnFamily::max_version_count)
            .max()
            .unwrap_or(0)
    }

    pub fn min_version_count(&self) -> usize {
        self.column_families
            .iter()
            .map(ColumnFamily::min_version_count)
            .min()
            .unwrap_or(0)
    }

    pub fn describe(&self) -> TableDescription {
        TableDescription {
            name: String::new(),
            row_keys: self.row_count(),
            column_families: self
                .family_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            enabled: self.enabled,
            max_versions: self.max_version_count(),
            min_versions: self.min_version_count(),
            indexed: self.indexed,
        }
    }

    /// Bulk insert: row key -> family -> column -> payload. Families not
    /// present on the table are skipped. Returns the number of rows that
    /// stored at least one cell.
    pub fn insert_many(
        &mut self,
        rows: &BTreeMap<String, BTreeMap<String, BTreeMap<String, Payload>>>,
    ) -> usize {
        let mut written = 0;
        for (row_key, families) in rows {
            let mut cells = 0;
            for family in &mut self.column_families {
                if let Some(values) = families.get(family.name()) {
                    cells += family.insert_row(row_key, values);
                }
            }
            if cells > 0 {
                written += 1;
            }
        }
        written
    }

    /// Point read returning family -> column -> current payload.
    pub fn search_data(
        &self,
        row_key: &str,
        family: Option<&str>,
        column: Option<&str>,
    ) -> BTreeMap<String, BTreeMap<String, Payload>> {
        let mut out: BTreeMap<String, BTreeMap<String, Payload>> = BTreeMap::new();
        for f in &self.column_families {
            if let Some(name) = family {
                if f.name() != name.trim() {
                    continue;
                }
            }
            let mut columns = BTreeMap::new();
            match column {
                Some(c) => {
                    if let Some(payload) = f.search_cell(row_key, c).and_then(Cell::current) {
                        columns.insert(c.to_string(), payload.clone());
                    }
                }
                None => {
                    for (name, cell) in f.search_row(row_key) {
                        if let Some(payload) = cell.and_then(Cell::current) {
                            columns.insert(name, payload.clone());
                        }
                    }
                }
            }
            if !columns.is_empty() {
                out.insert(f.name().to_string(), columns);
            }
        }
        out
    }

    pub(crate) fn restore_indexes(&mut self) {
        for family in &mut self.column_families {
            family.restore_indexes();
        }
    }
}
