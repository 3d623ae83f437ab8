use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::storage::{HeapFile, StorageError};
use crate::tuple::{TupleDesc, Type};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Table id {0} not found")]
    TableIdNotFound(u32),

    #[error("Schema parse error: {0}")]
    Parse(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

struct TableInfo {
    file: Arc<HeapFile>,
    name: String,
    primary_key: Option<String>,
}

/// Registry of tables: id ↔ name ↔ schema ↔ primary-key field ↔ backing
/// heap file. The catalog holds the files and outlives all queries.
#[derive(Default)]
pub struct Catalog {
    tables: HashMap<u32, TableInfo>,
    by_name: HashMap<String, u32>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any table previously registered under
    /// the same name or id. Returns the table id.
    pub fn add_table(
        &mut self,
        file: Arc<HeapFile>,
        name: impl Into<String>,
        primary_key: Option<String>,
    ) -> u32 {
        let name = name.into();
        let id = file.id();
        if let Some(old) = self.by_name.insert(name.clone(), id) {
            self.tables.remove(&old);
        }
        self.tables.insert(
            id,
            TableInfo {
                file,
                name,
                primary_key,
            },
        );
        id
    }

    pub fn table_id(&self, name: &str) -> CatalogResult<u32> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    pub fn table_name(&self, id: u32) -> CatalogResult<&str> {
        self.info(id).map(|t| t.name.as_str())
    }

    pub fn tuple_desc(&self, id: u32) -> CatalogResult<Arc<TupleDesc>> {
        self.info(id).map(|t| t.file.desc().clone())
    }

    pub fn table_file(&self, id: u32) -> CatalogResult<&Arc<HeapFile>> {
        self.info(id).map(|t| &t.file)
    }

    pub fn primary_key(&self, id: u32) -> CatalogResult<Option<&str>> {
        self.info(id).map(|t| t.primary_key.as_deref())
    }

    pub fn table_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.tables.keys().copied()
    }

    fn info(&self, id: u32) -> CatalogResult<&TableInfo> {
        self.tables.get(&id).ok_or(CatalogError::TableIdNotFound(id))
    }

    /// Load a plain-text schema file: one table per line,
    /// `name (col type [pk], col type, ...)` with `type ∈ {int, string}`.
    /// Each table's backing file is `<name>.dat` next to the schema file.
    /// Returns the ids of the loaded tables.
    pub fn load_schema(&mut self, path: impl AsRef<Path>) -> CatalogResult<Vec<u32>> {
        let path = path.as_ref();
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let content = fs::read_to_string(path)?;

        let mut ids = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, columns, primary_key) = parse_table_line(line)?;
            let (types, names): (Vec<Type>, Vec<Option<String>>) = columns
                .into_iter()
                .map(|(name, ty)| (ty, Some(name)))
                .unzip();
            let desc = Arc::new(TupleDesc::new(types, names));
            let file = Arc::new(HeapFile::open(
                base_dir.join(format!("{}.dat", name)),
                desc,
            )?);
            info!(table = %name, id = file.id(), "loaded table schema");
            ids.push(self.add_table(file, name, primary_key));
        }
        Ok(ids)
    }
}

/// Parse one `name (col type [pk], ...)` schema line.
fn parse_table_line(
    line: &str,
) -> CatalogResult<(String, Vec<(String, Type)>, Option<String>)> {
    let open = line
        .find('(')
        .ok_or_else(|| CatalogError::Parse(format!("missing '(' in {:?}", line)))?;
    let close = line
        .rfind(')')
        .ok_or_else(|| CatalogError::Parse(format!("missing ')' in {:?}", line)))?;
    let name = line[..open].trim().to_string();
    if name.is_empty() {
        return Err(CatalogError::Parse(format!("missing table name in {:?}", line)));
    }

    let mut columns = Vec::new();
    let mut primary_key = None;
    for column in line[open + 1..close].split(',') {
        let mut tokens = column.split_whitespace();
        let col = tokens
            .next()
            .ok_or_else(|| CatalogError::Parse(format!("empty column in {:?}", line)))?
            .to_string();
        let ty = match tokens.next() {
            Some("int") => Type::Int,
            Some("string") => Type::String(Type::DEFAULT_STRING_LEN),
            other => {
                return Err(CatalogError::Parse(format!(
                    "unknown column type {:?} in {:?}",
                    other, line
                )));
            }
        };
        match tokens.next() {
            Some("pk") => primary_key = Some(col.clone()),
            Some(extra) => {
                return Err(CatalogError::Parse(format!(
                    "unexpected token {:?} in {:?}",
                    extra, line
                )));
            }
            None => {}
        }
        columns.push((col, ty));
    }
    if columns.is_empty() {
        return Err(CatalogError::Parse(format!("no columns in {:?}", line)));
    }
    Ok((name, columns, primary_key))
}
