//! Destination stores for curated tables.
//!
//! A [`CuratedStore`] replaces whole tables. `truncate` only stages an empty
//! table; the staged content becomes visible when the following `bulk_write`
//! succeeds, so readers never observe an empty or half-written table and a
//! failed write leaves the previous content in place.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::models::{CuratedTable, Table};

/// Output collaborator of the pipeline.
pub trait CuratedStore {
    /// Stage an empty replacement for `table`.
    fn truncate(&mut self, table: Table) -> StorageResult<()>;

    /// Append `records` to the staged replacement and publish it.
    fn bulk_write(&mut self, table: Table, records: CuratedTable) -> StorageResult<()>;
}

fn ensure_matches(table: Table, records: &CuratedTable) -> StorageResult<()> {
    if records.table() != table {
        return Err(StorageError::Unavailable {
            table: table.to_string(),
            message: format!("received rows of {}", records.table()),
        });
    }
    Ok(())
}

// =============================================================================
// CSV directory store
// =============================================================================

/// One `<table>.csv` file per curated table.
#[derive(Debug)]
pub struct CsvDirStore {
    dir: PathBuf,
    staged: HashSet<Table>,
}

impl CsvDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Live file of `table`.
    pub fn path_of(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.csv", table.name()))
    }

    /// Read the published content of `table` back.
    pub fn load(&self, table: Table) -> StorageResult<CuratedTable> {
        let path = self.path_of(table);
        Ok(match table {
            Table::CrmCustomers => CuratedTable::Customers(read_rows(&path)?),
            Table::CrmProducts => CuratedTable::Products(read_rows(&path)?),
            Table::CrmSales => CuratedTable::Sales(read_rows(&path)?),
            Table::ErpDemographics => CuratedTable::Demographics(read_rows(&path)?),
            Table::ErpLocations => CuratedTable::Locations(read_rows(&path)?),
            Table::ErpCategories => CuratedTable::Categories(read_rows(&path)?),
        })
    }

    fn publish(&self, table: Table, records: &CuratedTable) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        // Same directory as the live file so the final rename stays atomic.
        let staging = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = csv::Writer::from_writer(staging.as_file());
            match records {
                CuratedTable::Customers(rows) => write_rows(&mut writer, rows)?,
                CuratedTable::Products(rows) => write_rows(&mut writer, rows)?,
                CuratedTable::Sales(rows) => write_rows(&mut writer, rows)?,
                CuratedTable::Demographics(rows) => write_rows(&mut writer, rows)?,
                CuratedTable::Locations(rows) => write_rows(&mut writer, rows)?,
                CuratedTable::Categories(rows) => write_rows(&mut writer, rows)?,
            }
            writer.flush()?;
        }
        staging.as_file().sync_all()?;

        let path = self.path_of(table);
        staging.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        debug!(table = %table, path = %path.display(), rows = records.len(), "published curated table");
        Ok(())
    }
}

fn write_rows<W: std::io::Write, T: Serialize>(writer: &mut csv::Writer<W>, rows: &[T]) -> StorageResult<()> {
    for row in rows {
        writer.serialize(row)?;
    }
    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> StorageResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

impl CuratedStore for CsvDirStore {
    fn truncate(&mut self, table: Table) -> StorageResult<()> {
        self.staged.insert(table);
        Ok(())
    }

    fn bulk_write(&mut self, table: Table, records: CuratedTable) -> StorageResult<()> {
        ensure_matches(table, &records)?;
        if !self.staged.remove(&table) {
            return Err(StorageError::NotTruncated(table.to_string()));
        }
        self.publish(table, &records)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Tables held in memory. Can be told to fail writes for chosen tables.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    live: HashMap<Table, CuratedTable>,
    staged: HashMap<Table, CuratedTable>,
    failing: HashSet<Table>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `bulk_write` of `table` fail.
    pub fn fail_writes_for(mut self, table: Table) -> Self {
        self.failing.insert(table);
        self
    }

    /// Published content of `table`, if it was ever written.
    pub fn get(&self, table: Table) -> Option<&CuratedTable> {
        self.live.get(&table)
    }

    /// Seed published content, as left by an earlier run.
    pub fn seed(&mut self, records: CuratedTable) {
        self.live.insert(records.table(), records);
    }
}

impl CuratedStore for InMemoryStore {
    fn truncate(&mut self, table: Table) -> StorageResult<()> {
        self.staged.insert(table, CuratedTable::empty(table));
        Ok(())
    }

    fn bulk_write(&mut self, table: Table, records: CuratedTable) -> StorageResult<()> {
        ensure_matches(table, &records)?;
        if self.failing.contains(&table) {
            self.staged.remove(&table);
            return Err(StorageError::Unavailable {
                table: table.to_string(),
                message: "write rejected".to_string(),
            });
        }
        if self.staged.remove(&table).is_none() {
            return Err(StorageError::NotTruncated(table.to_string()));
        }
        self.live.insert(table, records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryCurated, LocationCurated};
    use tempfile::tempdir;

    fn locations(ids: &[&str]) -> CuratedTable {
        CuratedTable::Locations(
            ids.iter()
                .map(|id| LocationCurated {
                    customer_id: Some(id.to_string()),
                    country: "Germany".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_csv_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = CsvDirStore::new(dir.path());

        store.truncate(Table::ErpLocations).unwrap();
        store
            .bulk_write(Table::ErpLocations, locations(&["AW00011000", "AW00011001"]))
            .unwrap();

        let content = fs::read_to_string(store.path_of(Table::ErpLocations)).unwrap();
        assert!(content.starts_with("cid,cntry\n"));

        let loaded = store.load(Table::ErpLocations).unwrap();
        assert_eq!(loaded, locations(&["AW00011000", "AW00011001"]));
    }

    #[test]
    fn test_csv_store_replaces_content() {
        let dir = tempdir().unwrap();
        let mut store = CsvDirStore::new(dir.path());

        for ids in [&["A", "B", "C"][..], &["D"][..]] {
            store.truncate(Table::ErpLocations).unwrap();
            store.bulk_write(Table::ErpLocations, locations(ids)).unwrap();
        }
        assert_eq!(store.load(Table::ErpLocations).unwrap(), locations(&["D"]));
    }

    #[test]
    fn test_write_without_truncate_rejected() {
        let dir = tempdir().unwrap();
        let mut store = CsvDirStore::new(dir.path());
        let err = store
            .bulk_write(Table::ErpLocations, locations(&["A"]))
            .unwrap_err();
        assert!(matches!(err, StorageError::NotTruncated(_)));
    }

    #[test]
    fn test_mismatched_rows_rejected() {
        let mut store = InMemoryStore::new();
        store.truncate(Table::ErpCategories).unwrap();
        let err = store
            .bulk_write(Table::ErpCategories, locations(&["A"]))
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[test]
    fn test_failed_write_keeps_previous_content() {
        let previous = CuratedTable::Categories(vec![CategoryCurated {
            id: Some("AC_BR".into()),
            category: Some("Accessories".into()),
            subcategory: Some("Bike Racks".into()),
            maintenance: Some("Yes".into()),
        }]);
        let mut store = InMemoryStore::new().fail_writes_for(Table::ErpCategories);
        store.seed(previous.clone());

        store.truncate(Table::ErpCategories).unwrap();
        assert!(store
            .bulk_write(Table::ErpCategories, CuratedTable::Categories(Vec::new()))
            .is_err());
        assert_eq!(store.get(Table::ErpCategories), Some(&previous));
    }
}
