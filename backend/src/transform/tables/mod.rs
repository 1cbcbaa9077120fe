//! Table transformers, one per source table.
//!
//! Each transformer maps a full raw snapshot to its curated counterpart and
//! never fails: malformed values are resolved where they occur.

pub mod categories;
pub mod customers;
pub mod demographics;
pub mod locations;
pub mod products;
pub mod sales;

use chrono::NaiveDateTime;

use crate::error::SourceResult;
use crate::models::{CuratedTable, Table};
use crate::parser::RawSource;

/// Raw rows read and curated snapshot produced for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Curated {
    pub rows_read: usize,
    pub records: CuratedTable,
}

/// Read the raw snapshot of `table` from `source` and curate it.
///
/// `now` is the processing time of the run, used to reject future dates.
pub fn curate(table: Table, source: &dyn RawSource, now: NaiveDateTime) -> SourceResult<Curated> {
    let (rows_read, records) = match table {
        Table::CrmCustomers => {
            let raw = source.customers()?;
            (raw.len(), CuratedTable::Customers(customers::curate(raw)))
        }
        Table::CrmProducts => {
            let raw = source.products()?;
            (raw.len(), CuratedTable::Products(products::curate(raw)))
        }
        Table::CrmSales => {
            let raw = source.sales()?;
            (raw.len(), CuratedTable::Sales(sales::curate(raw)))
        }
        Table::ErpDemographics => {
            let raw = source.demographics()?;
            (raw.len(), CuratedTable::Demographics(demographics::curate(raw, now)))
        }
        Table::ErpLocations => {
            let raw = source.locations()?;
            (raw.len(), CuratedTable::Locations(locations::curate(raw)))
        }
        Table::ErpCategories => {
            let raw = source.categories()?;
            (raw.len(), CuratedTable::Categories(categories::curate(raw)))
        }
    };
    Ok(Curated { rows_read, records })
}
