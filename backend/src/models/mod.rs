//! Domain models for the curation pipeline.
//!
//! - [`Table`] - The six source tables and their fixed processing order
//! - Raw records - One struct per extract, fields named after the CSV headers
//! - Curated records - The cleansed rows written to the destination store
//! - [`CuratedTable`] - A full curated snapshot of one table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Tables
// =============================================================================

/// A source table and its curated counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// CRM customer master (`crm_cust_info`).
    CrmCustomers,
    /// CRM product history (`crm_prd_info`).
    CrmProducts,
    /// CRM order lines (`crm_sales_details`).
    CrmSales,
    /// ERP customer birthdate and gender (`erp_cust_az12`).
    ErpDemographics,
    /// ERP customer country (`erp_loc_a101`).
    ErpLocations,
    /// ERP product categories (`erp_px_cat_g1v2`).
    ErpCategories,
}

impl Table {
    /// Processing order of a run.
    pub const ALL: [Table; 6] = [
        Table::CrmCustomers,
        Table::CrmProducts,
        Table::CrmSales,
        Table::ErpDemographics,
        Table::ErpLocations,
        Table::ErpCategories,
    ];

    /// Destination table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::CrmCustomers => "crm_cust_info",
            Table::CrmProducts => "crm_prd_info",
            Table::CrmSales => "crm_sales_details",
            Table::ErpDemographics => "erp_cust_az12",
            Table::ErpLocations => "erp_loc_a101",
            Table::ErpCategories => "erp_px_cat_g1v2",
        }
    }

    /// Location of the raw extract, relative to the source root.
    pub fn source_path(self) -> &'static str {
        match self {
            Table::CrmCustomers => "source_crm/cust_info.csv",
            Table::CrmProducts => "source_crm/prd_info.csv",
            Table::CrmSales => "source_crm/sales_details.csv",
            Table::ErpDemographics => "source_erp/CUST_AZ12.csv",
            Table::ErpLocations => "source_erp/LOC_A101.csv",
            Table::ErpCategories => "source_erp/PX_CAT_G1V2.csv",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Table::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
                format!("unknown table '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

impl Serialize for Table {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// =============================================================================
// Raw records
// =============================================================================

/// Row of `source_crm/cust_info.csv`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerRaw {
    #[serde(rename = "cst_id", default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(rename = "cst_key", default)]
    pub key: Option<String>,
    #[serde(rename = "cst_firstname", default)]
    pub first_name: Option<String>,
    #[serde(rename = "cst_lastname", default)]
    pub last_name: Option<String>,
    #[serde(rename = "cst_marital_status", default)]
    pub marital_status: Option<String>,
    #[serde(rename = "cst_gndr", default)]
    pub gender: Option<String>,
    #[serde(rename = "cst_create_date", default, deserialize_with = "lenient::date")]
    pub create_date: Option<NaiveDate>,
}

/// Row of `source_crm/prd_info.csv`.
///
/// `key` is the composite `CAT-SUB-PRODUCT` key. The extract's own
/// `prd_end_dt` column is skipped; end dates are always derived.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductRaw {
    #[serde(rename = "prd_id", default, deserialize_with = "lenient::int")]
    pub id: Option<i64>,
    #[serde(rename = "prd_key", default)]
    pub key: Option<String>,
    #[serde(rename = "prd_nm", default)]
    pub name: Option<String>,
    #[serde(rename = "prd_cost", default, deserialize_with = "lenient::int")]
    pub cost: Option<i64>,
    #[serde(rename = "prd_line", default)]
    pub line: Option<String>,
    #[serde(rename = "prd_start_dt", default, deserialize_with = "lenient::date")]
    pub start_date: Option<NaiveDate>,
}

/// Row of `source_crm/sales_details.csv`. Dates are `YYYYMMDD` integers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SalesRaw {
    #[serde(rename = "sls_ord_num", default)]
    pub order_number: Option<String>,
    #[serde(rename = "sls_prd_key", default)]
    pub product_key: Option<String>,
    #[serde(rename = "sls_cust_id", default, deserialize_with = "lenient::int")]
    pub customer_id: Option<i64>,
    #[serde(rename = "sls_order_dt", default, deserialize_with = "lenient::int")]
    pub order_date: Option<i64>,
    #[serde(rename = "sls_ship_dt", default, deserialize_with = "lenient::int")]
    pub ship_date: Option<i64>,
    #[serde(rename = "sls_due_dt", default, deserialize_with = "lenient::int")]
    pub due_date: Option<i64>,
    #[serde(rename = "sls_sales", default, deserialize_with = "lenient::float")]
    pub sales: Option<f64>,
    #[serde(rename = "sls_quantity", default, deserialize_with = "lenient::int")]
    pub quantity: Option<i64>,
    #[serde(rename = "sls_price", default, deserialize_with = "lenient::float")]
    pub price: Option<f64>,
}

/// Row of `source_erp/CUST_AZ12.csv`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DemographicRaw {
    #[serde(rename = "CID", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "BDATE", default, deserialize_with = "lenient::date")]
    pub birthdate: Option<NaiveDate>,
    #[serde(rename = "GEN", default)]
    pub gender: Option<String>,
}

/// Row of `source_erp/LOC_A101.csv`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationRaw {
    #[serde(rename = "CID", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "CNTRY", default)]
    pub country: Option<String>,
}

/// Row of `source_erp/PX_CAT_G1V2.csv`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryRaw {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "CAT", default)]
    pub category: Option<String>,
    #[serde(rename = "SUBCAT", default)]
    pub subcategory: Option<String>,
    #[serde(rename = "MAINTENANCE", default)]
    pub maintenance: Option<String>,
}

// =============================================================================
// Curated records
// =============================================================================

/// One customer, latest version only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCurated {
    #[serde(rename = "cst_id")]
    pub id: i64,
    #[serde(rename = "cst_key")]
    pub key: Option<String>,
    #[serde(rename = "cst_firstname")]
    pub first_name: Option<String>,
    #[serde(rename = "cst_lastname")]
    pub last_name: Option<String>,
    #[serde(rename = "cst_marital_status")]
    pub marital_status: String,
    #[serde(rename = "cst_gndr")]
    pub gender: String,
    #[serde(rename = "cst_create_date")]
    pub create_date: Option<NaiveDate>,
}

/// One product version with its derived validity period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCurated {
    #[serde(rename = "prd_id")]
    pub id: Option<i64>,
    #[serde(rename = "cat_id")]
    pub category_id: String,
    #[serde(rename = "prd_key")]
    pub product_key: String,
    #[serde(rename = "prd_nm")]
    pub name: Option<String>,
    #[serde(rename = "prd_cost")]
    pub cost: i64,
    #[serde(rename = "prd_line")]
    pub line: String,
    #[serde(rename = "prd_start_dt")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "prd_end_dt")]
    pub end_date: Option<NaiveDate>,
}

/// One order line with reconciled amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesCurated {
    #[serde(rename = "sls_ord_num")]
    pub order_number: Option<String>,
    #[serde(rename = "sls_prd_key")]
    pub product_key: Option<String>,
    #[serde(rename = "sls_cust_id")]
    pub customer_id: Option<i64>,
    #[serde(rename = "sls_order_dt")]
    pub order_date: Option<NaiveDate>,
    #[serde(rename = "sls_ship_dt")]
    pub ship_date: Option<NaiveDate>,
    #[serde(rename = "sls_due_dt")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "sls_sales")]
    pub sales: Option<f64>,
    #[serde(rename = "sls_quantity")]
    pub quantity: Option<i64>,
    #[serde(rename = "sls_price")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicCurated {
    #[serde(rename = "cid")]
    pub customer_id: Option<String>,
    #[serde(rename = "bdate")]
    pub birthdate: Option<NaiveDate>,
    #[serde(rename = "gen")]
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCurated {
    #[serde(rename = "cid")]
    pub customer_id: Option<String>,
    #[serde(rename = "cntry")]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCurated {
    pub id: Option<String>,
    #[serde(rename = "cat")]
    pub category: Option<String>,
    #[serde(rename = "subcat")]
    pub subcategory: Option<String>,
    pub maintenance: Option<String>,
}

// =============================================================================
// Curated snapshot
// =============================================================================

/// Complete curated content of one table, as handed to a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CuratedTable {
    Customers(Vec<CustomerCurated>),
    Products(Vec<ProductCurated>),
    Sales(Vec<SalesCurated>),
    Demographics(Vec<DemographicCurated>),
    Locations(Vec<LocationCurated>),
    Categories(Vec<CategoryCurated>),
}

impl CuratedTable {
    pub fn table(&self) -> Table {
        match self {
            CuratedTable::Customers(_) => Table::CrmCustomers,
            CuratedTable::Products(_) => Table::CrmProducts,
            CuratedTable::Sales(_) => Table::CrmSales,
            CuratedTable::Demographics(_) => Table::ErpDemographics,
            CuratedTable::Locations(_) => Table::ErpLocations,
            CuratedTable::Categories(_) => Table::ErpCategories,
        }
    }

    /// An empty snapshot for `table`, what a truncate leaves behind.
    pub fn empty(table: Table) -> Self {
        match table {
            Table::CrmCustomers => CuratedTable::Customers(Vec::new()),
            Table::CrmProducts => CuratedTable::Products(Vec::new()),
            Table::CrmSales => CuratedTable::Sales(Vec::new()),
            Table::ErpDemographics => CuratedTable::Demographics(Vec::new()),
            Table::ErpLocations => CuratedTable::Locations(Vec::new()),
            Table::ErpCategories => CuratedTable::Categories(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CuratedTable::Customers(rows) => rows.len(),
            CuratedTable::Products(rows) => rows.len(),
            CuratedTable::Sales(rows) => rows.len(),
            CuratedTable::Demographics(rows) => rows.len(),
            CuratedTable::Locations(rows) => rows.len(),
            CuratedTable::Categories(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Lenient field readers
// =============================================================================

/// Deserializers that resolve malformed raw values to `None` instead of
/// failing the whole extract.
mod lenient {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer};

    fn text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(de)?;
        Ok(value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    pub fn int<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
        Ok(text(de)?.and_then(|s| {
            s.parse::<i64>().ok().or_else(|| {
                // Exports sometimes write integers as "12.0".
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
        }))
    }

    pub fn float<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
        Ok(text(de)?.and_then(|s| s.parse::<f64>().ok().filter(|f| f.is_finite())))
    }

    pub fn date<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveDate>, D::Error> {
        Ok(text(de)?.and_then(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
                .ok()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_and_names() {
        let names: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "crm_cust_info",
                "crm_prd_info",
                "crm_sales_details",
                "erp_cust_az12",
                "erp_loc_a101",
                "erp_px_cat_g1v2"
            ]
        );
    }

    #[test]
    fn test_table_from_str() {
        assert_eq!("CRM_SALES_DETAILS".parse::<Table>(), Ok(Table::CrmSales));
        let err = "orders".parse::<Table>().unwrap_err();
        assert!(err.contains("erp_loc_a101"));
    }

    #[test]
    fn test_lenient_fields() {
        let csv = "cst_id,cst_key,cst_firstname,cst_lastname,cst_marital_status,cst_gndr,cst_create_date\n\
                   abc, AW01 ,Jon,,S,M,not-a-date\n\
                   12.0,AW02,,,,,2025-10-06 00:00:00\n";
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<CustomerRaw> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows[0].id, None);
        assert_eq!(rows[0].key.as_deref(), Some(" AW01 "));
        assert_eq!(rows[0].last_name, None);
        assert_eq!(rows[0].create_date, None);

        assert_eq!(rows[1].id, Some(12));
        assert_eq!(rows[1].create_date, NaiveDate::from_ymd_opt(2025, 10, 6));
    }

    #[test]
    fn test_out_of_range_integers_read_as_missing() {
        let csv = "sls_ord_num,sls_cust_id,sls_quantity,sls_order_dt\n\
                   SO1,1e30,-9.3e18,20101229.0\n";
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<SalesRaw> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows[0].customer_id, None);
        assert_eq!(rows[0].quantity, None);
        assert_eq!(rows[0].order_date, Some(20101229));
    }

    #[test]
    fn test_product_end_date_column_skipped() {
        let csv = "prd_id,prd_key,prd_nm,prd_cost,prd_line,prd_start_dt,prd_end_dt\n\
                   210,CO-RF-FR-R92B-58,HL Road Frame,,R,2003-07-01,2004-06-30\n";
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<ProductRaw> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows[0].id, Some(210));
        assert_eq!(rows[0].start_date, NaiveDate::from_ymd_opt(2003, 7, 1));
    }

    #[test]
    fn test_curated_table_empty() {
        for table in Table::ALL {
            let empty = CuratedTable::empty(table);
            assert_eq!(empty.table(), table);
            assert!(empty.is_empty());
        }
    }
}
