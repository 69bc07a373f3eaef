//! Normalized records and the typed views built on top of them.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BusTrackerError, Result};

/// One flat upstream entry: field name to string value, in document order.
pub type Record = IndexMap<String, String>;

/// Ordered rows plus the union of their field names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts every row into `T`, failing on the first row that does not fit.
    pub fn typed<T: BusRecord>(&self) -> Result<Vec<T>> {
        self.rows.iter().map(T::from_record).collect()
    }
}

/// A typed record for one endpoint kind.
///
/// Every field is optional: a field missing upstream is `None`, and fields the
/// type does not name are dropped.
pub trait BusRecord: DeserializeOwned + Serialize + std::fmt::Debug {
    const KIND: &'static str;

    fn from_record(record: &Record) -> Result<Self> {
        let object = record
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::from_value(Value::Object(object)).map_err(|source| BusTrackerError::Record {
            kind: Self::KIND,
            source,
        })
    }
}

/// A bus route as returned by `getroutes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route designator, e.g. `151` or `X9`.
    pub rt: Option<String>,
    /// Route name.
    pub rtnm: Option<String>,
    /// Route color as a hex code.
    pub rtclr: Option<String>,
    /// Route designator shown to riders.
    pub rtdd: Option<String>,
}

impl BusRecord for Route {
    const KIND: &'static str = "route";
}

/// A stop on one route and direction, as returned by `getstops`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub stpid: Option<String>,
    pub stpnm: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl BusRecord for Stop {
    const KIND: &'static str = "stop";
}

/// A vehicle position report, as returned by `getvehicles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vid: Option<String>,
    pub tmstmp: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub hdg: Option<String>,
    pub pid: Option<String>,
    pub rt: Option<String>,
    pub des: Option<String>,
    pub pdist: Option<String>,
    pub dly: Option<String>,
    pub tatripid: Option<String>,
    pub origtatripno: Option<String>,
    pub tablockid: Option<String>,
    pub zone: Option<String>,
    pub mode: Option<String>,
    pub psgld: Option<String>,
}

impl BusRecord for Vehicle {
    const KIND: &'static str = "vehicle";
}

impl Vehicle {
    /// Parses `tmstmp` in either minute (`20240105 14:32`) or second
    /// (`20240105 14:32:07`) resolution.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.tmstmp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y%m%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y%m%d %H:%M"))
            .ok()
    }
}
