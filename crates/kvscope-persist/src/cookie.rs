//! Cookie mirror: a secondary write channel in Set-Cookie form.
//!
//! Alongside the durable medium, a store can mirror every saved value
//! into a cookie jar so an external rendering path can read state without
//! opening the database. Records carry a far-future expiry and are keyed
//! by the same namespaced record key as the durable medium.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{Months, Utc};

use crate::error::Result;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// One mirrored value in Set-Cookie form.
///
/// The value is the raw JSON payload, stored without additional escaping.
/// A payload containing the literal `"; expires="` sequence cannot round
/// trip through [`CookieRecord::parse_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    /// HTTP-date expiry, twenty years out from creation.
    pub expires: String,
    pub path: String,
    pub same_site: String,
}

impl CookieRecord {
    /// Build a record with the standard attributes: twenty-year expiry,
    /// `path=/`, `SameSite=Lax`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: far_future_expires(),
            path: "/".to_owned(),
            same_site: "Lax".to_owned(),
        }
    }

    /// Render the record as one Set-Cookie style line.
    pub fn to_line(&self) -> String {
        format!(
            "{}={}; expires={}; path={}; SameSite={}",
            self.name, self.value, self.expires, self.path, self.same_site
        )
    }

    /// Parse a line produced by [`CookieRecord::to_line`].
    ///
    /// Returns `None` for lines not in that form. The attribute block is
    /// located from the end so that `"; "` inside a JSON value does not
    /// truncate it.
    pub fn parse_line(line: &str) -> Option<Self> {
        let attrs_start = line.rfind("; expires=")?;
        let (pair, attrs) = line.split_at(attrs_start);
        let (name, value) = pair.split_once('=')?;

        let mut expires = String::new();
        let mut path = "/".to_owned();
        let mut same_site = "Lax".to_owned();
        for attr in attrs.strip_prefix("; ")?.split("; ") {
            match attr.split_once('=') {
                Some(("expires", v)) => expires = v.to_owned(),
                Some(("path", v)) => path = v.to_owned(),
                Some(("SameSite", v)) => same_site = v.to_owned(),
                _ => {}
            }
        }

        Some(Self {
            name: name.to_owned(),
            value: value.to_owned(),
            expires,
            path,
            same_site,
        })
    }
}

fn far_future_expires() -> String {
    let now = Utc::now();
    let expires = now.checked_add_months(Months::new(240)).unwrap_or(now);
    expires.format(HTTP_DATE_FORMAT).to_string()
}

/// A store for mirrored cookie records.
pub trait CookieJar: Send + Sync {
    /// The raw payload mirrored under `name`, if any.
    fn read(&self, name: &str) -> Result<Option<String>>;

    /// Mirror a record, replacing any previous record with the same name.
    fn write(&self, record: &CookieRecord) -> Result<()>;
}

/// Cookie jar backed by a text file, one record line per cookie.
///
/// The file is reread on every call, so writes from other handles to the
/// same path are visible immediately.
pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_records(&self) -> Result<Vec<CookieRecord>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(text.lines().filter_map(CookieRecord::parse_line).collect())
    }
}

impl CookieJar for FileCookieJar {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let records = self.load_records()?;
        // Last record wins if the file carries duplicates.
        Ok(records
            .into_iter()
            .rev()
            .find(|record| record.name == name)
            .map(|record| record.value))
    }

    fn write(&self, record: &CookieRecord) -> Result<()> {
        let mut records = self.load_records()?;
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }

        let mut text = String::new();
        for record in &records {
            text.push_str(&record.to_line());
            text.push('\n');
        }
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// In-memory cookie jar for tests.
#[derive(Default)]
pub struct MemoryCookieJar {
    records: RwLock<HashMap<String, CookieRecord>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full stored record, for asserting attributes in tests.
    pub fn record(&self, name: &str) -> Option<CookieRecord> {
        self.records.read().unwrap().get(name).cloned()
    }
}

impl CookieJar for MemoryCookieJar {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let records = self.records.read().unwrap();
        Ok(records.get(name).map(|record| record.value.clone()))
    }

    fn write(&self, record: &CookieRecord) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert(record.name.clone(), record.clone());
        Ok(())
    }
}
