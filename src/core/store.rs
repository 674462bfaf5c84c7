//! Purpose: File-bound record store: load on open, query in memory, save on demand.
//! Exports: `Store`, `SaveOptions`, `Backup`, `DEFAULT_BACKUP_SUFFIX`.
//! Role: Owns the ordered record sequence and its persistence contract.
//! Invariants: Disk is only touched by `open` and `save`; each is a self-contained cycle.
//! Invariants: The backup (when requested) is taken before the destination is rewritten.
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::codec::{self, Record, Style};
use crate::core::error::{Error, ErrorKind};
use crate::core::query::{self, Criteria, Criterion};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Policy for backing up the bound file before a save rewrites it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Backup {
    /// Copy the bound file to `<path><suffix>`; a missing bound file fails the save.
    Suffix(String),
    /// Like `Suffix`, but a missing bound file skips the backup silently.
    IfPresent(String),
    /// No backup.
    Off,
}

impl Default for Backup {
    fn default() -> Self {
        Self::Suffix(DEFAULT_BACKUP_SUFFIX.to_string())
    }
}

/// Options for `Store::save`.
#[derive(Clone, Debug, Default)]
pub struct SaveOptions {
    /// Destination path; the store's bound path when unset.
    pub to: Option<PathBuf>,
    pub backup: Backup,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(mut self, path: impl Into<PathBuf>) -> Self {
        self.to = Some(path.into());
        self
    }

    pub fn backup(mut self, backup: Backup) -> Self {
        self.backup = backup;
        self
    }

    pub fn no_backup(mut self) -> Self {
        self.backup = Backup::Off;
        self
    }
}

/// An ordered sequence of records bound to one file.
///
/// The file's content populates the store at `open`; afterwards all mutation
/// is in-memory until an explicit `save`. The store does not track whether
/// memory and disk have diverged.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Vec<Record>,
    style: Style,
}

impl Store {
    /// Open the store bound to `path` with the default formatting style.
    ///
    /// A missing, blank, or `null` file yields an empty store. A file whose
    /// top level is not a sequence of mappings is a `Config` error; malformed
    /// content is a `Parse` error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with_style(path, Style::new())
    }

    pub fn open_with_style(path: impl AsRef<Path>, style: Style) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path) {
            Ok(text) => codec::decode(&text)
                .map_err(|err| err.with_path(&path))?
                .unwrap_or_default(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("cannot read store file")
                    .with_path(&path)
                    .with_source(err));
            }
        };

        tracing::debug!(path = %path.display(), records = records.len(), "opened store");
        Ok(Self {
            path,
            records,
            style,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Save the in-memory records, backing up the bound file first.
    ///
    /// The backup always keys off the bound path, even when `options.to`
    /// points elsewhere. The destination is written via a sibling temp file
    /// and renamed into place, so an interrupted save never corrupts the
    /// backup just taken.
    pub fn save(&self, options: &SaveOptions) -> Result<(), Error> {
        match &options.backup {
            Backup::Suffix(suffix) => self.back_up(suffix)?,
            Backup::IfPresent(suffix) => {
                if self.path.exists() {
                    self.back_up(suffix)?;
                }
            }
            Backup::Off => {}
        }

        let dest = options.to.as_deref().unwrap_or(&self.path);
        let text = codec::encode(&self.records, &self.style)?;

        let tmp = sibling_with_suffix(dest, ".tmp");
        fs::write(&tmp, text).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("cannot write store file")
                .with_path(&tmp)
                .with_source(err)
        })?;
        fs::rename(&tmp, dest).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            Error::new(ErrorKind::Io)
                .with_message("cannot move saved store file into place")
                .with_path(dest)
                .with_source(err)
        })?;

        tracing::debug!(path = %dest.display(), records = self.records.len(), "saved store");
        Ok(())
    }

    fn back_up(&self, suffix: &str) -> Result<(), Error> {
        // An empty suffix would make the backup path the bound path itself;
        // the copy would be a silent no-op and the save would go on to
        // overwrite the only copy of the old content.
        if suffix.is_empty() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("backup suffix must not be empty")
                .with_path(&self.path)
                .with_hint("Use Backup::Off to save without a backup."));
        }
        let backup = sibling_with_suffix(&self.path, suffix);
        fs::copy(&self.path, &backup).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("cannot back up store file before saving")
                .with_path(&self.path)
                .with_hint("Use Backup::IfPresent or Backup::Off when the store file may not exist yet.")
                .with_source(err)
        })?;
        Ok(())
    }

    /// All records satisfying `criteria`, in store order.
    pub fn filter(&self, criteria: &Criteria) -> Vec<&Record> {
        query::filter(&self.records, criteria)
    }

    /// Like `filter`, with each match paired with its position in the store.
    ///
    /// Positions are only valid until the next `append` or `remove`.
    pub fn filter_indexed(&self, criteria: &Criteria) -> Vec<(usize, &Record)> {
        query::filter_indexed(&self.records, criteria)
    }

    /// The single record satisfying `criteria`.
    pub fn get_one(&self, criteria: &Criteria) -> Result<&Record, Error> {
        let matched = self.filter(criteria);
        match matched.len() {
            0 => Err(Error::new(ErrorKind::NotFound)
                .with_message("no record satisfies the criteria")
                .with_path(&self.path)),
            1 => Ok(matched[0]),
            count => Err(Error::new(ErrorKind::Ambiguous)
                .with_message(format!("{count} records satisfy the criteria"))
                .with_path(&self.path)),
        }
    }

    /// The value of property `name` across all records satisfying `criteria`,
    /// tolerating numeric disagreement up to `tolerance`.
    ///
    /// Records lacking the property are excluded before filtering. A single
    /// collected value is returned as-is. Multiple values fail with
    /// `Disagreement` when `tolerance` is zero, when any value is not
    /// numeric, or when their spread (max minus min) exceeds `tolerance`;
    /// within tolerance the arithmetic mean of the values is returned.
    pub fn get_property(
        &self,
        name: &str,
        tolerance: f64,
        criteria: &Criteria,
    ) -> Result<Value, Error> {
        let mut criteria = criteria.clone();
        criteria.push(name, Criterion::Present);

        let values: Vec<&Value> = self
            .filter(&criteria)
            .into_iter()
            .filter_map(|record| record.get(name))
            .collect();

        match values.len() {
            0 => Err(Error::new(ErrorKind::NotFound)
                .with_message("no matching record carries the property")
                .with_key(name)
                .with_path(&self.path)),
            1 => Ok(values[0].clone()),
            count => {
                if tolerance == 0.0 {
                    return Err(Error::new(ErrorKind::Disagreement)
                        .with_message(format!(
                            "{count} values found and no disagreement is tolerated"
                        ))
                        .with_key(name)
                        .with_path(&self.path));
                }

                let mut numbers = Vec::with_capacity(values.len());
                for value in &values {
                    match value.as_f64() {
                        Some(number) if number.is_finite() => numbers.push(number),
                        _ => {
                            return Err(Error::new(ErrorKind::Disagreement)
                                .with_message("values disagree and are not numeric, cannot aggregate")
                                .with_key(name)
                                .with_path(&self.path));
                        }
                    }
                }

                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let spread = max - min;
                if spread > tolerance {
                    return Err(Error::new(ErrorKind::Disagreement)
                        .with_message(format!(
                            "value spread {spread} exceeds tolerance {tolerance}"
                        ))
                        .with_key(name)
                        .with_path(&self.path));
                }

                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                Ok(Value::from(mean))
            }
        }
    }

    /// Append one record at the end of the sequence. No shape validation.
    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Remove every record satisfying `criteria`, keeping the order of the
    /// remainder. Returns the number removed.
    pub fn remove(&mut self, criteria: &Criteria) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !criteria.accepts(record));
        before - self.records.len()
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
