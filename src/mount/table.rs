//! Mount table snapshot and mount point resolution

use std::path::Path;

use crate::models::MountRecord;

/// Parsed output of one `mount` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    records: Vec<MountRecord>,
}

impl MountTable {
    /// Build a table from `mount` output lines. Unparseable lines are skipped.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref();
                let record = MountRecord::parse(line);
                if record.is_none() && !line.trim().is_empty() {
                    debug!("Skipping mount line: {}", line);
                }
                record
            })
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[MountRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most specific mount containing `path`.
    ///
    /// Matching is by whole path components, so `/data` does not contain
    /// `/database`. When the same mount point appears more than once, the
    /// last entry (the topmost mount) wins.
    pub fn resolve(&self, path: &Path) -> Option<&MountRecord> {
        self.records
            .iter()
            .filter(|record| path.starts_with(&record.mount_point))
            .max_by_key(|record| Path::new(&record.mount_point).components().count())
    }
}

impl FromIterator<MountRecord> for MountTable {
    fn from_iter<T: IntoIterator<Item = MountRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
