use bytes::Bytes;
use log::warn;
use std::collections::HashMap;
use std::sync::Mutex;

/// Encoding of a committed asset payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    None,
    Jpeg,
    Png,
}

impl Format {
    pub fn to_u32(self) -> u32 {
        match self {
            Format::None => 0,
            Format::Jpeg => 1,
            Format::Png => 2,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Format::None),
            1 => Some(Format::Jpeg),
            2 => Some(Format::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Empty,
    Pending,
    Error,
    Committed,
}

impl AssetState {
    pub fn to_u32(self) -> u32 {
        match self {
            AssetState::Empty => 0,
            AssetState::Pending => 1,
            AssetState::Error => 2,
            AssetState::Committed => 3,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(AssetState::Empty),
            1 => Some(AssetState::Pending),
            2 => Some(AssetState::Error),
            3 => Some(AssetState::Committed),
            _ => None,
        }
    }
}

/// One asset row as persisted in snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub id: String,
    pub url: String,
    pub bytes: Bytes,
    pub format: Format,
    pub state: AssetState,
}

#[derive(Debug, Default)]
struct Row {
    url: String,
    bytes: Bytes,
    format: Option<Format>,
    state: RowState,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum RowState {
    #[default]
    Empty,
    Pending,
    Error,
    Committed,
}

/// Shared cache of remote assets keyed by image ref, rendering id or node id.
///
/// The row lifecycle is Empty -> Pending -> (Committed | Error). A single
/// mutex guards every transition and read; all operations are short and
/// non-reentrant. Committed rows only ever leave the store through `clear`.
pub struct AssetStore {
    rows: Mutex<HashMap<String, Row>>,
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.lock().unwrap().contains_key(key)
    }

    /// Creates an Empty row. The key must not exist yet.
    pub fn insert(&self, key: &str) {
        let mut rows = self.rows.lock().unwrap();
        debug_assert!(!rows.contains_key(key));
        rows.insert(key.to_owned(), Row::default());
    }

    /// Creates an Empty row that already knows its download url.
    pub fn insert_url(&self, key: &str, url: &str) {
        let mut rows = self.rows.lock().unwrap();
        debug_assert!(!rows.contains_key(key));
        rows.insert(
            key.to_owned(),
            Row {
                url: url.to_owned(),
                ..Row::default()
            },
        );
    }

    pub fn set_url(&self, key: &str, url: &str) {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(key) else {
            debug_assert!(false, "set_url on unknown key");
            return;
        };
        debug_assert!(row.url.is_empty());
        debug_assert!(row.state != RowState::Error);
        row.url = url.to_owned();
    }

    /// Atomic get-and-set: claims the row for a retrieval attempt. Returns
    /// false when another attempt already holds it.
    pub fn set_pending(&self, key: &str) -> bool {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(key) else {
            debug_assert!(false, "set_pending on unknown key");
            return false;
        };
        if row.state == RowState::Pending {
            return false;
        }
        debug_assert!(row.state == RowState::Empty);
        row.state = RowState::Pending;
        true
    }

    /// Commits downloaded bytes. Returns false when the row is no longer
    /// awaiting data (a cancel or clean raced the network callback).
    pub fn set_bytes(&self, key: &str, bytes: Bytes, format: Format) -> bool {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(key) else {
            debug_assert!(false, "set_bytes on unknown key");
            return false;
        };
        if row.state != RowState::Pending {
            warn!(target: "AssetStore", "late commit dropped for '{key}'");
            return false;
        }
        debug_assert!(!bytes.is_empty());
        row.bytes = bytes;
        row.format = Some(format);
        row.state = RowState::Committed;
        true
    }

    pub fn set_error(&self, key: &str) {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(key) else {
            debug_assert!(false, "set_error on unknown key");
            return;
        };
        debug_assert!(row.state != RowState::Committed);
        if row.state != RowState::Committed {
            row.state = RowState::Error;
        }
    }

    /// Committed payload, or None while the row is not (or no longer) usable.
    pub fn data(&self, key: &str) -> Option<Bytes> {
        let rows = self.rows.lock().unwrap();
        let row = rows.get(key)?;
        match row.state {
            RowState::Committed => Some(row.bytes.clone()),
            _ => None,
        }
    }

    pub fn format(&self, key: &str) -> Format {
        let rows = self.rows.lock().unwrap();
        rows.get(key)
            .and_then(|row| row.format)
            .unwrap_or(Format::None)
    }

    pub fn url(&self, key: &str) -> Option<String> {
        let rows = self.rows.lock().unwrap();
        let row = rows.get(key)?;
        if row.url.is_empty() {
            None
        } else {
            Some(row.url.clone())
        }
    }

    /// True unless the row has committed bytes.
    pub fn is_empty(&self, key: &str) -> bool {
        let rows = self.rows.lock().unwrap();
        match rows.get(key) {
            Some(row) => row.state != RowState::Committed,
            None => true,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        let rows = self.rows.lock().unwrap();
        matches!(rows.get(key), Some(row) if row.state == RowState::Pending)
    }

    pub fn is_error(&self, key: &str) -> bool {
        let rows = self.rows.lock().unwrap();
        matches!(rows.get(key), Some(row) if row.state == RowState::Error)
    }

    pub fn keys(&self) -> Vec<String> {
        let rows = self.rows.lock().unwrap();
        let mut keys: Vec<String> = rows.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty_store(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }

    /// Demotes every non-Committed row back to Empty so a retry can claim it
    /// again. Error rows are kept when `keep_errors` is set.
    pub fn clean(&self, keep_errors: bool) {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.values_mut() {
            if row.state == RowState::Committed {
                continue;
            }
            if keep_errors && row.state == RowState::Error {
                continue;
            }
            row.state = RowState::Empty;
        }
    }

    pub fn clear(&self) {
        self.rows.lock().unwrap().clear();
    }

    /// Committed rows only, in key order. This is the snapshot payload.
    pub fn committed(&self) -> Vec<AssetRecord> {
        let rows = self.rows.lock().unwrap();
        let mut records: Vec<AssetRecord> = rows
            .iter()
            .filter(|(_, row)| row.state == RowState::Committed)
            .map(|(key, row)| AssetRecord {
                id: key.clone(),
                url: row.url.clone(),
                bytes: row.bytes.clone(),
                format: row.format.unwrap_or(Format::None),
                state: AssetState::Committed,
            })
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Replaces the store contents with snapshot records.
    pub fn restore(&self, records: Vec<AssetRecord>) {
        let mut rows = self.rows.lock().unwrap();
        rows.clear();
        for record in records {
            let state = match record.state {
                AssetState::Committed => RowState::Committed,
                AssetState::Error => RowState::Error,
                AssetState::Pending | AssetState::Empty => RowState::Empty,
            };
            rows.insert(
                record.id,
                Row {
                    url: record.url,
                    bytes: record.bytes,
                    format: Some(record.format),
                    state,
                },
            );
        }
    }
}
