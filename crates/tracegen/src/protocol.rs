//! Capture records written by the runtime collector, one file per
//! invocation.
//!
//! # Record format
//!
//! ```text
//! | MAGIC (4B): b"TGCR"          |
//! | VERSION (2B, LE u16)         |
//! | BODY: bincode(CaptureRecord) |
//! ```
//!
//! Collectors that cannot link a bincode encoder may write the same record
//! as JSON instead; a record whose first byte is `{` is read that way, with
//! values in the collector's JSON form (see [`CapturedValue::from_json`]).
//!
//! # Results list
//!
//! UTF-8 text naming one record file per line, in invocation order. Relative
//! paths resolve against the list's directory. Blank lines and `#` comments
//! are ignored.

use crate::identifier::InternalId;
use crate::result::{TracegenError, TracegenResult};
use crate::value::CapturedValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Magic bytes at the start of every binary capture record.
pub const MAGIC: &[u8; 4] = b"TGCR";

/// Capture record protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// Probe that produced a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// Method entry
    Entry,
    /// Method exit
    Exit,
}

/// One value read by one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCapture {
    /// Probe phase
    pub phase: CapturePhase,
    /// Identifier id
    pub id: InternalId,
    /// Value
    pub value: CapturedValue,
}

/// Everything captured for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Invocation sequence index
    pub invocation: u64,
    /// Receiver identity token, `None` for static calls or when not tracked
    pub identity: Option<u64>,
    /// Captured values
    pub captures: Vec<RawCapture>,
    /// Exception class, when the collector saw the call throw
    pub exception: Option<String>,
}

impl CaptureRecord {
    /// Empty record for invocation `index`.
    #[must_use]
    pub const fn new(invocation: u64) -> Self {
        Self {
            invocation,
            identity: None,
            captures: Vec::new(),
            exception: None,
        }
    }

    /// Set the identity token.
    #[must_use]
    pub const fn with_identity(mut self, identity: u64) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Add an entry-phase capture.
    #[must_use]
    pub fn entry(mut self, id: InternalId, value: CapturedValue) -> Self {
        self.captures.push(RawCapture {
            phase: CapturePhase::Entry,
            id,
            value,
        });
        self
    }

    /// Add an exit-phase capture.
    #[must_use]
    pub fn exit(mut self, id: InternalId, value: CapturedValue) -> Self {
        self.captures.push(RawCapture {
            phase: CapturePhase::Exit,
            id,
            value,
        });
        self
    }

    /// Record the exception the call threw.
    #[must_use]
    pub fn threw(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Encode as a binary record.
    pub fn encode(&self) -> TracegenResult<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Decode a binary or JSON record. Anything else is a capture error.
    pub fn decode(bytes: &[u8]) -> TracegenResult<Self> {
        if bytes.first() == Some(&b'{') {
            return decode_json(bytes);
        }
        if bytes.len() < HEADER_LEN {
            return Err(TracegenError::capture(format!(
                "capture record truncated ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[..MAGIC.len()] != MAGIC.as_slice() {
            return Err(TracegenError::capture("capture record has bad magic"));
        }
        let version = u16::from_le_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
        if version != PROTOCOL_VERSION {
            return Err(TracegenError::capture(format!(
                "unsupported capture protocol version {version}"
            )));
        }
        bincode::deserialize(&bytes[HEADER_LEN..])
            .map_err(|e| TracegenError::capture(format!("undecodable capture record: {e}")))
    }

    /// Write an encoded record to `path`.
    pub fn write_to(&self, path: &Path) -> TracegenResult<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Read and decode the record at `path`.
    pub fn read_from(path: &Path) -> TracegenResult<Self> {
        let bytes = fs::read(path).map_err(|e| {
            TracegenError::capture(format!("cannot read capture record {}: {e}", path.display()))
        })?;
        Self::decode(&bytes).map_err(|e| match e {
            TracegenError::Capture { message } => {
                TracegenError::capture(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }
}

#[derive(Deserialize)]
struct JsonCapture {
    phase: CapturePhase,
    id: u32,
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRecord {
    invocation: u64,
    #[serde(default)]
    identity: Option<u64>,
    #[serde(default)]
    captures: Vec<JsonCapture>,
    #[serde(default)]
    exception: Option<String>,
}

fn decode_json(bytes: &[u8]) -> TracegenResult<CaptureRecord> {
    let record: JsonRecord = serde_json::from_slice(bytes)
        .map_err(|e| TracegenError::capture(format!("undecodable capture record: {e}")))?;
    let captures = record
        .captures
        .into_iter()
        .map(|c| {
            Ok(RawCapture {
                phase: c.phase,
                id: InternalId::new(c.id),
                value: CapturedValue::from_json(&c.value)?,
            })
        })
        .collect::<TracegenResult<Vec<_>>>()?;
    Ok(CaptureRecord {
        invocation: record.invocation,
        identity: record.identity,
        captures,
        exception: record.exception,
    })
}

/// Ordered list of capture record files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsList {
    records: Vec<PathBuf>,
}

impl ResultsList {
    /// List of the given record paths.
    #[must_use]
    pub fn new(records: Vec<PathBuf>) -> Self {
        Self { records }
    }

    /// Parse list text; relative entries are joined onto `base`.
    #[must_use]
    pub fn parse(text: &str, base: &Path) -> Self {
        let records = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let path = Path::new(line);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    base.join(path)
                }
            })
            .collect();
        Self { records }
    }

    /// Read a list file.
    pub fn read(path: &Path) -> TracegenResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            TracegenError::capture(format!("cannot read results list {}: {e}", path.display()))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self::parse(&text, base))
    }

    /// Write the list, one path per line.
    pub fn write(&self, path: &Path) -> TracegenResult<()> {
        let mut text = String::new();
        for record in &self.records {
            text.push_str(&record.display().to_string());
            text.push('\n');
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Record paths in invocation order.
    #[must_use]
    pub fn records(&self) -> &[PathBuf] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read every record, in order.
    pub fn read_records(&self) -> TracegenResult<Vec<CaptureRecord>> {
        self.records
            .iter()
            .map(|path| CaptureRecord::read_from(path))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record() -> CaptureRecord {
        CaptureRecord::new(3)
            .with_identity(77)
            .entry(InternalId::new(1), CapturedValue::Int(5))
            .exit(InternalId::new(2), CapturedValue::String("ok".into()))
    }

    mod binary {
        use super::*;

        #[test]
        fn header_layout() {
            let bytes = record().encode().unwrap();
            assert_eq!(&bytes[..4], b"TGCR");
            assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), PROTOCOL_VERSION);
            assert_eq!(CaptureRecord::decode(&bytes).unwrap(), record());
        }

        #[test]
        fn bad_magic() {
            let mut bytes = record().encode().unwrap();
            bytes[..4].copy_from_slice(b"XXXX");
            let err = CaptureRecord::decode(&bytes).unwrap_err();
            assert!(matches!(err, TracegenError::Capture { .. }));
        }

        #[test]
        fn future_version() {
            let mut bytes = record().encode().unwrap();
            bytes[4..6].copy_from_slice(&9u16.to_le_bytes());
            assert!(CaptureRecord::decode(&bytes)
                .unwrap_err()
                .to_string()
                .contains("version 9"));
        }

        #[test]
        fn truncated_body() {
            let bytes = record().encode().unwrap();
            let err = CaptureRecord::decode(&bytes[..bytes.len() - 3]).unwrap_err();
            assert!(err.is_recoverable());
            assert!(CaptureRecord::decode(b"TG").is_err());
        }
    }

    mod json {
        use super::*;

        #[test]
        fn collector_json_form() {
            let text = r#"{
                "invocation": 0,
                "identity": 9,
                "captures": [
                    {"phase": "entry", "id": 1, "value": {"$class": "com.example.Point", "x": 1}},
                    {"phase": "exit", "id": 2, "value": 4}
                ]
            }"#;
            let record = CaptureRecord::decode(text.as_bytes()).unwrap();
            assert_eq!(record.identity, Some(9));
            assert_eq!(record.captures.len(), 2);
            assert!(matches!(record.captures[0].value, CapturedValue::Object(_)));
            assert_eq!(record.captures[1].value, CapturedValue::Int(4));
            assert_eq!(record.exception, None);
        }

        #[test]
        fn malformed_json() {
            assert!(matches!(
                CaptureRecord::decode(b"{ nope"),
                Err(TracegenError::Capture { .. })
            ));
        }
    }

    mod results_list {
        use super::*;

        #[test]
        fn parse_skips_comments_and_resolves_relative() {
            let list = ResultsList::parse(
                "# records\n\ninv-0.bin\n  inv-1.bin  \n/abs/inv-2.bin\n",
                Path::new("/out"),
            );
            assert_eq!(
                list.records(),
                [
                    PathBuf::from("/out/inv-0.bin"),
                    PathBuf::from("/out/inv-1.bin"),
                    PathBuf::from("/abs/inv-2.bin"),
                ]
            );
        }

        #[test]
        fn read_records_in_order() {
            let dir = TempDir::new().unwrap();
            for i in 0..3 {
                CaptureRecord::new(i)
                    .entry(InternalId::new(1), CapturedValue::Long(i as i64))
                    .write_to(&dir.path().join(format!("inv-{i}.bin")))
                    .unwrap();
            }
            let list_path = dir.path().join("results.txt");
            fs::write(&list_path, "inv-0.bin\ninv-1.bin\ninv-2.bin\n").unwrap();
            let records = ResultsList::read(&list_path).unwrap().read_records().unwrap();
            let indices: Vec<_> = records.iter().map(|r| r.invocation).collect();
            assert_eq!(indices, vec![0, 1, 2]);
        }

        #[test]
        fn missing_record_is_capture_error() {
            let dir = TempDir::new().unwrap();
            let list = ResultsList::new(vec![dir.path().join("gone.bin")]);
            let err = list.read_records().unwrap_err();
            assert!(matches!(err, TracegenError::Capture { .. }));
        }

        #[test]
        fn write_then_read() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("results.txt");
            let list = ResultsList::new(vec![dir.path().join("a.bin"), dir.path().join("b.bin")]);
            list.write(&path).unwrap();
            assert_eq!(ResultsList::read(&path).unwrap(), list);
        }
    }
}
