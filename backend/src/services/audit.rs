use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tournament_settlement::EventRecord;
use tracing::{debug, info};

/// `prev_hash` of the first entry in a chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One committed settlement event, chained to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub sequence: u64,
    pub timestamp: i64,
    pub recorded_at: i64,
    pub event_type: String,
    pub details: serde_json::Value,
    pub prev_hash: String,
    pub hash: String,
}

#[derive(Serialize)]
struct HashInput<'a> {
    sequence: u64,
    timestamp: i64,
    recorded_at: i64,
    event_type: &'a str,
    details: &'a serde_json::Value,
}

impl AuditLogEntry {
    fn chained(record: &EventRecord, prev_hash: &str) -> AppResult<Self> {
        let mut entry = Self {
            sequence: record.sequence,
            timestamp: record.timestamp,
            recorded_at: chrono::Utc::now().timestamp(),
            event_type: record.event.name().to_string(),
            details: serde_json::to_value(&record.event)?,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// sha256(prev_hash || json(entry without hashes))
    pub fn compute_hash(&self) -> AppResult<String> {
        let input = serde_json::to_string(&HashInput {
            sequence: self.sequence,
            timestamp: self.timestamp,
            recorded_at: self.recorded_at,
            event_type: &self.event_type,
            details: &self.details,
        })?;
        let mut hasher = Sha256::new();
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(input.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

struct ChainHead {
    file: std::fs::File,
    last_hash: String,
    entries: usize,
}

/// Append-only, hash-chained JSON-lines log of settlement events
pub struct AuditTrail {
    log_file: PathBuf,
    head: Mutex<ChainHead>,
}

impl AuditTrail {
    /// Opens today's log in `log_directory`, resuming its chain if it exists
    pub fn new(log_directory: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&log_directory)?;

        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));
        Self::open(log_file)
    }

    pub fn open(log_file: PathBuf) -> AppResult<Self> {
        let (entries, last_hash) = if log_file.is_file() {
            let entries = Self::read_entries(&log_file)?;
            Self::verify_entries(&entries)?;
            let last = entries
                .last()
                .map(|e| e.hash.clone())
                .unwrap_or_else(|| GENESIS_HASH.to_string());
            (entries.len(), last)
        } else {
            (0, GENESIS_HASH.to_string())
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;

        info!(path = ?log_file, entries, "audit trail initialized");

        Ok(Self {
            log_file,
            head: Mutex::new(ChainHead {
                file,
                last_hash,
                entries,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    pub async fn len(&self) -> usize {
        self.head.lock().await.entries
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Appends committed event records to the chain
    pub async fn append(&self, records: &[EventRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut head = self.head.lock().await;
        for record in records {
            let entry = AuditLogEntry::chained(record, &head.last_hash)?;
            let json = serde_json::to_string(&entry)?;
            writeln!(head.file, "{}", json)?;
            debug!(sequence = entry.sequence, hash = %entry.hash, "audit entry written");
            head.last_hash = entry.hash;
            head.entries += 1;
        }
        head.file.flush()?;
        Ok(())
    }

    /// Recomputes the whole chain in `path`; returns the number of entries
    pub fn verify(path: &Path) -> AppResult<usize> {
        let entries = Self::read_entries(path)?;
        Self::verify_entries(&entries)?;
        Ok(entries.len())
    }

    fn read_entries(path: &Path) -> AppResult<Vec<AuditLogEntry>> {
        let file = std::fs::File::open(path)?;
        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| AppError::AuditCorrupted {
                line: index + 1,
                reason: e.to_string(),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn verify_entries(entries: &[AuditLogEntry]) -> AppResult<()> {
        let mut expected_prev = GENESIS_HASH.to_string();
        for (index, entry) in entries.iter().enumerate() {
            let line = index + 1;
            if entry.prev_hash != expected_prev {
                return Err(AppError::AuditCorrupted {
                    line,
                    reason: "broken link to previous entry".to_string(),
                });
            }
            if entry.compute_hash()? != entry.hash {
                return Err(AppError::AuditCorrupted {
                    line,
                    reason: "hash mismatch".to_string(),
                });
            }
            expected_prev = entry.hash.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tournament_settlement::{Address, SettlementEvent};
    use uuid::Uuid;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir().join(format!("audit-{}.log", Uuid::new_v4()))
    }

    fn records() -> Vec<EventRecord> {
        vec![
            EventRecord {
                sequence: 0,
                timestamp: 100,
                event: SettlementEvent::ParticipantRegistered {
                    participant: Address::derive("alice"),
                    name: "alice".to_string(),
                },
            },
            EventRecord {
                sequence: 1,
                timestamp: 200,
                event: SettlementEvent::RefundClaimed {
                    participant: Address::derive("alice"),
                    amount: 1_000,
                },
            },
        ]
    }

    #[tokio::test]
    async fn test_chain_verifies_and_resumes() {
        let path = scratch_file();
        let trail = AuditTrail::open(path.clone()).unwrap();
        trail.append(&records()[..1]).await.unwrap();
        drop(trail);

        let resumed = AuditTrail::open(path.clone()).unwrap();
        assert_eq!(resumed.len().await, 1);
        resumed.append(&records()[1..]).await.unwrap();

        assert_eq!(AuditTrail::verify(&path).unwrap(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_tampering_is_detected() {
        let path = scratch_file();
        let trail = AuditTrail::open(path.clone()).unwrap();
        trail.append(&records()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, contents.replace("\"amount\":1000", "\"amount\":9000")).unwrap();

        match AuditTrail::verify(&path) {
            Err(AppError::AuditCorrupted { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corruption, got {:?}", other),
        }
        std::fs::remove_file(&path).ok();
    }
}
