use crate::models::record::{Record, RecordKind};
use crate::models::transaction::{Transaction, TransactionId};
use anyhow::{anyhow, bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// WAL operation types
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    OpenTransaction(Transaction),
    AppendRecord { user_id: String, record: Record },
}

fn encode_list(items: &[String]) -> String {
    items.iter().map(hex::encode).collect::<Vec<_>>().join(",")
}

/// Din field of `OPEN_TX`; `-` marks a transaction without a din list
const NO_DIN_LIST: &str = "-";

fn encode_optional_list(items: Option<&[String]>) -> String {
    match items {
        Some(items) => encode_list(items),
        None => NO_DIN_LIST.to_string(),
    }
}

fn decode_optional_list(field: &str) -> Result<Option<Vec<String>>> {
    if field == NO_DIN_LIST {
        return Ok(None);
    }
    decode_list(field).map(Some)
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex field")?;
    String::from_utf8(bytes).context("Field is not valid UTF-8")
}

fn decode_list(field: &str) -> Result<Vec<String>> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field.split(',').map(decode_text).collect()
}

fn kind_tag(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Access => "access",
        RecordKind::Dispense => "dispense",
    }
}

impl WalOperation {
    fn to_line(&self) -> String {
        match self {
            WalOperation::OpenTransaction(tx) => format!(
                "OPEN_TX|{}|{}|{}|{}",
                hex::encode(tx.id.as_str()),
                hex::encode(&tx.user_id),
                tx.timestamp,
                encode_optional_list(tx.dins.as_deref())
            ),
            WalOperation::AppendRecord { user_id, record } => format!(
                "APPEND_RECORD|{}|{}|{}|{}",
                hex::encode(user_id),
                kind_tag(record.kind),
                record.timestamp,
                encode_list(&record.dins)
            ),
        }
    }

    fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"OPEN_TX") => {
                if parts.len() != 5 {
                    bail!("Invalid OPEN_TX format");
                }
                let raw_id = decode_text(parts[1]).context("Invalid transaction id")?;
                let id = TransactionId::parse(&raw_id)
                    .ok_or_else(|| anyhow!("Transaction id has invalid characters"))?;
                let user_id = decode_text(parts[2]).context("Invalid user id")?;
                let timestamp = parts[3].parse::<i64>().context("Invalid timestamp")?;
                let dins = decode_optional_list(parts[4]).context("Invalid din list")?;

                Ok(WalOperation::OpenTransaction(Transaction {
                    id,
                    user_id,
                    timestamp,
                    dins,
                }))
            }
            Some(&"APPEND_RECORD") => {
                if parts.len() != 5 {
                    bail!("Invalid APPEND_RECORD format");
                }
                let user_id = decode_text(parts[1]).context("Invalid user id")?;
                let kind = match parts[2] {
                    "access" => RecordKind::Access,
                    "dispense" => RecordKind::Dispense,
                    other => bail!("Unknown record kind '{}'", other),
                };
                let timestamp = parts[3].parse::<i64>().context("Invalid timestamp")?;
                let dins = decode_list(parts[4]).context("Invalid din list")?;

                Ok(WalOperation::AppendRecord {
                    user_id,
                    record: Record {
                        dins,
                        timestamp,
                        kind,
                    },
                })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

/// Append-only journal that makes in-memory store mutations durable
pub struct Wal {
    file: Mutex<File>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Mutex::new(file),
            path,
        })
    }

    /// Append one operation and sync it to disk before returning
    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_line();
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        file.sync_data().context("Failed to sync WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_line(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}
