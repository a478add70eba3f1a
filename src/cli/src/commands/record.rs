//! Record CRUD commands.
//!
//! Records are schemaless JSON objects keyed by a caller-supplied id within
//! a named collection. The payload is passed inline as a JSON string or read
//! from a file with `@path`.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum RecordCommands {
    /// Create a record (the payload must carry an "id" field)
    Create {
        /// Collection name
        collection: String,

        /// Record payload as a JSON object, or @path to a JSON file
        #[arg(short, long)]
        data: String,
    },

    /// Get a record by id
    Get {
        /// Collection name
        collection: String,

        /// Record id
        id: String,
    },

    /// Put (full replace, creating the record if absent)
    Put {
        /// Collection name
        collection: String,

        /// Record id
        id: String,

        /// Record payload as a JSON object, or @path to a JSON file
        #[arg(short, long)]
        data: String,
    },

    /// Delete a record by id (succeeds even if absent)
    Delete {
        /// Collection name
        collection: String,

        /// Record id
        id: String,
    },
}

pub async fn execute(cmd: RecordCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        RecordCommands::Create { collection, data } => {
            let payload = parse_payload(&data)?;
            let created: Value = client
                .post(&format!("/api/v1/records/{}", collection), &payload)
                .await?;
            output::print_item(&created, format);
        }
        RecordCommands::Get { collection, id } => {
            let record: Value = client
                .get(&format!("/api/v1/records/{}/{}", collection, id))
                .await?;
            output::print_item(&record, format);
        }
        RecordCommands::Put {
            collection,
            id,
            data,
        } => {
            let payload = parse_payload(&data)?;
            let updated: Value = client
                .put(&format!("/api/v1/records/{}/{}", collection, id), &payload)
                .await?;
            output::print_item(&updated, format);
        }
        RecordCommands::Delete { collection, id } => {
            client
                .delete(&format!("/api/v1/records/{}/{}", collection, id))
                .await?;
            output::print_success(&format!("deleted {}/{}", collection, id));
        }
    }

    Ok(())
}

/// Parse an inline JSON payload, or read it from a file when prefixed `@`.
fn parse_payload(data: &str) -> Result<Value> {
    let raw = match data.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
        }
        None => data.to_string(),
    };

    let value: Value =
        serde_json::from_str(&raw).context("payload is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("payload must be a JSON object");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline_payload() {
        let value = parse_payload(r#"{ "id": "1", "name": "Ann" }"#).unwrap();
        assert_eq!(value["id"], "1");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_payload("[1, 2, 3]").is_err());
        assert!(parse_payload("not json").is_err());
    }
}
