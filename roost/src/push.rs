use std::path::PathBuf;

use clap::Parser;
use futures::stream;
use roost_ingestor_core::IncomingRecord;
use roost_protocol::{Record, StoreRecordsRequest};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{IoSnafu, JsonParseSnafu, RequestSnafu, Result},
    remote::RemoteArgs,
};

/// Stream records to a storage server
#[derive(Parser)]
pub struct PushArgs {
    /// JSON file containing an array of records.
    ///
    /// Each record has `record_id`, `user_id`, `created_at` (milliseconds
    /// since the Unix epoch), `text` and `lang`.
    file: PathBuf,
    #[clap(flatten)]
    remote: RemoteArgs,
}

impl PushArgs {
    pub async fn run(self, _ct: CancellationToken) -> Result<()> {
        let content = tokio::fs::read_to_string(&self.file)
            .await
            .context(IoSnafu {})?;
        let requests = parse_requests(&content)?;

        println!(
            "Pushing {} records to {}",
            requests.len(),
            self.remote.remote_address
        );

        let mut client = self.remote.storage_client().await?;
        let response = client
            .store_records_stream(stream::iter(requests))
            .await
            .context(RequestSnafu {})?
            .into_inner();

        println!(
            "Received {} records, stored {} new documents",
            response.records_received, response.records_stored
        );

        Ok(())
    }
}

fn parse_requests(content: &str) -> Result<Vec<StoreRecordsRequest>> {
    let records: Vec<IncomingRecord> = serde_json::from_str(content).context(JsonParseSnafu {})?;

    Ok(records
        .into_iter()
        .map(|record| {
            StoreRecordsRequest::new(Record {
                record_id: record.record_id,
                user_id: record.user_id,
                created_at: record.created_at,
                text: record.text,
                lang: record.lang,
            })
        })
        .collect())
}
