//! Message Batches API.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::request::MessagesRequest;
use crate::response::MessageResponse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

const ENDPOINT: &str = "messages/batches";

/// One entry of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Caller-chosen identifier used to match results.
    pub custom_id: String,
    /// The message request to run.
    pub params: MessagesRequest,
}

impl BatchRequest {
    /// Pair a request with its identifier.
    pub fn new(custom_id: impl Into<String>, params: MessagesRequest) -> Self {
        Self {
            custom_id: custom_id.into(),
            params,
        }
    }
}

/// Processing status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Requests are still running.
    InProgress,
    /// Cancellation was requested.
    Canceling,
    /// All requests finished; results are available.
    Ended,
    /// A status this crate does not know.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Canceling => write!(f, "canceling"),
            Self::Ended => write!(f, "ended"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-outcome request counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct RequestCounts {
    pub processing: u64,
    pub succeeded: u64,
    pub errored: u64,
    pub canceled: u64,
    pub expired: u64,
}

/// A message batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Batch identifier.
    pub id: String,
    /// Object type (always "message_batch").
    #[serde(rename = "type", default)]
    pub object_type: String,
    #[allow(missing_docs)]
    pub processing_status: ProcessingStatus,
    #[allow(missing_docs)]
    #[serde(default)]
    pub request_counts: RequestCounts,
    /// RFC 3339 creation time.
    #[serde(default)]
    pub created_at: String,
    #[allow(missing_docs)]
    #[serde(default)]
    pub ended_at: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub expires_at: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub cancel_initiated_at: Option<String>,
    #[allow(missing_docs)]
    #[serde(default)]
    pub archived_at: Option<String>,
    /// Where the JSONL results can be downloaded once the batch has ended.
    #[serde(default)]
    pub results_url: Option<String>,
}

impl Batch {
    /// Requests are still running.
    pub fn is_processing(&self) -> bool {
        self.processing_status == ProcessingStatus::InProgress
    }

    /// The batch has ended.
    pub fn is_complete(&self) -> bool {
        self.processing_status == ProcessingStatus::Ended
    }

    /// Cancellation is in progress.
    pub fn is_canceling(&self) -> bool {
        self.processing_status == ProcessingStatus::Canceling
    }

    /// Sum of all request counts.
    pub fn total_requests(&self) -> u64 {
        let c = &self.request_counts;
        c.processing + c.succeeded + c.errored + c.canceled + c.expired
    }
}

/// One page of batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchList {
    /// Batches on this page.
    #[serde(default)]
    pub data: Vec<Batch>,
    /// More pages exist.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the previous page.
    #[serde(default)]
    pub first_id: Option<String>,
    /// Cursor for the next page.
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Pagination options for [`Batches::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Return batches before this id.
    pub before_id: Option<String>,
    /// Return batches after this id.
    pub after_id: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
}

/// Outcome of one batch entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The request produced a message.
    Succeeded {
        #[allow(missing_docs)]
        message: MessageResponse,
    },
    /// The request failed.
    Errored {
        /// Error object as returned by the API.
        error: Value,
    },
    /// The batch was canceled before this request ran.
    Canceled,
    /// The batch expired before this request ran.
    Expired,
}

/// One line of a batch results file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier from the matching [`BatchRequest`].
    pub custom_id: String,
    #[allow(missing_docs)]
    pub result: BatchOutcome,
}

/// Parse JSON Lines text. Blank lines are skipped; a malformed line fails
/// with its 1-based line number.
pub fn parse_jsonl<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::parse_error(format!("Invalid JSONL at line {}: {e}", i + 1)))
        })
        .collect()
}

fn validate_requests(requests: &[BatchRequest]) -> Result<()> {
    if requests.is_empty() {
        return Err(Error::invalid_parameter(
            "requests",
            "At least one request is required.",
        ));
    }
    for (index, request) in requests.iter().enumerate() {
        if request.custom_id.is_empty() {
            return Err(Error::invalid_parameter(
                "custom_id",
                format!("Request at index {index} is missing 'custom_id'."),
            ));
        }
        request.params.validate().map_err(|e| {
            Error::invalid_parameter("params", format!("Request at index {index}: {e}"))
        })?;
    }
    Ok(())
}

#[derive(Serialize)]
struct CreateBody<'a> {
    requests: &'a [BatchRequest],
}

/// Handle for the `messages/batches` endpoints; see [`Client::batches`].
#[derive(Debug, Clone, Copy)]
pub struct Batches<'a> {
    client: &'a Client,
}

impl<'a> Batches<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// URL of one batch; the id is escaped so it stays a single path segment.
    fn batch_url(&self, batch_id: &str, suffix: &[&str]) -> Result<Url> {
        let mut url = self.client.url(ENDPOINT)?;
        url.path_segments_mut()
            .map_err(|()| Error::configuration("Base URL cannot have path segments"))?
            .push(batch_id)
            .extend(suffix);
        Ok(url)
    }

    /// Submit a batch.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn create(&self, requests: &[BatchRequest]) -> Result<Batch> {
        validate_requests(requests)?;
        let url = self.client.url(ENDPOINT)?;
        self.client
            .post_json(url, &CreateBody { requests }, None)
            .await
    }

    /// Fetch a batch by id.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, batch_id: &str) -> Result<Batch> {
        let url = self.batch_url(batch_id, &[])?;
        self.client.get_json(url).await
    }

    /// List batches, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, options: &ListOptions) -> Result<BatchList> {
        let mut url = self.client.url(ENDPOINT)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(before) = &options.before_id {
                query.append_pair("before_id", before);
            }
            if let Some(after) = &options.after_id {
                query.append_pair("after_id", after);
            }
            if let Some(limit) = options.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.client.get_json(url).await
    }

    /// Request cancellation of a batch.
    #[instrument(skip(self))]
    pub async fn cancel(&self, batch_id: &str) -> Result<Batch> {
        let url = self.batch_url(batch_id, &["cancel"])?;
        self.client.post_json(url, &json!({}), None).await
    }

    /// Download the results of an ended batch.
    #[instrument(skip(self))]
    pub async fn results(&self, batch_id: &str) -> Result<Vec<BatchResult>> {
        let batch = self.retrieve(batch_id).await?;
        if !batch.is_complete() {
            return Err(Error::invalid_request(
                "Batch has not finished processing yet.",
            ));
        }
        let results_url = batch
            .results_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::invalid_request("No results URL available."))?;

        let url = Url::parse(results_url)
            .map_err(|e| Error::parse_error(format!("Invalid results URL '{results_url}': {e}")))?;
        let body = self.client.get_text(url).await?;
        let results: Vec<BatchResult> = parse_jsonl(&body)?;
        debug!(count = results.len(), "downloaded batch results");
        Ok(results)
    }
}
