//! Kafka REST proxy publisher.
//!
//! Produces trade events through a Confluent-compatible REST proxy
//! (`POST {broker_url}/topics/{topic}`), one record per trade keyed by the
//! trade id. Delivery is attempted once; the caller decides what to do with
//! a failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{EventPublishError, EventPublisherPort};
use crate::config::PublisherConfig;
use crate::domain::trade_lifecycle::Trade;

/// Content type for JSON-encoded records.
pub const KAFKA_JSON_CONTENT_TYPE: &str = "application/vnd.kafka.json.v2+json";

/// Response type requested from the proxy.
const KAFKA_ACCEPT: &str = "application/vnd.kafka.v2+json";

/// Longest topic name Kafka accepts.
const MAX_TOPIC_LEN: usize = 249;

/// Errors building a publisher from configuration.
#[derive(Debug, Error)]
pub enum PublisherConfigError {
    /// No broker URL was configured.
    #[error("publisher broker_url is not configured")]
    MissingBrokerUrl,

    /// The broker URL is not a usable http(s) URL.
    #[error("invalid publisher broker_url '{url}': {reason}")]
    InvalidBrokerUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The topic name is not a legal Kafka topic.
    #[error("invalid publisher topic '{topic}': {reason}")]
    InvalidTopic {
        /// Configured value.
        topic: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build publisher HTTP client: {0}")]
    Client(String),
}

/// Connection settings for the REST proxy.
#[derive(Debug, Clone)]
pub struct KafkaRestConfig {
    /// Base URL of the REST proxy.
    pub broker_url: String,
    /// Destination topic.
    pub topic: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl From<&PublisherConfig> for KafkaRestConfig {
    fn from(config: &PublisherConfig) -> Self {
        Self {
            broker_url: config.broker_url.clone(),
            topic: config.topic.clone(),
            request_timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: [ProduceRecord<'a>; 1],
}

#[derive(Serialize)]
struct ProduceRecord<'a> {
    key: &'a str,
    value: &'a Trade,
}

#[derive(Debug, Default, Deserialize)]
struct ProduceResponse {
    #[serde(default)]
    offsets: Vec<RecordOffset>,
}

#[derive(Debug, Deserialize)]
struct RecordOffset {
    partition: Option<i32>,
    offset: Option<i64>,
    error_code: Option<i64>,
    error: Option<String>,
}

/// `EventPublisherPort` that produces to Kafka through its REST proxy.
#[derive(Debug, Clone)]
pub struct KafkaRestPublisher {
    client: Client,
    endpoint: Url,
    topic: String,
}

impl KafkaRestPublisher {
    /// Validate the configuration and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `PublisherConfigError` if the broker URL is missing or not
    /// http(s), or the topic is not a legal Kafka topic name.
    pub fn new(config: &KafkaRestConfig) -> Result<Self, PublisherConfigError> {
        let broker_url = config.broker_url.trim();
        if broker_url.is_empty() {
            return Err(PublisherConfigError::MissingBrokerUrl);
        }
        validate_topic(&config.topic)?;

        let invalid_url = |reason: String| PublisherConfigError::InvalidBrokerUrl {
            url: broker_url.to_string(),
            reason,
        };
        let base = Url::parse(broker_url).map_err(|e| invalid_url(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid_url(format!(
                "unsupported scheme '{}'",
                base.scheme()
            )));
        }
        let endpoint = Url::parse(&format!(
            "{}/topics/{}",
            base.as_str().trim_end_matches('/'),
            config.topic
        ))
        .map_err(|e| invalid_url(e.to_string()))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PublisherConfigError::Client(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, topic = %config.topic, "Kafka REST publisher configured");

        Ok(Self {
            client,
            endpoint,
            topic: config.topic.clone(),
        })
    }

    /// Produce endpoint for the configured topic.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventPublisherPort for KafkaRestPublisher {
    async fn publish_trade(&self, trade: &Trade) -> Result<(), EventPublishError> {
        let body = serde_json::to_vec(&ProduceRequest {
            records: [ProduceRecord {
                key: trade.id().as_str(),
                value: trade,
            }],
        })
        .map_err(|e| EventPublishError::SerializationError {
            message: e.to_string(),
        })?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, KAFKA_JSON_CONTENT_TYPE)
            .header(ACCEPT, KAFKA_ACCEPT)
            .body(body)
            .send()
            .await
            .map_err(|e| EventPublishError::ConnectionError {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_else(|e| {
            tracing::debug!(
                trade_id = %trade.id(),
                status = %status,
                error = %e,
                "Unreadable produce response body"
            );
            String::new()
        });
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let produced: ProduceResponse = serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparseable produce response body");
            ProduceResponse::default()
        });

        match produced.offsets.first() {
            Some(RecordOffset {
                error: Some(error), ..
            }) => Err(EventPublishError::Rejected {
                message: error.clone(),
            }),
            Some(RecordOffset {
                error_code: Some(code),
                ..
            }) => Err(EventPublishError::Rejected {
                message: format!("error code {code}"),
            }),
            Some(RecordOffset {
                partition, offset, ..
            }) => {
                tracing::info!(
                    trade_id = %trade.id(),
                    topic = %self.topic,
                    partition = ?partition,
                    offset = ?offset,
                    "Published trade event"
                );
                Ok(())
            }
            None => {
                tracing::info!(
                    trade_id = %trade.id(),
                    topic = %self.topic,
                    "Published trade event"
                );
                Ok(())
            }
        }
    }
}

/// 5xx and 408 mean the proxy or cluster is unavailable; other failures are
/// refusals of this record.
fn status_error(status: StatusCode, body: &str) -> EventPublishError {
    let message = format!("HTTP {status}: {body}");
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        EventPublishError::ConnectionError { message }
    } else {
        EventPublishError::Rejected { message }
    }
}

fn validate_topic(topic: &str) -> Result<(), PublisherConfigError> {
    let invalid = |reason: &str| PublisherConfigError::InvalidTopic {
        topic: topic.to_string(),
        reason: reason.to_string(),
    };

    if topic.is_empty() {
        return Err(invalid("topic is empty"));
    }
    if topic == "." || topic == ".." {
        return Err(invalid("topic cannot be '.' or '..'"));
    }
    if topic.len() > MAX_TOPIC_LEN {
        return Err(invalid("topic is longer than 249 characters"));
    }
    if !topic
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(invalid("topic may only contain [A-Za-z0-9._-]"));
    }
    Ok(())
}
