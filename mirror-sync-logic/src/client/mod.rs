pub mod models;
pub mod settings;

use anyhow::Context;
use models::{MirrorMessage, TopicMessagesResponse};
use settings::MirrorNodeSettings;
use tracing::instrument;

/// Thin REST client for the mirror node topic messages endpoint.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    settings: MirrorNodeSettings,
    http: reqwest::Client,
}

impl MirrorClient {
    pub fn new(settings: MirrorNodeSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self) -> &str {
        self.settings.url.trim_end_matches('/')
    }

    /// Fetches up to `limit` messages for the topic, starting at `from_sequence`
    /// (inclusive), in ascending consensus order. Transient failures are retried
    /// with a linear backoff; if all attempts fail an empty page is returned so
    /// the caller can try again on its next polling tick.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_messages(
        &self,
        topic_id: &str,
        from_sequence: i64,
        limit: u32,
    ) -> Vec<MirrorMessage> {
        let from_sequence = from_sequence.max(0);
        for attempt in 1..=self.settings.max_attempts {
            match self.try_fetch(topic_id, from_sequence, limit).await {
                Ok(mut messages) => {
                    messages.sort_by_key(|m| m.sequence_number);
                    return messages;
                }
                Err(err) => {
                    tracing::warn!(
                        topic_id,
                        attempt,
                        error = ?err,
                        "failed to fetch topic messages"
                    );
                    if attempt < self.settings.max_attempts {
                        tokio::time::sleep(self.settings.retry_delay * attempt).await;
                    }
                }
            }
        }
        tracing::error!(
            topic_id,
            attempts = self.settings.max_attempts,
            "giving up on topic messages fetch until the next polling tick"
        );
        Vec::new()
    }

    async fn try_fetch(
        &self,
        topic_id: &str,
        from_sequence: i64,
        limit: u32,
    ) -> anyhow::Result<Vec<MirrorMessage>> {
        let url = format!(
            "{}/api/v1/topics/{}/messages?sequencenumber=gte:{}&limit={}&order=asc",
            self.url(),
            topic_id,
            from_sequence,
            limit
        );
        let response = self
            .http
            .get(&url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .context("sending request")?;
        if !response.status().is_success() {
            anyhow::bail!("mirror node returned status {}", response.status());
        }
        let body: TopicMessagesResponse = response.json().await.context("parsing response")?;
        Ok(body.messages)
    }
}
