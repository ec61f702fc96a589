use serde::Deserialize;

/// A single message as returned by the mirror node topic messages endpoint.
/// `message` is the base64-encoded message content.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorMessage {
    pub consensus_timestamp: String,
    pub message: String,
    pub running_hash: String,
    pub sequence_number: i64,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub payer_account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicMessagesResponse {
    #[serde(default)]
    pub messages: Vec<MirrorMessage>,
    #[serde(default)]
    pub links: Option<Links>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}
