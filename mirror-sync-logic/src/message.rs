use base64::{prelude::BASE64_STANDARD, Engine};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Typed view over the structured payloads published to the monitored topics.
/// Messages carrying an unknown `type` (or none at all) fall into the
/// `Unrecognized` variant and stay unrouted but persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum TopicPayload {
    #[serde(rename = "PROOF_ADDED")]
    ProofAdded(ProofPayload),
    #[serde(rename = "ORDER_CREATED")]
    OrderCreated(OrderPayload),
    #[serde(rename = "ORDER_DELIVERED")]
    OrderDelivered(OrderPayload),
    #[serde(rename = "ORDER_SETTLED")]
    OrderSettled(OrderPayload),
    #[serde(rename = "CARBON_LOT_CREATED")]
    CarbonLotCreated(LotPayload),
    #[serde(rename = "CARBON_LOT_UPDATED")]
    CarbonLotUpdated(LotPayload),
    #[serde(rename = "SETTLEMENT_COMPLETED")]
    SettlementCompleted(SettlementPayload),
    #[serde(untagged)]
    Unrecognized(Value),
}

impl TopicPayload {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self::Unrecognized(value.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofPayload {
    pub lot_id: String,
    pub proof_type: String,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub order_id: String,
    #[serde(default)]
    pub lot_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotPayload {
    pub lot_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPayload {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub lot_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Correlation fields extracted from a structured payload regardless of
/// whether its `type` is recognized. All optional, missing fields stay absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    pub message_type: Option<String>,
    pub lot_id: Option<String>,
    pub order_id: Option<String>,
    pub proof_type: Option<String>,
    pub submitted_by: Option<String>,
}

impl Correlation {
    fn from_json(json: &Value) -> Self {
        let field = |name: &str| {
            json.get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };
        Self {
            message_type: field("type"),
            lot_id: field("lotId"),
            order_id: field("orderId"),
            proof_type: field("proofType"),
            submitted_by: field("submittedBy").or_else(|| field("userId")),
        }
    }
}

/// Result of decoding a single raw mirror message. Decoding never fails:
/// messages that are not valid base64/UTF-8/JSON keep their raw text and
/// carry no structured payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnvelope {
    pub raw_text: String,
    pub json: Option<Value>,
    pub payload: Option<TopicPayload>,
    pub correlation: Correlation,
}

pub fn decode(raw_message: &str) -> DecodedEnvelope {
    let raw_text = match BASE64_STANDARD.decode(raw_message) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => raw_message.to_string(),
    };

    let json: Option<Value> = serde_json::from_str(&raw_text)
        .ok()
        .filter(Value::is_object);

    match json {
        Some(json) => {
            let payload = TopicPayload::from_value(&json);
            let correlation = Correlation::from_json(&json);
            DecodedEnvelope {
                raw_text,
                json: Some(json),
                payload: Some(payload),
                correlation,
            }
        }
        None => DecodedEnvelope {
            raw_text,
            json: None,
            payload: None,
            correlation: Correlation::default(),
        },
    }
}
