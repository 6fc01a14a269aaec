//! Decoding of server push messages.
//!
//! Payloads are validated once, here, into a [`PortfolioUpdate`]. Nothing
//! downstream re-checks fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::recency::parse_timestamp;

/// Message type carried by portfolio value updates.
pub const UPDATE_TYPE: &str = "portfolio-update";

/// Message type carried by server-side failure notices.
pub const ERROR_TYPE: &str = "error";

/// Reasons an inbound payload is rejected.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The payload is not valid JSON or has wrongly typed fields.
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent or null.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The timestamp is not ISO-8601.
    #[error("Invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A numeric field is NaN or infinite.
    #[error("Non-finite value in field: {0}")]
    NonFiniteValue(&'static str),

    /// The `type` discriminator is not one we understand.
    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

/// Wire shape of every message on the stream.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: Option<String>,
    timestamp: Option<String>,
    total_value_usd: Option<f64>,
    change_24h: Option<f64>,
    message: Option<String>,
}

/// A validated portfolio value update.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioUpdate {
    timestamp: String,
    at: DateTime<Utc>,
    total_value_usd: f64,
    change_percent: Option<f64>,
}

impl PortfolioUpdate {
    /// Validate the fields of an update.
    pub fn new(
        timestamp: &str,
        total_value_usd: f64,
        change_percent: Option<f64>,
    ) -> Result<Self, UpdateError> {
        let at = parse_timestamp(timestamp).map_err(|source| UpdateError::InvalidTimestamp {
            value: timestamp.to_string(),
            source,
        })?;
        if !total_value_usd.is_finite() {
            return Err(UpdateError::NonFiniteValue("total_value_usd"));
        }
        if change_percent.is_some_and(|c| !c.is_finite()) {
            return Err(UpdateError::NonFiniteValue("change_24h"));
        }
        Ok(Self {
            timestamp: timestamp.to_string(),
            at,
            total_value_usd,
            change_percent,
        })
    }

    /// The timestamp exactly as the server sent it.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The parsed timestamp.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn total_value_usd(&self) -> f64 {
        self.total_value_usd
    }

    /// 24h change in percent, if the server included one.
    pub fn change_percent(&self) -> Option<f64> {
        self.change_percent
    }
}

/// A decoded message from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// New portfolio value.
    Update(PortfolioUpdate),
    /// The server failed to compute an update and will retry on its side.
    Error {
        message: String,
        timestamp: Option<String>,
    },
}

impl ServerMessage {
    /// Decode one event's data field.
    ///
    /// Messages without a `type` are treated as portfolio updates.
    pub fn parse(data: &str) -> Result<Self, UpdateError> {
        let raw: RawMessage = serde_json::from_str(data)?;

        match raw.kind.as_deref() {
            None | Some(UPDATE_TYPE) => {
                let timestamp = raw.timestamp.ok_or(UpdateError::MissingField("timestamp"))?;
                let total = raw.total_value_usd.ok_or(UpdateError::MissingField("total_value_usd"))?;
                PortfolioUpdate::new(&timestamp, total, raw.change_24h).map(ServerMessage::Update)
            }
            Some(ERROR_TYPE) => Ok(ServerMessage::Error {
                message: raw.message.unwrap_or_else(|| "Unknown server error".to_string()),
                timestamp: raw.timestamp,
            }),
            Some(other) => Err(UpdateError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_update() {
        let msg = ServerMessage::parse(
            r#"{"type":"portfolio-update","timestamp":"2024-05-01T12:00:00+00:00","total_value_usd":12345.67,"change_24h":5.43}"#,
        )
        .unwrap();

        let ServerMessage::Update(update) = msg else {
            panic!("expected update");
        };
        assert_eq!(update.timestamp(), "2024-05-01T12:00:00+00:00");
        assert_eq!(update.total_value_usd(), 12345.67);
        assert_eq!(update.change_percent(), Some(5.43));
    }

    #[test]
    fn test_parse_without_type_or_change() {
        let msg = ServerMessage::parse(
            r#"{"timestamp":"2024-05-01T12:00:00Z","total_value_usd":10}"#,
        )
        .unwrap();

        let ServerMessage::Update(update) = msg else {
            panic!("expected update");
        };
        assert_eq!(update.change_percent(), None);
        assert_eq!(update.total_value_usd(), 10.0);
    }

    #[test]
    fn test_null_change_is_absent() {
        let msg = ServerMessage::parse(
            r#"{"timestamp":"2024-05-01T12:00:00Z","total_value_usd":1.5,"change_24h":null}"#,
        )
        .unwrap();
        assert!(matches!(msg, ServerMessage::Update(u) if u.change_percent().is_none()));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = ServerMessage::parse(r#"{"timestamp":"2024-05-01T12:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, UpdateError::MissingField("total_value_usd")));
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let err = ServerMessage::parse(r#"{"total_value_usd":5}"#).unwrap_err();
        assert!(matches!(err, UpdateError::MissingField("timestamp")));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let err =
            ServerMessage::parse(r#"{"timestamp":"soon","total_value_usd":5}"#).unwrap_err();
        assert!(matches!(err, UpdateError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = ServerMessage::parse(
            r#"{"timestamp":"2024-05-01T12:00:00Z","total_value_usd":"lots"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, UpdateError::Json(_)));
    }

    #[test]
    fn test_not_json_rejected() {
        assert!(matches!(ServerMessage::parse("ping").unwrap_err(), UpdateError::Json(_)));
    }

    #[test]
    fn test_error_message() {
        let msg = ServerMessage::parse(
            r#"{"type":"error","message":"Failed to fetch portfolio data","timestamp":"2024-05-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Error {
                message: "Failed to fetch portfolio data".to_string(),
                timestamp: Some("2024-05-01T12:00:00Z".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = ServerMessage::parse(r#"{"type":"heartbeat"}"#).unwrap_err();
        assert!(matches!(err, UpdateError::UnknownType(t) if t == "heartbeat"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = PortfolioUpdate::new("2024-05-01T12:00:00Z", f64::NAN, None).unwrap_err();
        assert!(matches!(err, UpdateError::NonFiniteValue("total_value_usd")));
        let err =
            PortfolioUpdate::new("2024-05-01T12:00:00Z", 1.0, Some(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, UpdateError::NonFiniteValue("change_24h")));
    }
}
