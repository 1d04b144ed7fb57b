//! Wire format of queued messages.

use common::OrderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outer shape of every queued message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub event_type: String,
    pub data: T,
}

/// Errors raised while decoding an inbound payment status message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not a valid envelope.
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// The order identifier is neither an integer nor a numeric string.
    #[error("Invalid order id: {0}")]
    InvalidOrderId(String),
}

/// A decoded payment status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub event_type: String,
    pub order_id: OrderId,
    pub payment_status: String,
}

#[derive(Deserialize)]
struct PaymentData {
    #[serde(alias = "order_id")]
    id_pedido: RawOrderId,
    #[serde(alias = "payment_status")]
    status: String,
}

/// Producers send the order ID either as a number or as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrderId {
    Number(i64),
    Text(String),
}

impl TryFrom<RawOrderId> for OrderId {
    type Error = DecodeError;

    fn try_from(raw: RawOrderId) -> Result<Self, Self::Error> {
        match raw {
            RawOrderId::Number(id) => Ok(OrderId::new(id)),
            RawOrderId::Text(text) => text
                .parse::<OrderId>()
                .map_err(|_| DecodeError::InvalidOrderId(text)),
        }
    }
}

/// Decodes a payment status message body.
///
/// The status string is not checked here; the use case validates it.
pub fn decode_payment_update(body: &str) -> Result<PaymentUpdate, DecodeError> {
    let envelope: Envelope<PaymentData> = serde_json::from_str(body)?;

    Ok(PaymentUpdate {
        event_type: envelope.event_type,
        order_id: envelope.data.id_pedido.try_into()?,
        payment_status: envelope.data.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_numeric_string_id() {
        let body = r#"{"event_type":"payment_status","data":{"id_pedido":"42","status":"Pago"}}"#;
        let update = decode_payment_update(body).unwrap();
        assert_eq!(update.order_id, OrderId::new(42));
        assert_eq!(update.payment_status, "Pago");
        assert_eq!(update.event_type, "payment_status");
    }

    #[test]
    fn test_decode_number_id_and_aliases() {
        let body = r#"{"event_type":"x","data":{"order_id":7,"payment_status":"Recusado"}}"#;
        let update = decode_payment_update(body).unwrap();
        assert_eq!(update.order_id, OrderId::new(7));
        assert_eq!(update.payment_status, "Recusado");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let body = r#"{"event_type":"x","data":{"id_pedido":1,"status":"Pago","valor":25.9},"trace":"abc"}"#;
        assert!(decode_payment_update(body).is_ok());
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let body = r#"{"event_type":"x","data":{"id_pedido":"abc","status":"Pago"}}"#;
        assert!(matches!(
            decode_payment_update(body),
            Err(DecodeError::InvalidOrderId(id)) if id == "abc"
        ));
    }

    #[test]
    fn test_malformed_bodies_are_rejected() {
        for body in [
            "",
            "not json",
            r#"{"event_type":"x"}"#,
            r#"{"event_type":"x","data":{"id_pedido":1}}"#,
            r#"{"event_type":"x","data":{"id_pedido":true,"status":"Pago"}}"#,
        ] {
            assert!(
                matches!(decode_payment_update(body), Err(DecodeError::Json(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = Envelope {
            event_type: "order_created".to_string(),
            data: serde_json::json!({ "order_id": 1 }),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event_type"], "order_created");
        assert_eq!(json["data"]["order_id"], 1);
    }
}
