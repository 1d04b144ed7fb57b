//! Order preparation and payment states.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Preparation state of an order.
///
/// Nominal flow:
/// ```text
/// Pendente ──► Recebido ──► EmPreparacao ──► Pronto ──► Finalizado
/// ```
/// Transitions are not enforced: any of the five states may follow any
/// other, including moving backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order placed, not yet acknowledged by the kitchen.
    #[default]
    Pendente,

    /// Kitchen acknowledged the order.
    Recebido,

    /// Being prepared.
    EmPreparacao,

    /// Ready for pickup.
    Pronto,

    /// Delivered to the customer.
    Finalizado,
}

impl OrderStatus {
    /// All statuses in nominal order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pendente,
        OrderStatus::Recebido,
        OrderStatus::EmPreparacao,
        OrderStatus::Pronto,
        OrderStatus::Finalizado,
    ];

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "Pendente",
            OrderStatus::Recebido => "Recebido",
            OrderStatus::EmPreparacao => "EmPreparacao",
            OrderStatus::Pronto => "Pronto",
            OrderStatus::Finalizado => "Finalizado",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Awaiting payment.
    #[default]
    Pendente,

    /// Paid.
    Pago,

    /// Declined by the payment provider.
    Recusado,

    /// Canceled.
    Cancelado,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pendente,
        PaymentStatus::Pago,
        PaymentStatus::Recusado,
        PaymentStatus::Cancelado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "Pendente",
            PaymentStatus::Pago => "Pago",
            PaymentStatus::Recusado => "Recusado",
            PaymentStatus::Cancelado => "Cancelado",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidPaymentStatus(s.to_string()))
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_states_are_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pendente);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pendente);
    }

    #[test]
    fn test_status_parse_matches_display() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        for status in PaymentStatus::ALL {
            assert_eq!(status.to_string().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        for input in ["pendente", "Em preparação", "Cancelado", "", "PRONTO"] {
            assert_eq!(
                input.parse::<OrderStatus>().unwrap_err(),
                ValidationError::InvalidStatus(input.to_string())
            );
        }
    }

    #[test]
    fn test_unknown_payment_status_is_rejected() {
        for input in ["pago", "Aprovado", "Recebido", ""] {
            assert_eq!(
                input.parse::<PaymentStatus>().unwrap_err(),
                ValidationError::InvalidPaymentStatus(input.to_string())
            );
        }
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::EmPreparacao).unwrap();
        assert_eq!(json, "\"EmPreparacao\"");
        let deserialized: PaymentStatus = serde_json::from_str("\"Recusado\"").unwrap();
        assert_eq!(deserialized, PaymentStatus::Recusado);
    }
}
