//! Order lifecycle and role enums.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Transitions are restricted to the table in [`OrderStatus::can_transition_to`];
/// `DELIVERED` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PaymentPendingVerification,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the status accepts no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Allowed moves:
    /// - `PENDING` / `PAYMENT_PENDING_VERIFICATION` -> `CONFIRMED` or `CANCELLED`
    /// - `CONFIRMED` -> `SHIPPED` or `CANCELLED`
    /// - `SHIPPED` -> `DELIVERED`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending | Self::PaymentPendingVerification,
                Self::Confirmed | Self::Cancelled
            ) | (Self::Confirmed, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::PaymentPendingVerification => "PAYMENT_PENDING_VERIFICATION",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAYMENT_PENDING_VERIFICATION" => Ok(Self::PaymentPendingVerification),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// Customer claims to have paid via UPI; verified manually by staff.
    ManualUpi,
}

impl PaymentMethod {
    /// The status a freshly placed order starts in.
    #[must_use]
    pub const fn initial_status(self) -> OrderStatus {
        match self {
            Self::Cod => OrderStatus::Pending,
            Self::ManualUpi => OrderStatus::PaymentPendingVerification,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "COD"),
            Self::ManualUpi => write!(f, "MANUAL_UPI"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "MANUAL_UPI" => Ok(Self::ManualUpi),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_initial_status_per_payment_method() {
        assert_eq!(PaymentMethod::Cod.initial_status(), OrderStatus::Pending);
        assert_eq!(
            PaymentMethod::ManualUpi.initial_status(),
            OrderStatus::PaymentPendingVerification
        );
    }

    #[test]
    fn test_allowed_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(PaymentPendingVerification.can_transition_to(Confirmed));
        assert!(PaymentPendingVerification.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_rejected_transitions() {
        use OrderStatus::*;

        // No backward moves
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
        // No skipping straight to delivery
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Shipped));
        // Terminal states accept nothing
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
        // Self-transitions are not a thing
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::PaymentPendingVerification,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let parsed = OrderStatus::from_str(&status.to_string()).expect("roundtrip");
            assert_eq!(parsed, status);
        }
        assert!(OrderStatus::from_str("REFUNDED").is_err());
    }

    #[test]
    fn test_status_serde_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::PaymentPendingVerification)
            .expect("serialize");
        assert_eq!(json, "\"PAYMENT_PENDING_VERIFICATION\"");
    }

    #[test]
    fn test_payment_method_roundtrip() {
        assert_eq!(PaymentMethod::from_str("COD").expect("cod"), PaymentMethod::Cod);
        assert_eq!(
            PaymentMethod::from_str("MANUAL_UPI").expect("upi"),
            PaymentMethod::ManualUpi
        );
        assert!(PaymentMethod::from_str("CARD").is_err());
    }
}
