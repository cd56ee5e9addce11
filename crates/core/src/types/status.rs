//! Status enums for orders, returns, payments and user roles.

use serde::{Deserialize, Serialize};

/// Order fulfillment status as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Not Processed")]
    NotProcessed,
    #[serde(rename = "Processing")]
    Processing,
    #[serde(rename = "Shipped")]
    Shipped,
    #[serde(rename = "Delivered")]
    Delivered,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in the order the admin status picker lists them.
    pub const ALL: [Self; 5] = [
        Self::NotProcessed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Label used by the backend and shown in the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotProcessed => "Not Processed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Customers may ask for a return only once the parcel arrived.
    #[must_use]
    pub const fn allows_return_request(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Return (refund) state attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    #[default]
    None,
    Requested,
    Approved,
    Rejected,
}

impl ReturnStatus {
    /// Whether an admin still has to decide on this return.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Requested)
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted card checkout at the payment provider.
    #[default]
    Card,
    /// Pay the courier on delivery; no provider round trip.
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Payment state reported for a hosted checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Whether the provider considers the checkout settled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }
}

/// Backend user role. The backend encodes it as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "u8", into = "u8")]
pub enum UserRole {
    #[default]
    Customer,
    Admin,
}

impl From<u8> for UserRole {
    fn from(value: u8) -> Self {
        if value == 1 { Self::Admin } else { Self::Customer }
    }
}

impl From<UserRole> for u8 {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Customer => 0,
            UserRole::Admin => 1,
        }
    }
}
