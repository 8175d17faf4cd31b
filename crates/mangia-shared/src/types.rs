use serde::{Deserialize, Serialize};

/// Role attached to every account.
///
/// Stored in SQLite as the upper-case text tag (`CLIENT`, `EMPLOYEE`,
/// `DELIVERER`), which is also what [`UserRole::as_str`] returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UserRole {
    /// A customer who places orders.
    Client,
    /// Restaurant-management staff.
    Employee,
    /// A courier who accepts and delivers orders.
    Deliverer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "CLIENT",
            UserRole::Employee => "EMPLOYEE",
            UserRole::Deliverer => "DELIVERER",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "CLIENT" => Some(UserRole::Client),
            "EMPLOYEE" => Some(UserRole::Employee),
            "DELIVERER" => Some(UserRole::Deliverer),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an order is in its lifecycle.
///
/// The only legal transitions are `PENDING -> IN_PROGRESS` (a deliverer
/// accepts the order) and `IN_PROGRESS -> DELIVERED` (the same deliverer
/// completes it). `DELIVERED` is terminal; there is no cancellation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    InProgress,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PENDING" => Some(OrderStatus::Pending),
            "IN_PROGRESS" => Some(OrderStatus::InProgress),
            "DELIVERED" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_become(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::InProgress)
                | (OrderStatus::InProgress, OrderStatus::Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
