//! # Audit Entries
//!
//! Who did what to the inventory, and when.
//!
//! The acting user is always passed in as an [`Actor`]; nothing in this
//! crate reads a "current user" from ambient state.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;

/// Role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserRole {
    Admin,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            other => Err(unknown("role", other)),
        }
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl FromStr for AuditAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            other => Err(unknown("action", other)),
        }
    }
}

/// Area of the application an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AuditComponent {
    Inventory,
    Transaction,
}

impl AuditComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditComponent::Inventory => "inventory",
            AuditComponent::Transaction => "transaction",
        }
    }
}

impl FromStr for AuditComponent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(AuditComponent::Inventory),
            "transaction" => Ok(AuditComponent::Transaction),
            other => Err(unknown("component", other)),
        }
    }
}

fn unknown(field: &str, value: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("unknown value '{}'", value),
    }
}

/// One audit log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditEntry {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub action: AuditAction,
    pub component: AuditComponent,
    pub message: String,
    pub product_id: Option<String>,
    pub user_name: String,
    pub user_id: String,
    pub details: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry attributed to `actor`.
    pub fn new(
        actor: &Actor,
        action: AuditAction,
        component: AuditComponent,
        message: impl Into<String>,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        AuditEntry {
            id: Uuid::new_v4().to_string(),
            email: actor.email.clone(),
            role: actor.role,
            action,
            component,
            message: message.into(),
            product_id: None,
            user_name: actor.name.clone(),
            user_id: actor.id.clone(),
            details: details.into(),
            timestamp,
        }
    }

    /// Entry for a batch added to inventory.
    pub fn stock_added(
        actor: &Actor,
        product_id: &str,
        batch_number: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut entry = AuditEntry::new(
            actor,
            AuditAction::Update,
            AuditComponent::Inventory,
            format!("Added new stocks with batch number: {}", batch_number),
            "Adding new stocks to inventory",
            timestamp,
        );
        entry.product_id = Some(product_id.to_string());
        entry
    }

    /// Entry for a completed checkout.
    pub fn order_confirmed(actor: &Actor, timestamp: DateTime<Utc>) -> Self {
        AuditEntry::new(
            actor,
            AuditAction::Create,
            AuditComponent::Transaction,
            format!("Order confirmed by {}", actor.name),
            "Adding transaction",
            timestamp,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> Actor {
        Actor {
            id: "u-1".to_string(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            role: UserRole::Staff,
        }
    }

    #[test]
    fn test_stock_added_entry() {
        let now = Utc::now();
        let entry = AuditEntry::stock_added(&cashier(), "p-1", "482913-9f3c-20240115-001", now);

        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.component, AuditComponent::Inventory);
        assert_eq!(entry.product_id.as_deref(), Some("p-1"));
        assert_eq!(entry.user_id, "u-1");
        assert_eq!(
            entry.message,
            "Added new stocks with batch number: 482913-9f3c-20240115-001"
        );
    }

    #[test]
    fn test_enum_strings_round_trip() {
        for role in [UserRole::Admin, UserRole::Staff] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert_eq!(
            "inventory".parse::<AuditComponent>().unwrap(),
            AuditComponent::Inventory
        );
        assert!("manager".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&cashier()).unwrap();
        assert!(json.contains(r#""role":"staff""#));
    }
}
