//! Domain entities
//!
//! Rows of the four shop tables plus the read-only composite returned by
//! the info query.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Balance granted to an employee on first login
pub const INITIAL_BALANCE: i64 = 1000;

/// Employee identity and wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: Uuid,
    pub username: String,
    /// PHC-formatted password hash
    pub password_hash: String,
    /// Coin balance, kept non-negative by the handlers
    pub balance: i64,
}

impl Employee {
    /// Provision a new employee with the starting balance
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            balance: INITIAL_BALANCE,
        }
    }

    pub fn can_afford(&self, price: i64) -> bool {
        self.balance >= price
    }
}

/// Catalog entry. Seeded by migrations and never mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
}

/// Quantity of one item held by one employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub item_id: Uuid,
    pub amount: i64,
}

impl InventoryRow {
    /// First holding of an item
    pub fn first(employee_id: Uuid, item_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            item_id,
            amount: 1,
        }
    }
}

/// Immutable record of one coin movement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: Uuid,
    pub from_employee: Uuid,
    pub to_employee: Uuid,
    pub amount: i64,
}

impl Transfer {
    pub fn new(from_employee: Uuid, to_employee: Uuid, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_employee,
            to_employee,
            amount,
        }
    }
}

/// Inventory line aggregated by item name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

/// Transfer total aggregated by counterparty username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    pub received: Vec<CoinTransaction>,
    pub sent: Vec<CoinTransaction>,
}

/// Snapshot of one employee's wallet, holdings and transfer history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInfo {
    pub coins: i64,
    pub inventory: Vec<InventoryItem>,
    pub coin_history: CoinHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_employee_gets_initial_balance() {
        let employee = Employee::new("alice", "hash");
        assert_eq!(employee.balance, INITIAL_BALANCE);
        assert_eq!(employee.username, "alice");
        assert!(employee.can_afford(INITIAL_BALANCE));
        assert!(!employee.can_afford(INITIAL_BALANCE + 1));
    }

    #[test]
    fn test_employee_info_wire_names() {
        let info = EmployeeInfo {
            coins: 920,
            inventory: vec![InventoryItem {
                item_type: "t-shirt".to_string(),
                quantity: 1,
            }],
            coin_history: CoinHistory::default(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["coins"], 920);
        assert_eq!(json["inventory"][0]["type"], "t-shirt");
        assert_eq!(json["inventory"][0]["quantity"], 1);
        assert!(json["coin_history"]["received"].as_array().unwrap().is_empty());
        assert!(json["coin_history"]["sent"].as_array().unwrap().is_empty());
    }
}
