//! Closed vocabularies used by budgets and expenses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Spending category. The set is closed: anything else is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Rent,
    Entertainment,
    Shopping,
    Healthcare,
    Education,
    Utilities,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Food,
        Self::Transport,
        Self::Rent,
        Self::Entertainment,
        Self::Shopping,
        Self::Healthcare,
        Self::Education,
        Self::Utilities,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Rent => "Rent",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::Utilities => "Utilities",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    /// Exact match against the closed set.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| EngineError::InvalidCategory(format!("unknown category: {value}")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    BankTransfer,
    DigitalWallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::DigitalWallet => "digital_wallet",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "digital_wallet" => Ok(Self::DigitalWallet),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

/// How often a recurring expense repeats. Stored as metadata only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for RecurringFrequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidInput(format!(
                "invalid recurring frequency: {other}"
            ))),
        }
    }
}
