use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Returns the opposite side of the trade
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "Long",
            Side::Short => "Short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            other => Err(CoreError::InvalidInput(
                "side".to_string(),
                format!("unknown side '{other}'"),
            )),
        }
    }
}

/// The currency symbol an account is denominated in. Only these two are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "$", alias = "USD")]
    Dollar,
    #[serde(rename = "€", alias = "EUR")]
    Euro,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Dollar => "$",
            Currency::Euro => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" | "USD" | "usd" => Ok(Currency::Dollar),
            "€" | "EUR" | "eur" => Ok(Currency::Euro),
            other => Err(CoreError::InvalidInput(
                "currency".to_string(),
                format!("unsupported currency '{other}'"),
            )),
        }
    }
}
