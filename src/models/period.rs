//! Lookback window models

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::utils::errors::ConfigError;

/// Historical span requested from the market-data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum LookbackPeriod {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    YearToDate,
    Max,
}

impl LookbackPeriod {
    pub const SUPPORTED: &'static str = "1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max";

    /// Value of the provider's `range` query parameter
    pub fn as_range(&self) -> &'static str {
        match self {
            LookbackPeriod::OneDay => "1d",
            LookbackPeriod::FiveDays => "5d",
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::FiveYears => "5y",
            LookbackPeriod::TenYears => "10y",
            LookbackPeriod::YearToDate => "ytd",
            LookbackPeriod::Max => "max",
        }
    }
}

impl FromStr for LookbackPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(LookbackPeriod::OneDay),
            "5d" | "1w" => Ok(LookbackPeriod::FiveDays),
            "1mo" | "1m" | "1month" => Ok(LookbackPeriod::OneMonth),
            "3mo" | "3m" | "3months" => Ok(LookbackPeriod::ThreeMonths),
            "6mo" | "6m" | "6months" => Ok(LookbackPeriod::SixMonths),
            "1y" | "1year" => Ok(LookbackPeriod::OneYear),
            "2y" => Ok(LookbackPeriod::TwoYears),
            "5y" => Ok(LookbackPeriod::FiveYears),
            "10y" => Ok(LookbackPeriod::TenYears),
            "ytd" => Ok(LookbackPeriod::YearToDate),
            "max" | "all" => Ok(LookbackPeriod::Max),
            _ => Err(ConfigError::InvalidPeriod(s.to_string())),
        }
    }
}

impl TryFrom<String> for LookbackPeriod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}
