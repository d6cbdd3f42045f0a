use serde::{Serialize, Serializer};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RetirementMode {
    Manual,
    Auto,
}

#[derive(Debug, Clone)]
pub struct Params {
    pub initial_capital: f64,
    pub monthly_income: f64,
    pub monthly_living_expenses: f64,
    pub income_growth_rate: f64,
    pub interest_rate: f64,
    pub inflation_rate: f64,
    pub current_age: u32,
    pub retirement_age: u32,
    pub retirement_mode: RetirementMode,
    pub max_age: u32,
}

/// Capital is either an amount or the terminal "account ran dry" marker.
/// The marker propagates forward; no arithmetic is ever performed on it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Capital {
    Amount(f64),
    Depleted,
}

pub const DEPLETED_MARKER: &str = "Ø";

impl Capital {
    pub fn amount(self) -> Option<f64> {
        match self {
            Capital::Amount(value) => Some(value),
            Capital::Depleted => None,
        }
    }

    pub fn is_depleted(self) -> bool {
        matches!(self, Capital::Depleted)
    }
}

impl Serialize for Capital {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Capital::Amount(value) => serializer.serialize_f64((value * 100.0).round() / 100.0),
            Capital::Depleted => serializer.serialize_str(DEPLETED_MARKER),
        }
    }
}

#[derive(Debug, Clone)]
pub struct YearRecord {
    pub year: u32,
    pub age: u32,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub investment_capital: f64,
    pub expenses_inflation: f64,
    pub net_capital: f64,
    // Signed annual net flow; the name is kept for the consuming report.
    pub annual_expenses: f64,
    pub total_capital_start: Capital,
    pub interest_income: f64,
    pub half_year_interest: f64,
    pub total_capital_end: Capital,
    pub expense_percentage: f64,
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub years: Vec<YearRecord>,
    pub retirement_age: u32,
}
