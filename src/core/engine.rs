use super::search::find_retirement_age;
use super::types::{Capital, Params, Projection, RetirementMode, YearRecord};

/// Walks the projection horizon year by year and resolves the effective
/// retirement age (configured in manual mode, searched in auto mode).
pub fn run_projection(params: &Params) -> Projection {
    let retirement_age = match params.retirement_mode {
        RetirementMode::Manual => params.retirement_age,
        RetirementMode::Auto => find_retirement_age(params),
    };

    let horizon = params.max_age.saturating_sub(params.current_age);
    let retirement_year = retirement_age.saturating_sub(params.current_age);
    let mut years: Vec<YearRecord> = Vec::with_capacity(horizon as usize);

    for year in 1..=horizon {
        let record = calculate_year(params, year, years.last(), retirement_age);
        // Depletion only ends the walk once retirement has begun; while still
        // accumulating, the horizon bound is the only stop.
        let stop = record.total_capital_end.is_depleted() && year > retirement_year;
        years.push(record);
        if stop {
            break;
        }
    }

    Projection {
        years,
        retirement_age,
    }
}

pub fn calculate_year(
    params: &Params,
    year: u32,
    prev: Option<&YearRecord>,
    effective_retirement_age: u32,
) -> YearRecord {
    let age = params.current_age + year;

    // Indexation starts at year 1: the first year is already escalated once.
    let monthly_income =
        params.monthly_income * (1.0 + params.income_growth_rate).powi(year as i32);
    let monthly_expenses =
        params.monthly_living_expenses * (1.0 + params.inflation_rate).powi(year as i32);

    let start = match prev {
        None => Capital::Amount(params.initial_capital),
        Some(record) => record.total_capital_end,
    };

    let Capital::Amount(start_capital) = start else {
        return depleted_year(year, age, monthly_income, monthly_expenses);
    };

    let accumulation = age < effective_retirement_age;
    let (investment_capital, expenses_inflation) = if accumulation {
        (monthly_income - monthly_expenses, 0.0)
    } else {
        // 2% floor: retirees withdraw at least 2% of starting capital a year,
        // even when indexed living costs are lower.
        let floor = 0.02 * start_capital / 12.0;
        (0.0, monthly_expenses.max(floor))
    };

    let net_capital = investment_capital - expenses_inflation;
    let annual_expenses = net_capital * 12.0;

    let interest_income = start_capital * params.interest_rate;
    // Interest on flows arriving evenly through the year; never negative.
    let half_year_interest = (net_capital * (params.interest_rate * 12.0) / 2.0).max(0.0);

    let total = start_capital + annual_expenses + interest_income + half_year_interest;
    let total_capital_end = if total > 0.0 {
        Capital::Amount(total)
    } else {
        Capital::Depleted
    };

    let expense_percentage = match total_capital_end {
        Capital::Amount(end) if end > 0.0 => expenses_inflation * 12.0 / end * 100.0,
        _ => 0.0,
    };

    YearRecord {
        year,
        age,
        monthly_income,
        monthly_expenses,
        investment_capital,
        expenses_inflation,
        net_capital,
        annual_expenses,
        total_capital_start: start,
        interest_income,
        half_year_interest,
        total_capital_end,
        expense_percentage,
    }
}

// A year spent against an already-depleted account: nothing is invested, the
// indexed living cost still goes out, and both capital fields stay depleted.
fn depleted_year(year: u32, age: u32, monthly_income: f64, monthly_expenses: f64) -> YearRecord {
    YearRecord {
        year,
        age,
        monthly_income,
        monthly_expenses,
        investment_capital: 0.0,
        expenses_inflation: monthly_expenses,
        net_capital: -monthly_expenses,
        annual_expenses: -monthly_expenses * 12.0,
        total_capital_start: Capital::Depleted,
        interest_income: 0.0,
        half_year_interest: 0.0,
        total_capital_end: Capital::Depleted,
        expense_percentage: 0.0,
    }
}
