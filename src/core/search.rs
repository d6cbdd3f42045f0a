use super::engine::calculate_year;
use super::types::{Capital, Params};

// Effective age no projection year can reach, pinning the whole search walk
// in the accumulation phase.
const NEVER_RETIRES: u32 = u32::MAX;

const TARGET_WITHDRAWAL_RATE: f64 = 4.0;

/// Finds the smallest age at which annualized living costs fit inside 4% of
/// projected capital, assuming contributions continue until then. Returns
/// `max_age` when the test is never met or savings run dry first.
pub fn find_retirement_age(params: &Params) -> u32 {
    let horizon = params.max_age.saturating_sub(params.current_age);
    let mut prev = None;

    for year in 1..=horizon {
        let record = calculate_year(params, year, prev.as_ref(), NEVER_RETIRES);

        if let Capital::Amount(end) = record.total_capital_end {
            if end > 0.0 {
                let withdrawal_rate = record.monthly_expenses * 12.0 / end * 100.0;
                if withdrawal_rate <= TARGET_WITHDRAWAL_RATE {
                    return params.current_age + year;
                }
            }
        }

        if record.total_capital_end.is_depleted() {
            break;
        }
        prev = Some(record);
    }

    params.max_age
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RetirementMode;

    fn search_params() -> Params {
        Params {
            initial_capital: 1_000_000.0,
            monthly_income: 10_000.0,
            monthly_living_expenses: 2_000.0,
            income_growth_rate: 0.03,
            interest_rate: 0.08,
            inflation_rate: 0.02,
            current_age: 30,
            retirement_age: 60,
            retirement_mode: RetirementMode::Auto,
            max_age: 60,
        }
    }

    #[test]
    fn returns_first_age_meeting_the_four_percent_test() {
        let params = search_params();
        let age = find_retirement_age(&params);
        assert_eq!(age, 31);

        // The discovered year passes the test under the accumulation-only walk
        // the search uses.
        let year = age - params.current_age;
        let mut prev = None;
        for y in 1..=year {
            let record = calculate_year(&params, y, prev.as_ref(), NEVER_RETIRES);
            prev = Some(record);
        }
        let record = prev.expect("record expected");
        let end = record.total_capital_end.amount().expect("capital expected");
        assert!(record.monthly_expenses * 12.0 / end * 100.0 <= TARGET_WITHDRAWAL_RATE);
    }

    #[test]
    fn returns_max_age_when_the_test_is_never_met() {
        let params = Params {
            initial_capital: 100.0,
            monthly_income: 1_000.0,
            monthly_living_expenses: 1_000.0,
            income_growth_rate: 0.0,
            interest_rate: 0.0,
            inflation_rate: 0.0,
            ..search_params()
        };
        // Capital holds flat at 100, far below 25x annual expenses.
        assert_eq!(find_retirement_age(&params), params.max_age);
    }

    #[test]
    fn returns_max_age_when_savings_deplete_during_the_search() {
        let params = Params {
            initial_capital: 100_000.0,
            monthly_income: 1_000.0,
            monthly_living_expenses: 2_000.0,
            income_growth_rate: 0.0,
            interest_rate: 0.0,
            inflation_rate: 0.0,
            ..search_params()
        };
        assert_eq!(find_retirement_age(&params), params.max_age);
    }
}
