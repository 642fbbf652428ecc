//! Financial-year labelling (April–March fiscal calendar).

use chrono::{Datelike, Local, NaiveDate};

/// `FY<year>` for the fiscal year containing `date`; January to March belong
/// to the previous year's FY.
pub fn financial_year(date: NaiveDate) -> String {
    let year = if date.month() < 4 {
        date.year() - 1
    } else {
        date.year()
    };
    format!("FY{year}")
}

pub fn current_financial_year() -> String {
    financial_year(Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_april_starts_a_new_year() {
        assert_eq!(financial_year(date(2025, 4, 1)), "FY2025");
        assert_eq!(financial_year(date(2025, 7, 22)), "FY2025");
    }

    #[test]
    fn test_first_quarter_belongs_to_previous_year() {
        assert_eq!(financial_year(date(2025, 2, 5)), "FY2024");
        assert_eq!(financial_year(date(2025, 3, 31)), "FY2024");
    }
}
