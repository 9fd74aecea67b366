//! Factor-related type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Date;

/// Number of risk factors in the model.
pub const N_FACTORS: usize = 6;

/// Name of a systematic risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum FactorName {
    /// Market excess return (Mkt-RF).
    #[display("Mkt-RF")]
    MarketExcess,
    /// Small minus big (SMB).
    #[display("SMB")]
    Size,
    /// High minus low book-to-market (HML).
    #[display("HML")]
    Value,
    /// Robust minus weak profitability (RMW).
    #[display("RMW")]
    Quality,
    /// Conservative minus aggressive investment (CMA).
    #[display("CMA")]
    Investment,
    /// Winners minus losers (Mom).
    #[display("Mom")]
    Momentum,
}

impl FactorName {
    /// All factors in regression column order.
    pub const ALL: [Self; N_FACTORS] =
        [Self::MarketExcess, Self::Size, Self::Value, Self::Quality, Self::Investment, Self::Momentum];

    /// Column position of this factor in a loading vector.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::MarketExcess => 0,
            Self::Size => 1,
            Self::Value => 2,
            Self::Quality => 3,
            Self::Investment => 4,
            Self::Momentum => 5,
        }
    }
}

/// Factor returns for a single date, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Date of the returns.
    pub date: Date,
    /// Market excess return.
    pub market_excess: f64,
    /// Size factor return.
    pub size: f64,
    /// Value factor return.
    pub value: f64,
    /// Quality (profitability) factor return.
    pub quality: f64,
    /// Investment factor return.
    pub investment: f64,
    /// Momentum factor return.
    pub momentum: f64,
    /// Risk-free rate.
    pub risk_free: f64,
}

impl FactorObservation {
    /// Factor values in regression column order.
    #[must_use]
    pub const fn factors(&self) -> [f64; N_FACTORS] {
        [self.market_excess, self.size, self.value, self.quality, self.investment, self.momentum]
    }

    /// Value of a single named factor.
    #[must_use]
    pub const fn get(&self, name: FactorName) -> f64 {
        self.factors()[name.index()]
    }
}

/// Daily factor table keyed uniquely by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    rows: Vec<FactorObservation>,
}

impl FactorTable {
    /// Build a table. Rows are sorted by date; for duplicate dates the last row wins.
    #[must_use]
    pub fn new(rows: impl IntoIterator<Item = FactorObservation>) -> Self {
        let mut rows: Vec<FactorObservation> = rows.into_iter().collect();
        rows.sort_by_key(|r| r.date);
        let mut deduped: Vec<FactorObservation> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.date == row.date => *last = row,
                _ => deduped.push(row),
            }
        }
        Self { rows: deduped }
    }

    /// Number of dates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending date order.
    #[must_use]
    pub fn rows(&self) -> &[FactorObservation] {
        &self.rows
    }

    /// Factor observation for an exact date.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<&FactorObservation> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok().map(|i| &self.rows[i])
    }

    /// Last date covered by the table.
    #[must_use]
    pub fn last_date(&self) -> Option<Date> {
        self.rows.last().map(|r| r.date)
    }
}

/// Regression coefficients of excess return on the factor set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorLoadings(pub [f64; N_FACTORS]);

impl FactorLoadings {
    /// Loading on a single named factor.
    #[must_use]
    pub const fn get(&self, name: FactorName) -> f64 {
        self.0[name.index()]
    }

    /// Fitted excess return: sum of loading times factor value.
    #[must_use]
    pub fn fitted(&self, factors: &[f64; N_FACTORS]) -> f64 {
        self.0.iter().zip(factors).map(|(b, f)| b * f).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, mkt: f64) -> FactorObservation {
        FactorObservation {
            date: Date::from_ymd_opt(2024, 1, day).unwrap(),
            market_excess: mkt,
            size: 0.1,
            value: 0.2,
            quality: 0.3,
            investment: 0.4,
            momentum: 0.5,
            risk_free: 0.02,
        }
    }

    #[test]
    fn factor_names_display_like_the_library() {
        assert_eq!(FactorName::MarketExcess.to_string(), "Mkt-RF");
        assert_eq!(FactorName::Momentum.to_string(), "Mom");
        for (i, name) in FactorName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn table_sorts_and_keeps_last_duplicate() {
        let table = FactorTable::new([obs(3, 1.0), obs(2, 0.5), obs(3, 2.0)]);
        assert_eq!(table.len(), 2);
        let d3 = Date::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(table.get(d3).map(|r| r.market_excess), Some(2.0));
        assert_eq!(table.last_date(), Some(d3));
        assert!(table.get(Date::from_ymd_opt(2024, 1, 4).unwrap()).is_none());
    }

    #[test]
    fn loadings_fitted_value() {
        let loadings = FactorLoadings([1.0, 0.5, 0.0, 0.0, 0.0, -1.0]);
        let row = obs(2, 2.0);
        // 1.0 * 2.0 + 0.5 * 0.1 - 1.0 * 0.5
        assert!((loadings.fitted(&row.factors()) - 1.55).abs() < 1e-12);
        assert_eq!(loadings.get(FactorName::Size), 0.5);
        assert_eq!(row.get(FactorName::Quality), 0.3);
    }
}
