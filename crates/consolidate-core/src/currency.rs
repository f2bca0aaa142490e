use std::collections::HashMap;

use tracing::debug;

use crate::models::ConsolidatedDataset;

/// Rate applied to currency codes that are not in the table.
pub const DEFAULT_RATE: f64 = 1.0;

/// Currency code → USD conversion rate for a whole run.
///
/// A single flat table is used for every row; there is no notion of rate
/// dates. Unknown codes convert at [`DEFAULT_RATE`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRateTable {
    rates: HashMap<String, f64>,
}

impl ExchangeRateTable {
    /// Build a table from `(code, rate)` pairs in source order.
    ///
    /// When a code appears more than once the first occurrence wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut rates = HashMap::new();
        for (code, rate) in pairs {
            if rates.contains_key(&code) {
                debug!("Ignoring duplicate exchange rate for {}", code);
                continue;
            }
            rates.insert(code, rate);
        }
        Self { rates }
    }

    /// An empty table: every amount converts at [`DEFAULT_RATE`].
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate for `code`, falling back to [`DEFAULT_RATE`].
    pub fn rate_for(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(DEFAULT_RATE)
    }

    /// Convert `amount` expressed in `currency` to USD.
    ///
    /// A missing currency converts at the default rate.
    pub fn to_usd(&self, amount: f64, currency: Option<&str>) -> f64 {
        let rate = currency.map_or(DEFAULT_RATE, |code| self.rate_for(code));
        amount * rate
    }

    /// Fill `Total_in_USD` on every row. Rows without a transaction amount
    /// get no total.
    pub fn apply(&self, dataset: &mut ConsolidatedDataset) {
        for row in &mut dataset.rows {
            row.total_in_usd = row
                .transaction
                .map(|amount| self.to_usd(amount, row.currency.as_deref()));
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
