use rust_decimal::{Decimal, RoundingStrategy};

use consign_config::Config;

/// Number formatting driven by the configured currency settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    currency: String,
    precision: u32,
}

impl Formatter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            currency: config.currency.clone(),
            precision: config.currency_precision,
        }
    }

    /// `1234.5` -> `"1234.50 EUR"`.
    pub fn money(&self, value: Decimal) -> String {
        format!("{} {}", self.amount(value), self.currency)
    }

    /// Amount without the currency code, for table cells.
    pub fn amount(&self, value: Decimal) -> String {
        let rounded =
            value.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.prec$}", prec = self.precision as usize)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Ratio as a percentage: `0.4558` -> `"45.58%"`.
pub fn ratio_percent(ratio: Decimal) -> String {
    let percent = (ratio * Decimal::ONE_HUNDRED).round_dp(2);
    format!("{percent:.2}%")
}

/// Signed percentage change: `673.68` -> `"+673.68%"`.
pub fn change(percent: Decimal) -> String {
    if percent > Decimal::ZERO {
        format!("+{percent:.2}%")
    } else {
        format!("{percent:.2}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_money_with_precision() {
        let config = Config {
            currency: "EUR".into(),
            currency_precision: 2,
            ..Config::default()
        };
        let fmt = Formatter::from_config(&config);
        assert_eq!(fmt.money(dec!(1234.5)), "1234.50 EUR");
        assert_eq!(fmt.amount(dec!(3309.095)), "3309.10");
    }

    #[test]
    fn formats_ratios_and_changes() {
        assert_eq!(ratio_percent(dec!(0.4558)), "45.58%");
        assert_eq!(change(dec!(673.68)), "+673.68%");
        assert_eq!(change(dec!(-12.5)), "-12.50%");
        assert_eq!(change(Decimal::ZERO), "0.00%");
    }
}
