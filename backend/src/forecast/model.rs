//! Search settings and model descriptions for the auto-ARIMA library.
//!
//! `anofox_forecast` does the order search and estimation. The types here are
//! the serializable face of it: the `[forecast]` config section and the order
//! reported back in views and logs.

use std::fmt;

use anofox_forecast::models::arima::{AutoARIMAConfig, ModelOrder as LibraryOrder};
use serde::{Deserialize, Serialize};

/// Criterion used to compare candidate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    #[default]
    Aic,
    Bic,
}

impl fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InformationCriterion::Aic => f.write_str("AIC"),
            InformationCriterion::Bic => f.write_str("BIC"),
        }
    }
}

/// Limits for the order search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoArimaConfig {
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    #[serde(rename = "max_seasonal_p")]
    pub max_cap_p: usize,
    #[serde(rename = "max_seasonal_q")]
    pub max_cap_q: usize,
    #[serde(rename = "max_seasonal_d")]
    pub max_cap_d: usize,
    /// Stepwise candidate list instead of the full grid.
    pub stepwise: bool,
    pub criterion: InformationCriterion,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_d: 2,
            max_cap_p: 2,
            max_cap_q: 2,
            max_cap_d: 1,
            stepwise: true,
            criterion: InformationCriterion::Aic,
        }
    }
}

impl AutoArimaConfig {
    /// Library configuration for a search with seasonal period `period`.
    ///
    /// A period of 0 searches non-seasonal models only.
    pub fn to_library(&self, period: usize) -> AutoARIMAConfig {
        let mut config = AutoARIMAConfig::default()
            .with_max_orders(self.max_p, self.max_d, self.max_q)
            .with_seasonal_orders(self.max_cap_p, self.max_cap_d, self.max_cap_q)
            .with_seasonal_period(period);
        if !self.stepwise {
            config = config.exhaustive();
        }
        config.use_aic = self.criterion == InformationCriterion::Aic;
        config
    }
}

/// Selected order (p, d, q)(P, D, Q)[s].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub cap_p: usize,
    pub cap_d: usize,
    pub cap_q: usize,
    /// Seasonal period; 0 or 1 means non-seasonal.
    pub s: usize,
}

impl ModelOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p: 0,
            cap_d: 0,
            cap_q: 0,
            s: 0,
        }
    }

    pub fn seasonal(mut self, cap_p: usize, cap_d: usize, cap_q: usize, s: usize) -> Self {
        self.cap_p = cap_p;
        self.cap_d = cap_d;
        self.cap_q = cap_q;
        self.s = s;
        self
    }

    pub fn is_seasonal(&self) -> bool {
        self.s > 1
    }
}

impl From<LibraryOrder> for ModelOrder {
    fn from(order: LibraryOrder) -> Self {
        ModelOrder::new(order.p, order.d, order.q).seasonal(
            order.cap_p,
            order.cap_d,
            order.cap_q,
            order.s,
        )
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "({},{},{})[{}]", self.cap_p, self.cap_d, self.cap_q, self.s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_display() {
        assert_eq!(ModelOrder::new(1, 1, 0).to_string(), "ARIMA(1,1,0)");
        assert_eq!(
            ModelOrder::new(0, 1, 1).seasonal(0, 1, 1, 24).to_string(),
            "ARIMA(0,1,1)(0,1,1)[24]"
        );
        // A period still shows when every seasonal order is zero.
        assert_eq!(
            ModelOrder::new(2, 0, 0).seasonal(0, 0, 0, 24).to_string(),
            "ARIMA(2,0,0)(0,0,0)[24]"
        );
    }

    #[test]
    fn test_order_from_library() {
        let order = ModelOrder::from(LibraryOrder {
            p: 1,
            d: 0,
            q: 2,
            cap_p: 1,
            cap_d: 1,
            cap_q: 0,
            s: 24,
        });
        assert_eq!(order, ModelOrder::new(1, 0, 2).seasonal(1, 1, 0, 24));
    }

    #[test]
    fn test_library_config_mapping() {
        let config = AutoArimaConfig {
            max_p: 3,
            max_cap_d: 0,
            stepwise: false,
            criterion: InformationCriterion::Bic,
            ..AutoArimaConfig::default()
        };
        let library = config.to_library(24);

        assert_eq!(library.max_p, 3);
        assert_eq!(library.max_q, 5);
        assert_eq!(library.max_cap_d, 0);
        assert_eq!(library.seasonal_period, 24);
        assert!(!library.stepwise);
        assert!(!library.use_aic);
    }

    #[test]
    fn test_criterion_names() {
        assert_eq!(InformationCriterion::Aic.to_string(), "AIC");
        assert_eq!(InformationCriterion::Bic.to_string(), "BIC");
        let parsed: InformationCriterion = serde_json::from_str("\"bic\"").unwrap();
        assert_eq!(parsed, InformationCriterion::Bic);
    }
}
