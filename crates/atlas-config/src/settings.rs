//! Configuration structures.

use atlas_broker::{CostModel, OrderManagerConfig, TieBreak};
use atlas_core::error::TradingError;
use atlas_core::types::Timeframe;
use atlas_data::{SessionWindow, DEFAULT_SESSION_TZ};
use atlas_indicators::MaType;
use atlas_risk::{BracketLevels, PositionSizer, PositionSizingMethod};
use atlas_strategies::StrategyRegistry;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), TradingError> {
        self.logging.validate()?;
        self.strategy.validate()
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "atlas".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), TradingError> {
        match self.format.to_lowercase().as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(TradingError::Configuration(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Where backtest input comes from and where results go.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BacktestSettings {
    /// CSV of base bars
    pub data_file: Option<PathBuf>,
    /// Directory for report artifacts
    pub output_dir: Option<PathBuf>,
    /// Pause between bars when replaying in paper mode
    #[serde(default)]
    pub replay_delay_ms: u64,
}

/// Periods of the labelled moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaPeriods {
    pub fast: usize,
    pub signal: usize,
    pub medium: usize,
    pub slow: usize,
}

impl Default for MaPeriods {
    fn default() -> Self {
        Self {
            fast: 5,
            signal: 9,
            medium: 20,
            slow: 50,
        }
    }
}

impl MaPeriods {
    /// `(label, period)` pairs.
    pub fn labelled(&self) -> [(&'static str, usize); 4] {
        use atlas_strategies::labels::{FAST, MEDIUM, SIGNAL, SLOW};
        [
            (FAST, self.fast),
            (SIGNAL, self.signal),
            (MEDIUM, self.medium),
            (SLOW, self.slow),
        ]
    }
}

/// Daily trading window, `HH:MM` in the exchange's local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    pub start: String,
    pub end: String,
    /// IANA timezone name
    #[serde(default = "default_session_tz")]
    pub timezone: String,
}

fn default_session_tz() -> String {
    DEFAULT_SESSION_TZ.to_string()
}

/// Recognized strategy options for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategySettings {
    pub symbol: String,
    /// Registry name of the decision policy
    pub strategy: String,
    /// Policy-specific parameters, passed to the registry
    pub strategy_params: serde_json::Value,

    pub base_timeframe: Timeframe,
    pub ma_timeframe: Timeframe,
    pub trend_timeframe: Timeframe,

    pub supertrend_length: usize,
    pub supertrend_multiplier: Decimal,
    pub ma_type: MaType,
    pub ma_periods: MaPeriods,

    pub sizing: Option<PositionSizingMethod>,
    /// Shorthand for fixed-share sizing
    pub quantity: Option<Decimal>,
    /// Cap on shares per entry, whatever the sizing method
    pub max_shares: Option<Decimal>,

    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub use_bracket_orders: bool,
    pub place_market_orders: bool,
    pub tie_break: TieBreak,

    pub starting_equity: Decimal,
    pub commission: Decimal,
    pub slippage_bps: Decimal,

    pub session: Option<SessionSettings>,
    pub flatten_at_end: bool,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            strategy: "supertrend_ma".to_string(),
            strategy_params: serde_json::Value::Null,
            base_timeframe: Timeframe::MINUTE_1,
            ma_timeframe: Timeframe::MINUTE_30,
            trend_timeframe: Timeframe::HOUR_3,
            supertrend_length: 10,
            supertrend_multiplier: dec!(3.0),
            ma_type: MaType::Simple,
            ma_periods: MaPeriods::default(),
            sizing: None,
            quantity: None,
            max_shares: None,
            stop_loss_pct: dec!(0.02),
            take_profit_pct: dec!(0.03),
            use_bracket_orders: true,
            place_market_orders: true,
            tie_break: TieBreak::StopFirst,
            starting_equity: dec!(100000),
            commission: Decimal::ZERO,
            slippage_bps: Decimal::ZERO,
            session: None,
            flatten_at_end: false,
        }
    }
}

fn invalid(msg: impl Into<String>) -> TradingError {
    TradingError::Configuration(msg.into())
}

impl StrategySettings {
    /// Build settings from a JSON options map and validate them.
    ///
    /// Keys not listed in [`StrategySettings`] are rejected.
    pub fn from_options(
        options: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, TradingError> {
        let settings: Self = serde_json::from_value(serde_json::Value::Object(options))
            .map_err(|e| invalid(format!("invalid strategy options: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every option; the first problem found is returned.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol is required"));
        }
        let registry = StrategyRegistry::new();
        if !registry.exists(&self.strategy) {
            return Err(invalid(format!("unknown strategy '{}'", self.strategy)));
        }
        registry
            .create(&self.strategy, self.strategy_params.clone())
            .map_err(|e| invalid(format!("strategy_params: {}", e)))?;

        for (name, tf) in [
            ("ma_timeframe", self.ma_timeframe),
            ("trend_timeframe", self.trend_timeframe),
        ] {
            if !tf.is_multiple_of(self.base_timeframe) {
                return Err(invalid(format!(
                    "{} {} is not a whole multiple of base_timeframe {}",
                    name, tf, self.base_timeframe
                )));
            }
        }

        if self.supertrend_length == 0 {
            return Err(invalid("supertrend_length must be greater than 0"));
        }
        if self.supertrend_multiplier <= Decimal::ZERO {
            return Err(invalid("supertrend_multiplier must be positive"));
        }
        if let Some((label, _)) = self.ma_periods.labelled().iter().find(|(_, p)| *p == 0) {
            return Err(invalid(format!("ma_periods.{} must be greater than 0", label)));
        }

        if self.sizing.is_some() && self.quantity.is_some() {
            return Err(invalid("set either sizing or quantity, not both"));
        }
        self.sizing_method().validate().map_err(invalid)?;
        if self.max_shares.is_some_and(|max| max <= Decimal::ZERO) {
            return Err(invalid("max_shares must be positive"));
        }

        self.bracket_levels().validate().map_err(invalid)?;
        self.costs().validate().map_err(invalid)?;
        if self.starting_equity <= Decimal::ZERO {
            return Err(invalid("starting_equity must be positive"));
        }

        self.session_window()?;
        Ok(())
    }

    /// Sizing in effect, with `quantity` as fixed-share shorthand.
    pub fn sizing_method(&self) -> PositionSizingMethod {
        match (&self.sizing, self.quantity) {
            (Some(method), _) => method.clone(),
            (None, Some(shares)) => PositionSizingMethod::Fixed { shares },
            (None, None) => PositionSizingMethod::default(),
        }
    }

    pub fn bracket_levels(&self) -> BracketLevels {
        BracketLevels::new(self.stop_loss_pct, self.take_profit_pct)
    }

    pub fn costs(&self) -> CostModel {
        CostModel::new(self.commission, self.slippage_bps)
    }

    pub fn session_window(&self) -> Result<Option<SessionWindow>, TradingError> {
        self.session
            .as_ref()
            .map(|s| SessionWindow::parse(&s.start, &s.end, &s.timezone))
            .transpose()
            .map_err(|e| invalid(format!("session: {}", e)))
    }

    pub fn position_sizer(&self) -> PositionSizer {
        let sizer = PositionSizer::new(self.sizing_method());
        match self.max_shares {
            Some(max) => sizer.with_max_shares(max),
            None => sizer,
        }
    }

    /// Order manager settings derived from these options.
    pub fn order_manager_config(&self) -> OrderManagerConfig {
        OrderManagerConfig {
            starting_equity: self.starting_equity,
            sizer: self.position_sizer(),
            brackets: self.use_bracket_orders.then(|| self.bracket_levels()),
            place_market_orders: self.place_market_orders,
            costs: self.costs(),
            tie_break: self.tie_break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("options must be an object"),
        }
    }

    #[test]
    fn test_defaults_need_symbol() {
        let settings = StrategySettings::default();
        assert!(settings.validate().is_err());

        let settings = StrategySettings {
            symbol: "QQQ".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.sizing_method(),
            PositionSizingMethod::Fixed { shares: dec!(100) }
        );
    }

    #[test]
    fn test_from_options() {
        let settings = StrategySettings::from_options(options(json!({
            "symbol": "QQQ",
            "base_timeframe": "1min",
            "ma_timeframe": "30min",
            "trend_timeframe": "3h",
            "supertrend_length": 10,
            "supertrend_multiplier": 3.0,
            "ma_type": "exponential",
            "ma_periods": {"fast": 5, "signal": 9, "medium": 20, "slow": 50},
            "quantity": 10,
            "stop_loss_pct": 0.02,
            "take_profit_pct": 0.03,
            "use_bracket_orders": true,
            "starting_equity": 50000,
            "commission": 1,
            "slippage_bps": 5,
            "session": {"start": "09:30", "end": "16:00"}
        })))
        .unwrap();

        assert_eq!(settings.ma_type, MaType::Exponential);
        assert_eq!(settings.trend_timeframe, Timeframe::HOUR_3);
        assert_eq!(
            settings.sizing_method(),
            PositionSizingMethod::Fixed { shares: dec!(10) }
        );
        let session = settings.session_window().unwrap().unwrap();
        assert_eq!(session.timezone(), chrono_tz::America::New_York);

        let om = settings.order_manager_config();
        assert_eq!(om.starting_equity, dec!(50000));
        assert_eq!(om.costs, CostModel::new(dec!(1), dec!(5)));
        assert!(om.brackets.is_some());
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = StrategySettings::from_options(options(json!({
            "symbol": "QQQ",
            "trailing_stop": true
        })))
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("trailing_stop"));
    }

    #[test]
    fn test_invalid_values() {
        let base = StrategySettings {
            symbol: "QQQ".into(),
            ..Default::default()
        };
        let cases = [
            StrategySettings {
                ma_timeframe: Timeframe::minutes(7).unwrap(),
                base_timeframe: Timeframe::MINUTE_5,
                ..base.clone()
            },
            StrategySettings {
                trend_timeframe: Timeframe::MINUTE_1,
                base_timeframe: Timeframe::MINUTE_5,
                ..base.clone()
            },
            StrategySettings {
                supertrend_length: 0,
                ..base.clone()
            },
            StrategySettings {
                supertrend_multiplier: dec!(0),
                ..base.clone()
            },
            StrategySettings {
                ma_periods: MaPeriods {
                    signal: 0,
                    ..MaPeriods::default()
                },
                ..base.clone()
            },
            StrategySettings {
                stop_loss_pct: dec!(1.5),
                ..base.clone()
            },
            StrategySettings {
                commission: dec!(-1),
                ..base.clone()
            },
            StrategySettings {
                max_shares: Some(dec!(0)),
                ..base.clone()
            },
            StrategySettings {
                starting_equity: dec!(0),
                ..base.clone()
            },
            StrategySettings {
                strategy: "martingale".into(),
                ..base.clone()
            },
            StrategySettings {
                quantity: Some(dec!(10)),
                sizing: Some(PositionSizingMethod::default()),
                ..base.clone()
            },
            StrategySettings {
                session: Some(SessionSettings {
                    start: "open".into(),
                    end: "21:00".into(),
                    timezone: "UTC".into(),
                }),
                ..base.clone()
            },
            StrategySettings {
                session: Some(SessionSettings {
                    start: "09:30".into(),
                    end: "16:00".into(),
                    timezone: "Atlantis/Poseidonia".into(),
                }),
                ..base.clone()
            },
        ];

        for (i, case) in cases.iter().enumerate() {
            let err = case.validate();
            assert!(
                matches!(err, Err(TradingError::Configuration(_))),
                "case {} should fail",
                i
            );
        }
    }

    #[test]
    fn test_strategy_params_checked_up_front() {
        let base = StrategySettings {
            symbol: "QQQ".into(),
            strategy: "ma_crossover".into(),
            ..Default::default()
        };

        let misspelled = StrategySettings {
            strategy_params: json!({ "allow_shrt": false }),
            ..base.clone()
        };
        let err = misspelled.validate().unwrap_err();
        assert!(matches!(err, TradingError::Configuration(_)));
        assert!(err.to_string().contains("allow_shrt"));

        let out_of_range = StrategySettings {
            strategy_params: json!({ "signal_threshold": 5 }),
            ..base.clone()
        };
        assert!(matches!(
            out_of_range.validate(),
            Err(TradingError::Configuration(_))
        ));

        let valid = StrategySettings {
            strategy_params: json!({ "follow_trend": false, "signal_threshold": "0.001" }),
            ..base
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_max_shares_caps_sizing() {
        let settings = StrategySettings {
            symbol: "QQQ".into(),
            sizing: Some(PositionSizingMethod::CapitalFraction {
                fraction: dec!(0.5),
            }),
            max_shares: Some(dec!(100)),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
        // 100000 * 0.5 / 50 = 1000 shares before the cap
        assert_eq!(
            settings.position_sizer().calculate(dec!(100000), dec!(50), None),
            dec!(100)
        );
        assert_eq!(
            settings.order_manager_config().sizer.calculate(dec!(100000), dec!(50), None),
            dec!(100)
        );
    }

    #[test]
    fn test_brackets_disabled() {
        let settings = StrategySettings {
            symbol: "QQQ".into(),
            use_bracket_orders: false,
            ..Default::default()
        };
        assert!(settings.order_manager_config().brackets.is_none());
    }
}
