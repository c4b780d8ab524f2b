//! Position Sizing
//!
//! Each strategy picks one sizing method. Risk-budget methods size so that a
//! move to the stop loses the budgeted capital; Kelly allocates a fraction of
//! equity directly.
//!
//! | Method | Risk capital | Distance |
//! |--------|--------------|----------|
//! | FixedFractional | equity * risk_pct | stop distance |
//! | AtrBased | equity * risk_pct | ATR * multiplier |
//! | VolatilityAdjusted | equity * base * avg_vol / vol | stop distance |
//! | KellyFractional | equity * kelly | entry price |

use bastion_core::ConfigError;
use bastion_core::error::checks;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Hard ceiling on any Kelly allocation
pub const KELLY_CAP: Decimal = dec!(0.25);

/// Bounds for the volatility-adjusted risk fraction
pub const MIN_VOL_ADJUSTED_RISK: Decimal = dec!(0.005);
pub const MAX_VOL_ADJUSTED_RISK: Decimal = dec!(0.05);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SizingMethod {
    FixedFractional {
        risk_pct: Decimal,
    },
    KellyFractional {
        win_rate: Decimal,
        avg_win: Decimal,
        avg_loss: Decimal,
        /// Multiplier on the full Kelly fraction (0.5 = half Kelly)
        fraction: Decimal,
    },
    AtrBased {
        risk_pct: Decimal,
        atr_multiplier: Decimal,
    },
    VolatilityAdjusted {
        base_risk_pct: Decimal,
    },
}

impl Default for SizingMethod {
    fn default() -> Self {
        SizingMethod::FixedFractional {
            risk_pct: dec!(0.01),
        }
    }
}

/// Market and account readings a sizing method may need
#[derive(Debug, Clone, Copy, Default)]
pub struct SizingInputs {
    pub equity: Decimal,
    pub entry: Decimal,
    pub stop: Option<Decimal>,
    pub atr: Option<Decimal>,
    pub volatility: Option<Decimal>,
    pub average_volatility: Option<Decimal>,
    pub kelly_cap: Decimal,
}

impl SizingInputs {
    /// |entry - stop|, or the entry price when no usable stop is given
    pub fn stop_distance(&self) -> Decimal {
        match self.stop {
            Some(stop) if stop != self.entry => (self.entry - stop).abs(),
            _ => self.entry,
        }
    }
}

impl SizingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SizingMethod::FixedFractional { .. } => "fixed_fractional",
            SizingMethod::KellyFractional { .. } => "kelly_fractional",
            SizingMethod::AtrBased { .. } => "atr_based",
            SizingMethod::VolatilityAdjusted { .. } => "volatility_adjusted",
        }
    }

    /// Base quantity before any gate shrinks it. Zero when inputs are unusable.
    pub fn quantity(&self, inputs: &SizingInputs) -> Decimal {
        if inputs.equity <= Decimal::ZERO || inputs.entry <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let quantity = match self {
            SizingMethod::FixedFractional { risk_pct } => {
                risk_quantity(inputs.equity * risk_pct, inputs.stop_distance())
            }
            SizingMethod::KellyFractional {
                win_rate,
                avg_win,
                avg_loss,
                fraction,
            } => {
                let f = kelly_fraction(*win_rate, *avg_win, *avg_loss, *fraction, inputs.kelly_cap);
                inputs.equity * f / inputs.entry
            }
            SizingMethod::AtrBased {
                risk_pct,
                atr_multiplier,
            } => {
                let distance = match inputs.atr {
                    Some(atr) if atr > Decimal::ZERO => atr * atr_multiplier,
                    _ => {
                        log::debug!("[RISK] ATR not warm, sizing off the stop distance");
                        inputs.stop_distance()
                    }
                };
                risk_quantity(inputs.equity * risk_pct, distance)
            }
            SizingMethod::VolatilityAdjusted { base_risk_pct } => {
                let risk_pct = volatility_adjusted_risk(
                    *base_risk_pct,
                    inputs.volatility,
                    inputs.average_volatility,
                );
                risk_quantity(inputs.equity * risk_pct, inputs.stop_distance())
            }
        };
        quantity.max(Decimal::ZERO)
    }

    pub fn validate(&self, strategy_id: &str) -> Result<(), ConfigError> {
        let field = |name: &str| format!("{}.sizing.{}", strategy_id, name);
        match self {
            SizingMethod::FixedFractional { risk_pct } => {
                checks::fraction(&field("risk_pct"), *risk_pct)
            }
            SizingMethod::KellyFractional {
                win_rate,
                avg_win,
                avg_loss,
                fraction,
            } => {
                if *win_rate <= Decimal::ZERO || *win_rate >= Decimal::ONE {
                    return Err(ConfigError::invalid(field("win_rate"), "must lie in (0, 1)"));
                }
                checks::positive(&field("avg_win"), *avg_win)?;
                checks::positive(&field("avg_loss"), *avg_loss)?;
                checks::fraction(&field("fraction"), *fraction)
            }
            SizingMethod::AtrBased {
                risk_pct,
                atr_multiplier,
            } => {
                checks::fraction(&field("risk_pct"), *risk_pct)?;
                checks::positive(&field("atr_multiplier"), *atr_multiplier)
            }
            SizingMethod::VolatilityAdjusted { base_risk_pct } => {
                checks::fraction(&field("base_risk_pct"), *base_risk_pct)
            }
        }
    }
}

fn risk_quantity(risk_capital: Decimal, distance: Decimal) -> Decimal {
    if distance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    risk_capital / distance
}

/// Full Kelly: `(b*p - q) / b` with `b = avg_win / avg_loss`
pub fn raw_kelly(win_rate: Decimal, avg_win: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_win <= Decimal::ZERO || avg_loss <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    // Past Decimal::MAX the loss term vanishes
    let Some(b) = avg_win.checked_div(avg_loss) else {
        return win_rate;
    };
    let q = Decimal::ONE - win_rate;
    (b * win_rate - q).checked_div(b).unwrap_or(Decimal::ZERO)
}

/// Fractional Kelly clamped to `[0, cap]`, with `cap` itself held to `KELLY_CAP`
pub fn kelly_fraction(
    win_rate: Decimal,
    avg_win: Decimal,
    avg_loss: Decimal,
    fraction: Decimal,
    cap: Decimal,
) -> Decimal {
    let cap = cap.min(KELLY_CAP).max(Decimal::ZERO);
    raw_kelly(win_rate, avg_win, avg_loss)
        .saturating_mul(fraction)
        .clamp(Decimal::ZERO, cap)
}

/// `base * average_vol / current_vol`, bounded to [0.5%, 5%]
pub fn volatility_adjusted_risk(
    base: Decimal,
    volatility: Option<Decimal>,
    average_volatility: Option<Decimal>,
) -> Decimal {
    let scaled = match (volatility, average_volatility) {
        (Some(current), Some(average)) if current > Decimal::ZERO && average > Decimal::ZERO => {
            base * average / current
        }
        _ => base,
    };
    scaled.clamp(MIN_VOL_ADJUSTED_RISK, MAX_VOL_ADJUSTED_RISK)
}
