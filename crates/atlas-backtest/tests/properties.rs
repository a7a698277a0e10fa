//! Property tests for engine invariants.
//!
//! 1. Resampling is deterministic for a given bar sequence
//! 2. SuperTrend's active band only ratchets within an unbroken trend
//! 3. Simulated fills never leave the bar's range
//! 4. Indicator values never depend on later bars

use atlas_broker::fill::fill_price;
use atlas_core::traits::StreamingIndicator;
use atlas_core::types::{Bar, Order, OrderId, OrderRole, Side, Timeframe, TrendDirection};
use atlas_data::Resampler;
use atlas_indicators::{IndicatorEngine, MaType, SuperTrend};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// (open, high, low, close) around an open between 50 and 150.
fn arb_ohlc() -> impl Strategy<Value = (Decimal, Decimal, Decimal, Decimal)> {
    (5_000i64..15_000, 0i64..500, 0i64..500, 0i64..=100).prop_map(|(o, up, down, k)| {
        let open = Decimal::new(o, 2);
        let high = open + Decimal::new(up, 2);
        let low = open - Decimal::new(down, 2);
        let close = low + (high - low) * Decimal::from(k) / Decimal::from(100);
        (open, high, low, close)
    })
}

fn arb_bar() -> impl Strategy<Value = Bar> {
    arb_ohlc().prop_map(|(o, h, l, c)| {
        Bar::new("SPY", Timeframe::MINUTE_1, t0(), o, h, l, c, Decimal::from(100))
    })
}

/// Random walk of bars on `timeframe`, with gaps of up to `max_gap` bars.
fn arb_series(
    timeframe: Timeframe,
    len: std::ops::Range<usize>,
    max_gap: i64,
) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-300i64..300, 0i64..300, 0i64..300, 0i64..=100, 1..=max_gap), len)
        .prop_map(move |steps| {
            let mut bars = Vec::with_capacity(steps.len());
            let mut price = Decimal::from(100);
            let mut slot = 0i64;
            for (delta, up, down, k, gap) in steps {
                let open = (price + Decimal::new(delta, 2)).max(Decimal::from(10));
                let high = open + Decimal::new(up, 2);
                let low = open - Decimal::new(down, 2);
                let close = low + (high - low) * Decimal::from(k) / Decimal::from(100);
                slot += gap;
                bars.push(Bar::new(
                    "SPY",
                    timeframe,
                    t0() + timeframe.duration() * slot as i32,
                    open,
                    high,
                    low,
                    close,
                    Decimal::from(100),
                ));
                price = close;
            }
            bars
        })
}

fn arb_order(reference: Decimal) -> impl Strategy<Value = Order> {
    (0u8..4, any::<bool>(), -1_000i64..1_000).prop_map(move |(kind, buy, offset)| {
        let side = if buy { Side::Buy } else { Side::Sell };
        let price = reference + Decimal::new(offset, 2);
        let qty = Decimal::from(10);
        match kind {
            0 => Order::market(OrderId(1), "SPY", side, qty, OrderRole::Entry, t0()),
            1 => Order::limit(OrderId(1), "SPY", side, qty, price, OrderRole::Entry, t0()),
            2 => Order::stop(OrderId(1), "SPY", side, qty, price, t0()),
            _ => Order::take_profit(OrderId(1), "SPY", side, qty, price, t0()),
        }
    })
}

fn resample(bars: &[Bar]) -> Vec<Bar> {
    let mut resampler = Resampler::new(
        "SPY",
        Timeframe::MINUTE_1,
        [Timeframe::MINUTE_5, Timeframe::MINUTE_15],
    )
    .unwrap();
    bars.iter()
        .flat_map(|b| resampler.ingest(b).unwrap())
        .collect()
}

// ── 1. Resampling ────────────────────────────────────────────────────

proptest! {
    /// Two fresh resamplers fed the same sequence finalize identical bars.
    #[test]
    fn resampling_is_repeatable(bars in arb_series(Timeframe::MINUTE_1, 1..120, 3)) {
        let first = resample(&bars);
        let second = resample(&bars);
        prop_assert_eq!(&first, &second);

        for bar in &first {
            prop_assert!(bar.low <= bar.open && bar.open <= bar.high);
            prop_assert!(bar.low <= bar.close && bar.close <= bar.high);
            prop_assert_eq!(bar.open_time, bar.timeframe.bucket_start(bar.open_time));
        }
    }
}

// ── 2. Band monotonicity ─────────────────────────────────────────────

proptest! {
    /// Within an unbroken up trend the lower band never falls; within a
    /// down trend the upper band never rises.
    #[test]
    fn supertrend_band_ratchets(bars in arb_series(Timeframe::HOUR_3, 5..80, 1)) {
        let mut st = SuperTrend::new(3, Decimal::from(2)).unwrap();
        let mut prev: Option<(TrendDirection, Decimal, Decimal)> = None;

        for bar in &bars {
            let Some(value) = st.update(bar) else {
                continue;
            };
            if let Some((dir, band, close)) = prev {
                match (dir, value.direction) {
                    (TrendDirection::Up, TrendDirection::Up) if close >= band => {
                        prop_assert!(value.band >= band);
                    }
                    (TrendDirection::Down, TrendDirection::Down) if close <= band => {
                        prop_assert!(value.band <= band);
                    }
                    _ => {}
                }
            }
            prev = Some((value.direction, value.band, bar.close));
        }
    }
}

// ── 3. Fill bounds ───────────────────────────────────────────────────

proptest! {
    /// Any fill the simulator reports lies within [low, high].
    #[test]
    fn fills_stay_inside_the_bar(
        (bar, order) in arb_bar().prop_flat_map(|bar| {
            let reference = bar.open;
            (Just(bar), arb_order(reference))
        })
    ) {
        if let Some(price) = fill_price(&order, &bar) {
            prop_assert!(price >= bar.low, "{} below low {}", price, bar.low);
            prop_assert!(price <= bar.high, "{} above high {}", price, bar.high);
        }
    }
}

// ── 4. No lookahead ──────────────────────────────────────────────────

fn indicator_engine() -> IndicatorEngine {
    IndicatorEngine::new("SPY")
        .with_supertrend(Timeframe::MINUTE_30, 3, Decimal::from(3))
        .unwrap()
        .with_average(Timeframe::MINUTE_30, "fast", MaType::Simple, 3)
        .unwrap()
        .with_average(Timeframe::MINUTE_30, "slow", MaType::Exponential, 5)
        .unwrap()
}

proptest! {
    /// The state published for bar t is the same whether or not later bars
    /// are fed afterwards.
    #[test]
    fn indicators_ignore_later_bars(
        bars in arb_series(Timeframe::MINUTE_30, 2..60, 2),
        cut in 0usize..60,
    ) {
        let cut = cut % bars.len();

        let mut prefix = indicator_engine();
        let mut at_cut = None;
        for bar in &bars[..=cut] {
            at_cut = prefix.on_closed_bar(bar).unwrap();
        }

        let mut full = indicator_engine();
        let mut seen = None;
        for (i, bar) in bars.iter().enumerate() {
            let state = full.on_closed_bar(bar).unwrap();
            if i == cut {
                seen = state;
            }
        }

        prop_assert!(at_cut.is_some());
        prop_assert_eq!(at_cut, seen);
        prop_assert_eq!(
            prefix.latest(Timeframe::MINUTE_30).map(|s| s.as_of),
            Some(bars[cut].open_time)
        );
    }
}
