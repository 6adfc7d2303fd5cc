use crate::model::{BollingerBands, Macd, Trend};

/// Technical indicators over a price series ordered most-recent-first
/// (`prices[0]` is the latest observation).
pub struct MarketAnalyzer;

impl MarketAnalyzer {
    pub const RSI_PERIOD: usize = 14;
    pub const BOLLINGER_PERIOD: usize = 20;
    pub const BOLLINGER_WIDTH: f64 = 2.0;
    const TREND_SAMPLE: usize = 3;
    const TREND_THRESHOLD: f64 = 5.0;

    /// Percent change of each observation relative to the one before it in time:
    /// `(prices[i] - prices[i+1]) / prices[i+1] * 100`. A zero base counts as no change.
    pub fn percent_changes(prices: &[f64]) -> Vec<f64> {
        prices
            .windows(2)
            .map(|w| if w[1] == 0.0 { 0.0 } else { (w[0] - w[1]) / w[1] * 100.0 })
            .collect()
    }

    /// Root-mean-square of the percent changes.
    pub fn volatility(prices: &[f64]) -> f64 {
        let changes = Self::percent_changes(prices);
        if changes.is_empty() {
            return 0.0;
        }
        (changes.iter().map(|c| c * c).sum::<f64>() / changes.len() as f64).sqrt()
    }

    /// RSI (Relative Strength Index) over the most recent `min(14, len-1)` steps.
    /// Fewer than two prices is neutral (50).
    pub fn compute_rsi(prices: &[f64]) -> f64 {
        let period = Self::RSI_PERIOD.min(prices.len().saturating_sub(1));
        if period == 0 {
            return 50.0;
        }

        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=period {
            let change = prices[i - 1] - prices[i];
            if change >= 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;
        // RS is pinned to 100 when there were no losses.
        let rs = if avg_loss == 0.0 { 100.0 } else { avg_gain / avg_loss };
        100.0 - (100.0 / (1.0 + rs))
    }

    /// EMA seeded with `series[0]`, folded over at most `period` entries.
    pub fn ema(series: &[f64], period: usize) -> f64 {
        let Some(&seed) = series.first() else {
            return 0.0;
        };
        let k = 2.0 / (period as f64 + 1.0);
        series
            .iter()
            .take(period.max(1))
            .skip(1)
            .fold(seed, |ema, &price| (price - ema) * k + ema)
    }

    /// MACD(12, 26) with a signal line taken as the 9-period EMA of the single
    /// latest MACD value, which leaves it equal to the MACD line.
    pub fn macd(prices: &[f64]) -> Macd {
        let value = Self::ema(prices, 12) - Self::ema(prices, 26);
        let signal = Self::ema(&[value], 9);
        Macd {
            value,
            signal,
            histogram: value - signal,
        }
    }

    pub fn bollinger_bands(prices: &[f64]) -> BollingerBands {
        let window = &prices[..prices.len().min(Self::BOLLINGER_PERIOD)];
        if window.is_empty() {
            return BollingerBands::default();
        }

        let n = window.len() as f64;
        let sma = window.iter().sum::<f64>() / n;
        let sd = (window.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / n).sqrt();
        BollingerBands {
            upper: sma + Self::BOLLINGER_WIDTH * sd,
            middle: sma,
            lower: sma - Self::BOLLINGER_WIDTH * sd,
        }
    }

    /// Compares the three latest prices with the three oldest ones.
    pub fn analyze_trend(prices: &[f64]) -> Trend {
        if prices.len() < 2 {
            return Trend::Stable;
        }

        let sample = Self::TREND_SAMPLE.min(prices.len());
        let recent_avg = prices[..sample].iter().sum::<f64>() / sample as f64;
        let old_avg = prices[prices.len() - sample..].iter().sum::<f64>() / sample as f64;
        if old_avg == 0.0 {
            return Trend::Stable;
        }

        let change_pct = (recent_avg - old_avg) / old_avg * 100.0;
        if change_pct > Self::TREND_THRESHOLD {
            Trend::Up
        } else if change_pct < -Self::TREND_THRESHOLD {
            Trend::Down
        } else {
            Trend::Stable
        }
    }

    /// Mean absolute percent step, scaled into [0, 1].
    pub fn trend_strength(prices: &[f64]) -> f64 {
        let changes = Self::percent_changes(prices);
        if changes.is_empty() {
            return 0.0;
        }
        let avg_change = changes.iter().map(|c| c.abs()).sum::<f64>() / changes.len() as f64;
        (avg_change / 10.0).clamp(0.0, 1.0)
    }
}
