use crate::analyzer::market_indicators::MarketAnalyzer;
use crate::model::{
    BollingerBands, Macd, PeriodMetrics, PredictionError, PredictionMetrics, PriceAnalysis,
    PricePoint, PricePrediction, ProfitAnalysis, RiskLevel, Seasonality, TechnicalMetrics,
    TemporalMetrics, TimeFrame, Trend,
};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Indicator values that drive price, confidence and profit scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub rsi: f64,
    pub macd_histogram: f64,
    pub trend: Trend,
    pub trend_strength: f64,
    pub volatility: f64,
}

impl Signals {
    pub fn from_prices(prices: &[f64]) -> Self {
        Self {
            rsi: MarketAnalyzer::compute_rsi(prices),
            macd_histogram: MarketAnalyzer::macd(prices).histogram,
            trend: MarketAnalyzer::analyze_trend(prices),
            trend_strength: MarketAnalyzer::trend_strength(prices),
            volatility: MarketAnalyzer::volatility(prices),
        }
    }

    /// Signals as recorded on an existing prediction.
    pub fn from_prediction(prediction: &PricePrediction) -> Self {
        let technical = &prediction.metrics.technical;
        Self {
            rsi: technical.rsi,
            macd_histogram: technical.macd.histogram,
            trend: prediction.trend,
            trend_strength: prediction.trend_strength,
            volatility: technical.volatility,
        }
    }

    fn rsi_extreme(&self) -> bool {
        self.rsi < 30.0 || self.rsi > 70.0
    }

    fn volatility_impact(&self) -> f64 {
        (self.volatility * 0.01).min(0.2)
    }
}

/// Heuristic price predictor over a most-recent-first price series.
pub struct PricePredictor;

impl PricePredictor {
    /// Runs the whole pipeline. Never fails: any breakdown yields the neutral default.
    pub fn predict_price(history: &[PricePoint], now: DateTime<Utc>) -> PricePrediction {
        match Self::try_predict(history, now) {
            Ok(prediction) => prediction,
            Err(e) => {
                let current = history.first().map(|p| p.price).unwrap_or(0.0);
                warn!("Prediction failed ({}), falling back to neutral at {:.2}", e, current);
                Self::default_prediction(current)
            }
        }
    }

    fn try_predict(history: &[PricePoint], now: DateTime<Utc>) -> Result<PricePrediction, PredictionError> {
        let prices: Vec<f64> = history.iter().map(|p| p.price).collect();
        let current_price = prices.first().copied().unwrap_or(0.0);

        let signals = Self::signals_checked(&prices)?;
        let macd = MarketAnalyzer::macd(&prices);
        let predicted_price = Self::predicted_price(current_price, &signals);
        if !predicted_price.is_finite() {
            return Err(PredictionError::NonFinite("predicted price"));
        }

        let confidence = Self::confidence(history.len(), &signals);
        let profit_analysis = Self::analyze_profit_potential(current_price, predicted_price, confidence, &signals)?;

        Ok(PricePrediction {
            predicted_price,
            confidence,
            trend: signals.trend,
            trend_strength: signals.trend_strength,
            volatility: signals.volatility,
            price_history: history.to_vec(),
            profit_analysis,
            metrics: PredictionMetrics {
                temporal: Self::temporal_metrics(history, now),
                technical: TechnicalMetrics {
                    rsi: signals.rsi,
                    momentum: signals.trend_strength,
                    volatility: signals.volatility,
                    macd,
                    bollinger_bands: MarketAnalyzer::bollinger_bands(&prices),
                },
                seasonality: Seasonality::default(),
            },
        })
    }

    fn signals_checked(prices: &[f64]) -> Result<Signals, PredictionError> {
        let signals = Signals::from_prices(prices);
        if !signals.volatility.is_finite() {
            return Err(PredictionError::NonFinite("volatility"));
        }
        if !signals.rsi.is_finite() {
            return Err(PredictionError::NonFinite("rsi"));
        }
        Ok(signals)
    }

    /// Fuses a primary prediction with the raw-grade average of an independent
    /// sales feed, half-weighting the predicted price toward it.
    pub fn predict_with_secondary(
        history: &[PricePoint],
        secondary_raw: &PriceAnalysis,
        now: DateTime<Utc>,
    ) -> PricePrediction {
        let primary = Self::predict_price(history, now);
        let current_price = history.first().map(|p| p.price).unwrap_or(0.0);
        Self::fuse(primary, current_price, secondary_raw)
    }

    pub fn fuse(primary: PricePrediction, current_price: f64, secondary_raw: &PriceAnalysis) -> PricePrediction {
        let secondary_price = secondary_raw.average_price;
        let ratio = secondary_price / primary.predicted_price;
        let predicted_price = primary.predicted_price * (1.0 + (ratio - 1.0) * 0.5);
        if !predicted_price.is_finite() {
            warn!(
                "Cannot fuse secondary price {:.2} into prediction {:.2}",
                secondary_price, primary.predicted_price
            );
            return primary;
        }

        let mut confidence = (primary.confidence * 1.2).min(1.0);
        let trends_agree = (secondary_raw.trend > 0.0 && primary.trend == Trend::Up)
            || (secondary_raw.trend < 0.0 && primary.trend == Trend::Down);
        if trends_agree {
            confidence = (confidence * 1.2).min(1.0);
        }

        let signals = Signals::from_prediction(&primary);
        let profit_analysis =
            match Self::analyze_profit_potential(current_price, predicted_price, confidence, &signals) {
                Ok(profit) => profit,
                Err(e) => {
                    warn!("Profit analysis after fusion failed: {}", e);
                    return primary;
                }
            };

        PricePrediction {
            predicted_price,
            confidence,
            profit_analysis,
            ..primary
        }
    }

    pub fn predicted_price(current_price: f64, signals: &Signals) -> f64 {
        let mut multiplier = 1.0;

        if signals.rsi < 30.0 {
            multiplier *= 1.15;
        } else if signals.rsi > 70.0 {
            multiplier *= 0.85;
        }

        if signals.macd_histogram > 0.0 {
            multiplier *= 1.1;
        } else if signals.macd_histogram < 0.0 {
            multiplier *= 0.9;
        }

        match signals.trend {
            Trend::Up => multiplier *= 1.0 + signals.trend_strength * 0.2,
            Trend::Down => multiplier *= 1.0 - signals.trend_strength * 0.2,
            Trend::Stable => {}
        }

        multiplier *= 1.0 + signals.volatility_impact();
        current_price * multiplier
    }

    pub fn confidence(history_len: usize, signals: &Signals) -> f64 {
        let mut confidence = 0.5;
        confidence += (history_len as f64 / 100.0).min(0.2);
        confidence += signals.trend_strength * 0.2;
        confidence -= signals.volatility_impact();
        if signals.rsi_extreme() {
            confidence -= 0.1;
        }
        confidence.clamp(0.0, 1.0)
    }

    pub fn analyze_profit_potential(
        current_price: f64,
        predicted_price: f64,
        confidence: f64,
        signals: &Signals,
    ) -> Result<ProfitAnalysis, PredictionError> {
        let expected_profit = predicted_price - current_price;
        let roi = expected_profit / current_price;
        if !roi.is_finite() {
            return Err(PredictionError::NonFinite("roi"));
        }

        let mut score = (roi * 100.0).min(40.0);
        score += if signals.rsi < 30.0 {
            20.0
        } else if signals.rsi < 40.0 {
            10.0
        } else if signals.rsi > 70.0 {
            -10.0
        } else {
            0.0
        };
        if signals.trend == Trend::Up {
            score += signals.trend_strength * 20.0;
        }
        score += confidence * 20.0;

        let risk_level = if signals.volatility < 10.0 && confidence > 0.7 {
            RiskLevel::Low
        } else if signals.volatility > 20.0 || confidence < 0.4 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        Ok(ProfitAnalysis {
            expected_profit,
            roi,
            investment_score: score.clamp(0.0, 100.0),
            risk_level,
            time_to_profit: (30.0 + signals.volatility * 2.0).ceil() as u32,
        })
    }

    /// Day/week/month/all-time metrics over the prediction series.
    pub fn temporal_metrics(history: &[PricePoint], now: DateTime<Utc>) -> TemporalMetrics {
        let window = |frame: TimeFrame| -> PeriodMetrics {
            let mut points: Vec<&PricePoint> = match frame.lookback() {
                Some(span) => history.iter().filter(|p| p.timestamp > now - span).collect(),
                None => history.iter().collect(),
            };
            points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Self::period_metrics(&points)
        };

        TemporalMetrics {
            current: history.first().map(|p| p.price).unwrap_or(0.0),
            day: window(TimeFrame::Day),
            week: window(TimeFrame::Week),
            month: window(TimeFrame::Month),
            all_time: window(TimeFrame::All),
        }
    }

    /// `points` must be newest first.
    fn period_metrics(points: &[&PricePoint]) -> PeriodMetrics {
        let (Some(newest), Some(oldest)) = (points.first(), points.last()) else {
            return PeriodMetrics::default();
        };

        let n = points.len() as f64;
        let change = if oldest.price != 0.0 {
            (newest.price - oldest.price) / oldest.price * 100.0
        } else {
            0.0
        };

        PeriodMetrics {
            avg: points.iter().map(|p| p.price).sum::<f64>() / n,
            min: points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min),
            max: points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max),
            change,
            volume: points.iter().map(|p| p.volume.unwrap_or(0)).sum(),
        }
    }

    /// Neutral prediction anchored on the latest known price.
    pub fn default_prediction(current_price: f64) -> PricePrediction {
        PricePrediction {
            predicted_price: current_price,
            confidence: 0.0,
            trend: Trend::Stable,
            trend_strength: 0.0,
            volatility: 0.0,
            price_history: Vec::new(),
            profit_analysis: ProfitAnalysis {
                expected_profit: 0.0,
                roi: 0.0,
                investment_score: 0.0,
                risk_level: RiskLevel::Medium,
                time_to_profit: 30,
            },
            metrics: PredictionMetrics {
                temporal: TemporalMetrics {
                    current: current_price,
                    ..Default::default()
                },
                technical: TechnicalMetrics {
                    rsi: 50.0,
                    momentum: 0.0,
                    volatility: 0.0,
                    macd: Macd::default(),
                    bollinger_bands: BollingerBands::default(),
                },
                seasonality: Seasonality::default(),
            },
        }
    }
}
