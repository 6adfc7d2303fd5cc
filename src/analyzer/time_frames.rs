use crate::model::{HistoryPoint, Sale, TimeFrame, TimeFrameAnalysis};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Look-back per window; `None` means unbounded.
const WINDOWS: [(TimeFrame, Option<i64>); 6] = [
    (TimeFrame::Day, Some(1)),
    (TimeFrame::Week, Some(7)),
    (TimeFrame::Month, Some(30)),
    (TimeFrame::Quarter, Some(90)),
    (TimeFrame::Year, Some(365)),
    (TimeFrame::All, None),
];

impl TimeFrame {
    pub const ALL: [TimeFrame; 6] = [
        TimeFrame::Day,
        TimeFrame::Week,
        TimeFrame::Month,
        TimeFrame::Quarter,
        TimeFrame::Year,
        TimeFrame::All,
    ];

    pub fn lookback(self) -> Option<Duration> {
        WINDOWS
            .iter()
            .find(|(frame, _)| *frame == self)
            .and_then(|(_, days)| days.map(Duration::days))
    }

    /// Earliest instant still inside the window. `All` starts at the epoch.
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.lookback() {
            Some(span) => now - span,
            None => DateTime::UNIX_EPOCH,
        }
    }
}

/// Summary of one window. Empty input yields the all-zero analysis.
pub fn summarize_window(sales: &[&Sale]) -> TimeFrameAnalysis {
    if sales.is_empty() {
        return TimeFrameAnalysis::default();
    }

    let count = sales.len();
    let prices = sales.iter().map(|s| s.price);
    let average_price = prices.clone().sum::<f64>() / count as f64;
    let min_price = prices.clone().fold(f64::INFINITY, f64::min);
    let max_price = prices.fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = sales.to_vec();
    sorted.sort_by(|a, b| {
        a.date_sold
            .cmp(&b.date_sold)
            .then_with(|| a.listing_id.cmp(&b.listing_id))
    });

    let oldest = sorted[0].price;
    let newest = sorted[count - 1].price;
    let trend = if oldest == 0.0 {
        0.0
    } else {
        (newest - oldest) / oldest * 100.0
    };

    TimeFrameAnalysis {
        average_price,
        min_price,
        max_price,
        sales_count: count,
        trend,
        price_history: sorted
            .iter()
            .map(|s| HistoryPoint { date: s.date_sold, price: s.price })
            .collect(),
    }
}

/// Buckets `sales` into every fixed window relative to `now`.
pub fn analyze_time_frames(sales: &[Sale], now: DateTime<Utc>) -> BTreeMap<TimeFrame, TimeFrameAnalysis> {
    TimeFrame::ALL
        .iter()
        .map(|&frame| {
            let cutoff = frame.cutoff(now);
            let in_window: Vec<&Sale> = sales.iter().filter(|s| s.date_sold >= cutoff).collect();
            (frame, summarize_window(&in_window))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grade;
    use chrono::TimeZone;

    fn sale(id: &str, price: f64, date_sold: DateTime<Utc>) -> Sale {
        Sale {
            listing_id: id.to_string(),
            title: String::new(),
            price,
            date_sold,
            is_auction: false,
            bids: None,
            condition: "raw".into(),
            grade: Grade::Raw,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn week_trend_runs_oldest_to_newest() {
        let t = now();
        let sales = vec![sale("a", 100.0, t), sale("b", 80.0, t - Duration::days(7))];
        let frames = analyze_time_frames(&sales, t);

        let week = &frames[&TimeFrame::Week];
        assert_eq!(week.sales_count, 2);
        assert!((week.trend - 25.0).abs() < 1e-9);
        assert_eq!(week.price_history[0].price, 80.0);
        assert_eq!(week.price_history[1].price, 100.0);

        let day = &frames[&TimeFrame::Day];
        assert_eq!(day.sales_count, 1);
        assert_eq!(day.trend, 0.0);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let t = now();
        let sales = vec![sale("a", 50.0, t - Duration::days(200))];
        let frames = analyze_time_frames(&sales, t);

        assert_eq!(frames[&TimeFrame::Quarter], TimeFrameAnalysis::default());
        assert_eq!(frames[&TimeFrame::Year].sales_count, 1);
        assert_eq!(frames[&TimeFrame::All].sales_count, 1);
        assert_eq!(frames.len(), 6);
    }

    #[test]
    fn zero_oldest_price_gives_flat_trend() {
        let t = now();
        let a = sale("a", 0.0, t - Duration::hours(2));
        let b = sale("b", 10.0, t - Duration::hours(1));
        let summary = summarize_window(&[&a, &b]);
        assert_eq!(summary.trend, 0.0);
        assert_eq!(summary.min_price, 0.0);
        assert_eq!(summary.max_price, 10.0);
    }

    #[test]
    fn ties_on_date_are_ordered_by_listing_id() {
        let t = now();
        let b = sale("b", 20.0, t);
        let a = sale("a", 10.0, t);
        let summary = summarize_window(&[&b, &a]);
        assert_eq!(summary.price_history[0].price, 10.0);
        assert!((summary.trend - 100.0).abs() < 1e-9);
    }

    #[test]
    fn average_is_bounded_by_extrema() {
        let t = now();
        let sales: Vec<Sale> = [12.5, 3.0, 99.0, 42.0, 42.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| sale(&i.to_string(), p, t - Duration::hours(i as i64 * 30)))
            .collect();
        for analysis in analyze_time_frames(&sales, t).values() {
            if analysis.sales_count > 0 {
                assert!(analysis.min_price <= analysis.average_price);
                assert!(analysis.average_price <= analysis.max_price);
            }
        }
    }

    #[test]
    fn window_cutoffs_come_from_the_lookup_table() {
        let t = now();
        assert_eq!(TimeFrame::Day.cutoff(t), t - Duration::hours(24));
        assert_eq!(TimeFrame::Year.cutoff(t), t - Duration::days(365));
        assert_eq!(TimeFrame::All.cutoff(t), DateTime::UNIX_EPOCH);
        assert_eq!(TimeFrame::Quarter.lookback(), Some(Duration::days(90)));
    }
}
