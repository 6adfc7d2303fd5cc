use crate::analyzer::distribution::{auction_analysis, price_distribution};
use crate::analyzer::time_frames::analyze_time_frames;
use crate::model::{Grade, GradeAnalysis, PriceAnalysis, Sale, TimeFrame};
use chrono::{DateTime, Utc};

/// Newest sales kept on each grade's analysis.
pub const RECENT_SALES_LIMIT: usize = 30;

/// Trait defining the interface for a sales analyzer.
pub trait Analyzer {
    /// Splits `sales` by grade and analyzes each grade independently.
    fn analyze_sales(&self, sales: &[Sale], now: DateTime<Utc>) -> GradeAnalysis;
    /// Analyzes a set of sales that all belong to one grade.
    fn analyze_grade(&self, sales: &[Sale], now: DateTime<Utc>) -> PriceAnalysis;
}

/// Implementation of the sales analyzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    fn analyze_sales(&self, sales: &[Sale], now: DateTime<Utc>) -> GradeAnalysis {
        let [raw, psa8, psa9, psa10] = Grade::ALL.map(|grade| {
            let graded: Vec<Sale> = sales.iter().filter(|s| s.grade == grade).cloned().collect();
            self.analyze_grade(&graded, now)
        });
        GradeAnalysis { raw, psa8, psa9, psa10 }
    }

    fn analyze_grade(&self, sales: &[Sale], now: DateTime<Utc>) -> PriceAnalysis {
        let time_frames = analyze_time_frames(sales, now);

        if sales.is_empty() {
            return PriceAnalysis {
                average_price: 0.0,
                min_price: 0.0,
                max_price: 0.0,
                trend: 0.0,
                recent_sales: Vec::new(),
                time_frames,
                price_distribution: Default::default(),
                auction_analysis: Default::default(),
            };
        }

        let count = sales.len() as f64;
        let average_price = sales.iter().map(|s| s.price).sum::<f64>() / count;
        let min_price = sales.iter().map(|s| s.price).fold(f64::INFINITY, f64::min);
        let max_price = sales.iter().map(|s| s.price).fold(f64::NEG_INFINITY, f64::max);
        let trend = time_frames
            .get(&TimeFrame::Month)
            .map(|frame| frame.trend)
            .unwrap_or(0.0);

        let mut recent_sales = sales.to_vec();
        recent_sales.sort_by(|a, b| {
            b.date_sold
                .cmp(&a.date_sold)
                .then_with(|| a.listing_id.cmp(&b.listing_id))
        });
        recent_sales.truncate(RECENT_SALES_LIMIT);

        PriceAnalysis {
            average_price,
            min_price,
            max_price,
            trend,
            recent_sales,
            time_frames,
            price_distribution: price_distribution(sales),
            auction_analysis: auction_analysis(sales),
        }
    }
}
