use crate::model::{AuctionAnalysis, BidDistribution, PriceDistribution, Quartiles, Sale};

/// Dispersion statistics over the sale prices. Empty input yields zeros.
pub fn price_distribution(sales: &[Sale]) -> PriceDistribution {
    if sales.is_empty() {
        return PriceDistribution::default();
    }

    let mut sorted: Vec<f64> = sales.iter().map(|s| s.price).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    let mean = sorted.iter().sum::<f64>() / n as f64;
    // Population variance.
    let variance = sorted.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n as f64;

    let median = sorted[n / 2];
    let q1 = sorted[(n as f64 * 0.25).floor() as usize];
    let q3 = sorted[(n as f64 * 0.75).floor() as usize];

    PriceDistribution {
        standard_deviation: variance.sqrt(),
        median,
        mode: mode(&sorted),
        quartiles: Quartiles { q1, q2: median, q3 },
    }
}

/// Most frequent value of an ascending slice; ties go to the smallest value.
fn mode(sorted: &[f64]) -> f64 {
    let mut best = (0.0, 0);
    for run in sorted.chunk_by(|a, b| a == b) {
        if run.len() > best.1 {
            best = (run[0], run.len());
        }
    }
    best.0
}

/// Auction vs. fixed-price split. Empty input yields zeros.
pub fn auction_analysis(sales: &[Sale]) -> AuctionAnalysis {
    if sales.is_empty() {
        return AuctionAnalysis::default();
    }

    let (auctions, buy_it_now): (Vec<&Sale>, Vec<&Sale>) = sales.iter().partition(|s| s.is_auction);
    let bids: Vec<f64> = auctions.iter().map(|s| s.bids.unwrap_or(0) as f64).collect();

    let auction_percentage = auctions.len() as f64 / sales.len() as f64 * 100.0;
    let average_bids = mean(&bids);

    let avg_auction_price = mean_price(&auctions);
    let avg_buy_it_now_price = mean_price(&buy_it_now);
    let auction_price_difference = if avg_buy_it_now_price > 0.0 {
        (avg_auction_price - avg_buy_it_now_price) / avg_buy_it_now_price * 100.0
    } else {
        0.0
    };

    let bid_distribution = if bids.is_empty() {
        BidDistribution::default()
    } else {
        BidDistribution {
            min: bids.iter().copied().fold(f64::INFINITY, f64::min),
            max: bids.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            average: average_bids,
        }
    };

    AuctionAnalysis {
        auction_percentage,
        average_bids,
        auction_price_difference,
        bid_distribution,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn mean_price(sales: &[&Sale]) -> f64 {
    if sales.is_empty() {
        0.0
    } else {
        sales.iter().map(|s| s.price).sum::<f64>() / sales.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grade;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sale(price: f64, is_auction: bool, bids: Option<u32>) -> Sale {
        Sale {
            listing_id: format!("{}", price),
            title: String::new(),
            price,
            date_sold: Utc::now(),
            is_auction,
            bids,
            condition: "raw".into(),
            grade: Grade::Raw,
        }
    }

    fn fixed(prices: &[f64]) -> Vec<Sale> {
        prices.iter().map(|&p| sale(p, false, None)).collect()
    }

    #[test]
    fn median_takes_upper_middle_without_interpolation() {
        let dist = price_distribution(&fixed(&[4.0, 1.0, 3.0, 2.0]));
        assert_eq!(dist.median, 3.0);
        assert_eq!(dist.quartiles.q1, 2.0);
        assert_eq!(dist.quartiles.q2, 3.0);
        assert_eq!(dist.quartiles.q3, 4.0);
    }

    #[test]
    fn standard_deviation_is_population() {
        let dist = price_distribution(&fixed(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert!((dist.standard_deviation - 2.0).abs() < 1e-12);
        assert_eq!(dist.mode, 4.0);
    }

    #[test]
    fn mode_ties_go_to_lowest_price() {
        let dist = price_distribution(&fixed(&[9.0, 5.0, 9.0, 5.0, 7.0]));
        assert_eq!(dist.mode, 5.0);
        let single = price_distribution(&fixed(&[3.0, 1.0, 2.0]));
        assert_eq!(single.mode, 1.0);
    }

    #[test]
    fn quartiles_are_monotone_on_random_sets() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.random_range(1..40);
            let prices: Vec<f64> = (0..len).map(|_| rng.random_range(0.0..500.0)).collect();
            let dist = price_distribution(&fixed(&prices));
            assert!(dist.quartiles.q1 <= dist.median);
            assert!(dist.median <= dist.quartiles.q3);
        }
    }

    #[test]
    fn auction_split_statistics() {
        let sales = vec![
            sale(120.0, true, Some(10)),
            sale(80.0, true, Some(2)),
            sale(80.0, false, None),
            sale(120.0, false, None),
        ];
        let auction = auction_analysis(&sales);
        assert_eq!(auction.auction_percentage, 50.0);
        assert_eq!(auction.average_bids, 6.0);
        assert_eq!(auction.auction_price_difference, 0.0);
        assert_eq!(auction.bid_distribution.min, 2.0);
        assert_eq!(auction.bid_distribution.max, 10.0);
        assert_eq!(auction.bid_distribution.average, 6.0);
    }

    #[test]
    fn auctions_only_have_no_price_difference() {
        let auction = auction_analysis(&[sale(50.0, true, None), sale(70.0, true, Some(4))]);
        assert_eq!(auction.auction_percentage, 100.0);
        assert_eq!(auction.auction_price_difference, 0.0);
        assert_eq!(auction.average_bids, 2.0);
        assert_eq!(auction.bid_distribution.min, 0.0);
    }

    #[test]
    fn fixed_price_only_has_zero_bid_stats() {
        let auction = auction_analysis(&fixed(&[10.0, 20.0]));
        assert_eq!(auction.auction_percentage, 0.0);
        assert_eq!(auction.bid_distribution, BidDistribution::default());
        assert_eq!(auction.auction_price_difference, -100.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(price_distribution(&[]), PriceDistribution::default());
        assert_eq!(auction_analysis(&[]), AuctionAnalysis::default());
    }
}
