//! `buylist optimize`: run the optimizer on a request file.

use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::command::OptimizeArgs;
use super::{load_config, output};
use crate::adapter::inbound::http::dto::OptimizeRequest;
use crate::application::optimize::OptimizationResult;
use crate::application::ListingAggregator;
use crate::domain::card::validate_buylist;
use crate::domain::Solution;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_optimizer;

/// One Pareto-front plan.
#[derive(Debug, Tabled)]
pub struct FrontRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Total")]
    pub total_cost: Decimal,
    #[tabled(rename = "Quality")]
    pub quality: String,
    #[tabled(rename = "Availability")]
    pub availability: String,
    #[tabled(rename = "Stores")]
    pub stores: usize,
}

/// One purchase in a plan.
#[derive(Debug, Tabled)]
pub struct PickRow {
    #[tabled(rename = "Card")]
    pub card: String,
    #[tabled(rename = "Site")]
    pub site: String,
    #[tabled(rename = "Cond")]
    pub quality: String,
    #[tabled(rename = "Qty")]
    pub quantity: u32,
    #[tabled(rename = "Price")]
    pub price: Decimal,
}

#[must_use]
pub fn front_rows(result: &OptimizationResult) -> Vec<FrontRow> {
    result
        .pareto_front
        .solutions()
        .iter()
        .enumerate()
        .map(|(i, s)| FrontRow {
            rank: i + 1,
            total_cost: s.total_cost,
            quality: format!("{:.2}", s.quality_score),
            availability: format!("{:.0}%", s.availability_score * 100.0),
            stores: s.num_stores,
        })
        .collect()
}

#[must_use]
pub fn pick_rows(solution: &Solution) -> Vec<PickRow> {
    solution
        .assignments
        .iter()
        .flat_map(|a| {
            a.picks.iter().map(|p| PickRow {
                card: a.card.name.clone(),
                site: p.listing.site_id.to_string(),
                quality: p.listing.quality.to_string(),
                quantity: p.quantity,
                price: p.listing.price,
            })
        })
        .collect()
}

pub async fn execute(config_path: &Path, args: &OptimizeArgs) -> Result<()> {
    let config = load_config(config_path, false)?;
    let content = std::fs::read_to_string(&args.input)?;
    let mut request: OptimizeRequest = serde_json::from_str(&content)?;

    if request.scan_job_id.is_some() {
        output::warning("scan_job_id is ignored outside the HTTP API; using inline listings");
    }
    if let Some(algorithm) = args.algorithm {
        request.optimization_config.algorithm = Some(algorithm);
    }
    if let Some(secs) = args.time_limit {
        request.optimization_config.time_limit = Some(secs);
    }
    if args.seed.is_some() {
        request.seed = args.seed;
    }

    validate_buylist(&request.card_list)?;
    let run_config = request.resolve_config(&config.optimizer)?;
    let aggregator = ListingAggregator::new(config.optimizer.acceptance);
    let pool = Arc::new(request.inline_pool(&aggregator));
    let engine = Arc::new(build_optimizer(&config));

    let result = engine.optimize(pool, run_config).await?;

    if output::is_json() {
        output::document(&result)?;
        return Ok(());
    }
    render(&result);
    Ok(())
}

fn render(result: &OptimizationResult) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Optimization");
    output::field("Requested", result.requested_algorithm);
    output::field("Algorithm", output::highlight(result.algorithm_used));
    if result.fallback_used {
        output::warning("Primary algorithm failed; result comes from the fallback");
    }
    output::field("Elapsed", format!("{} ms", result.metrics.elapsed_ms));
    if result.metrics.generations > 0 {
        output::field("Generations", result.metrics.generations);
    }

    output::section("Pareto front");
    output::table(Table::new(front_rows(result)).with(Style::rounded()));

    if let Some(best) = result.best() {
        output::section("Cheapest plan");
        output::table(Table::new(pick_rows(best)).with(Style::rounded()));
        output::field("Total", best.total_cost);
    }

    for card in &result.unfulfillable_cards {
        output::warning(&format!(
            "No acceptable listing for {} x{}",
            card.name, card.quantity
        ));
    }
    output::success("Optimization complete");
}
