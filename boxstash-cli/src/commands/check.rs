//! Connectivity check with a short inventory summary

use anyhow::{Context, Result};
use clap::Parser;

use boxstash_server::db::{self, DashboardRepo, DashboardStats};

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Database URL (overrides DB_HOST/DB_PORT/... composition)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_check(args: CheckArgs) -> Result<()> {
    let config = super::load_config(args.database_url)?;
    let pool = super::connect(&config).await?;

    db::ping(&pool).await.context("Database did not answer")?;
    let stats = DashboardRepo::new(&pool)
        .stats()
        .await
        .context("Failed to read inventory (has `boxstash migrate` been run?)")?;
    pool.close().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", summary(&stats));
    }
    Ok(())
}

fn summary(stats: &DashboardStats) -> String {
    format!(
        "database: connected\n\
         boxes:    {} ({} with NFC tags, {} scanned)\n\
         items:    {} ({} low or empty)\n\
         growth:   {:+} boxes, {:+} items this week\n",
        stats.total_boxes,
        stats.nfc_boxes,
        stats.scanned_boxes,
        stats.total_items,
        stats.low_stock_items,
        stats.box_growth,
        stats.item_growth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_counts() {
        let stats = DashboardStats {
            total_boxes: 4,
            total_items: 31,
            nfc_boxes: 2,
            scanned_boxes: 1,
            low_stock_items: 3,
            box_growth: -1,
            item_growth: 5,
            recent_activity: Vec::new(),
        };
        let text = summary(&stats);
        assert!(text.contains("boxes:    4 (2 with NFC tags, 1 scanned)"));
        assert!(text.contains("items:    31 (3 low or empty)"));
        assert!(text.contains("-1 boxes, +5 items"));
    }
}
