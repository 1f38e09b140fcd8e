use anyhow::Result;
use lyricwalk_core::model::Category;
use lyricwalk_core::schema::CatalogStats;
use lyricwalk_game::StoreStatus;
use serde::Serialize;
use std::path::Path;

use super::{print_json, Context};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    database: &'a Path,
    schema_version: u32,
    store: StoreStatus,
    stats: CatalogStats,
}

pub async fn show_status(ctx: &Context) -> Result<()> {
    let stats = ctx.store.stats().await?;
    let report = StatusReport {
        database: &ctx.config.database_path,
        schema_version: ctx.store.schema_version().await?,
        store: ctx.store.status().await,
        stats,
    };

    if ctx.json {
        return print_json(&report);
    }

    println!("\n📊 LyricWalk Status\n");
    println!("  Catalog: {}", report.database.display());
    println!("  Schema:  v{} ({})\n", report.schema_version, report.store);

    println!(
        "  {:<8} {:>6} {:>10} {:>8} {:>11} {:>8}",
        "", "songs", "collected", "guessed", "favourites", "markers"
    );
    for category in Category::ALL {
        let s = stats.for_category(category);
        println!(
            "  {:<8} {:>6} {:>10} {:>8} {:>11} {:>8}",
            category, s.total, s.collected, s.guessed, s.favourites, s.markers
        );
    }

    let uncollected: usize = Category::ALL
        .iter()
        .map(|c| {
            let s = stats.for_category(*c);
            s.total - s.collected
        })
        .sum();
    if uncollected == 0 {
        println!("\n  Every lyric has been collected!");
    } else {
        println!("\n  Run `lyricwalk markers` to find the {} lyrics still out there", uncollected);
    }

    Ok(())
}
