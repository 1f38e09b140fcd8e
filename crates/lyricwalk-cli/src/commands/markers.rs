use anyhow::Result;
use lyricwalk_core::model::LatLng;
use lyricwalk_game::collect::{nearest_marker, NearbyMarker};

use super::{print_json, Context};

pub async fn list_markers(ctx: &Context, user: Option<LatLng>) -> Result<()> {
    let markers = ctx.store.list_markers().await?;

    let Some(user) = user else {
        if ctx.json {
            return print_json(&markers);
        }
        println!("\n📍 {} markers on campus\n", markers.len());
        for marker in &markers {
            println!("  #{:<5} {:<8} {}", marker.id, marker.category, marker.position);
        }
        return Ok(());
    };

    let mut nearby: Vec<NearbyMarker> = markers
        .iter()
        .map(|marker| NearbyMarker {
            distance_m: marker.position.distance_to(user),
            marker: marker.clone(),
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));

    if ctx.json {
        return print_json(&nearby);
    }

    println!("\n📍 {} markers, nearest first (you are at {})\n", nearby.len(), user);
    for entry in &nearby {
        let reachable = if entry.distance_m < ctx.config.collect_radius_m {
            "  ← in range"
        } else {
            ""
        };
        println!(
            "  #{:<5} {:<8} {:>8.1} m{}",
            entry.marker.id, entry.marker.category, entry.distance_m, reachable
        );
    }

    if let Some(nearest) = nearest_marker(&markers, user) {
        println!(
            "\n  Nearest: #{} ({:.1} m away)",
            nearest.marker.id, nearest.distance_m
        );
    }

    Ok(())
}
