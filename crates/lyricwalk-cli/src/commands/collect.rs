use anyhow::{Context as _, Result};
use lyricwalk_core::model::LatLng;
use lyricwalk_game::{CollectionEngine, CollectionOutcome};

use super::{print_json, Context};

pub async fn run_collect(ctx: &Context, user: LatLng, marker_id: Option<i64>) -> Result<()> {
    let engine =
        CollectionEngine::new(ctx.store.clone()).with_radius(ctx.config.collect_radius_m);

    let outcome = match marker_id {
        Some(id) => {
            let marker = ctx
                .store
                .get_marker(id)
                .await
                .with_context(|| format!("Marker #{id} is not on the map"))?;
            engine.attempt_collect(&marker, user).await?
        }
        None => match engine.collect_nearest(user).await? {
            Some((nearby, outcome)) => {
                log::debug!(
                    "Nearest marker #{} is {:.1} m away",
                    nearby.marker.id,
                    nearby.distance_m
                );
                outcome
            }
            None => {
                println!("There are no markers on campus. Try `lyricwalk refresh`.");
                return Ok(());
            }
        },
    };

    if ctx.json {
        return print_json(&outcome);
    }

    match outcome {
        CollectionOutcome::TooFar { distance_m } => {
            println!(
                "Too far away: {:.1} m (you need to be within {:.0} m)",
                distance_m,
                engine.radius_m()
            );
        }
        CollectionOutcome::NoSongsAvailable => {
            println!("Every song in this category has already been collected.");
        }
        CollectionOutcome::Collected(song) => {
            println!("✓ Collected a {} lyric!\n", song.category);
            println!("  \"{}\"\n", song.lyric);
            println!(
                "  Guess it with: lyricwalk guess {} {}",
                song.category.as_str().to_lowercase(),
                song.id
            );
        }
    }

    Ok(())
}
