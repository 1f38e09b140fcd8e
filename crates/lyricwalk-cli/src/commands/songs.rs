use anyhow::Result;
use lyricwalk_core::model::Category;

use super::{print_json, print_songs, Context};

pub async fn list_songs(ctx: &Context, category: Category, collected: Option<bool>) -> Result<()> {
    let songs = ctx.store.list_collected_songs(category, collected).await?;

    if ctx.json {
        return print_json(&songs);
    }

    let heading = match collected {
        Some(true) => "collected",
        Some(false) => "uncollected",
        None => "all",
    };
    println!("\n🎵 {} songs ({}, {})\n", category, heading, songs.len());
    print_songs(&songs);
    println!("\n  C = collected, G = guessed, * = favourite");

    Ok(())
}

pub async fn list_favourites(ctx: &Context) -> Result<()> {
    let songs = ctx.store.list_favourite_songs().await?;

    if ctx.json {
        return print_json(&songs);
    }

    println!("\n⭐ Favourites ({})\n", songs.len());
    for category in Category::ALL {
        let in_category: Vec<_> = songs
            .iter()
            .filter(|s| s.category == category)
            .cloned()
            .collect();
        if !in_category.is_empty() {
            println!("  {category}");
            print_songs(&in_category);
        }
    }

    Ok(())
}

pub async fn set_favourite(
    ctx: &Context,
    category: Category,
    id: i64,
    favourite: bool,
) -> Result<()> {
    let updated = ctx.store.set_favourite(id, category, favourite).await?;

    if updated == 0 {
        println!("No {} song with id {}; nothing changed.", category, id);
    } else if favourite {
        println!("✓ Added {} song {} to favourites", category, id);
    } else {
        println!("✓ Removed {} song {} from favourites", category, id);
    }

    Ok(())
}

pub async fn show_song(ctx: &Context, category: Category, id: i64) -> Result<()> {
    let song = ctx.store.get_song(id, category).await?;

    if ctx.json {
        return print_json(&song);
    }

    println!("\n{} song #{}\n", song.category, song.id);
    if song.is_collected {
        println!("  Lyric:     {}", song.lyric);
    } else {
        println!("  Lyric:     (not collected yet)");
    }
    if song.is_guessed {
        println!("  Title:     {}", song.title);
        println!("  Artist:    {}", song.artist);
    } else {
        println!("  Title:     ???");
        println!("  Artist:    ???");
    }
    println!("  Collected: {}", if song.is_collected { "yes" } else { "no" });
    println!("  Guessed:   {}", if song.is_guessed { "yes" } else { "no" });
    println!("  Favourite: {}", if song.is_favourite { "yes" } else { "no" });

    Ok(())
}
