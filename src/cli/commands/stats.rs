use crate::config::Config;
use crate::domain::{MediaKind, Score};
use crate::services::RatingError;
use crate::state::SharedState;

pub async fn cmd_stats(config: Config, tmdb_id: i32, kind_str: &str) -> anyhow::Result<()> {
    let Ok(kind) = kind_str.parse::<MediaKind>() else {
        println!("Invalid media type: {kind_str}. Use 'movie' or 'tv'.");
        return Ok(());
    };

    let shared = SharedState::new(config).await?;

    let stats = match shared.rating_service.stats_for(tmdb_id, kind).await {
        Ok(stats) => stats,
        Err(RatingError::NotFound(_)) => {
            println!("No cached {kind} with TMDb ID {tmdb_id}. Nobody has rated it yet.");
            return Ok(());
        }
        Err(e) => return Err(anyhow::anyhow!(e)),
    };

    println!("{} ({}, TMDb {})", stats.media_title, stats.media_type, stats.tmdb_id);
    println!("{:-<60}", "");
    println!("Ratings:  {}", stats.total_ratings);
    println!("Average:  {:.1}", stats.average_rating);
    println!();

    let bands = [
        ("★★★★★", stats.five_star_ratings),
        ("★★★★☆", stats.four_star_ratings),
        ("★★★☆☆", stats.three_star_ratings),
        ("★★☆☆☆", stats.two_star_ratings),
        ("★☆☆☆☆", stats.one_star_ratings),
    ];
    for (label, count) in bands {
        println!("  {label}  {count:>5}");
    }

    if !stats.recent_ratings.is_empty() {
        println!();
        println!("Recent:");
        for rating in &stats.recent_ratings {
            let stars = Score::from_stored(rating.rating).stars();
            let spoiler = if rating.is_spoiler { " [spoiler]" } else { "" };
            println!(
                "  {stars} {:>4.1}  {}{spoiler}  {}",
                rating.rating,
                rating.username,
                rating.created_at.format("%Y-%m-%d")
            );
        }
    }

    println!();
    Ok(())
}
