use crate::config::Config;
use crate::domain::MediaKind;
use crate::state::SharedState;

pub async fn cmd_refresh(config: Config, tmdb_id: i32, kind_str: &str) -> anyhow::Result<()> {
    let Ok(kind) = kind_str.parse::<MediaKind>() else {
        println!("Invalid media type: {kind_str}. Use 'movie' or 'tv'.");
        return Ok(());
    };

    let shared = SharedState::new(config).await?;

    println!("Refreshing {kind} {tmdb_id} from TMDb...");
    match shared.media_resolver.refresh(tmdb_id, kind).await {
        Ok(media) => {
            println!("✓ {} (updated {})", media.title, media.updated_at.to_rfc3339());
            Ok(())
        }
        Err(e) => {
            println!("⚠ Failed to refresh: {e}");
            Err(anyhow::anyhow!(e))
        }
    }
}
