pub mod config;
pub mod download;
pub mod errors;
pub mod history;
pub mod models;
pub mod native;
pub mod providers;
pub mod proxy;
pub mod queue;
pub mod search;
pub mod state;
pub mod youtube;

use anyhow::Context;

use config::Settings;
use state::AppState;

/// Headless entry point: search once, load the results into the queue and
/// report what would play.
pub async fn run(query: &str) -> anyhow::Result<()> {
    let settings = Settings::load();
    let state = AppState::new(settings).context("failed to initialize application state")?;
    log::info!("Search tiers: {:?}", state.pipeline.tiers());

    if query.trim().is_empty() {
        let recs = state.local_recommendations();
        log::info!("No query given, {} local recommendations", recs.len());
        for song in recs {
            println!("{}\t{}\t{}", song.id, song.title, song.channel);
        }
        return Ok(());
    }

    let songs = state.search(query).await.unwrap_or_default();
    if songs.is_empty() {
        println!("No results for \"{}\"", query.trim());
        return Ok(());
    }

    for (i, song) in songs.iter().enumerate() {
        println!(
            "{:>2}. {} - {} [{}]",
            i + 1,
            song.title,
            song.channel,
            song.duration.as_deref().unwrap_or("?")
        );
    }

    if let Some(current) = state.play(songs, 0) {
        let queue = state.queue.read();
        println!(
            "Now playing: {} ({} in queue, loop {})",
            current.title,
            queue.len(),
            queue.loop_mode()
        );
    }

    Ok(())
}
