//! "Precise" re-ranking: nudges official studio recordings to the top.
//!
//! This is a linear score, not a filter. Every candidate comes back, only
//! the order changes, and ties keep the order the source returned them in.

use crate::models::Song;
use std::cmp::Reverse;

const TOPIC_SUFFIX: &str = " - topic";
const BRAND_MARKER: &str = "vevo";

const TOPIC_WEIGHT: i32 = 100;
const BRAND_WEIGHT: i32 = 100;
const ARTIST_WEIGHT: i32 = 50;
const OFFICIAL_WEIGHT: i32 = 20;
const NON_STUDIO_WEIGHT: i32 = -50;
const DERIVATIVE_WEIGHT: i32 = -20;

const OFFICIAL_KEYWORDS: &[&str] = &[
    "official video",
    "official audio",
    "video oficial",
    "audio oficial",
    "official lyric video",
];

const NON_STUDIO_KEYWORDS: &[&str] = &[
    "cover",
    "live",
    "directo",
    "en vivo",
    "unplugged",
    "acoustic",
    "acústico",
    "tutorial",
    "reacción",
    "reaction",
];

const DERIVATIVE_KEYWORDS: &[&str] = &["remix", "lyrics", "letra", "karaoke"];

pub fn score(song: &Song, query: &str) -> i32 {
    let title = song.title.to_lowercase();
    let channel = song.channel.to_lowercase();
    let mut score = 0;

    if channel.ends_with(TOPIC_SUFFIX) {
        score += TOPIC_WEIGHT;
    }
    if channel.contains(BRAND_MARKER) {
        score += BRAND_WEIGHT;
    }

    // First word of the query is taken as the artist name
    if let Some(artist_guess) = query.split_whitespace().next() {
        let compact: String = channel.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.contains(&artist_guess.to_lowercase()) {
            score += ARTIST_WEIGHT;
        }
    }

    if contains_any(&title, OFFICIAL_KEYWORDS) {
        score += OFFICIAL_WEIGHT;
    }
    if contains_any(&title, NON_STUDIO_KEYWORDS) {
        score += NON_STUDIO_WEIGHT;
    }
    if contains_any(&title, DERIVATIVE_KEYWORDS) {
        score += DERIVATIVE_WEIGHT;
    }

    score
}

pub fn apply_precise_filter(songs: Vec<Song>, query: &str) -> Vec<Song> {
    let mut scored: Vec<(i32, Song)> = songs
        .into_iter()
        .map(|song| (score(&song, query), song))
        .collect();

    // `sort_by_key` is stable
    scored.sort_by_key(|(score, _)| Reverse(*score));

    scored.into_iter().map(|(_, song)| song).collect()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, title: &str, channel: &str) -> Song {
        Song::new(id, title, "", channel)
    }

    fn ids(list: &[Song]) -> Vec<&str> {
        list.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_topic_channel_beats_live_cover() {
        let query = "Imagine Dragons Believer";
        let cover = song(
            "cover",
            "Believer (Live Acoustic Cover)",
            "Imagine Dragons Cover Band",
        );
        let topic = song("topic", "Believer", "Imagine Dragons - Topic");

        assert_eq!(score(&topic, query), TOPIC_WEIGHT + ARTIST_WEIGHT);
        assert_eq!(score(&cover, query), ARTIST_WEIGHT + NON_STUDIO_WEIGHT);

        let ranked = apply_precise_filter(vec![cover, topic], query);
        assert_eq!(ids(&ranked), vec!["topic", "cover"]);
    }

    #[test]
    fn test_individual_weights() {
        let q = "zzz";
        assert_eq!(score(&song("a", "Track", "SomeVEVO"), q), BRAND_WEIGHT);
        assert_eq!(
            score(&song("a", "Track (Official Audio)", "x"), q),
            OFFICIAL_WEIGHT
        );
        assert_eq!(
            score(&song("a", "Track (Remix)", "x"), q),
            DERIVATIVE_WEIGHT
        );
        assert_eq!(
            score(&song("a", "Track en vivo", "x"), q),
            NON_STUDIO_WEIGHT
        );
        assert_eq!(score(&song("a", "Track", "x"), q), 0);
    }

    #[test]
    fn test_artist_guess_ignores_channel_whitespace() {
        assert_eq!(
            score(&song("a", "Song", "Daft Punk"), "daftpunk around"),
            ARTIST_WEIGHT
        );
        assert_eq!(score(&song("a", "Song", "Someone"), "   "), 0);
    }

    #[test]
    fn test_equal_scores_keep_source_order() {
        let list = vec![
            song("1", "Plain", "a"),
            song("2", "Song (Live)", "b"),
            song("3", "Plain too", "c"),
            song("4", "Song (Official Video)", "d"),
            song("5", "Another plain", "e"),
        ];

        let ranked = apply_precise_filter(list, "nobody");
        assert_eq!(ids(&ranked), vec!["4", "1", "3", "5", "2"]);
    }

    #[test]
    fn test_filter_is_idempotent_and_keeps_everything() {
        let list = vec![
            song("1", "Karaoke version", "x"),
            song("2", "Song", "Artist - Topic"),
            song("3", "Song (Official Video)", "ArtistVEVO"),
            song("4", "Song reaction", "y"),
            song("5", "Song", "Artist"),
        ];

        let once = apply_precise_filter(list.clone(), "artist song");
        let twice = apply_precise_filter(once.clone(), "artist song");

        assert_eq!(once.len(), list.len());
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(ids(&once)[0], "3");
    }

    #[test]
    fn test_empty_input() {
        assert!(apply_precise_filter(Vec::new(), "anything").is_empty());
    }
}
