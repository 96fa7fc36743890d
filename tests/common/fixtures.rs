//! Test fixture creation for the raw input datasets
//!
//! Lays out song and event-log JSON the way the real dataset is stored:
//! `song-data/<A>/<B>/<C>/<track>.json` with one record per file and
//! `log_data/<year>/<month>/<date>-events.json` with one event per line.

use super::constants::*;
use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn song(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    location: &str,
    coordinates: Option<(f64, f64)>,
    year: i64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": coordinates.map(|c| c.0),
        "artist_longitude": coordinates.map(|c| c.1),
        "artist_location": location,
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 218.93179,
        "year": year,
    })
}

fn event(user_id: &str, page: &str, play: Option<(&str, &str)>, ts: i64) -> Value {
    let method = if play.is_some() { "PUT" } else { "GET" };
    json!({
        "artist": play.map(|p| p.0),
        "auth": "Logged In",
        "firstName": format!("First{}", user_id),
        "gender": "F",
        "itemInSession": 0,
        "lastName": format!("Last{}", user_id),
        "length": play.map(|_| 218.93179),
        "level": "free",
        "location": "Phoenix-Mesa-Scottsdale, AZ",
        "method": method,
        "page": page,
        "registration": 1540344794796.0,
        "sessionId": 139,
        "song": play.map(|p| p.1),
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Windows NT 6.1; WOW64)",
        "userId": user_id,
    })
}

fn write_song(root: &Path, dirs: &str, file: &str, record: &Value) -> Result<()> {
    let dir = root.join("song-data").join(dirs);
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(file), serde_json::to_string(record)?)?;
    Ok(())
}

fn write_events(root: &Path, dirs: &str, file: &str, events: &[Value]) -> Result<()> {
    let dir = root.join("log_data").join(dirs);
    fs::create_dir_all(&dir)?;
    let lines: Vec<String> = events
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<_, _>>()?;
    fs::write(dir.join(file), lines.join("\n"))?;
    Ok(())
}

/// Creates the song dataset: 3 songs by 2 artists, with one song file
/// duplicated under a second directory.
pub fn create_song_data(root: &Path) -> Result<()> {
    let song_1 = song(
        SONG_1_ID,
        SONG_1_TITLE,
        ARTIST_1_ID,
        ARTIST_1_NAME,
        ARTIST_1_LOCATION,
        Some((35.14968, -90.04892)),
        SONGS_YEAR,
    );
    let song_2 = song(
        SONG_2_ID,
        SONG_2_TITLE,
        ARTIST_1_ID,
        ARTIST_1_NAME,
        ARTIST_1_LOCATION,
        Some((35.14968, -90.04892)),
        SONGS_YEAR,
    );
    let song_3 = song(
        SONG_3_ID,
        SONG_3_TITLE,
        ARTIST_2_ID,
        ARTIST_2_NAME,
        "",
        None,
        0,
    );

    write_song(root, "A/A/A", "TRAAAAW128F429D538.json", &song_1)?;
    write_song(root, "A/A/B", "TRAABJL12903CDCF1A.json", &song_2)?;
    write_song(root, "A/B/C", "TRABCEI128F424C983.json", &song_3)?;
    write_song(root, "B/A/A", "TRBAAAW128F429D538.json", &song_1)?;
    Ok(())
}

/// Creates the event logs across three files and two months.
pub fn create_log_data(root: &Path) -> Result<()> {
    let first_play = event("9", "NextSong", Some((ARTIST_1_NAME, SONG_1_TITLE)), KNOWN_TS);
    write_events(
        root,
        "2018/11",
        "2018-11-01-events.json",
        &[
            first_play.clone(),
            first_play,
            event(
                "10",
                "NextSong",
                Some((ARTIST_2_NAME, SONG_3_TITLE)),
                KNOWN_TS + 3_600_000,
            ),
            event(
                "11",
                "NextSong",
                Some(("Nobody", "Unknown Song")),
                KNOWN_TS + 7_200_000,
            ),
            // Title exists, but under a different artist.
            event(
                "11",
                "NextSong",
                Some((ARTIST_2_NAME, SONG_1_TITLE)),
                KNOWN_TS + 7_300_000,
            ),
            event("50", "Home", None, KNOWN_TS + 10),
            event("51", "Login", None, KNOWN_TS + 20),
        ],
    )?;
    write_events(
        root,
        "2018/11",
        "2018-11-02-events.json",
        &[event(
            "9",
            "NextSong",
            Some((ARTIST_1_NAME, SONG_2_TITLE)),
            KNOWN_TS + 86_400_000,
        )],
    )?;
    write_events(
        root,
        "2018/12",
        "2018-12-01-events.json",
        &[event(
            "10",
            "NextSong",
            Some((ARTIST_1_NAME, SONG_1_TITLE)),
            DECEMBER_TS,
        )],
    )?;

    // Not JSON; must be skipped by the listing.
    fs::write(root.join("log_data/2018/11/README.txt"), "not an event log")?;
    Ok(())
}
