//! Song pipeline: `songs` and `artists` dimension tables.

use super::schema::song_schema;
use super::source::load_json;
use super::writer::write_table;
use super::{ARTISTS_TABLE, SONGS_TABLE, SONG_DATA_PATTERN};
use crate::error::Result;
use crate::storage::StorageLocation;
use datafusion::prelude::{DataFrame, SessionContext};
use tracing::info;

pub const SONGS_COLUMNS: &[&str] = &["year", "artist_id", "song_id", "title", "duration"];
pub const SONGS_PARTITION_BY: &[&str] = &["year", "artist_id"];

pub const ARTISTS_COLUMNS: &[&str] = &[
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

/// Rows written by the song pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SongTables {
    pub songs: u64,
    pub artists: u64,
}

pub fn load_song_data(ctx: &SessionContext, input_root: &StorageLocation) -> Result<DataFrame> {
    info!("Loading songs data from {} ...", input_root);
    let df = load_json(ctx, input_root, SONG_DATA_PATTERN, song_schema())?;
    info!("Loading complete!");
    Ok(df)
}

pub fn songs_table(song_data: DataFrame) -> Result<DataFrame> {
    Ok(song_data.select_columns(SONGS_COLUMNS)?.distinct()?)
}

/// One row per distinct artist; the input repeats an artist for each of its songs.
pub fn artists_table(song_data: DataFrame) -> Result<DataFrame> {
    Ok(song_data.select_columns(ARTISTS_COLUMNS)?.distinct()?)
}

/// Load the raw song records and write the `songs` (partitioned by year and
/// artist) and `artists` tables under `output_root`.
pub async fn process_song_data(
    ctx: &SessionContext,
    input_root: &StorageLocation,
    output_root: &StorageLocation,
) -> Result<SongTables> {
    let song_data = load_song_data(ctx, input_root)?;

    let songs = write_table(
        ctx,
        songs_table(song_data.clone())?,
        output_root,
        SONGS_TABLE,
        SONGS_PARTITION_BY,
    )
    .await?;

    let artists = write_table(
        ctx,
        artists_table(song_data)?,
        output_root,
        ARTISTS_TABLE,
        &[],
    )
    .await?;

    Ok(SongTables { songs, artists })
}
