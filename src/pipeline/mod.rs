//! Star-schema ETL over the song and event-log datasets.
//!
//! Two stages run one after the other against a single session:
//! 1. The song pipeline writes the `songs` and `artists` dimensions
//! 2. The log pipeline writes the `users` and `time` dimensions, then joins
//!    song plays to song records to produce the `songplays` fact table
//!
//! Every table is deduplicated on its full row and rewritten from scratch on
//! each run.

mod logs;
mod schema;
mod songs;
mod source;
mod writer;

pub use logs::{
    day_of, hour_of, load_log_data, month_of, process_log_data, song_plays_only,
    songplays_table, time_table, users_table, week_of, weekday_of, with_event_time, year_of,
    LogTables, NEXT_SONG_PAGE, SONGPLAYS_PARTITION_BY, TIME_PARTITION_BY,
};
pub use schema::{log_schema, song_schema};
pub use songs::{
    artists_table, load_song_data, process_song_data, songs_table, SongTables, ARTISTS_COLUMNS,
    SONGS_COLUMNS, SONGS_PARTITION_BY,
};
pub use source::load_json;
pub use writer::{clear_location, write_table};

use crate::config::StorageSettings;
use crate::error::Result;
use datafusion::prelude::SessionContext;
use tracing::info;

pub const SONG_DATA_PATTERN: &str = "song-data/*/*/*/*.json";
pub const LOG_DATA_PATTERN: &str = "log_data/*/*/*.json";

pub const SONGS_TABLE: &str = "songs";
pub const ARTISTS_TABLE: &str = "artists";
pub const USERS_TABLE: &str = "users";
pub const TIME_TABLE: &str = "time";
pub const SONGPLAYS_TABLE: &str = "songplays";

/// Rows written per table by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub songs: u64,
    pub artists: u64,
    pub users: u64,
    pub time: u64,
    pub songplays: u64,
}

impl RunSummary {
    fn new(song_tables: SongTables, log_tables: LogTables) -> Self {
        Self {
            songs: song_tables.songs,
            artists: song_tables.artists,
            users: log_tables.users,
            time: log_tables.time,
            songplays: log_tables.songplays,
        }
    }

    pub fn tables(&self) -> [(&'static str, u64); 5] {
        [
            (SONGS_TABLE, self.songs),
            (ARTISTS_TABLE, self.artists),
            (USERS_TABLE, self.users),
            (TIME_TABLE, self.time),
            (SONGPLAYS_TABLE, self.songplays),
        ]
    }
}

/// Run the song pipeline, then the log pipeline.
pub async fn run_pipeline(ctx: &SessionContext, storage: &StorageSettings) -> Result<RunSummary> {
    info!(
        "Running pipeline from {} into {}",
        storage.input_root, storage.output_root
    );

    let song_tables = process_song_data(ctx, &storage.input_root, &storage.output_root).await?;
    let log_tables = process_log_data(ctx, &storage.input_root, &storage.output_root).await?;

    Ok(RunSummary::new(song_tables, log_tables))
}
