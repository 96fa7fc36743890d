//! Log pipeline: `users` and `time` dimensions and the `songplays` fact table.

use super::schema::log_schema;
use super::songs::load_song_data;
use super::source::load_json;
use super::writer::write_table;
use super::{LOG_DATA_PATTERN, SONGPLAYS_TABLE, TIME_TABLE, USERS_TABLE};
use crate::error::Result;
use crate::storage::StorageLocation;
use datafusion::arrow::datatypes::DataType;
use datafusion::common::Column;
use datafusion::prelude::*;
use tracing::info;

/// The only page value that represents a song being played.
pub const NEXT_SONG_PAGE: &str = "NextSong";

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const DATETIME_COLUMN: &str = "datetime";

pub const TIME_PARTITION_BY: &[&str] = &["year", "month"];
pub const SONGPLAYS_PARTITION_BY: &[&str] = &["year", "month"];

const LOG_ALIAS: &str = "log";
const SONG_ALIAS: &str = "songs";

/// Rows written by the log pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogTables {
    pub users: u64,
    pub time: u64,
    pub songplays: u64,
}

/// Load the raw events, keeping song plays only.
pub fn load_log_data(ctx: &SessionContext, input_root: &StorageLocation) -> Result<DataFrame> {
    info!("Loading log data from {} ...", input_root);
    let df = load_json(ctx, input_root, LOG_DATA_PATTERN, log_schema())?;
    info!("Loading complete!");
    song_plays_only(df)
}

pub fn song_plays_only(log_data: DataFrame) -> Result<DataFrame> {
    Ok(log_data.filter(ident("page").eq(lit(NEXT_SONG_PAGE)))?)
}

pub fn users_table(log_data: DataFrame) -> Result<DataFrame> {
    Ok(log_data
        .select(vec![
            ident("userId").alias("user_id"),
            ident("firstName").alias("first_name"),
            ident("lastName").alias("last_name"),
            ident("gender"),
            ident("level"),
        ])?
        .distinct()?)
}

/// Adds `timestamp` (the `ts` epoch milliseconds as a UTC timestamp) and
/// `datetime` (its calendar date).
pub fn with_event_time(log_data: DataFrame) -> Result<DataFrame> {
    Ok(log_data
        .with_column(TIMESTAMP_COLUMN, to_timestamp_millis(vec![ident("ts")]))?
        .with_column(
            DATETIME_COLUMN,
            cast(ident(TIMESTAMP_COLUMN), DataType::Date32),
        )?)
}

fn calendar_part(part: &str, timestamp: Expr) -> Expr {
    cast(date_part(lit(part), timestamp), DataType::Int32)
}

pub fn year_of(timestamp: Expr) -> Expr {
    calendar_part("year", timestamp)
}

pub fn month_of(timestamp: Expr) -> Expr {
    calendar_part("month", timestamp)
}

/// ISO-8601 week of the year.
pub fn week_of(timestamp: Expr) -> Expr {
    calendar_part("week", timestamp)
}

/// Day of the week counted from 1 = Sunday to 7 = Saturday.
pub fn weekday_of(timestamp: Expr) -> Expr {
    calendar_part("dow", timestamp) + lit(1_i32)
}

pub fn day_of(timestamp: Expr) -> Expr {
    calendar_part("day", timestamp)
}

pub fn hour_of(timestamp: Expr) -> Expr {
    calendar_part("hour", timestamp)
}

/// Expects the columns added by [`with_event_time`].
pub fn time_table(log_data: DataFrame) -> Result<DataFrame> {
    let timestamp = || ident(TIMESTAMP_COLUMN);
    Ok(log_data
        .select(vec![
            ident("ts"),
            timestamp().alias("start_timestamp"),
            year_of(timestamp()).alias("year"),
            month_of(timestamp()).alias("month"),
            week_of(timestamp()).alias("week"),
            weekday_of(timestamp()).alias("weekday"),
            day_of(timestamp()).alias("day"),
            hour_of(timestamp()).alias("hour"),
        ])?
        .distinct()?)
}

fn log_col(name: &str) -> Expr {
    Expr::Column(Column::new(Some(LOG_ALIAS), name))
}

fn song_col(name: &str) -> Expr {
    Expr::Column(Column::new(Some(SONG_ALIAS), name))
}

/// Song plays matched to song records on title and artist name. Events with
/// no matching song are dropped.
pub fn songplays_table(log_data: DataFrame, song_data: DataFrame) -> Result<DataFrame> {
    let joined = log_data.alias(LOG_ALIAS)?.join_on(
        song_data.alias(SONG_ALIAS)?,
        JoinType::Inner,
        [
            log_col("song").eq(song_col("title")),
            log_col("artist").eq(song_col("artist_name")),
        ],
    )?;

    Ok(joined
        .select(vec![
            log_col(TIMESTAMP_COLUMN).alias("start_time"),
            year_of(log_col(TIMESTAMP_COLUMN)).alias("year"),
            month_of(log_col(TIMESTAMP_COLUMN)).alias("month"),
            log_col("userId").alias("user_id"),
            log_col("level").alias("level"),
            song_col("song_id").alias("song_id"),
            song_col("artist_id").alias("artist_id"),
            log_col("sessionId").alias("session_id"),
            song_col("artist_location").alias("location"),
            log_col("userAgent").alias("user_agent"),
        ])?
        .distinct()?)
}

/// Load the event logs and write the `users`, `time` (partitioned by year
/// and month) and `songplays` (partitioned by year and month) tables.
///
/// Song records are read again from `input_root` for the join.
pub async fn process_log_data(
    ctx: &SessionContext,
    input_root: &StorageLocation,
    output_root: &StorageLocation,
) -> Result<LogTables> {
    let log_data = load_log_data(ctx, input_root)?;

    let users = write_table(
        ctx,
        users_table(log_data.clone())?,
        output_root,
        USERS_TABLE,
        &[],
    )
    .await?;

    let log_data = with_event_time(log_data)?;

    let time = write_table(
        ctx,
        time_table(log_data.clone())?,
        output_root,
        TIME_TABLE,
        TIME_PARTITION_BY,
    )
    .await?;

    let song_data = load_song_data(ctx, input_root)?;

    let songplays = write_table(
        ctx,
        songplays_table(log_data, song_data)?,
        output_root,
        SONGPLAYS_TABLE,
        SONGPLAYS_PARTITION_BY,
    )
    .await?;

    Ok(LogTables {
        users,
        time,
        songplays,
    })
}
