//! Per-hostname volume store (read side)
//!
//! One integer percent (0-500) per hostname; default 100 when absent.
//! Store failures are absorbed: a page without a readable store still
//! amplifies, it just starts at 100%.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tabgain_common::params;
use tracing::warn;

/// Get the saved volume percent for a hostname
pub async fn get_site_volume(db: &Pool<Sqlite>, hostname: &str) -> Result<Option<u16>> {
    let key = params::normalize_hostname(hostname);
    let row: Option<i64> =
        sqlx::query_scalar("SELECT volume_percent FROM site_volumes WHERE hostname = ?")
            .bind(&key)
            .fetch_optional(db)
            .await?;

    Ok(row.map(|percent| percent.clamp(0, params::MAX_VOLUME_PERCENT as i64) as u16))
}

/// Read the seed gain factor for a hostname
///
/// Absent rows and store errors both yield the default 100%.
pub async fn seed_volume(db: &Pool<Sqlite>, hostname: &str) -> f32 {
    match get_site_volume(db, hostname).await {
        Ok(Some(percent)) => params::percent_to_volume(percent),
        Ok(None) => params::DEFAULT_VOLUME,
        Err(e) => {
            warn!(hostname, "Failed to read saved volume, using default: {}", e);
            params::DEFAULT_VOLUME
        }
    }
}
