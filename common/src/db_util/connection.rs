//! Connection pools for the primary and target databases.

use anyhow::{Context, Result};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Open a pool and check out one connection so an unreachable database fails right away.
///
/// # Errors
/// Returns an error if the pool cannot be built or no connection can be established.
pub fn connect_pool(connection_string: &str, pool_size: u32) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(connection_string);
    let pool = Pool::builder()
        .max_size(pool_size)
        .test_on_check_out(true)
        .build(manager)
        .context("failed to build connection pool")?;
    pool.get().context("failed to ping database")?;
    Ok(pool)
}
