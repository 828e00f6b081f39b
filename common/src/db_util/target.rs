use super::conversions::i64_to_u64;
use super::{PgPool, TargetDatabase, TargetPool, connect_pool, difference_count_query};
use crate::config::SelectionJudgeConfig;
use anyhow::{Context, Result, anyhow};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use log::info;
use std::sync::Arc;

#[derive(QueryableByName)]
struct DifferencePrivate {
    #[diesel(sql_type = BigInt)]
    difference_rows: i64,
}

/// One target schema, reached through its own connection pool.
pub struct PgTargetDatabase {
    name: String,
    pool: PgPool,
    content_query: String,
    order_query: String,
}

impl PgTargetDatabase {
    #[must_use]
    pub fn new(name: String, pool: PgPool, content_template: &str, order_template: &str) -> Self {
        Self {
            name,
            pool,
            content_query: difference_count_query(content_template),
            order_query: difference_count_query(order_template),
        }
    }

    fn count_difference(&self, query: &str, candidate: &str, reference: &str) -> Result<u64> {
        let mut conn = self
            .pool
            .get()
            .with_context(|| format!("no connection to selection DB {}", self.name))?;

        let row: DifferencePrivate = sql_query(query)
            .bind::<Text, _>(candidate)
            .bind::<Text, _>(reference)
            .get_result(&mut conn)?;

        i64_to_u64(row.difference_rows).map_err(|e| anyhow!(e))
    }
}

impl TargetDatabase for PgTargetDatabase {
    fn content_difference(&self, candidate: &str, reference: &str) -> Result<u64> {
        self.count_difference(&self.content_query, candidate, reference)
    }

    fn order_difference(&self, candidate: &str, reference: &str) -> Result<u64> {
        self.count_difference(&self.order_query, candidate, reference)
    }
}

/// Connect every configured target schema. The first failure aborts the whole pool.
///
/// # Errors
/// Returns an error naming the first target that could not be connected.
pub fn connect_target_pool(config: &SelectionJudgeConfig) -> Result<TargetPool> {
    config
        .dbs
        .iter()
        .map(|target| {
            let pool = connect_pool(&target.config.connection_string(), config.pool_size)
                .with_context(|| format!("failed to connect selection DB {}", target.name))?;
            info!(
                "selection DB connected: {}",
                target.config.masked_connection_string()
            );
            let database = PgTargetDatabase::new(
                target.name.clone(),
                pool,
                &config.content_template,
                &config.order_template,
            );
            Ok((target.name.clone(), Arc::new(database) as Arc<dyn TargetDatabase>))
        })
        .collect()
}
