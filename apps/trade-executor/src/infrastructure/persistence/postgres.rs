//! PostgreSQL trade repository.
//!
//! One row per trade in the `trades` table. Decimals are stored as
//! `NUMERIC`, timestamps as `TIMESTAMPTZ` and enums as their variant names.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::config::PersistenceConfig;
use crate::domain::shared::{CustomerId, Timestamp, TradeId};
use crate::domain::trade_lifecycle::{
    ReconstitutedTradeParams, RepositoryError, Trade, TradeRepository, TradeStatus, TradeTerms,
    TradeType,
};

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS trades (
        id                   TEXT PRIMARY KEY,
        customer_id          TEXT NOT NULL,
        instrument           TEXT NOT NULL,
        trade_type           TEXT NOT NULL,
        quantity             NUMERIC NOT NULL,
        price                NUMERIC NOT NULL,
        execution_timestamp  TIMESTAMPTZ NOT NULL,
        settlement_timestamp TIMESTAMPTZ,
        status               TEXT NOT NULL,
        currency             TEXT NOT NULL,
        counterparty         TEXT NOT NULL,
        fees                 NUMERIC NOT NULL DEFAULT 0
    )
";

/// `TradeRepository` backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresTradeRepository {
    pool: PgPool,
}

impl PostgresTradeRepository {
    /// Connect a pool using the persistence settings.
    ///
    /// # Errors
    ///
    /// Returns `Connection` if the database cannot be reached.
    pub async fn connect(config: &PersistenceConfig) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "PostgreSQL connection pool initialized"
        );

        Ok(Self { pool })
    }

    /// Create a repository with an existing pool (for testing).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `trades` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        info!("Trade schema ready");
        Ok(())
    }

    fn row_to_trade(row: &PgRow) -> Result<Trade, RepositoryError> {
        let id: String = row.try_get("id").map_err(map_sqlx_error)?;
        let corrupt = |message: String| RepositoryError::Corrupt {
            trade_id: id.clone(),
            message,
        };

        let trade_type = row
            .try_get::<String, _>("trade_type")
            .map_err(map_sqlx_error)?
            .parse::<TradeType>()
            .map_err(|e| corrupt(e.to_string()))?;
        let status = row
            .try_get::<String, _>("status")
            .map_err(map_sqlx_error)?
            .parse::<TradeStatus>()
            .map_err(|e| corrupt(e.to_string()))?;

        let terms = TradeTerms {
            customer_id: CustomerId::new(
                row.try_get::<String, _>("customer_id")
                    .map_err(map_sqlx_error)?,
            ),
            instrument: row.try_get("instrument").map_err(map_sqlx_error)?,
            trade_type,
            quantity: row.try_get::<Decimal, _>("quantity").map_err(map_sqlx_error)?,
            price: row.try_get::<Decimal, _>("price").map_err(map_sqlx_error)?,
            settlement_timestamp: row
                .try_get::<Option<DateTime<Utc>>, _>("settlement_timestamp")
                .map_err(map_sqlx_error)?
                .map(Timestamp::new),
            currency: row.try_get("currency").map_err(map_sqlx_error)?,
            counterparty: row.try_get("counterparty").map_err(map_sqlx_error)?,
            fees: row.try_get::<Decimal, _>("fees").map_err(map_sqlx_error)?,
        };
        let execution_timestamp = row
            .try_get::<DateTime<Utc>, _>("execution_timestamp")
            .map_err(map_sqlx_error)?;

        Ok(Trade::reconstitute(ReconstitutedTradeParams {
            id: TradeId::new(id),
            status,
            execution_timestamp: Timestamp::new(execution_timestamp),
            terms,
        }))
    }
}

#[async_trait]
impl TradeRepository for PostgresTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO trades (
                id, customer_id, instrument, trade_type, quantity, price,
                execution_timestamp, settlement_timestamp, status, currency,
                counterparty, fees
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(trade.id().as_str())
        .bind(trade.customer_id().as_str())
        .bind(trade.instrument())
        .bind(trade.trade_type().as_str())
        .bind(trade.quantity())
        .bind(trade.price())
        .bind(trade.execution_timestamp().as_datetime())
        .bind(trade.settlement_timestamp().map(|ts| ts.as_datetime()))
        .bind(trade.status().as_str())
        .bind(trade.currency())
        .bind(trade.counterparty())
        .bind(trade.fees())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Duplicate {
                trade_id: trade.id().to_string(),
            });
        }

        debug!(trade_id = %trade.id(), "Trade inserted");
        Ok(())
    }

    async fn replace(&self, trade: &Trade) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE trades SET
                customer_id = $2,
                instrument = $3,
                trade_type = $4,
                quantity = $5,
                price = $6,
                execution_timestamp = $7,
                settlement_timestamp = $8,
                status = $9,
                currency = $10,
                counterparty = $11,
                fees = $12
            WHERE id = $1
            ",
        )
        .bind(trade.id().as_str())
        .bind(trade.customer_id().as_str())
        .bind(trade.instrument())
        .bind(trade.trade_type().as_str())
        .bind(trade.quantity())
        .bind(trade.price())
        .bind(trade.execution_timestamp().as_datetime())
        .bind(trade.settlement_timestamp().map(|ts| ts.as_datetime()))
        .bind(trade.status().as_str())
        .bind(trade.currency())
        .bind(trade.counterparty())
        .bind(trade.fees())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                trade_id: trade.id().to_string(),
            });
        }

        debug!(trade_id = %trade.id(), "Trade replaced");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Trade>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, customer_id, instrument, trade_type, quantity, price,
                   execution_timestamp, settlement_timestamp, status, currency,
                   counterparty, fees
            FROM trades
            ORDER BY execution_timestamp, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let trades = rows
            .iter()
            .map(Self::row_to_trade)
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = trades.len(), "Loaded trades from database");
        Ok(trades)
    }
}

/// Split sqlx failures into reachability problems and statement failures.
fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => RepositoryError::Connection(err.to_string()),
        other => RepositoryError::Query(other.to_string()),
    }
}
