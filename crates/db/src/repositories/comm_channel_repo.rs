//! Repository for the `comm_channels` table.

use sqlx::PgPool;
use uuid::Uuid;

use fete_core::types::DbId;

use crate::models::comm_channel::CommChannel;
use crate::models::status::StatusId;

/// Column list for `comm_channels` queries.
const COLUMNS: &str = "id, account_id, comm_type, comm_endpoint, validation_token, \
     validation_at, message_sent_at, created_at, updated_at";

/// Provides CRUD operations for endpoint-validation rounds.
pub struct CommChannelRepo;

impl CommChannelRepo {
    /// Open a validation round for an endpoint with a fresh token.
    pub async fn create(
        pool: &PgPool,
        account_id: DbId,
        comm_type: StatusId,
        comm_endpoint: &str,
        validation_token: Uuid,
    ) -> Result<CommChannel, sqlx::Error> {
        let query = format!(
            "INSERT INTO comm_channels (account_id, comm_type, comm_endpoint, validation_token) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommChannel>(&query)
            .bind(account_id)
            .bind(comm_type)
            .bind(comm_endpoint)
            .bind(validation_token)
            .fetch_one(pool)
            .await
    }

    /// Fetch a validation round by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CommChannel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comm_channels WHERE id = $1");
        sqlx::query_as::<_, CommChannel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Stamp the moment the validation message went out.
    pub async fn mark_message_sent(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE comm_channels SET message_sent_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
