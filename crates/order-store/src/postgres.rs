use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, OrderLine, OrderRepository, OrderState, RepositoryError, RepositoryResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderStoreError, Result};

const ORDER_COLUMNS: &str = "id, user_id, created_at, state, carrier_name, carrier_price, \
     delivery, payment_session_id, submission_token";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| OrderStoreError::InvalidRow(format!("negative quantity {quantity}")))?;

        Ok(OrderLine {
            product_name: row.try_get("product_name")?,
            product_illustration: row.try_get("product_illustration")?,
            quantity,
            unit_price: row.try_get("unit_price")?,
            tax_rate_percent: row.try_get("tax_rate_percent")?,
        })
    }

    fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let code: i16 = row.try_get("state")?;
        let state = OrderState::try_from(code)
            .map_err(|e| OrderStoreError::InvalidRow(e.to_string()))?;

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            row.try_get("created_at")?,
            state,
            row.try_get("carrier_name")?,
            row.try_get("carrier_price")?,
            row.try_get("delivery")?,
            row.try_get("payment_session_id")?,
            row.try_get("submission_token")?,
            lines,
        ))
    }

    /// Loads the lines of every order in `rows` and assembles the orders.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let line_rows = sqlx::query(
            r#"
            SELECT order_id, product_name, product_illustration, quantity, unit_price, tax_rate_percent
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in &line_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines
                .entry(order_id)
                .or_default()
                .push(Self::row_to_line(row)?);
        }

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, lines.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        bind_uuid: Uuid,
        bind_extra: Option<Uuid>,
    ) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {condition}");
        let mut query = sqlx::query(&sql).bind(bind_uuid);
        if let Some(extra) = bind_extra {
            query = query.bind(extra);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, created_at, state, carrier_name, carrier_price, delivery, payment_session_id, submission_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.created_at())
        .bind(order.state().code())
        .bind(order.carrier_name())
        .bind(order.carrier_price())
        .bind(order.delivery())
        .bind(order.payment_session_id())
        .bind(order.submission_token())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("unique_user_submission_token")
                    && let Some(token) = order.submission_token()
                {
                    return RepositoryError::DuplicateSubmission { token }.into();
                }
                if db_err.constraint() == Some("orders_pkey") {
                    return RepositoryError::AlreadyExists(order.id()).into();
                }
            }
            OrderStoreError::Database(e)
        })?;

        for (position, line) in order.lines().iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| OrderStoreError::InvalidRow("too many order lines".to_string()))?;
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                OrderStoreError::InvalidRow(format!("quantity {} out of range", line.quantity))
            })?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, product_name, product_illustration, quantity, unit_price, tax_rate_percent)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(position)
            .bind(&line.product_name)
            .bind(&line.product_illustration)
            .bind(quantity)
            .bind(line.unit_price)
            .bind(line.tax_rate_percent)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::counter!("order_store_inserts_total").increment(1);
        Ok(())
    }

    async fn list_orders(&self, user_id: UserId, states: &[OrderState]) -> Result<Vec<Order>> {
        let codes: Vec<i16> = states.iter().map(OrderState::code).collect();
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND state = ANY($2) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_uuid())
            .bind(&codes)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_session_id = $1");
        let rows = sqlx::query(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn set_payment_session(&self, order_id: OrderId, session_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE orders SET payment_session_id = $2 WHERE id = $1 AND state = $3",
        )
        .bind(order_id.as_uuid())
        .bind(session_id)
        .bind(OrderState::PendingPayment.code())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_set_state(
        &self,
        order_id: OrderId,
        expected: OrderState,
        new_state: OrderState,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET state = $3 WHERE id = $1 AND state = $2")
            .bind(order_id.as_uuid())
            .bind(expected.code())
            .bind(new_state.code())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(order_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(RepositoryError::NotFound(order_id).into());
        }
        Ok(false)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        Ok(self.insert_order(order).await?)
    }

    async fn find(&self, order_id: OrderId) -> RepositoryResult<Option<Order>> {
        Ok(self
            .fetch_one_where("id = $1", order_id.as_uuid(), None)
            .await?)
    }

    async fn find_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> RepositoryResult<Option<Order>> {
        Ok(self
            .fetch_one_where(
                "id = $1 AND user_id = $2",
                order_id.as_uuid(),
                Some(user_id.as_uuid()),
            )
            .await?)
    }

    async fn find_by_payment_session(&self, session_id: &str) -> RepositoryResult<Option<Order>> {
        Ok(self.find_by_session(session_id).await?)
    }

    async fn find_by_submission_token(
        &self,
        user_id: UserId,
        token: Uuid,
    ) -> RepositoryResult<Option<Order>> {
        Ok(self
            .fetch_one_where(
                "user_id = $1 AND submission_token = $2",
                user_id.as_uuid(),
                Some(token),
            )
            .await?)
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        states: &[OrderState],
    ) -> RepositoryResult<Vec<Order>> {
        Ok(self.list_orders(user_id, states).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn record_payment_session(
        &self,
        order_id: OrderId,
        session_id: &str,
    ) -> RepositoryResult<bool> {
        Ok(self.set_payment_session(order_id, session_id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn update_state(
        &self,
        order_id: OrderId,
        expected: OrderState,
        new_state: OrderState,
    ) -> RepositoryResult<bool> {
        Ok(self
            .compare_and_set_state(order_id, expected, new_state)
            .await?)
    }
}
