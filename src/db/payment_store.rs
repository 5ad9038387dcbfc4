use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::payment::{NewPayment, Payment, PaymentUpdate},
};

// Rows written by older front ends may carry '' instead of NULL for an unpaid entry.
const SELECT_PAYMENTS: &str = "SELECT id, company, amount, NULLIF(payment_date, '') AS payment_date, \
     status, due_date FROM payments";

/// Payment store for database operations
#[derive(Clone)]
pub struct PaymentStore {
    pool: DbPool,
}

impl PaymentStore {
    /// Create a new PaymentStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a payment and return its generated id
    pub async fn insert(&self, payment: &NewPayment) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO payments (company, amount, payment_date, status, due_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.company)
        .bind(payment.amount)
        .bind(payment.payment_date)
        .bind(payment.status)
        .bind(payment.due_date)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, company = %payment.company, "payment inserted");
        Ok(id)
    }

    /// Get all payments in insertion order
    pub async fn list(&self) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!("{} ORDER BY id", SELECT_PAYMENTS))
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Get a payment by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!("{} WHERE id = ?", SELECT_PAYMENTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::RecordNotFound(id))?;

        Ok(payment)
    }

    /// Overwrite amount, payment date and due date of a payment
    pub async fn update(&self, id: i64, update: &PaymentUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount = ?, payment_date = ?, due_date = ?
            WHERE id = ?
            "#,
        )
        .bind(update.amount)
        .bind(update.payment_date)
        .bind(update.due_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!(id, "payment updated");
        Ok(())
    }

    /// Delete a payment by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!(id, "payment deleted");
        Ok(())
    }

    /// Payments whose stored due date equals `due_date` exactly, or all payments
    /// when no (or a blank) date is given
    pub async fn filter(&self, due_date: Option<&str>) -> Result<Vec<Payment>> {
        let Some(due_date) = due_date.filter(|d| !d.is_empty()) else {
            return self.list().await;
        };

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "{} WHERE due_date = ? ORDER BY id",
            SELECT_PAYMENTS
        ))
        .bind(due_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
