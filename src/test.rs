use crate::db::{self, DbPool, PAYMENTS_TABLE, PaymentStore};
use crate::error::AppError;
use crate::models::payment::{NewPayment, PaymentStatus, PaymentUpdate};

use chrono::NaiveDate;
use tempfile::TempDir;

// Helper function to setup a test database in its own directory.
// The TempDir has to outlive the pool, so it is handed back to the test.
async fn setup_test_db() -> (TempDir, DbPool, PaymentStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("tax_tracker.db").display());

    let pool = db::init_db_pool(&url, 2)
        .await
        .expect("Failed to initialize database");
    let store = PaymentStore::new(pool.clone());

    (dir, pool, store)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

// Helper function to create a test payment
fn acme_payment() -> NewPayment {
    NewPayment {
        company: "Acme".to_string(),
        amount: 150.0,
        payment_date: Some(date("2024-01-01")),
        status: PaymentStatus::Unpaid,
        due_date: date("2024-02-01"),
    }
}

fn payment_due(company: &str, due_date: &str) -> NewPayment {
    NewPayment {
        company: company.to_string(),
        amount: 10.0,
        payment_date: None,
        status: PaymentStatus::Unpaid,
        due_date: date(due_date),
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_payments_table() {
        let (_dir, pool, _store) = setup_test_db().await;

        assert!(db::table_exists(&pool, PAYMENTS_TABLE).await.unwrap());
        assert!(!db::table_exists(&pool, "invoices").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let (_dir, pool, store) = setup_test_db().await;
        let id = store.insert(&acme_payment()).await.unwrap();

        db::ensure_schema(&pool).await.unwrap();
        db::ensure_schema(&pool).await.unwrap();

        // Existing rows survive repeated initialization
        assert_eq!(store.get_by_id(id).await.unwrap().company, "Acme");
    }

    #[tokio::test]
    async fn test_reopening_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("reopen.db").display());

        let pool = db::init_db_pool(&url, 1).await.unwrap();
        PaymentStore::new(pool.clone())
            .insert(&acme_payment())
            .await
            .unwrap();
        pool.close().await;

        let pool = db::init_db_pool(&url, 1).await.unwrap();
        let payments = PaymentStore::new(pool).list().await.unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_storage_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}",
            dir.path().join("missing").join("nested").join("db.sqlite").display()
        );

        let result = db::init_db_pool(&url, 1).await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }
}

#[cfg(test)]
mod payment_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get_by_id() {
        let (_dir, _pool, store) = setup_test_db().await;

        let id = store.insert(&acme_payment()).await.unwrap();
        assert_eq!(id, 1);

        let payment = store.get_by_id(id).await.unwrap();
        assert_eq!(payment.id, 1);
        assert_eq!(payment.company, "Acme");
        assert_eq!(payment.amount, 150.0);
        assert_eq!(payment.payment_date, Some(date("2024-01-01")));
        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert_eq!(payment.due_date, date("2024-02-01"));
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let (_dir, _pool, store) = setup_test_db().await;

        let result = store.get_by_id(42).await;
        assert!(matches!(result, Err(AppError::RecordNotFound(42))));
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let (_dir, _pool, store) = setup_test_db().await;

        assert!(store.list().await.unwrap().is_empty());

        store.insert(&payment_due("First", "2024-04-15")).await.unwrap();
        store.insert(&payment_due("Second", "2024-06-15")).await.unwrap();
        store.insert(&payment_due("Third", "2024-04-15")).await.unwrap();

        let companies: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.company)
            .collect();
        assert_eq!(companies, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_update_overwrites_only_mutable_columns() {
        let (_dir, _pool, store) = setup_test_db().await;
        let id = store.insert(&acme_payment()).await.unwrap();

        let update = PaymentUpdate {
            amount: 200.0,
            payment_date: Some(date("2024-01-05")),
            due_date: date("2024-04-15"),
        };
        store.update(id, &update).await.unwrap();

        let payment = store.get_by_id(id).await.unwrap();
        assert_eq!(payment.amount, 200.0);
        assert_eq!(payment.payment_date, Some(date("2024-01-05")));
        assert_eq!(payment.due_date, date("2024-04-15"));
        assert_eq!(payment.company, "Acme");
        assert_eq!(payment.status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_update_can_clear_payment_date() {
        let (_dir, _pool, store) = setup_test_db().await;
        let id = store.insert(&acme_payment()).await.unwrap();

        let update = PaymentUpdate {
            amount: 150.0,
            payment_date: None,
            due_date: date("2024-02-01"),
        };
        store.update(id, &update).await.unwrap();

        assert_eq!(store.get_by_id(id).await.unwrap().payment_date, None);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let (_dir, _pool, store) = setup_test_db().await;

        let update = PaymentUpdate {
            amount: 1.0,
            payment_date: None,
            due_date: date("2024-02-01"),
        };
        let result = store.update(9, &update).await;
        assert!(matches!(result, Err(AppError::RecordNotFound(9))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, _pool, store) = setup_test_db().await;
        let id = store.insert(&acme_payment()).await.unwrap();

        store.delete(id).await.unwrap();

        assert!(matches!(
            store.get_by_id(id).await,
            Err(AppError::RecordNotFound(_))
        ));
        assert!(matches!(
            store.delete(id).await,
            Err(AppError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (_dir, _pool, store) = setup_test_db().await;

        let first = store.insert(&acme_payment()).await.unwrap();
        let second = store.insert(&acme_payment()).await.unwrap();
        store.delete(second).await.unwrap();

        let third = store.insert(&acme_payment()).await.unwrap();
        assert!(third > second);
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_filter_by_due_date() {
        let (_dir, _pool, store) = setup_test_db().await;

        store.insert(&payment_due("A", "2024-04-15")).await.unwrap();
        store.insert(&payment_due("B", "2024-06-15")).await.unwrap();
        store.insert(&payment_due("C", "2024-04-15")).await.unwrap();

        let april = store.filter(Some("2024-04-15")).await.unwrap();
        assert_eq!(april.len(), 2);
        assert!(april.iter().all(|p| p.due_date == date("2024-04-15")));

        let none = store.filter(Some("2025-01-15")).await.unwrap();
        assert!(none.is_empty());

        let all = store.filter(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(store.filter(Some("")).await.unwrap().len(), 3);

        // Exact text equality: other spellings of the same day do not match
        assert!(store.filter(Some("2024-4-15")).await.unwrap().is_empty());
        assert!(store.filter(Some("15/04/2024")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_payment_date_reads_as_none() {
        let (_dir, pool, store) = setup_test_db().await;
        store.insert(&acme_payment()).await.unwrap();

        // Older front ends stored '' rather than NULL
        sqlx::query(
            "INSERT INTO payments (company, amount, payment_date, status, due_date)
             VALUES ('Globex', 20.0, '', 'unpaid', '2024-02-01')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let payments = store.list().await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_date, Some(date("2024-01-01")));
        assert_eq!(payments[1].payment_date, None);

        assert_eq!(store.get_by_id(payments[1].id).await.unwrap().payment_date, None);
        assert_eq!(store.filter(Some("2024-02-01")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_storage_rejects_unknown_status() {
        let (_dir, pool, _store) = setup_test_db().await;

        // Bypass the service layer to reach the CHECK constraint
        let result = sqlx::query(
            "INSERT INTO payments (company, amount, payment_date, status, due_date)
             VALUES ('Acme', 1.0, NULL, 'pending', '2024-02-01')",
        )
        .execute(&pool)
        .await
        .map_err(AppError::from);

        assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (_dir, _pool, store) = setup_test_db().await;

        let id = store.insert(&acme_payment()).await.unwrap();
        assert_eq!(id, 1);

        let update = PaymentUpdate {
            amount: 200.0,
            payment_date: Some(date("2024-01-05")),
            due_date: date("2024-02-01"),
        };
        store.update(id, &update).await.unwrap();
        assert_eq!(store.get_by_id(id).await.unwrap().amount, 200.0);

        store.delete(id).await.unwrap();
        assert!(matches!(
            store.get_by_id(id).await,
            Err(AppError::RecordNotFound(1))
        ));
    }
}
