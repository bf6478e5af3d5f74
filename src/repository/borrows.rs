//! Borrow records repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrow::{BorrowDetails, BorrowStatus, NewBorrow},
};

const BORROW_SELECT: &str = r#"
    SELECT bb.id, bb.user_id, u.username AS user_name, bb.book_id, b.book_name,
           bb.borrow_date, bb.return_date, bb.status
    FROM book_borrows bb
    JOIN users u ON u.id = bb.user_id
    JOIN books b ON b.id = bb.book_id
"#;

/// Storage used by the borrow workflow.
///
/// Status and return-date writes are conditional on the current row state and
/// report whether a row was changed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowStore: Send + Sync {
    async fn user_exists(&self, user_id: i32) -> AppResult<bool>;

    async fn book_exists(&self, book_id: i32) -> AppResult<bool>;

    async fn insert(&self, borrow: NewBorrow) -> AppResult<BorrowDetails>;

    async fn get(&self, id: i32) -> AppResult<Option<BorrowDetails>>;

    async fn list_all(&self) -> AppResult<Vec<BorrowDetails>>;

    async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>>;

    /// Set `status` to `next` only if it currently equals `expected`
    async fn update_status(
        &self,
        id: i32,
        expected: BorrowStatus,
        next: BorrowStatus,
    ) -> AppResult<bool>;

    /// Set `return_date` on an approved record that has none yet
    async fn mark_returned(&self, id: i32, return_date: NaiveDate) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowStore for BorrowsRepository {
    async fn user_exists(&self, user_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn book_exists(&self, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, borrow: NewBorrow) -> AppResult<BorrowDetails> {
        sqlx::query_as::<_, BorrowDetails>(
            r#"
            WITH inserted AS (
                INSERT INTO book_borrows (user_id, book_id, borrow_date, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT bb.id, bb.user_id, u.username AS user_name, bb.book_id, b.book_name,
                   bb.borrow_date, bb.return_date, bb.status
            FROM inserted bb
            JOIN users u ON u.id = bb.user_id
            JOIN books b ON b.id = bb.book_id
            "#,
        )
        .bind(borrow.user_id)
        .bind(borrow.book_id)
        .bind(borrow.borrow_date)
        .bind(BorrowStatus::Pending)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Borrow already exists", "User or book not found"))
    }

    async fn get(&self, id: i32) -> AppResult<Option<BorrowDetails>> {
        let borrow = sqlx::query_as::<_, BorrowDetails>(&format!("{} WHERE bb.id = $1", BORROW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(borrow)
    }

    async fn list_all(&self) -> AppResult<Vec<BorrowDetails>> {
        let borrows = sqlx::query_as::<_, BorrowDetails>(&format!("{} ORDER BY bb.id", BORROW_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(borrows)
    }

    async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let borrows = sqlx::query_as::<_, BorrowDetails>(&format!(
            "{} WHERE bb.user_id = $1 ORDER BY bb.id",
            BORROW_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    async fn update_status(
        &self,
        id: i32,
        expected: BorrowStatus,
        next: BorrowStatus,
    ) -> AppResult<bool> {
        let updated = sqlx::query("UPDATE book_borrows SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(expected)
            .bind(next)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(updated == 1)
    }

    async fn mark_returned(&self, id: i32, return_date: NaiveDate) -> AppResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE book_borrows SET return_date = $2
            WHERE id = $1 AND status = $3 AND return_date IS NULL
            "#,
        )
        .bind(id)
        .bind(return_date)
        .bind(BorrowStatus::Approved)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}
