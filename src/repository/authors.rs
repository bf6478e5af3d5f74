//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorInput},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all authors
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, author_name, publication_year FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, author_name, publication_year FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Create an author; names are unique
    pub async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (author_name, publication_year)
            VALUES ($1, $2)
            RETURNING id, author_name, publication_year
            "#,
        )
        .bind(&author.author_name)
        .bind(author.publication_year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Author already exists", "Author not found"))
    }

    /// Replace an author's fields
    pub async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET author_name = $2, publication_year = $3
            WHERE id = $1
            RETURNING id, author_name, publication_year
            "#,
        )
        .bind(id)
        .bind(&author.author_name)
        .bind(author.publication_year)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "Author already exists", "Author not found"))?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author with its books and their borrow records.
    ///
    /// Children are removed first, all in one transaction.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM book_borrows
            WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM books WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            // Dropping the transaction rolls it back
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
