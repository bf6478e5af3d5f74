//! Books repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput, CreateBookWithAuthor},
};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.book_name, b.description, b.author_id, a.author_name AS author
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all books
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} ORDER BY b.id", BOOK_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List the books of an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "{} WHERE b.author_id = $1 ORDER BY b.id",
            BOOK_SELECT
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Create a book for an existing author
    pub async fn create(&self, author_id: i32, book: &BookInput) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            WITH inserted AS (
                INSERT INTO books (book_name, description, author_id)
                VALUES ($1, $2, $3)
                RETURNING id, book_name, description, author_id
            )
            SELECT b.id, b.book_name, b.description, b.author_id, a.author_name AS author
            FROM inserted b
            JOIN authors a ON a.id = b.author_id
            "#,
        )
        .bind(&book.book_name)
        .bind(&book.description)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_constraint(
                e,
                "Book already exists",
                &format!("Author with id {} not found", author_id),
            )
        })
    }

    /// Create a new author and its first book in one transaction.
    ///
    /// Fails with `Conflict` when an author with that name already exists.
    pub async fn create_with_author(&self, input: &CreateBookWithAuthor) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let author_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO authors (author_name, publication_year)
            VALUES ($1, $2)
            ON CONFLICT (author_name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&input.author)
        .bind(input.publication_year)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("Author already exists".to_string()))?;

        let book_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (book_name, description, author_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&input.book_name)
        .bind(&input.description)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Book {
            id: book_id,
            book_name: input.book_name.clone(),
            description: input.description.clone(),
            author_id,
            author: input.author.clone(),
        })
    }

    /// Replace a book's name and description
    pub async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book> {
        self.update_where(id, None, book).await
    }

    /// Replace a book's fields, only if it belongs to `author_id`
    pub async fn update_for_author(
        &self,
        author_id: i32,
        id: i32,
        book: &BookInput,
    ) -> AppResult<Book> {
        self.update_where(id, Some(author_id), book).await
    }

    async fn update_where(&self, id: i32, author_id: Option<i32>, book: &BookInput) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            WITH updated AS (
                UPDATE books SET book_name = $3, description = $4
                WHERE id = $1 AND ($2::INTEGER IS NULL OR author_id = $2)
                RETURNING id, book_name, description, author_id
            )
            SELECT b.id, b.book_name, b.description, b.author_id, a.author_name AS author
            FROM updated b
            JOIN authors a ON a.id = b.author_id
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(&book.book_name)
        .bind(&book.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book and its borrow records in one transaction
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM book_borrows WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete every book of an author (and their borrow records), keeping the
    /// author. Returns the number of books removed.
    pub async fn delete_by_author(&self, author_id: i32) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM book_borrows
            WHERE book_id IN (SELECT id FROM books WHERE author_id = $1)
            "#,
        )
        .bind(author_id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM books WHERE author_id = $1")
            .bind(author_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }
}
