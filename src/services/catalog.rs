//! Catalog management service: authors and their books

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorInput},
        book::{Book, BookInput, CreateBookWithAuthor, UpdateAuthorBook},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Authors

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    /// Create an author; the name must not be taken
    pub async fn create_author(&self, author: AuthorInput) -> AppResult<Author> {
        author.validate()?;
        let created = self.repository.authors.create(&author).await?;
        tracing::info!(author_id = created.id, "Author created");
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, author: AuthorInput) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.update(id, &author).await
    }

    /// Delete an author together with its books and their borrow records
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted with its books");
        Ok(())
    }

    // Books

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn update_book(&self, id: i32, book: BookInput) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    /// Delete a book and its borrow records
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Create a book for an existing author
    pub async fn create_book_for_author(&self, author_id: i32, book: BookInput) -> AppResult<Book> {
        book.validate()?;
        // Fails with NotFound before any write
        self.repository.authors.get_by_id(author_id).await?;

        let created = self.repository.books.create(author_id, &book).await?;
        tracing::info!(book_id = created.id, author_id, "Book created");
        Ok(created)
    }

    /// Create a book along with a new author. An existing author name is a conflict.
    pub async fn create_book_with_author(&self, input: CreateBookWithAuthor) -> AppResult<Book> {
        input.validate()?;
        let created = self.repository.books.create_with_author(&input).await?;
        tracing::info!(
            book_id = created.id,
            author_id = created.author_id,
            "Book created with new author"
        );
        Ok(created)
    }

    pub async fn list_author_books(&self, author_id: i32) -> AppResult<Vec<Book>> {
        self.repository.authors.get_by_id(author_id).await?;
        self.repository.books.list_by_author(author_id).await
    }

    /// Update one of an author's books, identified in the payload
    pub async fn update_author_book(&self, author_id: i32, update: UpdateAuthorBook) -> AppResult<Book> {
        let book_id = update
            .id
            .ok_or_else(|| AppError::Validation("Book ID is required to update".to_string()))?;
        update.validate()?;

        self.repository.authors.get_by_id(author_id).await?;
        self.repository
            .books
            .update_for_author(author_id, book_id, &update.book)
            .await
    }

    /// Delete all books of an author, keeping the author
    pub async fn delete_author_books(&self, author_id: i32) -> AppResult<u64> {
        self.repository.authors.get_by_id(author_id).await?;
        let deleted = self.repository.books.delete_by_author(author_id).await?;
        tracing::info!(author_id, deleted, "Author's books deleted");
        Ok(deleted)
    }
}
