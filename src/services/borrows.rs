//! Borrow workflow service
//!
//! A borrow request starts `pending` and is resolved exactly once, to
//! `approved` or `denied`. Resolution is a compare-and-swap on the stored
//! status, so two concurrent resolutions cannot both succeed. An approved
//! loan is closed by recording its return date.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowDetails, BorrowStatus, NewBorrow},
        user::UserClaims,
    },
    repository::borrows::BorrowStore,
};

#[derive(Clone)]
pub struct BorrowsService {
    store: Arc<dyn BorrowStore>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Borrow record with id {} not found", id))
}

impl BorrowsService {
    pub fn new(store: Arc<dyn BorrowStore>) -> Self {
        Self { store }
    }

    /// List every borrow record
    pub async fn list_borrows(&self) -> AppResult<Vec<BorrowDetails>> {
        self.store.list_all().await
    }

    /// List the borrow records of one user, whatever their status
    pub async fn list_user_borrows(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        self.store.list_for_user(user_id).await
    }

    /// Get a borrow record by ID
    pub async fn get_borrow(&self, id: i32) -> AppResult<BorrowDetails> {
        self.store.get(id).await?.ok_or_else(|| not_found(id))
    }

    /// Get a borrow record as seen by `caller`. Another user's record is
    /// reported as missing, so existence of other loans is not revealed.
    pub async fn get_borrow_for(&self, id: i32, caller: &UserClaims) -> AppResult<BorrowDetails> {
        match self.store.get(id).await? {
            Some(borrow) if borrow.user_id == caller.user_id || caller.is_staff() => Ok(borrow),
            _ => Err(not_found(id)),
        }
    }

    /// Open a borrow request. Always starts pending, dated today.
    pub async fn create_borrow(&self, user_id: i32, book_id: i32) -> AppResult<BorrowDetails> {
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        if !self.store.book_exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let borrow = self
            .store
            .insert(NewBorrow {
                user_id,
                book_id,
                borrow_date: today(),
            })
            .await?;

        tracing::info!(
            borrow_id = borrow.id,
            user_id,
            book_id,
            "Borrow request created"
        );
        Ok(borrow)
    }

    /// Resolve a pending request to `approved` or `denied`
    pub async fn resolve(&self, id: i32, status: &str) -> AppResult<BorrowDetails> {
        let next = BorrowStatus::resolution(status)?;

        let current = self.get_borrow(id).await?;
        current.status.transition_to(next)?;

        if !self
            .store
            .update_status(id, BorrowStatus::Pending, next)
            .await?
        {
            // Someone else changed or removed the record since we read it
            return match self.store.get(id).await? {
                None => Err(not_found(id)),
                Some(latest) => {
                    tracing::warn!(
                        borrow_id = id,
                        requested = %next,
                        current = %latest.status,
                        "Lost borrow status race"
                    );
                    Err(AppError::Conflict(format!(
                        "Borrow request already {}",
                        latest.status
                    )))
                }
            };
        }

        tracing::info!(borrow_id = id, status = %next, "Borrow request resolved");
        Ok(BorrowDetails {
            status: next,
            ..current
        })
    }

    /// Close an approved loan by recording today as its return date
    pub async fn return_borrow(&self, id: i32) -> AppResult<BorrowDetails> {
        let current = self.get_borrow(id).await?;
        Self::ensure_returnable(&current)?;

        let return_date = today();
        if !self.store.mark_returned(id, return_date).await? {
            let latest = self.store.get(id).await?.ok_or_else(|| not_found(id))?;
            Self::ensure_returnable(&latest)?;
            return Err(AppError::Conflict("Borrow record changed concurrently".to_string()));
        }

        tracing::info!(borrow_id = id, %return_date, "Borrowed book returned");
        Ok(BorrowDetails {
            return_date: Some(return_date),
            ..current
        })
    }

    fn ensure_returnable(borrow: &BorrowDetails) -> AppResult<()> {
        if borrow.status != BorrowStatus::Approved {
            return Err(AppError::Conflict(format!(
                "Only approved loans can be returned (status is {})",
                borrow.status
            )));
        }
        if borrow.return_date.is_some() {
            return Err(AppError::Conflict("Book already returned".to_string()));
        }
        Ok(())
    }
}
