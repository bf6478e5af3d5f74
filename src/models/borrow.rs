//! Borrow record model and its status state machine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Approval status of a borrow request.
///
/// `Pending` is the only initial state; `Approved` and `Denied` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Pending,
    Approved,
    Denied,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::Approved => "approved",
            BorrowStatus::Denied => "denied",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BorrowStatus::Pending)
    }

    /// Parse a requested resolution. Only `approved` and `denied` are accepted.
    pub fn resolution(value: &str) -> AppResult<Self> {
        match value {
            "approved" => Ok(BorrowStatus::Approved),
            "denied" => Ok(BorrowStatus::Denied),
            other => Err(AppError::Validation(format!(
                "Invalid status '{}': expected 'approved' or 'denied'",
                other
            ))),
        }
    }

    /// Check that a record in this status may move to `next`
    pub fn transition_to(self, next: BorrowStatus) -> AppResult<BorrowStatus> {
        match (self, next) {
            (BorrowStatus::Pending, BorrowStatus::Approved | BorrowStatus::Denied) => Ok(next),
            (BorrowStatus::Pending, BorrowStatus::Pending) => Err(AppError::Validation(
                "A borrow request cannot be resolved to 'pending'".to_string(),
            )),
            (current, _) => Err(AppError::Conflict(format!(
                "Borrow request already {}",
                current
            ))),
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BorrowStatus::Pending),
            "approved" => Ok(BorrowStatus::Approved),
            "denied" => Ok(BorrowStatus::Denied),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// Stored as TEXT, constrained by a CHECK in the schema
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Borrow record with the names of its user and book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowDetails {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub book_id: i32,
    pub book_name: String,
    pub borrow_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
}

/// Values written when a borrow request is created
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrow {
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: NaiveDate,
}

/// Create borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrow {
    /// Defaults to the caller
    pub user_id: Option<i32>,
    pub book_id: i32,
}

/// Update borrow status request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrowStatus {
    /// "approved" or "denied"
    pub status: String,
}
