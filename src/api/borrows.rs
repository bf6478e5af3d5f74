//! Borrow request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{BorrowDetails, CreateBorrow, UpdateBorrowStatus},
    AppState,
};

use super::AuthenticatedUser;

/// Status update acknowledgement
#[derive(Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub borrow: BorrowDetails,
}

/// List all borrow records
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All borrow records", body = Vec<BorrowDetails>),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    claims.require_librarian()?;

    let borrows = state.services.borrows.list_borrows().await?;
    Ok(Json(borrows))
}

/// Get the borrow records of a user
#[utoipa::path(
    get,
    path = "/users/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's borrow records", body = Vec<BorrowDetails>),
        (status = 403, description = "Not the caller's records"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrows(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    claims.require_self_or_librarian(user_id)?;

    let borrows = state.services.borrows.list_user_borrows(user_id).await?;
    Ok(Json(borrows))
}

/// Request to borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow request created (pending)", body = BorrowDetails),
        (status = 403, description = "Cannot borrow on behalf of another user"),
        (status = 404, description = "User or book not found")
    )
)]
pub async fn create_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowDetails>)> {
    let user_id = request.user_id.unwrap_or(claims.user_id);
    claims.require_self_or_librarian(user_id)?;

    let borrow = state
        .services
        .borrows
        .create_borrow(user_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Get a borrow record
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Borrow record", body = BorrowDetails),
        (status = 404, description = "Borrow record not found or not the caller's")
    )
)]
pub async fn get_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    let borrow = state.services.borrows.get_borrow_for(id, &claims).await?;
    Ok(Json(borrow))
}

/// Approve or deny a pending borrow request
#[utoipa::path(
    put,
    path = "/borrows/{id}/status",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    request_body = UpdateBorrowStatus,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 400, description = "Status must be 'approved' or 'denied'"),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "Request already resolved")
    )
)]
pub async fn update_borrow_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBorrowStatus>,
) -> AppResult<Json<StatusUpdateResponse>> {
    claims.require_librarian()?;

    let borrow = state.services.borrows.resolve(id, &request.status).await?;
    Ok(Json(StatusUpdateResponse {
        message: "Book borrow status updated successfully".to_string(),
        borrow,
    }))
}

/// Record the return of an approved loan
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowDetails),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "Not approved or already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowDetails>> {
    claims.require_librarian()?;

    let borrow = state.services.borrows.return_borrow(id).await?;
    Ok(Json(borrow))
}
