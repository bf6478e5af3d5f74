//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, borrows, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Library management REST API: users, authors, books and borrow approvals"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_librarian,
        // Books
        books::list_books,
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::create_author,
        authors::get_author,
        authors::update_author,
        authors::delete_author,
        authors::list_author_books,
        authors::create_book_for_author,
        authors::update_author_book,
        authors::delete_author_books,
        // Borrows
        borrows::list_borrows,
        borrows::get_user_borrows,
        borrows::create_borrow,
        borrows::get_borrow,
        borrows::update_borrow_status,
        borrows::return_borrow,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateLibrarian,
            // Catalog
            crate::models::author::Author,
            crate::models::author::AuthorInput,
            crate::models::book::Book,
            crate::models::book::BookInput,
            crate::models::book::UpdateAuthorBook,
            crate::models::book::CreateBookWithAuthor,
            // Borrows
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::CreateBorrow,
            crate::models::borrow::UpdateBorrowStatus,
            borrows::StatusUpdateResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "books", description = "Book catalog"),
        (name = "authors", description = "Authors and their books"),
        (name = "borrows", description = "Borrow requests and approvals")
    )
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
