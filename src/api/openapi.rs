//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblios API",
        version = "0.3.0",
        description = "Library Circulation REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::get_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::create_loan,
        loans::get_loan,
        loans::return_loan,
        loans::extend_loan,
        loans::mark_lost,
        // Admin
        admin::sweep_overdue,
        admin::calculate_fines,
    ),
    components(
        schemas(
            health::HealthResponse,
            crate::error::ErrorResponse,
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::author::Author,
            crate::models::category::Category,
            crate::models::member::Member,
            crate::models::member::MembershipStatus,
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            loans::ReturnLoanRequest,
            loans::ExtendLoanRequest,
            admin::SweepRequest,
            admin::CalculateFinesRequest,
            admin::BatchResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "books", description = "Book catalog with lifecycle logic"),
        (name = "loans", description = "Loan circulation"),
        (name = "admin", description = "Administrative batch operations")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router serving the generated OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
