mod early_access;
mod health_check;
mod relay;
mod subscriptions;

pub use early_access::*;
pub use health_check::*;
pub use relay::*;
pub use subscriptions::*;

use actix_web::HttpResponse;

/// Answers every method other than POST on the intake resources.
pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(serde_json::json!({ "error": "Method not allowed" }))
}

fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
