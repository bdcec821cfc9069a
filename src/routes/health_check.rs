use actix_web::HttpResponse;

/// Liveness probe: answers 200 with an empty body while the server accepts requests.
/// It does not touch the database nor the notification relays.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
