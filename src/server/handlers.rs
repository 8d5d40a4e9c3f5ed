use crate::{error::RelayError, models::RelayRequest, relay::PostRelay};
use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::{Method, StatusCode},
    web, HttpRequest, HttpResponse,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthBody<'a> {
    status: &'static str,
    model: &'a str,
}

pub fn error_response(e: &RelayError) -> HttpResponse {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorBody::new(e.user_message()))
}

/// Entry point for both the generate and the refine flow.
pub async fn generate_post(
    relay: web::Data<PostRelay>,
    request: web::Json<RelayRequest>,
) -> HttpResponse {
    match relay.handle(request.into_inner()).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(&e),
    }
}

pub async fn health(relay: web::Data<PostRelay>) -> HttpResponse {
    HttpResponse::Ok().json(HealthBody {
        status: "ok",
        model: relay.model_name(),
    })
}

/// CORS pre-flight for any path; unknown non-OPTIONS routes get a JSON 404.
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().json(ErrorBody::new("Not found"))
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = match &err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            HttpResponse::PayloadTooLarge().json(ErrorBody::new("Uploaded images are too large"))
        }
        other => {
            log::warn!("Rejected malformed request body: {}", other);
            error_response(&RelayError::invalid(format!("Invalid request: {}", other)))
        }
    };
    InternalError::from_response(err, response).into()
}
