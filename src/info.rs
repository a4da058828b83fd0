use actix_web::{get, web, HttpResponse};
use log::{debug, error};

use crate::{
    error::ApiError,
    store::{self, Db},
};

#[get("/")]
async fn status() -> HttpResponse {
    HttpResponse::Ok().body("photo_share is running")
}

async fn schema_info(sql: &Db) -> Result<HttpResponse, ApiError> {
    match store::schema_info(sql).await? {
        Some(info) => Ok(HttpResponse::Ok().json(info)),
        None => {
            error!("schema_info table is empty");
            Err(ApiError::Internal("Missing SchemaInfo".into()))
        }
    }
}

#[get("/test")]
async fn test_default(sql: web::Data<Db>) -> Result<HttpResponse, ApiError> {
    schema_info(&sql).await
}

#[get("/test/{param}")]
async fn test_param(sql: web::Data<Db>, param: web::Path<String>) -> Result<HttpResponse, ApiError> {
    debug!("/test called with param {param}");

    match param.as_str() {
        "info" => schema_info(&sql).await,
        "counts" => Ok(HttpResponse::Ok().json(store::counts(&sql).await?)),
        other => Err(ApiError::bad_request(format!("Bad param {other}"))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(status).service(test_default).service(test_param);
}
