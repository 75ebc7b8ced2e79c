//! HTTP front end: a single `GET /` serving the prerendered index page.

use crate::config::AppConfig;
use crate::render::RenderedPage;
use actix_web::http::header::{self, ContentType};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, get, web};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[get("/")]
async fn index(req: HttpRequest, page: web::Data<RenderedPage>) -> impl Responder {
    let etag = page.etag();
    let fresh = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|tags| tags.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));
    if fresh {
        debug!("Index not modified");
        return HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish();
    }
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header((header::ETAG, etag))
        .body(page.body().to_owned())
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig, page: web::Data<RenderedPage>) {
    cfg.app_data(page).service(index);
}

/// Serve `page` until the server is stopped.
pub async fn serve(config: &AppConfig, page: Arc<RenderedPage>) -> Result<()> {
    let (host, port) = config.bind_addr();
    let page = web::Data::from(page);
    let server = HttpServer::new(move || {
        let page = page.clone();
        App::new().configure(move |cfg| configure(cfg, page))
    })
    .workers(config.workers.max(1))
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {host}:{port}"))?;

    info!(%host, port, workers = config.workers.max(1), "Serving on http://{host}:{port}/");
    server.run().await.context("HTTP server stopped with an error")
}
