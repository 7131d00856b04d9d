// Static file server for Whisper Relay
//
// Serves the published directory verbatim over HTTP. The only contract is that
// whatever the publisher puts under the served directory becomes fetchable at
// the public base URL; everything here is plain pass-through file serving.

use std::io;
use std::path::Path;

use actix_files::Files;
use actix_web::dev::Server;
use actix_web::middleware::Logger;
use actix_web::{get, App, HttpResponse, HttpServer};
use log::info;
use serde::Serialize;

use crate::config::ServerConfig;

/// Liveness payload
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness endpoint
#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

/// Bind the static file server and return its future
///
/// Binding happens synchronously, so once this returns the socket is already
/// listening and published URLs can be handed to the remote API while the
/// returned future runs.
pub fn bind_file_server(served_dir: &Path, config: &ServerConfig) -> io::Result<Server> {
    std::fs::create_dir_all(served_dir)?;
    let dir = served_dir.to_path_buf();

    info!(
        "Serving {} on http://{}:{}",
        dir.display(),
        config.host,
        config.port
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(health)
            .service(Files::new("/", dir.clone()).show_files_listing())
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(App::new().service(health)).await;
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn served_files_are_fetchable_by_base_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp3"), b"audio-bytes").unwrap();

        let app = test::init_service(
            App::new()
                .service(health)
                .service(Files::new("/", dir.path().to_path_buf()).show_files_listing()),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/clip.mp3").to_request()).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"audio-bytes");
    }

    #[actix_web::test]
    async fn missing_files_return_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let app = test::init_service(
            App::new().service(Files::new("/", dir.path().to_path_buf()).show_files_listing()),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/absent.mp3").to_request())
                .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
