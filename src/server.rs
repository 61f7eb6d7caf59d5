use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::{fs, net::TcpListener};

use crate::{
    config::Config,
    errors::AppResult,
    handlers,
    video::{THUMBNAIL_ROUTE, ThumbnailFetcher, YtDlp},
};
use tower_http::services::ServeDir;

/// Shared, read-only state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ytdlp: YtDlp,
    pub thumbnails: ThumbnailFetcher,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        Ok(Self {
            ytdlp: YtDlp::new(&config),
            thumbnails: ThumbnailFetcher::new(&config)?,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_content_length;
    let thumbnails = ServeDir::new(state.config.thumbnails_dir());

    Router::new()
        .route("/", get(handlers::index))
        .route("/get_video_info", post(handlers::get_video_info))
        .route("/download", post(handlers::download))
        .route("/bulk_download", post(handlers::bulk_download))
        .nest_service(THUMBNAIL_ROUTE, thumbnails)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Create the uploads and thumbnails folders expected by the handlers
pub async fn prepare_dirs(config: &Config) -> AppResult<()> {
    fs::create_dir_all(&config.upload_folder).await?;
    fs::create_dir_all(config.thumbnails_dir()).await?;
    Ok(())
}

pub async fn start_server(config: Config) -> AppResult<()> {
    prepare_dirs(&config).await?;

    let addr = config.bind_addr;
    let app = router(AppState::new(config)?);

    let listener = TcpListener::bind(addr).await?;
    log::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        path::{Path, PathBuf},
    };

    use reqwest::{
        Client, StatusCode,
        multipart::{Form, Part},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::video::ytdlp::tests::ECHO_ARGS;

    const DUMP_JSON: &str = r#"
cat <<'JSON'
{"title": "Demo", "duration": 19, "formats": [{"format_id": "sb0"}, {"format_id": "18", "ext": "mp4", "resolution": "640x360"}]}
JSON
"#;

    struct TestApp {
        base: String,
        upload_folder: PathBuf,
        download_dir: PathBuf,
        _dir: tempfile::TempDir,
    }

    fn test_config(dir: &Path, script: &str) -> Config {
        let script_path = dir.join("fake-yt-dlp.sh");
        std::fs::write(&script_path, script).unwrap();

        Config {
            upload_folder: dir.join("uploads"),
            download_dir: dir.join("downloads"),
            ytdlp_program: "sh".to_string(),
            ytdlp_args: vec![script_path.to_string_lossy().into_owned()],
            // Nothing listens here; thumbnail fetches fail fast unless a test overrides it
            thumbnail_base_url: "http://127.0.0.1:9/vi".to_string(),
            ..Config::default()
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{}", addr)
    }

    async fn spawn_app_with(script: &str, customize: impl FnOnce(&mut Config)) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path(), script);
        customize(&mut config);
        prepare_dirs(&config).await.unwrap();

        let upload_folder = config.upload_folder.clone();
        let download_dir = config.download_dir.clone();
        let base = spawn(router(AppState::new(config).unwrap())).await;

        TestApp {
            base,
            upload_folder,
            download_dir,
            _dir: dir,
        }
    }

    async fn spawn_app(script: &str) -> TestApp {
        spawn_app_with(script, |_| {}).await
    }

    async fn post(app: &TestApp, route: &str, form: Form) -> (StatusCode, Value) {
        let response = Client::new()
            .post(format!("{}{}", app.base, route))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    fn cookies(name: &str) -> Part {
        Part::bytes(b"# Netscape HTTP Cookie File\n".to_vec()).file_name(name.to_string())
    }

    #[tokio::test]
    async fn index_serves_html() {
        let app = spawn_app(ECHO_ARGS).await;

        let response = reqwest::get(format!("{}/", app.base)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.unwrap().contains("<form"));
    }

    #[tokio::test]
    async fn missing_url_is_bad_request() {
        let app = spawn_app(ECHO_ARGS).await;

        for route in ["/get_video_info", "/download"] {
            let (status, body) = post(&app, route, Form::new().text("format_id", "18")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{route}");
            assert_eq!(body, json!({"error": "No URL provided"}));
        }

        let (status, body) = post(&app, "/bulk_download", Form::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No URLs provided"}));
    }

    #[tokio::test]
    async fn multipart_body_without_parts_reports_the_missing_field() {
        let app = spawn_app(ECHO_ARGS).await;

        let expectations = [
            ("/get_video_info", "No URL provided"),
            ("/download", "No URL provided"),
            ("/bulk_download", "No URLs provided"),
        ];
        for (route, message) in expectations {
            let response = Client::new()
                .post(format!("{}{}", app.base, route))
                .header("content-type", "multipart/form-data; boundary=X")
                .body("--X--\r\n")
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{route}");
            let body: Value = response.json().await.unwrap();
            assert_eq!(body, json!({"error": message}), "{route}");
        }
    }

    #[tokio::test]
    async fn video_info_returns_normalized_formats() {
        let app = spawn_app(DUMP_JSON).await;

        let form = Form::new().text("url", "https://example.com/video");
        let (status, body) = post(&app, "/get_video_info", form).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Demo");
        assert_eq!(body["duration"], json!(19));
        assert_eq!(body["formats"].as_array().unwrap().len(), 1);
        assert_eq!(body["formats"][0]["format_id"], "18");
        assert!(body.get("local_thumbnail").is_none());
    }

    #[tokio::test]
    async fn tool_failure_is_reported_with_ok_status() {
        let app = spawn_app("printf 'ERROR: unsupported URL' >&2\nexit 1\n").await;

        let form = Form::new().text("url", "https://example.com/video");
        let (status, body) = post(&app, "/get_video_info", form).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "ERROR: unsupported URL"}));
    }

    #[tokio::test]
    async fn video_info_attaches_local_thumbnail() {
        let image_host = spawn(Router::new().route(
            "/vi/:id/maxresdefault.jpg",
            get(|| async { "jpeg-bytes" }),
        ))
        .await;
        let app = spawn_app_with(DUMP_JSON, |config| {
            config.thumbnail_base_url = format!("{}/vi", image_host);
        })
        .await;

        let form = Form::new().text("url", "https://www.youtube.com/watch?v=abc12345678");
        let (status, body) = post(&app, "/get_video_info", form).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["local_thumbnail"], "/uploads/thumbnails/abc12345678.jpg");

        let image = reqwest::get(format!("{}/uploads/thumbnails/abc12345678.jpg", app.base))
            .await
            .unwrap();
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(image.headers()["content-type"], "image/jpeg");
        assert_eq!(image.bytes().await.unwrap().as_ref(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn download_passes_format_cookies_and_output_dir() {
        let app = spawn_app(ECHO_ARGS).await;

        let form = Form::new()
            .text("url", "https://youtu.be/abc12345678")
            .text("format_id", "18")
            .part("cookies", cookies("cookies.txt"));
        let (status, body) = post(&app, "/download", form).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let expected = format!(
            "arg: -f\narg: 18\narg: --cookies\narg: {}\narg: -P\narg: {}\narg: https://youtu.be/abc12345678\n",
            app.upload_folder.join("cookies.txt").display(),
            app.download_dir.display()
        );
        assert_eq!(body["output"], expected.as_str());
        assert!(app.upload_folder.join("cookies.txt").is_file());
    }

    #[tokio::test]
    async fn disallowed_credential_file_is_dropped() {
        let app = spawn_app(ECHO_ARGS).await;

        let form = Form::new()
            .text("url", "https://youtu.be/abc12345678")
            .part("cookies", cookies("cookies.exe"));
        let (status, body) = post(&app, "/download", form).await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body["output"].as_str().unwrap().contains("--cookies"));
        let stored: Vec<_> = std::fs::read_dir(&app.upload_folder)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(stored, vec![std::ffi::OsString::from("thumbnails")]);
    }

    #[tokio::test]
    async fn failed_download_is_data_not_an_http_error() {
        let app = spawn_app(ECHO_ARGS).await;

        let form = Form::new().text("url", "https://example.com/bad");
        let (status, body) = post(&app, "/download", form).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["output"].as_str().unwrap().contains("ERROR: unsupported URL"));
    }

    #[tokio::test]
    async fn url_encoded_forms_are_accepted() {
        let app = spawn_app(ECHO_ARGS).await;

        let response = Client::new()
            .post(format!("{}/download", app.base))
            .header("content-type", "application/x-www-form-urlencoded")
            .body("url=https%3A%2F%2Fyoutu.be%2Fabc12345678")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert!(body["output"].as_str().unwrap().ends_with("arg: https://youtu.be/abc12345678\n"));
    }

    #[tokio::test]
    async fn bulk_download_keeps_order_and_skips_blank_lines() {
        let app = spawn_app(ECHO_ARGS).await;

        let form = Form::new().text("urls", "https://ok/1\n\nhttps://bad/2\n  \nhttps://ok/3\n");
        let (status, body) = post(&app, "/bulk_download", form).await;

        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        let summary: Vec<_> = results
            .iter()
            .map(|r| (r["url"].as_str().unwrap(), r["success"].as_bool().unwrap()))
            .collect();
        assert_eq!(
            summary,
            vec![("https://ok/1", true), ("https://bad/2", false), ("https://ok/3", true)]
        );
    }

    #[tokio::test]
    async fn empty_bulk_input_yields_no_results() {
        let app = spawn_app(ECHO_ARGS).await;

        let (status, body) = post(&app, "/bulk_download", Form::new().text("urls", "")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"results": []}));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = spawn_app_with(ECHO_ARGS, |config| config.max_content_length = 1024).await;

        let big = Part::bytes(vec![b'x'; 8 * 1024]).file_name("cookies.txt");
        let form = Form::new().text("url", "https://youtu.be/abc12345678").part("cookies", big);
        let response = Client::new()
            .post(format!("{}/download", app.base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!app.upload_folder.join("cookies.txt").exists());
    }

    #[tokio::test]
    async fn thumbnail_route_stays_inside_its_folder() {
        let app = spawn_app(ECHO_ARGS).await;
        std::fs::write(app.upload_folder.join("cookies.txt"), "secret").unwrap();

        for path in ["missing.jpg", "..%2Fcookies.txt", "%2E%2E/cookies.txt"] {
            let response = reqwest::get(format!("{}/uploads/thumbnails/{}", app.base, path))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}
