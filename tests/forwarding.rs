//! End-to-end forwarding tests against a mock backend.

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;

use api_router::config::OffloadConfig;

mod common;
use common::{echo_backend, router_config, start_backend, start_router, BackendProbe};

const CHUNK: usize = 40 * 1024;

#[tokio::test]
async fn get_relays_backend_response_byte_for_byte() {
    let probe = BackendProbe::default();
    let hit_probe = probe.clone();
    let backend = start_backend(Router::new().route(
        "/source/home:king/pkg",
        get(move || {
            hit_probe.hit();
            async { ([(CONTENT_TYPE, "text/xml")], "<directory count=\"2\"/>") }
        }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::get(format!("{base}/source/home:king/pkg"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/xml"));
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "inline"
    );
    assert!(response.headers().contains_key("x-opensuse-apiversion"));
    assert_eq!(response.text().await.unwrap(), "<directory count=\"2\"/>");
    assert_eq!(probe.hits(), 1, "backend must be called exactly once");
}

#[tokio::test]
async fn binary_content_is_not_inlined() {
    let backend = start_backend(Router::new().route(
        "/build/pkg.rpm",
        get(|| async { ([(CONTENT_TYPE, "application/x-rpm")], vec![0u8; 16]) }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::get(format!("{base}/build/pkg.rpm")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().get("content-disposition").is_none());
}

#[tokio::test]
async fn x_forward_offload_never_touches_the_backend() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let mut config = router_config(backend);
    config.offload = OffloadConfig::XForward;
    let backend_authority = format!("{}:{}", config.backend.host, config.backend.port);
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::get(format!("{base}/source/pkg?rev=7")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("x-forward").unwrap().to_str().unwrap(),
        format!("http://{backend_authority}/source/pkg?rev=7")
    );
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "no-transform"
    );
    assert_eq!(response.text().await.unwrap(), "");
    assert_eq!(probe.hits(), 0);
}

#[tokio::test]
async fn x_rewrite_offload_emits_uri_and_host() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let mut config = router_config(backend);
    config.offload = OffloadConfig::XRewrite {
        host: "download.example.org".to_string(),
    };
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::get(format!("{base}/published/repo")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("x-rewrite-uri").unwrap(),
        "/published/repo"
    );
    assert_eq!(
        response.headers().get("x-rewrite-host").unwrap(),
        "download.example.org"
    );
    assert_eq!(response.content_length(), Some(0));
    assert_eq!(probe.hits(), 0);
}

#[tokio::test]
async fn nginx_offload_emits_accel_redirect() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let mut config = router_config(backend);
    config.offload = OffloadConfig::NginxAccel {
        prefix: "/internal".to_string(),
    };
    let backend_authority = format!("{}:{}", config.backend.host, config.backend.port);
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::get(format!("{base}/build/pkg/_log")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("x-accel-redirect")
            .unwrap()
            .to_str()
            .unwrap(),
        format!("/internal/http/{backend_authority}/build/pkg/_log")
    );
    assert_eq!(probe.hits(), 0);
}

#[tokio::test]
async fn put_round_trips_bodies_around_the_chunk_boundary() {
    let probe = BackendProbe::default();
    let record = probe.clone();
    let backend = start_backend(Router::new().route(
        "/source/pkg/archive",
        put(move |request: Request| {
            let probe = record.clone();
            async move {
                let (parts, body) = request.into_parts();
                let content_type = parts
                    .headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
                probe.record(content_type, bytes);
                ([(CONTENT_TYPE, "text/xml")], "<status code=\"ok\"/>")
            }
        }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;
    let client = reqwest::Client::new();

    for size in [0, 1, CHUNK - 1, CHUNK, CHUNK + 1, CHUNK * 3] {
        let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let response = client
            .put(format!("{base}/source/pkg/archive"))
            .body(payload.clone())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200, "size {size}");
        assert_eq!(
            probe.last_body().unwrap(),
            Bytes::from(payload),
            "size {size}"
        );
    }
}

#[tokio::test]
async fn form_post_forwards_the_encoded_body_verbatim() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/source/pkg?cmd=commit"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("comment=fix+build&rev=3")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        probe.last_body().unwrap(),
        Bytes::from("comment=fix+build&rev=3")
    );
    assert_eq!(
        probe.last_content_type().as_deref(),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn post_with_opaque_body_is_staged_and_forwarded() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let payload = vec![0x5A; CHUNK * 2 + 11];
    let response = reqwest::Client::new()
        .post(format!("{base}/source/pkg/_aggregate"))
        .header(CONTENT_TYPE, "text/xml")
        .body(payload.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(probe.last_body().unwrap(), Bytes::from(payload));
    assert_eq!(probe.last_content_type().as_deref(), Some("text/xml"));
}

#[tokio::test]
async fn delete_is_forwarded_and_relayed_inline() {
    let probe = BackendProbe::default();
    let hit_probe = probe.clone();
    let backend = start_backend(Router::new().route(
        "/source/pkg",
        delete(move || {
            hit_probe.hit();
            async { ([(CONTENT_TYPE, "text/xml")], "<status code=\"ok\"/>") }
        }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::Client::new()
        .delete(format!("{base}/source/pkg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "inline"
    );
    assert_eq!(probe.hits(), 1);
    assert_eq!(response.text().await.unwrap(), "<status code=\"ok\"/>");
}

#[tokio::test]
async fn backend_timeout_during_put_maps_to_408() {
    let backend = start_backend(Router::new().route(
        "/source/pkg/big",
        put(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            "too late"
        }),
    ))
    .await;
    let mut config = router_config(backend);
    config.backend.read_timeout_secs = 1;
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::Client::new()
        .put(format!("{base}/source/pkg/big"))
        .header("accept", "application/json")
        .body("slow upload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 408);
    assert_eq!(
        response.headers().get("x-opensuse-errorcode").unwrap(),
        "timeout_error"
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["errorcode"], "timeout_error");
}

#[tokio::test]
async fn backend_error_payload_is_relayed_with_forced_origin() {
    let backend = start_backend(Router::new().route(
        "/source/secret",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                [(CONTENT_TYPE, "text/xml")],
                "<status code=\"403\"><summary>no permission</summary></status>",
            )
        }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::get(format!("{base}/source/secret")).await.unwrap();

    assert_eq!(response.status(), 403);
    let body = response.text().await.unwrap();
    assert!(body.contains("origin=\"backend\""), "got: {body}");
    assert!(body.contains("<summary>no permission</summary>"));
}

#[tokio::test]
async fn backend_404_maps_to_not_found() {
    let backend = start_backend(Router::new()).await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::get(format!("{base}/source/missing")).await.unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("x-opensuse-errorcode").unwrap(),
        "not_found"
    );
}

#[tokio::test]
async fn unreachable_backend_is_an_uncaught_exception() {
    let backend = start_backend(Router::new()).await;
    let mut config = router_config(backend);
    // Point at a port nothing listens on.
    config.backend.port = 1;
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::get(format!("{base}/source/pkg")).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(
        response.headers().get("x-opensuse-errorcode").unwrap(),
        "uncaught_exception"
    );
}

#[tokio::test]
async fn unsupported_method_is_not_route() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::PATCH, format!("{base}/source/pkg"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("x-opensuse-errorcode").unwrap(),
        "not_route"
    );
    assert_eq!(probe.hits(), 0);
}

#[tokio::test]
async fn login_requirement_returns_a_challenge() {
    let probe = BackendProbe::default();
    let backend = start_backend(echo_backend(probe.clone())).await;
    let mut config = router_config(backend);
    config.auth.require_login = true;
    let (base, _shutdown) = start_router(config).await;
    let client = reqwest::Client::new();

    let anonymous = client.get(format!("{base}/source")).send().await.unwrap();
    assert_eq!(anonymous.status(), 401);
    assert_eq!(
        anonymous.headers().get("www-authenticate").unwrap(),
        "basic realm=\"API login\""
    );
    assert_eq!(probe.hits(), 0);

    let identified = client
        .get(format!("{base}/source"))
        .header("x-username", "king")
        .send()
        .await
        .unwrap();
    assert_eq!(identified.status(), 200);
    assert_eq!(probe.hits(), 1);
}

#[tokio::test]
async fn api_version_header_is_set_on_error_paths_too() {
    let backend = start_backend(Router::new()).await;
    let mut config = router_config(backend);
    config.api.version = "2.10.5".to_string();
    let (base, _shutdown) = start_router(config).await;

    let response = reqwest::get(format!("{base}/missing")).await.unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers().get("x-opensuse-apiversion").unwrap(),
        "2.10.5"
    );
}

#[tokio::test]
async fn post_route_forwards_query_string() {
    let probe = BackendProbe::default();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(String::new()));
    let seen_in = seen.clone();
    let record = probe.clone();
    let backend = start_backend(Router::new().route(
        "/source/pkg",
        post(move |request: Request| {
            let seen = seen_in.clone();
            let probe = record.clone();
            async move {
                *seen.lock().unwrap() = request.uri().to_string();
                probe.hit();
                ([(CONTENT_TYPE, "text/xml")], "<status code=\"ok\"/>")
            }
        }),
    ))
    .await;
    let (base, _shutdown) = start_router(router_config(backend)).await;

    reqwest::Client::new()
        .post(format!("{base}/source/pkg?cmd=rebuild&arch=x86_64"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("")
        .send()
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), "/source/pkg?cmd=rebuild&arch=x86_64");
}
