use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Amount;
use server::{BASE_PATH, ServerState, router};

fn app() -> Router {
    router(ServerState::new(Amount::new(dec!(380))))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("{BASE_PATH}{path}"))
        .body(Body::empty())
        .unwrap()
}

fn post(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("{BASE_PATH}/"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(path: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("{BASE_PATH}{path}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn list_requires_period() {
    let app = app();
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("mes is required"));

    let (status, _) = send(&app, get("/?mes=2025-13")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_period_lists_nothing() {
    let app = app();
    let (status, body) = send(&app, get("/?mes=2025-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));
}

#[tokio::test]
async fn create_then_list_and_summarize() {
    let app = app();
    let (status, body) = send(
        &app,
        post(json!({"descricao": "Cinema", "valor": 50, "mes": "2025-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["id"], json!(1));
    assert_eq!(body["data"]["descricao"], json!("Cinema"));
    assert_eq!(body["data"]["valor"], json!(50.0));
    assert!(body["data"]["data"].as_str().is_some());

    let (_, body) = send(&app, get("/?mes=2025-01")).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    let (_, body) = send(&app, get("/?mes=2025-02")).await;
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(&app, get("/resumo/?mes=2025-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "mes": "2025-01",
            "total_gasto": 50.0,
            "saldo_restante": 330.0,
            "quantidade_gastos": 1,
            "orcamento_mensal": 380.0
        })
    );

    let (_, body) = send(&app, get("/meses-com-gastos/")).await;
    assert_eq!(body["data"], json!(["2025-01"]));
}

#[tokio::test]
async fn create_reports_every_invalid_field() {
    let app = app();
    let (status, body) = send(
        &app,
        post(json!({"descricao": "  ", "valor": -5, "mes": "2025-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["details"],
        json!({"descricao": ["this field is required"], "valor": ["must be positive"]})
    );

    let (status, body) = send(&app, post(json!({"descricao": "Cinema", "valor": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("mes is required"));
}

#[tokio::test]
async fn oversized_amounts_are_rejected_and_summary_stays_up() {
    let app = app();
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            post(json!({"descricao": "big", "valor": "50000000000000000000000000000", "mes": "2025-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["details"],
            json!({"valor": ["ensure this value is less than or equal to 1000000000"]})
        );
    }

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            post(json!({"descricao": "big", "valor": "1000000000", "mes": "2025-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/resumo/?mes=2025-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantidade_gastos"], json!(2));
    assert_eq!(body["data"]["total_gasto"], json!(2_000_000_000.0));
}

#[tokio::test]
async fn delete_removes_and_then_reports_not_found() {
    let app = app();
    send(
        &app,
        post(json!({"descricao": "Cinema", "valor": 50, "mes": "2025-01"})),
    )
    .await;

    let (status, body) = send(&app, delete("/1/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, body) = send(&app, delete("/1/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(&app, delete("/7/?mes=2030-01")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
