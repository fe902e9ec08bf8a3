//! End-to-end HTTP flow against an in-memory store.
//!
//! Drives the real router with `tower::ServiceExt::oneshot`, covering the
//! guest scan-to-order path, staff board actions and admin catalog CRUD.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use dine_server::core::{Config, ServerState};
use dine_server::store::Store;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::{DiningTableCreate, MenuItemCreate, RestaurantCreate};
use tower::ServiceExt;

struct TestApp {
    state: ServerState,
    router: Router,
    menu_item_id: String,
}

fn spawn_app() -> TestApp {
    let work_dir = std::env::temp_dir().join(format!("dine-test-{}", uuid::Uuid::new_v4()));
    let config = Config::with_overrides(work_dir.to_string_lossy().into_owned(), 0);
    let store = Store::open_in_memory().unwrap();
    let state = ServerState::with_store(&config, store).unwrap();

    let restaurant = state
        .catalog
        .create_restaurant(RestaurantCreate {
            slug: "golden-wok".into(),
            name: "Golden Wok".into(),
        })
        .unwrap();
    state
        .catalog
        .create_table(DiningTableCreate {
            restaurant_id: restaurant.id.clone(),
            label: "T1".into(),
        })
        .unwrap();
    let item = state
        .catalog
        .create_menu_item(MenuItemCreate {
            restaurant_id: restaurant.id.clone(),
            name: "Fried Rice".into(),
            price_cents: 1250,
        })
        .unwrap();

    let router = dine_server::api::router(state.clone());
    TestApp {
        state,
        router,
        menu_item_id: item.id,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    let value = format!("Bearer {}", token);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        value.parse().unwrap(),
    );
    request
}

#[tokio::test]
async fn health_check() {
    let app = spawn_app();
    let (status, body) = send(&app.router, get_request("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn guest_scan_to_order_flow() {
    let app = spawn_app();

    // Scan landing page
    let (status, menu) = send(&app.router, get_request("/api/menu/golden-wok/T1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["restaurant_name"], "Golden Wok");
    assert_eq!(menu["table_label"], "T1");
    assert_eq!(menu["items"].as_array().unwrap().len(), 1);

    // Open a cart session
    let (status, session) = send(
        &app.router,
        json_request(
            "POST",
            "/api/sessions",
            json!({"restaurant_slug": "golden-wok", "table_label": "T1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "active");
    let session_id = session["id"].as_str().unwrap().to_string();

    // Add two portions
    let (status, cart) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/sessions/{}/cart", session_id),
            json!({"op": "add", "menu_item_id": app.menu_item_id, "quantity": 2, "customizations": ["no onion"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_cents"], 2500);

    // Drop to one portion
    let (status, cart) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/sessions/{}/cart", session_id),
            json!({"op": "update", "menu_item_id": app.menu_item_id, "quantity": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_cents"], 1250);

    // Place the order
    let (status, order) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/sessions/{}/order", session_id),
            json!({"name": "Alice"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_cents"], 1250);
    let order_id = order["id"].as_str().unwrap().to_string();

    // Guest can poll the order without auth
    let (status, fetched) = send(&app.router, get_request(&format!("/api/orders/{}", order_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], order_id.as_str());

    // Ordering twice from the same session is rejected
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            &format!("/api/sessions/{}/order", session_id),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E2005");
}

#[tokio::test]
async fn unknown_scan_target_is_not_found() {
    let app = spawn_app();
    let (status, body) = send(&app.router, get_request("/api/menu/no-such-place/T1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
}

#[tokio::test]
async fn empty_cart_cannot_convert() {
    let app = spawn_app();
    let (_, session) = send(
        &app.router,
        json_request(
            "POST",
            "/api/sessions",
            json!({"restaurant_slug": "golden-wok", "table_label": "T1"}),
        ),
    )
    .await;
    let session_id = session["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        json_request("POST", &format!("/api/sessions/{}/order", session_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E2004");
}

async fn place_order(app: &TestApp) -> String {
    let (_, session) = send(
        &app.router,
        json_request(
            "POST",
            "/api/sessions",
            json!({"restaurant_slug": "golden-wok", "table_label": "T1"}),
        ),
    )
    .await;
    let session_id = session["id"].as_str().unwrap().to_string();
    send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/sessions/{}/cart", session_id),
            json!({"op": "add", "menu_item_id": app.menu_item_id, "quantity": 1, "customizations": []}),
        ),
    )
    .await;
    let (_, order) = send(
        &app.router,
        json_request("POST", &format!("/api/sessions/{}/order", session_id), json!({})),
    )
    .await;
    order["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn staff_board_requires_token() {
    let app = spawn_app();
    let order_id = place_order(&app).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/orders/{}/status", order_id),
            json!({"status": "confirmed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E1001");
}

#[tokio::test]
async fn staff_can_advance_order_status() {
    let app = spawn_app();
    let order_id = place_order(&app).await;
    let token = app
        .state
        .jwt_service
        .generate_token("staff-1", "Bob", "staff")
        .unwrap();

    for target in ["confirmed", "preparing", "ready", "completed"] {
        let request = with_bearer(
            json_request(
                "PUT",
                &format!("/api/orders/{}/status", order_id),
                json!({"status": target}),
            ),
            &token,
        );
        let (status, order) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK, "transition to {}", target);
        assert_eq!(order["status"], target);
    }

    // Terminal state rejects anything further
    let request = with_bearer(
        json_request(
            "PUT",
            &format!("/api/orders/{}/status", order_id),
            json!({"status": "cancelled"}),
        ),
        &token,
    );
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn staff_cannot_skip_transition_steps() {
    let app = spawn_app();
    let order_id = place_order(&app).await;
    let token = app
        .state
        .jwt_service
        .generate_token("staff-1", "Bob", "staff")
        .unwrap();

    let request = with_bearer(
        json_request(
            "PUT",
            &format!("/api/orders/{}/status", order_id),
            json!({"status": "completed"}),
        ),
        &token,
    );
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E3001");

    // Order untouched
    let (_, order) = send(&app.router, get_request(&format!("/api/orders/{}", order_id))).await;
    assert_eq!(order["status"], "pending");
}

#[tokio::test]
async fn staff_board_lists_orders() {
    let app = spawn_app();
    let order_id = place_order(&app).await;
    let token = app
        .state
        .jwt_service
        .generate_token("staff-1", "Bob", "staff")
        .unwrap();
    let restaurant_id = app.state.catalog.list_restaurants()[0].id.clone();

    let request = with_bearer(
        get_request(&format!(
            "/api/orders?restaurant_id={}&status=pending",
            restaurant_id
        )),
        &token,
    );
    let (status, orders) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id.as_str());
}

#[tokio::test]
async fn admin_routes_reject_plain_staff() {
    let app = spawn_app();
    let token = app
        .state
        .jwt_service
        .generate_token("staff-1", "Bob", "staff")
        .unwrap();

    let request = with_bearer(
        json_request(
            "POST",
            "/api/admin/restaurants",
            json!({"slug": "new-place", "name": "New Place"}),
        ),
        &token,
    );
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E1004");
}

#[tokio::test]
async fn admin_manages_catalog() {
    let app = spawn_app();
    let token = app
        .state
        .jwt_service
        .generate_token("admin-1", "Eve", "admin")
        .unwrap();

    let request = with_bearer(
        json_request(
            "POST",
            "/api/admin/restaurants",
            json!({"slug": "sea-breeze", "name": "Sea Breeze"}),
        ),
        &token,
    );
    let (status, restaurant) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let restaurant_id = restaurant["id"].as_str().unwrap().to_string();

    // Duplicate slug is a conflict
    let request = with_bearer(
        json_request(
            "POST",
            "/api/admin/restaurants",
            json!({"slug": "sea-breeze", "name": "Copycat"}),
        ),
        &token,
    );
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");

    let request = with_bearer(
        json_request(
            "POST",
            "/api/admin/tables",
            json!({"restaurant_id": restaurant_id, "label": "A1"}),
        ),
        &token,
    );
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = with_bearer(
        json_request(
            "POST",
            "/api/admin/menu-items",
            json!({"restaurant_id": restaurant_id, "name": "Clam Soup", "price_cents": 900}),
        ),
        &token,
    );
    let (status, item) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let item_id = item["id"].as_str().unwrap().to_string();

    // New restaurant is scannable
    let (status, menu) = send(&app.router, get_request("/api/menu/sea-breeze/A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["items"].as_array().unwrap().len(), 1);

    // Deactivate the item, menu goes empty
    let request = with_bearer(
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/menu-items/{}", item_id))
            .body(Body::empty())
            .unwrap(),
        &token,
    );
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, menu) = send(&app.router, get_request("/api/menu/sea-breeze/A1")).await;
    assert!(menu["items"].as_array().unwrap().is_empty());

    // Deactivate the restaurant, scanning now 404s
    let request = with_bearer(
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/restaurants/{}", restaurant_id))
            .body(Body::empty())
            .unwrap(),
        &token,
    );
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app.router, get_request("/api/menu/sea-breeze/A1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_snapshot_survives_price_change() {
    let app = spawn_app();
    let order_id = place_order(&app).await;

    app.state
        .catalog
        .update_menu_item(
            &app.menu_item_id,
            shared::MenuItemUpdate {
                name: None,
                price_cents: Some(9999),
                is_available: None,
            },
        )
        .unwrap();

    let (_, order) = send(&app.router, get_request(&format!("/api/orders/{}", order_id))).await;
    assert_eq!(order["total_cents"], 1250);
    assert_eq!(order["items"][0]["price_cents"], 1250);
}
