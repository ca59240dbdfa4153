mod common;

use axum::http::StatusCode;
use common::*;

fn assert_scoped_to(backend: &FakeBackend, tenant: &str) {
    let calls = backend.calls();
    assert!(!calls.is_empty());
    for call in calls {
        assert_eq!(call.context_tenant, tenant, "{} context", call.method);
        if let Some(message_tenant) = call.message_tenant {
            assert_eq!(message_tenant, tenant, "{} message", call.method);
        }
    }
}

#[tokio::test]
async fn query_cannot_override_tenant() {
    let backend = FakeBackend::new();
    let app = test_app(backend.clone());
    let token = access_token("seller", TENANT_A);

    let uri = format!("/sales?company_id={}&limit=10", TENANT_B);
    let response = send(&app, get(&uri, Some(&token))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_scoped_to(&backend, TENANT_A);
}

#[tokio::test]
async fn reads_by_id_carry_the_callers_tenant() {
    let backend = FakeBackend::new();
    let app = test_app(backend.clone());
    let token = access_token("admin", TENANT_B);

    for uri in ["/sales/s1", "/clients/c1", "/companies", "/branches", "/debts/payments/d1"] {
        let response = send(&app, get(uri, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }

    assert_scoped_to(&backend, TENANT_B);
}

#[tokio::test]
async fn company_is_the_callers_own() {
    let backend = FakeBackend::new();
    let app = test_app(backend.clone());
    let token = access_token("seller", TENANT_B);

    let response = send(&app, get("/companies", Some(&token))).await;

    assert_eq!(body_json(response).await["id"], TENANT_B);
}

#[tokio::test]
async fn every_checkout_step_is_scoped() {
    let backend = FakeBackend::new();
    let app = test_app(backend.clone());
    let token = access_token("seller", TENANT_A);

    let response = send(
        &app,
        post_json(
            "/debts/payments",
            Some(&token),
            serde_json::json!({
                "client_name": "Walk-in",
                "branch_id": "branch-1",
                "payment_method": "debt",
                "currency_code": "UZS",
                "paid_amount": 1000.0,
                "sold_products": [{"product_id": "p1", "quantity": 2, "sale_price": 5000.0}]
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let methods: Vec<_> = backend.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec!["create_client", "create_sale", "create_debt", "pay_debt"]);
    assert_scoped_to(&backend, TENANT_A);
}
