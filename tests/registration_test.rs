mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};

use common::*;
use retiro::database::registrations_repo;
use retiro::error::AppError;
use retiro::models::RegistrationStatus;
use retiro::services::registration_service;

#[tokio::test]
async fn registration_without_gateway_redirects_with_no_payment_fields() {
    let app = TestApp::new(None).await;

    let response = app
        .send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;
    assert_redirect(&response, "/status/1");

    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .expect("registration should be stored");
    assert_eq!(row.name, "Maria da Silva");
    assert_eq!(row.sex, "Feminino");
    assert_eq!(row.status(), RegistrationStatus::Pending);
    assert_eq!(row.payment_id, None);
    assert_eq!(row.qr_code, None);
    assert_eq!(row.qr_code_base64, None);
    assert_eq!(
        row.amount(),
        app.state.config.pricing.current_price(Utc::now()),
        "amount should come from the pricing policy at creation time"
    );
}

#[tokio::test]
async fn registration_with_gateway_attaches_returned_pix_payload() {
    let gateway = FakeGateway::new();
    let app = TestApp::new(Some(gateway.clone())).await;

    let response = app
        .send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;
    assert_redirect(&response, "/status/1");

    let expected = FakeGateway::intent_for("1", 1);
    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.payment_id.as_deref(), Some(expected.gateway_id.as_str()));
    assert_eq!(row.qr_code.as_deref(), Some(expected.qr_payload.as_str()));
    assert_eq!(row.qr_code_base64.as_deref(), Some(expected.qr_image.as_str()));
    assert_eq!(row.status(), RegistrationStatus::Pending);

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].external_reference, "1");
    assert_eq!(requests[0].amount, row.amount());
    assert_eq!(requests[0].payer.first_name, "Maria");
    assert_eq!(requests[0].payer.cpf, "12345678901");
    assert_eq!(requests[0].description, "Inscrição Retiro (Feminino) - ID 1");

    let page = body_string(app.send(get("/status/1")).await).await;
    assert!(page.contains(&expected.qr_payload));
}

#[tokio::test]
async fn gateway_failure_keeps_registration_pending_and_offers_retry() {
    let gateway = FakeGateway::new();
    gateway.fail_create.store(true, Ordering::SeqCst);
    let app = TestApp::new(Some(gateway.clone())).await;

    let response = app
        .send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;
    assert_redirect(&response, "/status/1");

    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.payment_id, None);
    assert_eq!(row.status(), RegistrationStatus::Pending);

    let page = body_string(app.send(get("/status/1")).await).await;
    assert!(page.contains("PIX indisponível"));
    assert!(page.contains("/status/1/pagamento"));

    gateway.fail_create.store(false, Ordering::SeqCst);
    let response = app
        .send(post_form("/status/1/pagamento", "", None))
        .await;
    assert_redirect(&response, "/status/1");

    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.payment_id.as_deref(), Some("mp-1"));
}

#[tokio::test]
async fn retry_does_not_replace_an_attached_payment() {
    let gateway = FakeGateway::new();
    let app = TestApp::new(Some(gateway.clone())).await;

    app.send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;
    let response = app
        .send(post_form("/status/1/pagamento", "", None))
        .await;
    assert_redirect(&response, "/status/1");

    assert_eq!(gateway.requests().len(), 1, "no second PIX should be requested");
    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.payment_id.as_deref(), Some("mp-1"));
}

#[tokio::test]
async fn concurrent_retries_request_a_single_pix() {
    let gateway = FakeGateway::new();
    gateway.fail_create.store(true, Ordering::SeqCst);
    let app = TestApp::new(Some(gateway.clone())).await;
    app.send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;

    gateway.fail_create.store(false, Ordering::SeqCst);
    gateway.create_delay_ms.store(50, Ordering::SeqCst);
    let (first, second) = tokio::join!(
        app.send(post_form("/status/1/pagamento", "", None)),
        app.send(post_form("/status/1/pagamento", "", None)),
    );
    assert_redirect(&first, "/status/1");
    assert_redirect(&second, "/status/1");

    assert_eq!(gateway.requests().len(), 1, "only one PIX may reach the gateway");
    let row = registrations_repo::get_registration(&app.pool, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.payment_id.as_deref(), Some("mp-1"));
}

#[tokio::test]
async fn retry_while_a_pix_request_is_in_flight_skips_the_gateway() {
    let gateway = FakeGateway::new();
    gateway.fail_create.store(true, Ordering::SeqCst);
    let app = TestApp::new(Some(gateway.clone())).await;
    app.send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;
    gateway.fail_create.store(false, Ordering::SeqCst);

    let now = Utc::now().timestamp();
    let claimed = registrations_repo::claim_payment(&app.pool, 1, "held", now, now - 300)
        .await
        .unwrap();
    assert_eq!(claimed, 1);

    let response = app
        .send(post_form("/status/1/pagamento", "", None))
        .await;
    assert_redirect(&response, "/status/1");
    assert!(gateway.requests().is_empty());

    registrations_repo::release_payment_claim(&app.pool, 1, "held")
        .await
        .unwrap();
    app.send(post_form("/status/1/pagamento", "", None))
        .await;
    assert_eq!(gateway.requests().len(), 1);
}

#[tokio::test]
async fn abandoned_claim_does_not_block_retries_forever() {
    let pool = test_pool().await;
    let id = registration_service::create_registration(
        &pool,
        &test_pricing(),
        &sample_form("Ana", "Feminino"),
        Utc::now(),
    )
    .await
    .unwrap();

    let long_ago = Utc::now().timestamp() - 3_600;
    registrations_repo::claim_payment(&pool, id, "crashed", long_ago, long_ago - 300)
        .await
        .unwrap();

    let now = Utc::now().timestamp();
    let fresh = registrations_repo::claim_payment(&pool, id, "fresh", now, now - 300)
        .await
        .unwrap();
    assert_eq!(fresh, 1);
    let again = registrations_repo::claim_payment(&pool, id, "third", now, now - 300)
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn non_numeric_status_ids_render_the_not_found_page() {
    let gateway = FakeGateway::new();
    let app = TestApp::new(Some(gateway.clone())).await;

    let response = app.send(get("/status/abc")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Não encontrado."));

    let response = app
        .send(post_form("/status/abc/pagamento", "", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn status_page_without_gateway_has_no_retry_button() {
    let app = TestApp::new(None).await;
    app.send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;

    let response = app.send(get("/status/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("Pendente"));
    assert!(!page.contains("/status/1/pagamento"));
}

#[tokio::test]
async fn unknown_status_page_is_not_found() {
    let app = TestApp::new(None).await;
    let response = app.send(get("/status/42")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Não encontrado."));
}

#[tokio::test]
async fn check_status_api_reports_status_or_error() {
    let app = TestApp::new(None).await;
    app.send(post_form("/inscrever", SAMPLE_FORM_BODY, None))
        .await;

    let body = body_string(app.send(get("/api/check-status/1")).await).await;
    assert_eq!(body, r#"{"status":"Pendente"}"#);

    registration_service::update_status(&app.pool, 1, RegistrationStatus::Paid)
        .await
        .unwrap();
    let body = body_string(app.send(get("/api/check-status/1")).await).await;
    assert_eq!(body, r#"{"status":"Pago"}"#);

    let body = body_string(app.send(get("/api/check-status/99")).await).await;
    assert_eq!(body, r#"{"status":"Erro"}"#);

    let body = body_string(app.send(get("/api/check-status/abc")).await).await;
    assert_eq!(body, r#"{"status":"Erro"}"#);
}

#[tokio::test]
async fn amount_is_fixed_at_creation_time() {
    let pool = test_pool().await;
    let pricing = test_pricing();
    let early = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

    let id = registration_service::create_registration(
        &pool,
        &pricing,
        &sample_form("João Pedro", "Masculino"),
        early,
    )
    .await
    .unwrap();

    let later = early + Duration::days(60);
    assert_eq!(pricing.current_price(later), pricing.tier2);

    registration_service::update_status(&pool, id, RegistrationStatus::Paid)
        .await
        .unwrap();
    let row = registration_service::get_registration(&pool, id).await.unwrap();
    assert_eq!(row.amount(), pricing.tier1);
    assert_eq!(row.status(), RegistrationStatus::Paid);
    assert_eq!(row.created_at, early.naive_utc());
}

#[tokio::test]
async fn update_status_twice_matches_once() {
    let pool = test_pool().await;
    let id = registration_service::create_registration(
        &pool,
        &test_pricing(),
        &sample_form("Ana", "Feminino"),
        Utc::now(),
    )
    .await
    .unwrap();

    registration_service::update_status(&pool, id, RegistrationStatus::Paid)
        .await
        .unwrap();
    let once = registration_service::get_registration(&pool, id).await.unwrap();

    registration_service::update_status(&pool, id, RegistrationStatus::Paid)
        .await
        .unwrap();
    let twice = registration_service::get_registration(&pool, id).await.unwrap();

    assert_eq!(once.status, twice.status);
    assert_eq!(once.amount_cents, twice.amount_cents);
    assert_eq!(once.payment_id, twice.payment_id);
}

#[tokio::test]
async fn paid_status_never_reverts_to_pending() {
    let pool = test_pool().await;
    let id = registration_service::create_registration(
        &pool,
        &test_pricing(),
        &sample_form("Ana", "Feminino"),
        Utc::now(),
    )
    .await
    .unwrap();

    registration_service::update_status(&pool, id, RegistrationStatus::Paid)
        .await
        .unwrap();
    let matched = registration_service::update_status(&pool, id, RegistrationStatus::Pending)
        .await
        .unwrap();

    assert!(!matched);
    let row = registration_service::get_registration(&pool, id).await.unwrap();
    assert_eq!(row.status(), RegistrationStatus::Paid);
}

#[tokio::test]
async fn attach_payment_rejects_unknown_id_and_different_payment() {
    let pool = test_pool().await;
    let intent = FakeGateway::intent_for("1", 1);

    let err = registration_service::attach_payment(&pool, 1, &intent)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let id = registration_service::create_registration(
        &pool,
        &test_pricing(),
        &sample_form("Ana", "Feminino"),
        Utc::now(),
    )
    .await
    .unwrap();
    registration_service::attach_payment(&pool, id, &intent)
        .await
        .unwrap();
    // Same payment again is accepted.
    registration_service::attach_payment(&pool, id, &intent)
        .await
        .unwrap();

    let other = FakeGateway::intent_for("1", 2);
    let err = registration_service::attach_payment(&pool, id, &other)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PaymentConflict { registration_id } if registration_id == id));

    let row = registration_service::get_registration(&pool, id).await.unwrap();
    assert_eq!(row.payment_id.as_deref(), Some("mp-1"));
}

#[tokio::test]
async fn registrations_are_listed_newest_first() {
    let pool = test_pool().await;
    let pricing = test_pricing();
    for name in ["Primeiro", "Segundo", "Terceiro"] {
        registration_service::create_registration(
            &pool,
            &pricing,
            &sample_form(name, "Masculino"),
            Utc::now(),
        )
        .await
        .unwrap();
    }

    let rows = registrations_repo::list_registrations(&pool, None)
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Terceiro", "Segundo", "Primeiro"]);
}

#[tokio::test]
async fn home_page_shows_price_and_gallery() {
    let app = TestApp::new(None).await;
    retiro::database::gallery_repo::insert_gallery_item(
        &app.pool,
        retiro::models::GalleryKind::Image,
        "/uploads/1-foto.jpg",
        "Culto de abertura",
    )
    .await
    .unwrap();

    let response = app.send(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    let price = app.state.config.pricing.current_price(Utc::now()).to_string();
    assert!(page.contains(&price));
    assert!(page.contains("Culto de abertura"));
}
