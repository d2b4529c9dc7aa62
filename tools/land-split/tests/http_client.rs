//! The HTTP client against a local axum stand-in for the land-deals backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use land_split::cache::{ResponseCache, TtlCache};
use land_split::client::HttpPaymentApi;
use land_split::config::Config;
use landdeal_common::api::{submit_payment, ApiError, PaymentApi};
use landdeal_common::form::{FinalizedSplit, SplitForm};
use landdeal_common::party::{PartyId, PartyShare, PartyType};
use landdeal_common::payment::{DealId, PartyPayload, PaymentDraft, PaymentRequest, SubmitRoute};
use landdeal_common::split::SplitConfig;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

#[derive(Default)]
struct Backend {
    roster_hits: usize,
    auth: Vec<Option<String>>,
    payments: Vec<(u64, bool, Value)>,
    investor_to_owner: Vec<Value>,
    investor_route_enabled: bool,
}

type Shared = Arc<Mutex<Backend>>;

async fn deal(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let mut backend = state.lock().unwrap();
    backend.roster_hits += 1;
    backend.auth.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );
    if id != 124 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": 124,
        "project_name": "Riverside plots",
        "owners": [{"id": 1, "name": "Asha"}],
        "investors": [{"id": 9, "investor_name": "Ravi"}],
        "buyers": []
    })))
}

async fn create_payment(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let force = query.get("force").is_some_and(|v| v == "true");
    let amount = body["amount"].as_f64().unwrap_or_default();
    let parties_total: f64 = body["parties"]
        .as_array()
        .map(|parties| parties.iter().filter_map(|p| p["amount"].as_f64()).sum())
        .unwrap_or_default();
    if !force && (amount - parties_total).abs() > 0.01 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "party_amount_mismatch",
                "payment_amount": amount,
                "parties_total": parties_total
            })),
        );
    }
    state.lock().unwrap().payments.push((id, force, body));
    (
        StatusCode::CREATED,
        Json(json!({"message": "Payment created", "payment_id": 77})),
    )
}

async fn investor_to_owner(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut backend = state.lock().unwrap();
    if !backend.investor_route_enabled {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"})));
    }
    backend.investor_to_owner.push(body);
    (
        StatusCode::CREATED,
        Json(json!({"message": "Investor payment tracked", "payment_id": 88})),
    )
}

async fn spawn_backend(backend: Backend) -> (String, Shared) {
    let state = Arc::new(Mutex::new(backend));
    let app = Router::new()
        .route("/api/deals/{id}", get(deal))
        .route("/api/payments/{id}", post(create_payment))
        .route("/api/payments/{id}/investor-to-owner", post(investor_to_owner))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn client(config: &Config) -> (HttpPaymentApi, Arc<TtlCache>) {
    let cache = Arc::new(TtlCache::new(config.cache_ttl));
    let api = HttpPaymentApi::new(config, cache.clone()).unwrap();
    (api, cache)
}

fn draft(amount: rust_decimal::Decimal) -> PaymentDraft {
    PaymentDraft::new(amount, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
}

#[tokio::test]
async fn test_roster_is_cached_and_authorized() {
    let (url, state) = spawn_backend(Backend::default()).await;
    let mut config = Config::for_url(url);
    config.token = Some("secret".to_string());
    let (api, cache) = client(&config);

    let roster = api.deal_participants(DealId(124)).await.unwrap();
    assert_eq!(roster.participants().len(), 2);
    assert_eq!(roster.investors[0].investor_name.as_deref(), Some("Ravi"));
    assert!(cache.get("deal:124").is_some());

    let again = api.deal_participants(DealId(124)).await.unwrap();
    assert_eq!(again, roster);

    let backend = state.lock().unwrap();
    assert_eq!(backend.roster_hits, 1);
    assert_eq!(backend.auth, vec![Some("Bearer secret".to_string())]);
}

#[tokio::test]
async fn test_missing_deal_reports_status() {
    let (url, _state) = spawn_backend(Backend::default()).await;
    let (api, cache) = client(&Config::for_url(url));
    let err = api.deal_participants(DealId(5)).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Not Found".to_string()
        }
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_amount_mismatch_then_force() {
    let (url, state) = spawn_backend(Backend::default()).await;
    let (api, _cache) = client(&Config::for_url(url));
    let split = FinalizedSplit {
        payment_total: dec!(100),
        parties: vec![
            PartyPayload {
                party_type: PartyType::Owner,
                party_id: Some(PartyId(1)),
                amount: Some(dec!(60)),
                percentage: None,
            },
            PartyPayload {
                party_type: PartyType::Other,
                party_id: None,
                amount: Some(dec!(30)),
                percentage: None,
            },
        ],
        force: false,
        warnings: vec![],
    };
    let request = PaymentRequest::new(&draft(dec!(100)), &split);

    let err = api
        .create_payment(DealId(124), &request, false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::PartyAmountMismatch {
            payment_amount: dec!(100),
            parties_total: dec!(90)
        }
    );

    let created = api.create_payment(DealId(124), &request, true).await.unwrap();
    assert_eq!(created.payment_id, Some(77));
    let backend = state.lock().unwrap();
    assert_eq!(backend.payments.len(), 1);
    assert_eq!(backend.payments[0].0, 124);
    assert!(backend.payments[0].1);
}

fn investor_owner_form() -> SplitForm {
    SplitForm::with_parties(
        SplitConfig::default(),
        Some(dec!(250000)),
        vec![
            PartyShare::listed(PartyType::Investor, PartyId(9), "Ravi").with_percentage(dec!(50)),
            PartyShare::listed(PartyType::Owner, PartyId(1), "Asha").with_percentage(dec!(50)),
        ],
    )
}

#[tokio::test]
async fn test_investor_to_owner_route() {
    let (url, state) = spawn_backend(Backend {
        investor_route_enabled: true,
        ..Backend::default()
    })
    .await;
    let (api, _cache) = client(&Config::for_url(url));
    let finalized = investor_owner_form().submit().unwrap();

    let done = submit_payment(&api, DealId(124), &draft(dec!(250000)), &finalized)
        .await
        .unwrap();
    assert_eq!(
        done.route,
        SubmitRoute::InvestorToOwner {
            investor_id: PartyId(9),
            owner_id: PartyId(1)
        }
    );
    assert!(!done.fell_back);
    assert_eq!(done.created.payment_id, Some(88));

    let backend = state.lock().unwrap();
    assert!(backend.payments.is_empty());
    let body = &backend.investor_to_owner[0];
    assert_eq!(body["investor_id"], 9);
    assert_eq!(body["owner_id"], 1);
    assert_eq!(body["payment_mode"], "cash");
    assert_eq!(body["amount"], json!(250000.0));
}

#[tokio::test]
async fn test_investor_to_owner_falls_back_to_regular_payment() {
    let (url, state) = spawn_backend(Backend::default()).await;
    let (api, cache) = client(&Config::for_url(url));
    api.deal_participants(DealId(124)).await.unwrap();
    let finalized = investor_owner_form().submit().unwrap();

    let done = submit_payment(&api, DealId(124), &draft(dec!(250000)), &finalized)
        .await
        .unwrap();
    assert!(done.fell_back);
    assert_eq!(done.created.payment_id, Some(77));
    assert!(cache.get("deal:124").is_none());

    let backend = state.lock().unwrap();
    assert_eq!(backend.payments.len(), 1);
    let (_, force, body) = &backend.payments[0];
    assert!(!force);
    assert_eq!(body["parties"][0]["party_type"], "investor");
    assert_eq!(body["parties"][0]["amount"], json!(125000.0));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (api, _cache) = client(&Config::for_url(format!("http://{addr}")));
    let err = api.deal_participants(DealId(124)).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
