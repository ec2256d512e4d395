//! Route handlers and the router.
//!
//! Thin translation layer: extract identity, deserialize the request
//! body, call the service, wrap the result. All domain rules live below
//! the service boundary.

use crate::error::ApiError;
use crate::identity::Identity;
use agora_core::{Account, Instrument, MarketSnapshot, PriceImpact};
use agora_ledger::DepositDecision;
use agora_service::{InstrumentStats, QueuedDeposit, RankingEntry, TradingService};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TradingService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(open_session))
        .route("/api/account", get(get_account))
        .route("/api/market", get(get_market).put(replace_market))
        .route("/api/orders/buy", post(buy))
        .route("/api/orders/sell", post(sell))
        .route("/api/deposits", post(request_deposit))
        .route("/api/deposits/pending", get(pending_deposits))
        .route("/api/deposits/resolve", post(resolve_deposit))
        .route("/api/ranking", get(ranking))
        .route("/api/stats", get(stats))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type Handler<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest {
    display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccountResponse {
    account: Account,
}

#[derive(Debug, Deserialize)]
struct OrderRequest {
    symbol: String,
    quantity: i64,
    price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    account: Account,
    price_impact: Option<PriceImpact>,
}

#[derive(Debug, Deserialize)]
struct DepositRequest {
    amount: i64,
}

#[derive(Debug, Serialize)]
struct PendingDepositsResponse {
    deposits: Vec<QueuedDeposit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveDepositRequest {
    account_id: String,
    deposit_id: i64,
    decision: DepositDecision,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplaceMarketRequest {
    instruments: Vec<Instrument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceMarketResponse {
    last_update_at: DateTime<Utc>,
    next_update_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RankingResponse {
    ranking: Vec<RankingEntry>,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    stats: Vec<InstrumentStats>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn open_session(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<SessionRequest>,
) -> Handler<AccountResponse> {
    let account = state.service.identify(&identity, body.display_name)?;
    Ok(Json(AccountResponse { account }))
}

async fn get_account(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Handler<AccountResponse> {
    let account = state.service.account(&identity)?;
    Ok(Json(AccountResponse { account }))
}

async fn get_market(State(state): State<AppState>) -> Handler<MarketSnapshot> {
    Ok(Json(state.service.market()?))
}

async fn replace_market(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<ReplaceMarketRequest>,
) -> Handler<ReplaceMarketResponse> {
    let snapshot = state.service.replace_market(&identity, body.instruments)?;
    Ok(Json(ReplaceMarketResponse {
        last_update_at: snapshot.last_update_at,
        next_update_at: snapshot.next_update_at,
    }))
}

async fn buy(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<OrderRequest>,
) -> Handler<OrderResponse> {
    let outcome = state
        .service
        .buy(&identity, &body.symbol, body.quantity, body.price)?;
    Ok(Json(OrderResponse {
        account: outcome.account,
        price_impact: outcome.price_impact,
    }))
}

async fn sell(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<OrderRequest>,
) -> Handler<OrderResponse> {
    let outcome = state
        .service
        .sell(&identity, &body.symbol, body.quantity, body.price)?;
    Ok(Json(OrderResponse {
        account: outcome.account,
        price_impact: outcome.price_impact,
    }))
}

async fn request_deposit(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<DepositRequest>,
) -> Handler<AccountResponse> {
    let account = state.service.request_deposit(&identity, body.amount)?;
    Ok(Json(AccountResponse { account }))
}

async fn pending_deposits(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Handler<PendingDepositsResponse> {
    let deposits = state.service.pending_deposits(&identity)?;
    Ok(Json(PendingDepositsResponse { deposits }))
}

async fn resolve_deposit(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(body): Json<ResolveDepositRequest>,
) -> Handler<AccountResponse> {
    let account = state.service.resolve_deposit(
        &identity,
        &body.account_id,
        body.deposit_id,
        body.decision,
        body.reason,
    )?;
    Ok(Json(AccountResponse { account }))
}

async fn ranking(State(state): State<AppState>) -> Handler<RankingResponse> {
    Ok(Json(RankingResponse {
        ranking: state.service.ranking()?,
    }))
}

async fn stats(State(state): State<AppState>) -> Handler<StatsResponse> {
    Ok(Json(StatsResponse {
        stats: state.service.stats()?,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
