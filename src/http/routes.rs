//! Endpoint table.
//!
//! Each endpoint is a thin adapter: pick the domain operation, hand it to the
//! shared [`RequestHandler`](crate::http::handler::RequestHandler).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    response::Response,
};
use serde::Serialize;

use crate::domain::{CardHolder, CardHolders, System};
use crate::error::GateError;
use crate::http::handler::{Endpoint, RequestHandler};
use crate::http::request::actor;

pub const CARDHOLDERS_LIST: Endpoint = Endpoint {
    name: "cardholders.list",
    envelope: "db",
    mutates: false,
};

pub const CARDHOLDERS_ADD: Endpoint = Endpoint {
    name: "cardholders.add",
    envelope: "db",
    mutates: true,
};

pub const CARDHOLDERS_UPDATE: Endpoint = Endpoint {
    name: "cardholders.update",
    envelope: "db",
    mutates: true,
};

pub const SYSTEM_GET: Endpoint = Endpoint {
    name: "system.get",
    envelope: "system",
    mutates: false,
};

pub const SYSTEM_UPDATE: Endpoint = Endpoint {
    name: "system.update",
    envelope: "system",
    mutates: true,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: RequestHandler,
    pub cardholders: Arc<CardHolders>,
    pub system: Arc<System>,
}

/// Body of the `db` envelope.
#[derive(Debug, Serialize)]
pub struct DbView {
    pub cardholders: Vec<CardHolder>,
}

impl From<Vec<CardHolder>> for DbView {
    fn from(cardholders: Vec<CardHolder>) -> Self {
        Self { cardholders }
    }
}

pub async fn list_cardholders(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cardholders = state.cardholders.clone();
    state
        .handler
        .read(CARDHOLDERS_LIST, &headers, move |_| async move {
            Ok::<_, GateError>(DbView::from(cardholders.list()))
        })
        .await
}

pub async fn add_cardholder(State(state): State<AppState>, request: Request) -> Response {
    let cardholders = state.cardholders.clone();
    let actor = actor(request.headers());

    state
        .handler
        .write(CARDHOLDERS_ADD, request, move |fields, token| async move {
            cardholders.add(&actor, fields, token).await.map(DbView::from)
        })
        .await
}

pub async fn update_cardholder(State(state): State<AppState>, request: Request) -> Response {
    let cardholders = state.cardholders.clone();
    let actor = actor(request.headers());

    state
        .handler
        .write(CARDHOLDERS_UPDATE, request, move |fields, token| async move {
            cardholders.update(&actor, fields, token).await.map(DbView::from)
        })
        .await
}

pub async fn get_system(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let system = state.system.clone();
    state
        .handler
        .read(SYSTEM_GET, &headers, move |_| async move { Ok::<_, GateError>(system.get()) })
        .await
}

pub async fn update_system(State(state): State<AppState>, request: Request) -> Response {
    let system = state.system.clone();
    let actor = actor(request.headers());

    state
        .handler
        .write(SYSTEM_UPDATE, request, move |fields, token| async move {
            system.update(&actor, fields, token).await
        })
        .await
}

pub async fn healthz() -> &'static str {
    "ok"
}
