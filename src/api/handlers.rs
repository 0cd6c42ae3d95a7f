//! HTTP request handlers for the server API.
//!
//! Every handler translates a request into one [`Galena`] call and wraps
//! the result in a JSON envelope (`server`, `servers` or `events`).

use crate::Galena;
use crate::error::Result;
use crate::server::{ServerData, ServerId};

use actix_web::{
    HttpResponse,
    web::{Data, Json, Path, Query},
};
use serde::Deserialize;
use serde_json::json;

/// Body of create and update requests
#[derive(Debug, Deserialize)]
pub struct ServerRequest {
    pub server: ServerData,
}

/// Query string of the events endpoint
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
}

fn server_id(raw: &str) -> Result<ServerId> {
    raw.parse()
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "healthy": true }))
}

pub async fn list_servers(galena: Data<Galena>) -> Result<HttpResponse> {
    let servers = galena.list().await?;
    Ok(HttpResponse::Ok().json(json!({ "servers": servers })))
}

pub async fn get_server(galena: Data<Galena>, id: Path<String>) -> Result<HttpResponse> {
    let server = galena.get(server_id(&id)?).await?;
    Ok(HttpResponse::Ok().json(json!({ "server": server })))
}

pub async fn create_server(
    galena: Data<Galena>,
    body: Json<ServerRequest>,
) -> Result<HttpResponse> {
    let server = galena.create(body.into_inner().server).await?;
    tracing::info!(server_id = %server.id(), "Created server via API");
    Ok(HttpResponse::Ok().json(json!({ "server": server })))
}

pub async fn update_server(
    galena: Data<Galena>,
    id: Path<String>,
    body: Json<ServerRequest>,
) -> Result<HttpResponse> {
    let server = galena
        .update(server_id(&id)?, body.into_inner().server)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "server": server })))
}

pub async fn remove_server(galena: Data<Galena>, id: Path<String>) -> Result<HttpResponse> {
    galena.remove(server_id(&id)?).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn start_server(galena: Data<Galena>, id: Path<String>) -> Result<HttpResponse> {
    let server = galena.start(server_id(&id)?).await?;
    Ok(HttpResponse::Ok().json(json!({ "server": server })))
}

pub async fn stop_server(galena: Data<Galena>, id: Path<String>) -> Result<HttpResponse> {
    let server = galena.stop(server_id(&id)?).await?;
    Ok(HttpResponse::Ok().json(json!({ "server": server })))
}

pub async fn fleet_events(galena: Data<Galena>, query: Query<EventsQuery>) -> HttpResponse {
    let events = galena.all_events(query.limit);
    HttpResponse::Ok().json(json!({ "events": events }))
}

pub async fn server_events(
    galena: Data<Galena>,
    id: Path<String>,
    query: Query<EventsQuery>,
) -> Result<HttpResponse> {
    let events = galena.events(server_id(&id)?, query.limit).await?;
    Ok(HttpResponse::Ok().json(json!({ "events": events })))
}
