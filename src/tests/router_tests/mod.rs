mod appeal_routes;
mod error_responses;
mod report_routes;

use crate::cache::{QueryCache, QueryClient};
use crate::db::connection::Database;
use crate::router::handle;
use astra::{Body, Response};
use http::{Method, Request};
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;

pub(crate) fn test_client(db: &Database) -> QueryClient {
    QueryClient::new(db.clone(), Arc::new(QueryCache::new()), 10)
}

pub(crate) fn send(client: &QueryClient, method: Method, uri: &str, body: Option<&str>) -> Response {
    let body = body.map(|b| Body::from(b.as_bytes().to_vec())).unwrap_or_else(Body::empty);
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body)
        .unwrap();

    match handle(req, client) {
        Ok(resp) => resp,
        Err(err) => crate::responses::error_to_response(&err),
    }
}

pub(crate) fn body_json(resp: Response) -> Value {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    serde_json::from_str(&body).unwrap_or_else(|e| panic!("non-JSON body {body:?}: {e}"))
}
