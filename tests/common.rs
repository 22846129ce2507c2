#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use accountotron::config::{extract_config, ConfigV1};
use accountotron::routes::create_router;
use accountotron::startup::build_state;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::Value;

pub const SECRET: &str = "test-obj-secret";

pub fn load_config(yaml: &str) -> ConfigV1 {
    extract_config(&Figment::new().merge(Yaml::string(yaml))).expect("Failed to parse test config YAML")
}

pub fn build_app(config: ConfigV1) -> (Router, Arc<ConfigV1>) {
    let config = Arc::new(config);
    let state = build_state(config.clone()).expect("state should build");
    (create_router(state), config)
}

pub fn json_request(method: Method, path: &str, body: Option<Value>) -> Request<Body> {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .header("x-request-id", "integration-test")
        .body(body)
        .expect("failed to build request");

    request.extensions_mut().insert(ConnectInfo(SocketAddr::new(
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        0,
    )));

    request
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
