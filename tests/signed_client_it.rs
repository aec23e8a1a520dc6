#![cfg(feature = "reqwest")]

//! End-to-end signing flow through the reqwest transport.

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
// self
use keystone_client::{
	cache::{MemoryCache, TokenCache},
	client::SignedClient,
	tenant::TenantConfig,
	token::Token,
	url::Url,
};

fn token_body(server: &MockServer, id: &str) -> String {
	let expires = (OffsetDateTime::now_utc() + Duration::hours(1))
		.format(&Rfc3339)
		.expect("Expiry timestamp fixture should format as RFC 3339.");

	format!(
		r#"{{"access": {{"token": {{"id": "{id}", "expires": "{expires}"}},
			"serviceCatalog": [{{"name": "api", "type": "compute",
			"endpoints": [{{"publicurl": "{}"}}]}}]}}}}"#,
		server.base_url(),
	)
}

fn build_client(server: &MockServer, cache: Arc<MemoryCache>) -> SignedClient {
	let tenant = TenantConfig::new(
		Url::parse(&server.url("/tokens")).expect("Mock server URL should parse."),
		"john",
		"validpassword",
		"compute",
	)
	.with_tenant_name("testing");

	SignedClient::new(tenant, cache)
}

#[tokio::test]
async fn relative_requests_are_rebased_and_signed() {
	let server = MockServer::start_async().await;
	let cache = Arc::new(MemoryCache::default());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokens");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body(&server, "abcd1234"));
		})
		.await;
	let instances_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/instances").header("x-auth-token", "abcd1234");
			then.status(200).header("content-type", "application/json").body(r#"["i-1"]"#);
		})
		.await;
	let client = build_client(&server, cache.clone());
	let response = client.get("/instances").await.expect("Signed GET should succeed.");

	assert_eq!(response.status(), 200);
	assert_eq!(response.body(), br#"["i-1"]"#);

	token_mock.assert_calls_async(1).await;
	instances_mock.assert_calls_async(1).await;

	// The serialized token survives in the cache under the versioned key.
	let cached = cache
		.get(&client.pool().cache_key())
		.await
		.expect("Cache read should succeed.")
		.expect("The freshly fetched token should be cached.");
	let token = Token::from_json(&cached).expect("The cached payload should parse back.");

	assert_eq!(token.id().expose(), "abcd1234");

	// A second request reuses the token without another exchange.
	let second = client.get("/instances").await.expect("Second signed GET should succeed.");

	assert_eq!(second.status(), 200);

	token_mock.assert_calls_async(1).await;
	instances_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn query_strings_survive_the_rewrite() {
	let server = MockServer::start_async().await;
	let cache = Arc::new(MemoryCache::default());
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokens");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body(&server, "abcd1234"));
		})
		.await;
	let list_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/instances")
				.query_param("limit", "10")
				.header("x-auth-token", "abcd1234");
			then.status(200).body("[]");
		})
		.await;
	let client = build_client(&server, cache);
	let response = client.get("/instances?limit=10").await.expect("Signed GET should succeed.");

	assert_eq!(response.status(), 200);

	list_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn a_rejected_exchange_surfaces_the_remote_status() {
	let server = MockServer::start_async().await;
	let cache = Arc::new(MemoryCache::default());
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokens");
			then.status(401).body("invalid credentials");
		})
		.await;
	let client = build_client(&server, cache);
	let err = client
		.get("/instances")
		.await
		.expect_err("Signing should fail when the credential exchange is rejected.");
	let rendered = format!("{err}");

	assert!(
		rendered.contains("token"),
		"Error should point at the token acquisition: {rendered}.",
	);
}
