//! Fetches an OpenID discovery document and posts a client-credentials request through the
//! adapter.
//!
//! 1. Build a [`ReqwestTransport`]; set a base URL if proxy-routed requests should reach a relay.
//! 2. Pick a [`ConnectivityProbe`]; here a [`ConnectivityFlag`] the app would flip on network
//!    changes.
//! 3. Call [`HttpAdapter::send_get_request`] / [`HttpAdapter::send_post_request`] and inspect the
//!    envelope status yourself: 4xx/5xx are not errors.
//!
//! Run with `cargo run --example token_endpoint -- <issuer-url>`.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use serde_json::Value;
// self
use oauth2_transport::{
	adapter::{HttpAdapter, RequestOptions, ReqwestHttpAdapter},
	connectivity::{ConnectivityFlag, ConnectivityProbe},
	correlation::IncrementingCorrelationVector,
	error::Error,
	http::ReqwestTransport,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let issuer = env::args()
		.nth(1)
		.unwrap_or_else(|| "https://login.microsoftonline.com/common/v2.0".to_owned());
	let connectivity = ConnectivityFlag::default();
	let transport =
		ReqwestTransport::default().with_base_url(Url::parse("http://127.0.0.1:8080/")?);
	let adapter: ReqwestHttpAdapter<ConnectivityFlag> =
		HttpAdapter::new(transport, connectivity.clone())
			.with_correlation_vector_source(IncrementingCorrelationVector::new());
	let discovery_url =
		format!("{}/.well-known/openid-configuration", issuer.trim_end_matches('/'));
	let accept_json = RequestOptions::new().with_header("accept", "application/json");
	let discovery =
		adapter.send_get_request::<Value>(&discovery_url, Some(&accept_json)).await?;

	println!("Discovery responded with HTTP {}.", discovery.status);

	let token_endpoint = discovery.body["token_endpoint"]
		.as_str()
		.ok_or_else(|| eyre!("Discovery document has no token_endpoint."))?;
	let form = accept_json
		.with_header("content-type", "application/x-www-form-urlencoded")
		.with_body("grant_type=client_credentials&client_id=demo&client_secret=demo");

	match adapter.send_post_request::<Value>(token_endpoint, Some(&form)).await {
		Ok(envelope) if envelope.is_success() => println!("Token endpoint issued a token."),
		Ok(envelope) => println!(
			"Token endpoint answered HTTP {} with error {}.",
			envelope.status, envelope.body["error"]
		),
		Err(Error::NoNetworkConnectivity) => println!("Offline; try again once connected."),
		Err(e) if e.is_transport_failure() => println!(
			"Transport failed (online: {}): {e}.",
			connectivity.is_online()
		),
		Err(e) => return Err(e.into()),
	}

	Ok(())
}
