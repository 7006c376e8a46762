//! The HTTP adapter that token-endpoint callers talk to.
//!
//! [`HttpAdapter`] turns a URL plus [`RequestOptions`] into a single [`TransportPort`] call and
//! normalizes the outcome: either a [`ResponseEnvelope`] (for any HTTP status) or one of the
//! classified [`Error`] variants. There are no retries, no timeouts, and no state shared between
//! calls; concurrent requests are fully independent.
//!
//! POSTs whose URL contains the configured [`ProxyRoute`] host pattern are sent to the relay
//! path instead, carrying the original target in `gs-requesturl` and a correlation vector in
//! `ms-cv` when the caller did not provide one.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
// self
use crate::{
	_prelude::*,
	connectivity::ConnectivityProbe,
	correlation::{CorrelationVectorSource, PlaceholderCorrelationVector},
	error::{InvalidHeaderError, ResponseParseError},
	headers,
	http::{HttpMethod, TransportPort, TransportRequest, TransportResponse},
	obs::{self, RequestScope},
};
#[cfg(feature = "reqwest")] use crate::{connectivity::AlwaysOnline, http::ReqwestTransport};

/// Host substring that triggers the proxy rewrite by default.
pub const PROXY_HOST_PATTERN: &str = "login.microsoftonline.com";
/// Relay path proxy-routed POSTs are sent to by default.
pub const PROXY_PATH: &str = "/gsapi/proxy/v1";
/// Correlation-vector header name.
pub const MS_CV: &str = "ms-cv";
/// Header carrying the original target of a proxy-routed request.
pub const GS_REQUEST_URL: &str = "gs-requesturl";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Adapter backed by [`ReqwestTransport`].
#[cfg(feature = "reqwest")]
pub type ReqwestHttpAdapter<C = AlwaysOnline> = HttpAdapter<ReqwestTransport, C>;

/// Optional per-request configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Request headers; names are unique as given, ordering is irrelevant.
	pub headers: Option<BTreeMap<String, String>>,
	/// POST body; ignored for GET and sent as `""` when absent.
	pub body: Option<String>,
}
impl RequestOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a header entry.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.get_or_insert_with(BTreeMap::new).insert(name.into(), value.into());

		self
	}

	/// Sets the POST body.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}
}

/// Normalized result of a request, returned for every HTTP status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
	/// Numeric HTTP status code.
	pub status: u16,
	/// Flattened response headers keyed by lowercase name; see
	/// [`flatten_headers`](headers::flatten_headers) for multi-value behavior.
	pub headers: HashMap<String, String>,
	/// Parsed JSON payload.
	pub body: T,
}
impl<T> ResponseEnvelope<T> {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Routing rule that redirects matching POSTs to a relay path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyRoute {
	/// Substring of the target URL that selects the route.
	pub host_pattern: String,
	/// Path the request is sent to instead of the target URL.
	pub path: String,
}
impl ProxyRoute {
	/// Creates a route for `host_pattern` relayed through `path`.
	pub fn new(host_pattern: impl Into<String>, path: impl Into<String>) -> Self {
		Self { host_pattern: host_pattern.into(), path: path.into() }
	}

	/// Returns `true` when `url` should be relayed.
	pub fn matches(&self, url: &str) -> bool {
		url.contains(self.host_pattern.as_str())
	}

	/// Adds the relay headers for a request originally aimed at `url`.
	///
	/// `ms-cv` is only added when absent; `gs-requesturl` is always appended.
	pub fn decorate(
		&self,
		url: &str,
		headers: &mut HeaderMap,
		correlation: &dyn CorrelationVectorSource,
	) -> Result<(), InvalidHeaderError> {
		if !headers.contains_key(MS_CV) {
			headers::append_header(headers, MS_CV, &correlation.next_vector())?;
		}

		headers::append_header(headers, GS_REQUEST_URL, url)
	}
}
impl Default for ProxyRoute {
	fn default() -> Self {
		Self::new(PROXY_HOST_PATTERN, PROXY_PATH)
	}
}

/// Contract the authentication layer uses to reach token and metadata endpoints.
pub trait NetworkModule
where
	Self: Send + Sync,
{
	/// Issues a GET and parses the JSON body into `T`.
	fn send_get_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> impl Future<Output = Result<ResponseEnvelope<T>>> + Send
	where
		T: DeserializeOwned + Send;

	/// Issues a POST and parses the JSON body into `T`.
	fn send_post_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> impl Future<Output = Result<ResponseEnvelope<T>>> + Send
	where
		T: DeserializeOwned + Send;
}

struct RawResponse {
	status: u16,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl RawResponse {
	fn into_envelope<T>(self, url: &str) -> Result<ResponseEnvelope<T>>
	where
		T: DeserializeOwned,
	{
		// A leading byte order mark is not part of the JSON text.
		let text = self.body.strip_prefix(UTF8_BOM).unwrap_or(&self.body);
		let mut de = serde_json::Deserializer::from_slice(text);
		let body = serde_path_to_error::deserialize(&mut de)
			.map_err(|e| Error::response_parse_failed(url, e.into()))?;

		de.end()
			.map_err(|e| Error::response_parse_failed(url, ResponseParseError::TrailingData(e)))?;

		Ok(ResponseEnvelope {
			status: self.status,
			headers: headers::flatten_headers(&self.headers),
			body,
		})
	}
}

/// Fetch-style adapter over an injected [`TransportPort`] and [`ConnectivityProbe`].
///
/// Cloning is cheap: collaborators live behind `Arc`.
pub struct HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	transport: Arc<P>,
	connectivity: Arc<C>,
	proxy_route: Option<ProxyRoute>,
	correlation: Arc<dyn CorrelationVectorSource>,
}
impl<P, C> HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	/// Creates an adapter with the default proxy route and placeholder correlation vector.
	pub fn new(transport: impl Into<Arc<P>>, connectivity: impl Into<Arc<C>>) -> Self {
		Self {
			transport: transport.into(),
			connectivity: connectivity.into(),
			proxy_route: Some(ProxyRoute::default()),
			correlation: Arc::new(PlaceholderCorrelationVector),
		}
	}

	/// Replaces the proxy route; `None` sends every POST to its own URL.
	pub fn with_proxy_route(mut self, route: Option<ProxyRoute>) -> Self {
		self.proxy_route = route;

		self
	}

	/// Replaces the source of `ms-cv` values for proxy-routed requests.
	pub fn with_correlation_vector_source(
		mut self,
		source: impl 'static + CorrelationVectorSource,
	) -> Self {
		self.correlation = Arc::new(source);

		self
	}

	/// Returns the active proxy route, if any.
	pub fn proxy_route(&self) -> Option<&ProxyRoute> {
		self.proxy_route.as_ref()
	}

	/// Issues a GET against `url` and parses the JSON body into `T`.
	///
	/// Only `options.headers` is used. HTTP error statuses come back as envelopes.
	pub async fn send_get_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> Result<ResponseEnvelope<T>>
	where
		T: DeserializeOwned,
	{
		const METHOD: HttpMethod = HttpMethod::Get;

		RequestScope::start(METHOD, "send_get_request")
			.run(async move {
				let headers = headers::build_headers(options)
					.map_err(|e| self.classify_transport_failure(METHOD, url, e))?;

				self.execute(TransportRequest::get(url, headers), url).await?.into_envelope(url)
			})
			.await
	}

	/// Issues a POST against `url` (or the proxy relay) and parses the JSON body into `T`.
	///
	/// `options.body` defaults to an empty string. Errors always carry the caller's `url`, never
	/// the relay path.
	pub async fn send_post_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> Result<ResponseEnvelope<T>>
	where
		T: DeserializeOwned,
	{
		const METHOD: HttpMethod = HttpMethod::Post;

		RequestScope::start(METHOD, "send_post_request")
			.run(async move {
				let body = options.and_then(|options| options.body.clone()).unwrap_or_default();
				let request = headers::build_headers(options)
					.and_then(|headers| self.route_post(url, headers, body))
					.map_err(|e| self.classify_transport_failure(METHOD, url, e))?;

				self.execute(request, url).await?.into_envelope(url)
			})
			.await
	}

	fn route_post(
		&self,
		url: &str,
		mut headers: HeaderMap,
		body: String,
	) -> Result<TransportRequest, InvalidHeaderError> {
		match &self.proxy_route {
			Some(route) if route.matches(url) => {
				route.decorate(url, &mut headers, self.correlation.as_ref())?;
				obs::trace_proxy_rewrite(url, &route.path);

				Ok(TransportRequest::post(route.path.as_str(), headers, body))
			},
			_ => Ok(TransportRequest::post(url, headers, body)),
		}
	}

	async fn execute(&self, request: TransportRequest, url: &str) -> Result<RawResponse> {
		let method = request.method;
		let response = match self.transport.call(request).await {
			Ok(response) => response,
			Err(e) => return Err(self.classify_transport_failure(method, url, e)),
		};
		let status = response.status();
		let headers = response.headers().clone();
		let body = response
			.into_body()
			.await
			.map_err(|e| Error::response_parse_failed(url, ResponseParseError::body(e)))?;

		Ok(RawResponse { status, headers, body })
	}

	fn classify_transport_failure(
		&self,
		method: HttpMethod,
		url: &str,
		err: impl 'static + Send + Sync + StdError,
	) -> Error {
		let online = self.connectivity.is_online();

		obs::trace_transport_failure(method, url, online);

		if online { Error::request_failed(method, err, url) } else { Error::NoNetworkConnectivity }
	}
}
impl<P, C> Clone for HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			connectivity: Arc::clone(&self.connectivity),
			proxy_route: self.proxy_route.clone(),
			correlation: Arc::clone(&self.correlation),
		}
	}
}
impl<P, C> Debug for HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpAdapter")
			.field("proxy_route", &self.proxy_route)
			.finish_non_exhaustive()
	}
}
impl<P, C> NetworkModule for HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	fn send_get_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> impl Future<Output = Result<ResponseEnvelope<T>>> + Send
	where
		T: DeserializeOwned + Send,
	{
		HttpAdapter::send_get_request(self, url, options)
	}

	fn send_post_request<T>(
		&self,
		url: &str,
		options: Option<&RequestOptions>,
	) -> impl Future<Output = Result<ResponseEnvelope<T>>> + Send
	where
		T: DeserializeOwned + Send,
	{
		HttpAdapter::send_post_request(self, url, options)
	}
}

/// Lets an `oauth2` client send its token requests through the adapter.
///
/// GET and POST go through the same routing and failure classification as
/// [`HttpAdapter::send_get_request`] and [`HttpAdapter::send_post_request`]; the body is
/// returned raw so `oauth2` can parse it. Adapter errors arrive in
/// [`HttpClientError::Reqwest`], the variant `oauth2` reserves for boxed transport errors.
impl<'c, P, C> AsyncHttpClient<'c> for HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	type Error = HttpClientError<Error>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(self.relay(request))
	}
}
impl<P, C> HttpAdapter<P, C>
where
	P: ?Sized + TransportPort,
	C: ?Sized + ConnectivityProbe,
{
	async fn relay(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError<Error>> {
		let (parts, body) = request.into_parts();
		let url = parts.uri.to_string();
		let body = String::from_utf8(body).map_err(|e| {
			HttpClientError::Other(format!("Request body is not valid UTF-8: {e}."))
		})?;
		let transport_request = match parts.method.as_str() {
			"GET" => TransportRequest::get(url.as_str(), parts.headers),
			"POST" => self.route_post(&url, parts.headers, body).map_err(|e| {
				Box::new(self.classify_transport_failure(HttpMethod::Post, &url, e))
			})?,
			other =>
				return Err(HttpClientError::Other(format!(
					"Unsupported request method `{other}`."
				))),
		};
		let raw = self.execute(transport_request, &url).await.map_err(Box::new)?;
		let mut response = HttpResponse::new(raw.body);

		*response.status_mut() = StatusCode::from_u16(raw.status).map_err(|e| {
			HttpClientError::Other(format!("Transport returned an invalid status: {e}."))
		})?;
		*response.headers_mut() = raw.headers;

		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{collections::VecDeque, io};
	// crates.io
	use parking_lot::Mutex;
	use serde_json::{Value, json};
	// self
	use super::*;
	use crate::{connectivity::ConnectivityFlag, http::BufferedResponse};

	enum Scripted {
		Respond(BufferedResponse),
		Fail(&'static str),
	}

	#[derive(Default)]
	struct ScriptedTransport {
		script: Mutex<VecDeque<Scripted>>,
		requests: Mutex<Vec<TransportRequest>>,
	}
	impl ScriptedTransport {
		fn respond(response: BufferedResponse) -> Self {
			let transport = Self::default();

			transport.script.lock().push_back(Scripted::Respond(response));

			transport
		}

		fn ok(body: &[u8]) -> Self {
			Self::respond(BufferedResponse::new(200, body.to_vec()))
		}

		fn fail(message: &'static str) -> Self {
			let transport = Self::default();

			transport.script.lock().push_back(Scripted::Fail(message));

			transport
		}

		fn sent(&self) -> TransportRequest {
			self.requests.lock().last().cloned().expect("A request should have been sent.")
		}
	}
	impl TransportPort for ScriptedTransport {
		type Response = BufferedResponse;
		type TransportError = io::Error;

		fn call(
			&self,
			request: TransportRequest,
		) -> crate::http::TransportFuture<'_, Result<Self::Response, Self::TransportError>> {
			self.requests.lock().push(request);

			let next = self.script.lock().pop_front();

			Box::pin(async move {
				match next {
					Some(Scripted::Respond(response)) => Ok(response),
					Some(Scripted::Fail(message)) => Err(io::Error::other(message)),
					None => Err(io::Error::other("script exhausted")),
				}
			})
		}
	}

	fn build_adapter(
		transport: ScriptedTransport,
		online: bool,
	) -> (HttpAdapter<ScriptedTransport, ConnectivityFlag>, Arc<ScriptedTransport>) {
		let transport = Arc::new(transport);
		let adapter = HttpAdapter::new(Arc::clone(&transport), ConnectivityFlag::new(online));

		(adapter, transport)
	}

	#[tokio::test]
	async fn get_returns_envelope_with_flattened_headers() {
		let (adapter, transport) = build_adapter(
			ScriptedTransport::respond(
				BufferedResponse::new(200, br#"{"issuer":"https://idp.example.com"}"#.to_vec())
					.with_header("content-type", "application/json"),
			),
			true,
		);
		let options = RequestOptions::new().with_header("accept", "application/json");
		let envelope = adapter
			.send_get_request::<Value>(
				"https://idp.example.com/.well-known/openid-configuration",
				Some(&options),
			)
			.await
			.expect("GET should succeed.");

		assert_eq!(envelope.status, 200);
		assert_eq!(envelope.body, json!({ "issuer": "https://idp.example.com" }));
		assert_eq!(
			envelope.headers.get("content-type").map(String::as_str),
			Some("application/json")
		);

		let sent = transport.sent();

		assert_eq!(sent.method, HttpMethod::Get);
		assert_eq!(sent.url, "https://idp.example.com/.well-known/openid-configuration");
		assert!(sent.body.is_none());
		assert_eq!(
			sent.headers.get("accept").and_then(|v| v.to_str().ok()),
			Some("application/json")
		);
	}

	#[tokio::test]
	async fn get_ignores_body_option() {
		let (adapter, transport) = build_adapter(ScriptedTransport::ok(b"{}"), true);
		let options = RequestOptions::new().with_body("ignored");
		let _ = adapter
			.send_get_request::<Value>("https://idp.example.com/keys", Some(&options))
			.await
			.expect("GET should succeed.");

		assert!(transport.sent().body.is_none());
	}

	#[tokio::test]
	async fn error_status_is_an_envelope_not_an_error() {
		let (adapter, _) = build_adapter(
			ScriptedTransport::respond(BufferedResponse::new(
				404,
				br#"{"error":"not_found"}"#.to_vec(),
			)),
			true,
		);
		let envelope = adapter
			.send_post_request::<Value>("https://idp.example.com/token", None)
			.await
			.expect("HTTP 404 should still produce an envelope.");

		assert_eq!(envelope.status, 404);
		assert!(!envelope.is_success());
		assert_eq!(envelope.body, json!({ "error": "not_found" }));
	}

	#[tokio::test]
	async fn post_defaults_body_and_keeps_url() {
		let (adapter, transport) = build_adapter(ScriptedTransport::ok(b"{}"), true);
		let _ = adapter
			.send_post_request::<Value>("https://idp.example.com/token", None)
			.await
			.expect("POST should succeed.");
		let sent = transport.sent();

		assert_eq!(sent.url, "https://idp.example.com/token");
		assert_eq!(sent.body.as_deref(), Some(""));
		assert!(sent.headers.is_empty());
	}

	#[tokio::test]
	async fn login_host_posts_go_through_proxy_relay() {
		let url = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
		let (adapter, transport) = build_adapter(ScriptedTransport::ok(b"{}"), true);
		let options = RequestOptions::new().with_body("grant_type=client_credentials");
		let _ = adapter
			.send_post_request::<Value>(url, Some(&options))
			.await
			.expect("Proxy-routed POST should succeed.");
		let sent = transport.sent();

		assert_eq!(sent.url, PROXY_PATH);
		assert_eq!(sent.body.as_deref(), Some("grant_type=client_credentials"));
		assert_eq!(sent.headers.get(GS_REQUEST_URL).and_then(|v| v.to_str().ok()), Some(url));
		assert_eq!(
			sent.headers.get(MS_CV).and_then(|v| v.to_str().ok()),
			Some("DPlGFG6zXT2tUsVjaZVTnj.1")
		);
	}

	#[tokio::test]
	async fn caller_correlation_vector_is_never_overwritten() {
		let (adapter, transport) = build_adapter(ScriptedTransport::ok(b"{}"), true);
		let options = RequestOptions::new().with_header("MS-CV", "caller.7");
		let _ = adapter
			.send_post_request::<Value>("https://login.microsoftonline.com/t/token", Some(&options))
			.await
			.expect("Proxy-routed POST should succeed.");
		let sent = transport.sent();
		let values = sent.headers.get_all(MS_CV).iter().collect::<Vec<_>>();

		assert_eq!(values, vec!["caller.7"]);
	}

	#[tokio::test]
	async fn custom_correlation_source_and_disabled_route() {
		let (adapter, transport) = build_adapter(ScriptedTransport::ok(b"{}"), true);
		let adapter = adapter.with_correlation_vector_source(
			crate::correlation::IncrementingCorrelationVector::with_base("base"),
		);
		let _ = adapter
			.send_post_request::<Value>("https://login.microsoftonline.com/t/token", None)
			.await
			.expect("Proxy-routed POST should succeed.");

		assert_eq!(
			transport.sent().headers.get(MS_CV).and_then(|v| v.to_str().ok()),
			Some("base.1")
		);

		let (adapter, transport) = adapter_without_route(ScriptedTransport::ok(b"{}"));
		let url = "https://login.microsoftonline.com/t/token";
		let _ = adapter.send_post_request::<Value>(url, None).await.expect("POST should succeed.");
		let sent = transport.sent();

		assert_eq!(sent.url, url);
		assert!(!sent.headers.contains_key(GS_REQUEST_URL));
	}

	fn adapter_without_route(
		transport: ScriptedTransport,
	) -> (HttpAdapter<ScriptedTransport, ConnectivityFlag>, Arc<ScriptedTransport>) {
		let (adapter, transport) = build_adapter(transport, true);

		(adapter.with_proxy_route(None), transport)
	}

	#[tokio::test]
	async fn offline_failures_report_no_connectivity() {
		let (adapter, _) = build_adapter(ScriptedTransport::fail("dns"), false);
		let err = adapter
			.send_get_request::<Value>("https://idp.example.com/keys", None)
			.await
			.expect_err("Transport failure should surface.");

		assert!(matches!(err, Error::NoNetworkConnectivity));

		let (adapter, _) = build_adapter(ScriptedTransport::fail("reset"), false);
		let err = adapter
			.send_post_request::<Value>("https://login.microsoftonline.com/t/token", None)
			.await
			.expect_err("Transport failure should surface.");

		assert!(matches!(err, Error::NoNetworkConnectivity));
	}

	#[tokio::test]
	async fn online_failures_carry_cause_and_original_url() {
		let (adapter, _) = build_adapter(ScriptedTransport::fail("tls handshake"), true);
		let err = adapter
			.send_get_request::<Value>("https://idp.example.com/keys", None)
			.await
			.expect_err("Transport failure should surface.");

		match err {
			Error::GetRequestFailed { source, url } => {
				assert_eq!(source.to_string(), "tls handshake");
				assert_eq!(url, "https://idp.example.com/keys");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let url = "https://login.microsoftonline.com/t/token";
		let (adapter, _) = build_adapter(ScriptedTransport::fail("refused"), true);
		let err = adapter
			.send_post_request::<Value>(url, None)
			.await
			.expect_err("Transport failure should surface.");

		assert!(matches!(err, Error::PostRequestFailed { url: ref failed, .. } if failed == url));
	}

	#[tokio::test]
	async fn non_json_body_is_a_parse_failure() {
		let bodies: [&[u8]; 3] = [b"<html>oops</html>", b"", b"{} trailing"];

		for body in bodies {
			let url = "https://idp.example.com/token";
			let (adapter, _) = build_adapter(ScriptedTransport::ok(body), false);
			let err = adapter
				.send_get_request::<Value>(url, None)
				.await
				.expect_err("Non-JSON bodies should fail to parse.");

			assert!(matches!(
				err,
				Error::ResponseParseFailed { url: ref failed, .. } if failed == url
			));
			assert!(!err.is_transport_failure());

			let (adapter, _) = build_adapter(ScriptedTransport::ok(body), false);
			let err = adapter
				.send_post_request::<Value>(url, None)
				.await
				.expect_err("Non-JSON bodies should fail to parse.");

			assert!(matches!(
				err,
				Error::ResponseParseFailed { url: ref failed, .. } if failed == url
			));
			assert!(!err.is_transport_failure());
		}
	}

	#[tokio::test]
	async fn typed_bodies_report_mismatched_fields() {
		#[derive(Debug, Deserialize)]
		struct Token {
			#[allow(dead_code)]
			expires_in: u64,
		}

		let (adapter, _) = build_adapter(
			ScriptedTransport::respond(BufferedResponse::new(
				200,
				br#"{"expires_in":"soon"}"#.to_vec(),
			)),
			true,
		);
		let err = adapter
			.send_get_request::<Token>("https://idp.example.com/token", None)
			.await
			.expect_err("A string is not a u64.");

		match err {
			Error::ResponseParseFailed { source: ResponseParseError::Json(inner), .. } =>
				assert_eq!(inner.path().to_string(), "expires_in"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[tokio::test]
	async fn invalid_headers_are_classified_like_transport_failures() {
		let options = RequestOptions::new().with_header("x-a", "line\nbreak");
		let (adapter, transport) = build_adapter(ScriptedTransport::default(), true);
		let err = adapter
			.send_get_request::<Value>("https://idp.example.com/keys", Some(&options))
			.await
			.expect_err("Invalid header values should fail the request.");

		match err {
			Error::GetRequestFailed { source, url } => {
				assert_eq!(url, "https://idp.example.com/keys");
				assert_eq!(
					source
						.downcast_ref::<InvalidHeaderError>()
						.map(|cause| cause.name.as_str()),
					Some("x-a")
				);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
		assert!(transport.requests.lock().is_empty());

		let (adapter, transport) = build_adapter(ScriptedTransport::default(), false);
		let err = adapter
			.send_post_request::<Value>("https://idp.example.com/token", Some(&options))
			.await
			.expect_err("Invalid header values should fail the request.");

		assert!(matches!(err, Error::NoNetworkConnectivity));
		assert!(transport.requests.lock().is_empty());

		let url = "https://login.microsoftonline.com/x\ny";
		let (adapter, transport) = build_adapter(ScriptedTransport::default(), true);
		let err = adapter
			.send_post_request::<Value>(url, None)
			.await
			.expect_err("A relay URL that cannot be a header value should fail the request.");

		match err {
			Error::PostRequestFailed { source, url: failed } => {
				assert_eq!(failed, url);
				assert_eq!(
					source
						.downcast_ref::<InvalidHeaderError>()
						.map(|cause| cause.name.as_str()),
					Some(GS_REQUEST_URL)
				);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
		assert!(transport.requests.lock().is_empty());
	}

	#[tokio::test]
	async fn leading_byte_order_mark_is_ignored() {
		let (adapter, _) =
			build_adapter(ScriptedTransport::ok("\u{FEFF}{\"a\":1}".as_bytes()), true);
		let envelope = adapter
			.send_get_request::<Value>("https://idp.example.com/keys", None)
			.await
			.expect("A BOM-prefixed JSON body should parse.");

		assert_eq!(envelope.status, 200);
		assert_eq!(envelope.body, json!({ "a": 1 }));

		let (adapter, _) = build_adapter(ScriptedTransport::ok(b"\xEF\xBB\xBF"), true);
		let err = adapter
			.send_post_request::<Value>("https://idp.example.com/token", None)
			.await
			.expect_err("A lone BOM is still an empty body.");

		assert!(matches!(err, Error::ResponseParseFailed { .. }));
	}

	#[tokio::test]
	async fn adapter_is_usable_through_network_module() {
		async fn fetch<N>(module: &N) -> Result<ResponseEnvelope<Value>>
		where
			N: NetworkModule,
		{
			module.send_get_request("https://idp.example.com/keys", None).await
		}

		let (adapter, _) = build_adapter(ScriptedTransport::ok(br#"{"keys":[]}"#), true);
		let envelope = fetch(&adapter).await.expect("GET should succeed.");

		assert_eq!(envelope.body, json!({ "keys": [] }));
	}

	#[tokio::test]
	async fn oauth2_bridge_relays_raw_response() {
		let url = "https://login.microsoftonline.com/t/oauth2/v2.0/token";
		let (adapter, transport) = build_adapter(
			ScriptedTransport::respond(
				BufferedResponse::new(400, br#"{"error":"invalid_grant"}"#.to_vec())
					.with_header("content-type", "application/json"),
			),
			true,
		);
		let request = oauth2::http::Request::builder()
			.method(oauth2::http::Method::POST)
			.uri(url)
			.header("content-type", "application/x-www-form-urlencoded")
			.body(b"grant_type=refresh_token".to_vec())
			.expect("Request should build.");
		let response =
			AsyncHttpClient::call(&adapter, request).await.expect("Bridge should relay.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(response.body(), br#"{"error":"invalid_grant"}"#);

		let sent = transport.sent();

		assert_eq!(sent.url, PROXY_PATH);
		assert_eq!(sent.body.as_deref(), Some("grant_type=refresh_token"));
		assert_eq!(sent.headers.get(GS_REQUEST_URL).and_then(|v| v.to_str().ok()), Some(url));
	}

	#[tokio::test]
	async fn oauth2_bridge_rejects_other_methods() {
		let (adapter, transport) = build_adapter(ScriptedTransport::default(), true);
		let request = oauth2::http::Request::builder()
			.method(oauth2::http::Method::PUT)
			.uri("https://idp.example.com/token")
			.body(Vec::new())
			.expect("Request should build.");
		let err = AsyncHttpClient::call(&adapter, request).await.expect_err("PUT is unsupported.");

		assert!(matches!(err, HttpClientError::Other(_)));
		assert!(transport.requests.lock().is_empty());
	}
}
