//! Minimal HTTP transport adapter for OAuth/OIDC token endpoints—issue GET and POST
//! requests through a pluggable transport, normalize every response into a
//! [`ResponseEnvelope`](adapter::ResponseEnvelope), and classify transport failures with the
//! platform's connectivity signal.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod adapter;
pub mod connectivity;
pub mod correlation;
pub mod error;
pub mod headers;
pub mod http;
pub mod obs;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use oauth2::http::{HeaderMap, HeaderName, HeaderValue};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
