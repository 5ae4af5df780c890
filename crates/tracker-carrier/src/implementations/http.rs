//! HTTP carrier implementation.
//!
//! Talks to the carrier's tracking endpoint over HTTP. The endpoint is
//! expected to answer `GET {base_url}/tracking/{carrier_ref}` with a
//! JSON body containing the raw status code, e.g. `{"status":
//! "delivering"}`. The wire protocol beyond that shape is the
//! carrier's business, not ours.

use crate::{CarrierError, CarrierInterface};
use async_trait::async_trait;
use serde::Deserialize;

/// Response body of the carrier's tracking endpoint.
#[derive(Debug, Deserialize)]
struct TrackingResponse {
	/// Raw carrier status code.
	status: String,
}

/// HTTP-based carrier provider.
pub struct HttpCarrier {
	client: reqwest::Client,
	base_url: String,
}

impl HttpCarrier {
	/// Creates a new HttpCarrier for the given base URL.
	pub fn new(base_url: String) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}
}

#[async_trait]
impl CarrierInterface for HttpCarrier {
	async fn track_shipment(&self, carrier_ref: &str) -> Result<String, CarrierError> {
		let url = format!("{}/tracking/{}", self.base_url, carrier_ref);

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| CarrierError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(CarrierError::Network(format!(
				"Carrier returned HTTP {}",
				response.status()
			)));
		}

		let body: TrackingResponse = response
			.json()
			.await
			.map_err(|e| CarrierError::Decode(e.to_string()))?;

		tracing::trace!(carrier_ref = %carrier_ref, status = %body.status, "Tracking lookup");
		Ok(body.status)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn trailing_slash_is_trimmed() {
		let carrier = HttpCarrier::new("http://localhost:9800/".to_string());
		assert_eq!(carrier.base_url, "http://localhost:9800");
	}
}
