use std::sync::Arc;
use std::time::Duration;

use ethers_providers::{Http, Provider};
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::info;

use pudding_core::BindingError;

use crate::{ConnectionConf, EthersTransport};

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// An error when connecting to an ethereum provider.
#[derive(Error, Debug)]
pub enum EthereumProviderConnectionError {
    /// Underlying reqwest lib threw an error
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    /// A URL string could not be parsed
    #[error("Failed to parse url {1:?}: {0}")]
    InvalidUrl(url::ParseError, String),
}

impl From<EthereumProviderConnectionError> for BindingError {
    fn from(e: EthereumProviderConnectionError) -> Self {
        BindingError::from_transport(e)
    }
}

/// The transport built from a connection config.
pub type HttpTransport = EthersTransport<Provider<Http>>;

/// Build a transport for the given connection. No request is made until the
/// transport is first used.
pub fn build_transport(conn: &ConnectionConf) -> Result<HttpTransport, EthereumProviderConnectionError> {
    match conn {
        ConnectionConf::Http { url } => {
            let http_client = Client::builder().timeout(HTTP_CLIENT_TIMEOUT).build()?;
            let parsed_url = url
                .parse::<Url>()
                .map_err(|e| EthereumProviderConnectionError::InvalidUrl(e, url.clone()))?;
            info!(url = %parsed_url, "Connecting over HTTP");
            let http_provider = Http::new_with_client(parsed_url, http_client);
            Ok(EthersTransport::new(Arc::new(Provider::new(http_provider))))
        }
    }
}
