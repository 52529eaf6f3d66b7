use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use instance_upgrade::{
    ComputeService, ImageCatalog, ImageQuery, ImageRecord, InstanceIdentity, MetadataSource, Server,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use clouds::DEFAULT_CLOUD;
pub use clouds::clouds_yaml_paths;
pub use connector::Connector;
pub use error::Error;
pub use error::Result;
pub use identity::Credentials;
pub use metadata::MetadataClient;

use identity::Session;

mod clouds;
mod compute;
mod connector;
mod error;
mod identity;
mod image;
mod metadata;


const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated handle on the compute and image services of one cloud
///
#[derive(Clone)]
pub struct OpenStack {
    client: reqwest::Client,
    token: String,
    compute_url: String,
    image_url: String,
}

impl OpenStack {
    /// Authenticate against the identity service and look up the compute
    /// and image endpoints in the returned service catalog.
    ///
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let client = http_client()?;
        let session = Session::authenticate(&client, credentials).await?;
        let compute_url = session.endpoint("compute", credentials)?;
        let image_url = image::versionless(&session.endpoint("image", credentials)?);
        tracing::debug!(compute_url, image_url, "Connected to OpenStack");
        Ok(Self {
            client,
            token: session.token,
            compute_url,
            image_url,
        })
    }

    fn get(&self, url: impl AsRef<str>) -> reqwest::RequestBuilder {
        self.client
            .get(url.as_ref())
            .header(AUTH_TOKEN_HEADER, &self.token)
    }

    fn post(&self, url: impl AsRef<str>) -> reqwest::RequestBuilder {
        self.client
            .post(url.as_ref())
            .header(AUTH_TOKEN_HEADER, &self.token)
    }
}

impl fmt::Debug for OpenStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenStack")
            .field("compute_url", &self.compute_url)
            .field("image_url", &self.image_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(Error::from)
}

/// Sends `request`, turning non-success statuses into `Error::Status`
///
async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Status { status, url, body })
    }
}

async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    send(request).await?.json().await.map_err(Error::from)
}
