use instance_upgrade::InstanceMetadata;

use super::*;

/// Reads the instance identity from the metadata service
///
#[derive(Clone, Debug)]
pub struct MetadataClient {
    client: reqwest::Client,
    url: String,
}

impl MetadataClient {
    pub fn new(url: impl ToString) -> Result<Self> {
        let client = http_client()?;
        let url = url.to_string();
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn metadata(&self) -> Result<InstanceMetadata> {
        send_json(self.client.get(&self.url)).await
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    type Error = Error;

    async fn instance_identity(&self) -> Result<InstanceIdentity> {
        self.metadata().await.map(|metadata| metadata.identity())
    }
}
