use super::*;

/// Image catalog that authenticates a fresh session for every call.
///
/// Tokens expire, so a long running server connects on demand instead of
/// holding on to one `OpenStack` handle.
///
#[derive(Clone, Debug)]
pub struct Connector {
    credentials: Credentials,
}

impl Connector {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub async fn connect(&self) -> Result<OpenStack> {
        OpenStack::connect(&self.credentials).await
    }
}

#[async_trait]
impl ImageCatalog for Connector {
    type Error = Error;

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>> {
        self.connect().await?.list_images(query).await
    }

    async fn get_image(&self, id: &str) -> Result<ImageRecord> {
        self.connect().await?.get_image(id).await
    }
}
