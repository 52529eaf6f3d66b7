use super::*;

#[derive(Debug, Deserialize)]
struct ImagePage {
    #[serde(default)]
    images: Vec<ImageRecord>,
    /// path of the next page, relative to the versionless endpoint
    #[serde(default)]
    next: Option<String>,
}

#[async_trait]
impl ImageCatalog for OpenStack {
    type Error = Error;

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>> {
        let mut images = Vec::new();
        let mut request = self
            .get(format!("{}/v2/images", self.image_url))
            .query(query);
        loop {
            let page: ImagePage = send_json(request).await?;
            images.extend(page.images);
            match page.next {
                Some(next) => request = self.get(format!("{}{next}", self.image_url)),
                None => break,
            }
        }
        tracing::debug!(name = query.name, count = images.len(), "Listed images");
        Ok(images)
    }

    async fn get_image(&self, id: &str) -> Result<ImageRecord> {
        send_json(self.get(format!("{}/v2/images/{id}", self.image_url))).await
    }
}

/// Catalog entries for the image service may carry the API version; paging
/// links returned by the service already do.
///
pub(crate) fn versionless(url: &str) -> String {
    let url = url.trim_end_matches('/');
    url.strip_suffix("/v2").unwrap_or(url).to_string()
}
