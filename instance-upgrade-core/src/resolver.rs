use super::*;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to list images: {0}")]
    Catalog(#[source] BoxError),
}

/// Finds the newest active image of an image family
///
#[derive(Clone, Debug)]
pub struct ImageResolver<C> {
    catalog: C,
}

impl<C> ImageResolver<C>
where
    C: ImageCatalog,
{
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Id of the newest active image called exactly `name`.
    ///
    /// `Ok(None)` when the catalog holds no such image. Images created at the
    /// same instant keep the order the catalog returned them in.
    ///
    pub async fn resolve_latest(&self, name: &str) -> Result<Option<String>, ResolveError> {
        let query = ImageQuery::latest_active(name);
        let mut images = self
            .catalog
            .list_images(&query)
            .await
            .map_err(|err| ResolveError::Catalog(err.into()))?;
        images.retain(|image| query.matches(image));
        images.sort_by(ImageRecord::newest_first);
        let latest = images.into_iter().next().map(|image| image.id);
        tracing::debug!(name, ?latest, "Resolved latest image");
        Ok(latest)
    }
}
