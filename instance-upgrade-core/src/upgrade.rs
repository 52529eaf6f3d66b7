use super::*;

#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("no image id nor name given")]
    MissingImage,

    #[error("failed to get instance metadata: {0}")]
    Metadata(#[source] BoxError),

    #[error("failed to fetch latest image id: {0}")]
    LatestImage(#[source] ResolveError),

    #[error("no image with name {0} found")]
    ImageNotFound(String),

    #[error("failed to fetch image {id}: {source}")]
    ImageFetch { id: String, source: BoxError },

    #[error("failed to fetch instance {id}: {source}")]
    InstanceFetch {
        id: InstanceIdentity,
        source: BoxError,
    },

    #[error("instance {0} has no image id attribute")]
    MissingImageAttribute(InstanceIdentity),

    #[error("failed to rebuild instance {id}: {source}")]
    Rebuild { id: String, source: BoxError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// the instance already runs the target image
    UpToDate {
        instance: InstanceIdentity,
        image: String,
    },
    /// the compute service accepted a rebuild from `from` to `to`
    RebuildRequested {
        instance: InstanceIdentity,
        from: String,
        to: String,
    },
}

/// Decides whether the instance this process runs on must be rebuilt from a
/// different image, and requests the rebuild when it does.
///
#[derive(Debug)]
pub struct UpgradeEngine<M, C, I> {
    metadata: M,
    compute: C,
    resolver: ImageResolver<I>,
}

impl<M, C, I> UpgradeEngine<M, C, I>
where
    M: MetadataSource,
    C: ComputeService,
    I: ImageCatalog,
{
    pub fn new(metadata: M, compute: C, images: I) -> Self {
        Self {
            metadata,
            compute,
            resolver: ImageResolver::new(images),
        }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn compute(&self) -> &C {
        &self.compute
    }

    pub fn resolver(&self) -> &ImageResolver<I> {
        &self.resolver
    }

    /// Bring the instance to `image_id`, or to the newest image called
    /// `image_name` when `image_id` is empty or `"latest"`.
    ///
    /// The rebuild is only requested; the call returns once the compute
    /// service accepted it.
    ///
    pub async fn update_instance_image(
        &self,
        image_name: Option<&str>,
        image_id: &str,
    ) -> Result<UpgradeOutcome, UpgradeError> {
        let instance = self
            .metadata
            .instance_identity()
            .await
            .map_err(|err| UpgradeError::Metadata(err.into()))?;
        tracing::info!(%instance, "Instance id");

        let target = self.target_image_id(image_name, image_id).await?;
        let image = self
            .resolver
            .catalog()
            .get_image(&target)
            .await
            .map_err(|err| UpgradeError::ImageFetch {
                id: target.clone(),
                source: err.into(),
            })?;
        tracing::info!(id = image.id, name = image.name, "Latest image");

        let server = match self.compute.get_server(&instance).await {
            Ok(server) => server,
            Err(err) => {
                return Err(UpgradeError::InstanceFetch {
                    id: instance,
                    source: err.into(),
                });
            }
        };
        let Some(current) = server.image_id() else {
            return Err(UpgradeError::MissingImageAttribute(instance));
        };

        if current == image.id {
            tracing::info!(image = current, "Instance is up-to-date");
            return Ok(UpgradeOutcome::UpToDate {
                instance,
                image: image.id,
            });
        }

        tracing::info!(
            from = current,
            to = image.id,
            "Instance needs to be upgraded"
        );
        self.compute
            .rebuild_server(&server.id, &image.id)
            .await
            .map_err(|err| UpgradeError::Rebuild {
                id: server.id.clone(),
                source: err.into(),
            })?;
        tracing::info!("Rebuild started ...");

        Ok(UpgradeOutcome::RebuildRequested {
            instance,
            from: current.to_string(),
            to: image.id,
        })
    }

    async fn target_image_id(
        &self,
        image_name: Option<&str>,
        image_id: &str,
    ) -> Result<String, UpgradeError> {
        if !image_id.is_empty() && image_id != LATEST {
            return Ok(image_id.to_string());
        }

        let name = image_name
            .filter(|name| !name.is_empty())
            .ok_or(UpgradeError::MissingImage)?;
        self.resolver
            .resolve_latest(name)
            .await
            .map_err(UpgradeError::LatestImage)?
            .ok_or_else(|| UpgradeError::ImageNotFound(name.to_string()))
    }
}
