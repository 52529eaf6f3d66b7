use super::*;

/// Lists cluster nodes together with their status conditions.
///
#[async_trait]
pub trait NodeLister: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Self::Error>;
}

/// Read access to the cloud image catalog.
///
#[async_trait]
pub trait ImageCatalog: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    /// All images matching `query`, in the order the catalog returns them
    ///
    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, Self::Error>;

    /// Single image by id, failing when the catalog does not know it
    ///
    async fn get_image(&self, id: &str) -> Result<ImageRecord, Self::Error>;
}

/// Compute service operations on a running instance.
///
#[async_trait]
pub trait ComputeService: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    async fn get_server(&self, id: &InstanceIdentity) -> Result<Server, Self::Error>;

    /// Ask the compute service to rebuild `server` from `image_ref`.
    /// Returns once the request is accepted, not when the rebuild is done.
    ///
    async fn rebuild_server(&self, server: &str, image_ref: &str) -> Result<(), Self::Error>;
}

/// Source of the identity of the instance this process runs on.
///
#[async_trait]
pub trait MetadataSource: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    async fn instance_identity(&self) -> Result<InstanceIdentity, Self::Error>;
}
