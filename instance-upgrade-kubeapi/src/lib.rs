use std::fmt;

use async_trait::async_trait;
use instance_upgrade::NodeLister;
use instance_upgrade_ext as k8s;
use kube::api;

use k8s::corev1;

pub struct KubeApi {
    list_params: api::ListParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi configured with the default Kubernetes client.
    ///
    /// The default client uses the in-cluster service account when running
    /// inside a pod and falls back to the local kubeconfig otherwise.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = instance_upgrade_kubeapi::KubeApi::new().await?;
    /// // use `api`...
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> kube::Result<Self> {
        kube::Client::try_default().await.map(Self::with_client)
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    ///
    /// The returned KubeApi lists with default `ListParams`.
    ///
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            list_params: api::ListParams::default(),
            client,
        }
    }

    /// Lists all Nodes in the cluster, status conditions included.
    ///
    /// # Returns
    ///
    /// A `kube::Result` containing one `corev1::Node` per node in the cluster;
    /// the `Err` variant indicates a request or API error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use instance_upgrade_kubeapi::KubeApi;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let api = KubeApi::new().await?;
    /// let nodes = api.list_nodes().await?;
    /// println!("discovered {} nodes", nodes.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_nodes(&self) -> kube::Result<Vec<corev1::Node>> {
        let lp = self.list_params();
        let nodes = self.nodes().list(lp).await.map(|list| list.items)?;
        tracing::debug!(count = nodes.len(), "Listed nodes");
        Ok(nodes)
    }

    /// Returns an Api handle scoped to all Nodes using the configured Kubernetes client.
    ///
    fn nodes(&self) -> api::Api<corev1::Node> {
        api::Api::all(self.client.clone())
    }

    /// Accesses the default list query parameters used by this API client.
    ///
    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }
}

#[async_trait]
impl NodeLister for KubeApi {
    type Error = kube::Error;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Self::Error> {
        Self::list_nodes(self).await
    }
}

impl fmt::Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, showing `list_params` while redacting the `client`.
    ///
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeApi")
            .field("list_params", &self.list_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
