use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use instance_upgrade::Server;
use k8s::NodeConditionExt as _;
use k8s::NodeExt as _;
use tokio::time::Instant;

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct FakeError(pub(crate) &'static str);

#[derive(Clone, Debug)]
pub(crate) enum Observation {
    ApiDown,
    Nodes(Vec<corev1::Node>),
}

impl Observation {
    pub(crate) fn ready() -> Self {
        Self::nodes(None)
    }

    pub(crate) fn not_ready(name: &str) -> Self {
        Self::nodes(Some(name))
    }

    fn nodes(not_ready: Option<&str>) -> Self {
        let nodes = ["worker-1", "worker-2", "worker-3"]
            .into_iter()
            .map(|name| {
                let ready = not_ready != Some(name);
                corev1::Node::new(name).with_conditions([
                    corev1::NodeCondition::new("MemoryPressure", false),
                    corev1::NodeCondition::ready(ready),
                ])
            })
            .collect();
        Self::Nodes(nodes)
    }
}

/// Plays back `script` one observation per call, repeating the last one
///
#[derive(Debug)]
pub(crate) struct ScriptedNodes {
    script: Vec<Observation>,
    calls: AtomicUsize,
}

impl ScriptedNodes {
    pub(crate) fn new(script: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn always(observation: Observation) -> Self {
        Self::new([observation])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeLister for ScriptedNodes {
    type Error = FakeError;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, FakeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(call).or(self.script.last()) {
            Some(Observation::Nodes(nodes)) => Ok(nodes.clone()),
            Some(Observation::ApiDown) | None => Err(FakeError(
                "the server is currently unable to handle the request",
            )),
        }
    }
}

/// Clock that only moves when slept on
///
#[derive(Debug)]
pub(crate) struct StepClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: AtomicUsize,
}

impl StepClock {
    pub(crate) fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: AtomicUsize::new(0),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    pub(crate) fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clock for StepClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Catalog that filters like the image service but returns matches unsorted
///
#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    images: Vec<ImageRecord>,
    broken: bool,
    queries: Mutex<Vec<ImageQuery>>,
}

impl FakeCatalog {
    pub(crate) fn new(images: impl IntoIterator<Item = ImageRecord>) -> Self {
        Self {
            images: images.into_iter().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub(crate) fn queries(&self) -> Vec<ImageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageCatalog for FakeCatalog {
    type Error = FakeError;

    async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, FakeError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.broken {
            return Err(FakeError("image service unavailable"));
        }
        let images = self
            .images
            .iter()
            .filter(|image| query.matches(image))
            .cloned()
            .collect();
        Ok(images)
    }

    async fn get_image(&self, id: &str) -> Result<ImageRecord, FakeError> {
        if self.broken {
            return Err(FakeError("image service unavailable"));
        }
        self.images
            .iter()
            .find(|image| image.id == id)
            .cloned()
            .ok_or(FakeError("image not found"))
    }
}

#[derive(Debug)]
pub(crate) struct FakeCompute {
    server: Option<Server>,
    reject_rebuild: bool,
    rebuilds: Mutex<Vec<(String, String)>>,
}

impl FakeCompute {
    pub(crate) fn new(id: &str, image: serde_json::Value) -> Self {
        let server = Server {
            id: id.to_string(),
            name: "worker-1".to_string(),
            image,
        };
        Self {
            server: Some(server),
            reject_rebuild: false,
            rebuilds: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn booted_from(id: &str, image_id: &str) -> Self {
        Self::new(id, serde_json::json!({"id": image_id, "links": []}))
    }

    pub(crate) fn gone() -> Self {
        Self {
            server: None,
            reject_rebuild: false,
            rebuilds: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn rejecting_rebuilds(self) -> Self {
        Self {
            reject_rebuild: true,
            ..self
        }
    }

    pub(crate) fn rebuilds(&self) -> Vec<(String, String)> {
        self.rebuilds.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeService for FakeCompute {
    type Error = FakeError;

    async fn get_server(&self, id: &InstanceIdentity) -> Result<Server, FakeError> {
        self.server
            .clone()
            .filter(|server| server.id == id.as_str())
            .ok_or(FakeError("instance not found"))
    }

    async fn rebuild_server(&self, server: &str, image_ref: &str) -> Result<(), FakeError> {
        if self.reject_rebuild {
            return Err(FakeError("instance is locked"));
        }
        self.rebuilds
            .lock()
            .unwrap()
            .push((server.to_string(), image_ref.to_string()));
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FakeMetadata {
    identity: Option<InstanceIdentity>,
    calls: AtomicUsize,
}

impl FakeMetadata {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            identity: Some(InstanceIdentity::new(id)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            identity: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    type Error = FakeError;

    async fn instance_identity(&self) -> Result<InstanceIdentity, FakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.identity
            .clone()
            .ok_or(FakeError("connection refused"))
    }
}
