use super::*;

/// Id of the compute instance this process runs on
///
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstanceIdentity(String);

impl InstanceIdentity {
    pub fn new(id: impl ToString) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The subset of the instance metadata document we rely on
///
#[derive(Clone, Debug, Deserialize)]
pub struct InstanceMetadata {
    pub uuid: String,
}

impl InstanceMetadata {
    pub fn identity(&self) -> InstanceIdentity {
        InstanceIdentity::new(&self.uuid)
    }
}

/// A compute instance as returned by the compute service
///
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// `{"id": ..., "links": [...]}` for image backed instances, an empty
    /// string for volume backed ones
    ///
    #[serde(default)]
    pub image: serde_json::Value,
}

impl Server {
    /// Id of the image the instance was built from, `None` when the
    /// attribute carries no `id` at all
    ///
    pub fn image_id(&self) -> Option<&str> {
        self.image.get("id").and_then(serde_json::Value::as_str)
    }
}
