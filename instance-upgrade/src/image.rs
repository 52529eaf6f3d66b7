use std::cmp::Ordering;

use serde::Deserializer;

use super::*;

/// `ImageRecord` is one entry of the image catalog
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// unique id of the image
    ///
    pub id: String,

    /// name of the image, several images may share it
    ///
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// lifecycle status as reported by the catalog, e.g. "active"
    ///
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,

    /// time the image was registered
    ///
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ImageRecord {
    pub fn new(id: impl ToString, name: impl ToString, created_at: OffsetDateTime) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status: ACTIVE.to_string(),
            created_at,
        }
    }

    pub fn with_status(self, status: impl ToString) -> Self {
        Self {
            status: status.to_string(),
            ..self
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ACTIVE
    }

    /// Orders newer images before older ones
    ///
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }
}

/// Catalog filter, serialized as the query string of an image listing
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageQuery {
    pub name: String,
    pub status: String,
    pub sort: String,
}

impl ImageQuery {
    /// Active images called exactly `name`, newest first
    ///
    pub fn latest_active(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            status: ACTIVE.to_string(),
            sort: "created_at:desc".to_string(),
        }
    }

    pub fn matches(&self, image: &ImageRecord) -> bool {
        image.name == self.name && image.status == self.status
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
