use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::core::v1 as corev1;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use capability::ComputeService;
pub use capability::ImageCatalog;
pub use capability::MetadataSource;
pub use capability::NodeLister;
pub use image::ImageQuery;
pub use image::ImageRecord;
pub use instance::InstanceIdentity;
pub use instance::InstanceMetadata;
pub use instance::Server;

/// Image id placeholder asking for the newest active image of a family
pub const LATEST: &str = "latest";

/// Glance status of an image that can be booted
pub const ACTIVE: &str = "active";

/// Well-known link-local OpenStack metadata document
pub const METADATA_URL: &str = "http://169.254.169.254/openstack/latest/meta_data.json";

mod capability;
mod image;
mod instance;
