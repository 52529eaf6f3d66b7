use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use instance_upgrade::{
    ComputeService, ImageCatalog, ImageQuery, ImageRecord, InstanceIdentity, LATEST,
    MetadataSource, NodeLister,
};
use instance_upgrade_ext as k8s;

use k8s::corev1;

pub use clock::Clock;
pub use clock::TokioClock;
pub use health::HealthError;
pub use health::HealthVerifier;
pub use health::NodeHealthSnapshot;
pub use health::PollState;
pub use health::VerifierConfig;
pub use resolver::ImageResolver;
pub use resolver::ResolveError;
pub use upgrade::UpgradeEngine;
pub use upgrade::UpgradeError;
pub use upgrade::UpgradeOutcome;

pub type BoxError = Box<dyn StdError + Send + Sync>;

mod clock;
mod health;
mod resolver;
mod upgrade;

#[cfg(test)]
mod fake;
