use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::*;

/// Cloud looked up in `clouds.yaml` when `OS_CLOUD` is not set
pub const DEFAULT_CLOUD: &str = "openstack";

const CLOUDS_YAML: &str = "clouds.yaml";

#[derive(Deserialize)]
struct CloudsYaml {
    #[serde(default)]
    clouds: HashMap<String, Cloud>,
}

#[derive(Deserialize)]
struct Cloud {
    #[serde(default)]
    auth: CloudAuth,
    region_name: Option<String>,
    interface: Option<String>,
}

#[derive(Default, Deserialize)]
struct CloudAuth {
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_domain_name: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    project_domain_name: Option<String>,
    application_credential_id: Option<String>,
    application_credential_secret: Option<String>,
}

impl From<Cloud> for Credentials {
    fn from(cloud: Cloud) -> Self {
        let Cloud {
            auth,
            region_name,
            interface,
        } = cloud;
        Self {
            auth_url: auth.auth_url,
            username: auth.username,
            password: auth.password,
            user_domain_name: auth.user_domain_name,
            project_id: auth.project_id,
            project_name: auth.project_name,
            project_domain_name: auth.project_domain_name,
            application_credential_id: auth.application_credential_id,
            application_credential_secret: auth.application_credential_secret,
            region_name,
            interface,
        }
    }
}

/// `clouds.yaml` locations in lookup order: `config_file` (from
/// `OS_CLIENT_CONFIG_FILE`), the working directory, the user config
/// directory and `/etc/openstack`.
///
pub fn clouds_yaml_paths(config_file: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    paths.extend(config_file.map(Path::to_path_buf));
    paths.push(PathBuf::from(CLOUDS_YAML));
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(Path::new(&home).join(".config/openstack").join(CLOUDS_YAML));
    }
    paths.push(Path::new("/etc/openstack").join(CLOUDS_YAML));
    paths
}

impl Credentials {
    /// Settings of `cloud` in a `clouds.yaml` document, `None` when the
    /// document has no such cloud.
    ///
    pub fn from_clouds_yaml(text: &str, cloud: &str) -> Result<Option<Self>> {
        let mut clouds: CloudsYaml = serde_yaml::from_str(text)?;
        Ok(clouds.clouds.remove(cloud).map(Self::from))
    }

    /// Settings of `cloud` in the first readable file of `paths`
    ///
    pub fn load_cloud(paths: &[PathBuf], cloud: &str) -> Result<Option<Self>> {
        for path in paths {
            let Ok(text) = fs::read_to_string(path) else {
                continue;
            };
            tracing::debug!(path = %path.display(), cloud, "Reading clouds.yaml");
            return Self::from_clouds_yaml(&text, cloud);
        }
        Ok(None)
    }

    /// Takes every setting missing here from `fallback`
    ///
    pub fn or(self, fallback: Self) -> Self {
        Self {
            auth_url: self.auth_url.or(fallback.auth_url),
            username: self.username.or(fallback.username),
            password: self.password.or(fallback.password),
            user_domain_name: self.user_domain_name.or(fallback.user_domain_name),
            project_id: self.project_id.or(fallback.project_id),
            project_name: self.project_name.or(fallback.project_name),
            project_domain_name: self.project_domain_name.or(fallback.project_domain_name),
            application_credential_id: self
                .application_credential_id
                .or(fallback.application_credential_id),
            application_credential_secret: self
                .application_credential_secret
                .or(fallback.application_credential_secret),
            region_name: self.region_name.or(fallback.region_name),
            interface: self.interface.or(fallback.interface),
        }
    }
}
