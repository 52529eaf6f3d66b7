use serde_json::json;

use super::*;

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const DEFAULT_DOMAIN: &str = "Default";
const DEFAULT_INTERFACE: &str = "public";

/// Standard OpenStack client settings, as found in the `OS_*` environment
///
#[derive(Clone, Default)]
pub struct Credentials {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_secret: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
}

impl Credentials {
    fn tokens_url(&self) -> Result<String> {
        let auth_url = self
            .auth_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(Error::MissingAuthUrl)?
            .trim_end_matches('/');
        if auth_url.ends_with("/v3") {
            Ok(format!("{auth_url}/auth/tokens"))
        } else {
            Ok(format!("{auth_url}/v3/auth/tokens"))
        }
    }

    fn auth_request(&self) -> Result<serde_json::Value> {
        if let (Some(id), Some(secret)) = (
            &self.application_credential_id,
            &self.application_credential_secret,
        ) {
            let identity = json!({
                "methods": ["application_credential"],
                "application_credential": {"id": id, "secret": secret},
            });
            return Ok(json!({"auth": {"identity": identity}}));
        }

        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(Error::MissingCredentials);
        };
        let user_domain = self.user_domain_name.as_deref().unwrap_or(DEFAULT_DOMAIN);
        let identity = json!({
            "methods": ["password"],
            "password": {
                "user": {
                    "name": username,
                    "domain": {"name": user_domain},
                    "password": password,
                },
            },
        });

        let scope = match (&self.project_id, &self.project_name) {
            (Some(id), _) => Some(json!({"project": {"id": id}})),
            (None, Some(name)) => {
                let domain = self
                    .project_domain_name
                    .as_deref()
                    .unwrap_or(user_domain);
                Some(json!({"project": {"name": name, "domain": {"name": domain}}}))
            }
            (None, None) => None,
        };

        let auth = match scope {
            Some(scope) => json!({"identity": identity, "scope": scope}),
            None => json!({"identity": identity}),
        };
        Ok(json!({ "auth": auth }))
    }

    fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or(DEFAULT_INTERFACE)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("user_domain_name", &self.user_domain_name)
            .field("project_id", &self.project_id)
            .field("project_name", &self.project_name)
            .field("project_domain_name", &self.project_domain_name)
            .field("application_credential_id", &self.application_credential_id)
            .field(
                "application_credential_secret",
                &self
                    .application_credential_secret
                    .as_ref()
                    .map(|_| "<redacted>"),
            )
            .field("region_name", &self.region_name)
            .field("interface", &self.interface)
            .finish()
    }
}

/// Issued token plus the service catalog it came with
///
pub(crate) struct Session {
    pub(crate) token: String,
    catalog: Vec<CatalogEntry>,
}

impl Session {
    pub(crate) async fn authenticate(
        client: &reqwest::Client,
        credentials: &Credentials,
    ) -> Result<Self> {
        let url = credentials.tokens_url()?;
        let body = credentials.auth_request()?;
        let response = send(client.post(&url).json(&body)).await?;
        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
            .ok_or(Error::MissingToken)?;
        let TokenResponse { token: issued } = response.json().await?;
        tracing::debug!(url, services = issued.catalog.len(), "Issued token");
        Ok(Self {
            token,
            catalog: issued.catalog,
        })
    }

    pub(crate) fn endpoint(&self, service: &str, credentials: &Credentials) -> Result<String> {
        find_endpoint(
            &self.catalog,
            service,
            credentials.interface(),
            credentials.region_name.as_deref(),
        )
        .map(|url| url.trim_end_matches('/').to_string())
        .ok_or_else(|| Error::NoEndpoint {
            service: service.to_string(),
            interface: credentials.interface().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: IssuedToken,
}

#[derive(Debug, Deserialize)]
struct IssuedToken {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    interface: String,
    #[serde(default)]
    region_id: Option<String>,
    #[serde(default)]
    region: Option<String>,
    url: String,
}

impl Endpoint {
    fn in_region(&self, region: Option<&str>) -> bool {
        region.is_none_or(|region| {
            self.region_id.as_deref() == Some(region) || self.region.as_deref() == Some(region)
        })
    }
}

fn find_endpoint<'a>(
    catalog: &'a [CatalogEntry],
    service: &str,
    interface: &str,
    region: Option<&str>,
) -> Option<&'a str> {
    catalog
        .iter()
        .filter(|entry| entry.kind == service)
        .flat_map(|entry| &entry.endpoints)
        .find(|endpoint| endpoint.interface == interface && endpoint.in_region(region))
        .map(|endpoint| endpoint.url.as_str())
}
