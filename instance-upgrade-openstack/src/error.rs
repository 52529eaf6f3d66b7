pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    #[error("no identity endpoint given, please specify OS_AUTH_URL")]
    MissingAuthUrl,

    #[error(
        "no credentials given, please specify OS_USERNAME and OS_PASSWORD or an application credential"
    )]
    MissingCredentials,

    #[error("failed to parse clouds.yaml: {0}")]
    CloudsYaml(#[from] serde_yaml::Error),

    #[error("identity service returned no token")]
    MissingToken,

    #[error("no {interface} endpoint for {service} service in catalog")]
    NoEndpoint { service: String, interface: String },
}
