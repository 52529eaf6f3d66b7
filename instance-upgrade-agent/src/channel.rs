use axum::extract::Path;
use axum::extract::State;
use axum::http;
use axum::response::Redirect;
use axum::{Router, response::IntoResponse, routing::get};
use constcat::concat;
use instance_upgrade::ImageCatalog;
use instance_upgrade_core::ImageResolver;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::*;

const IMAGES_ROOT: &str = "/openstack/images";
const LATEST_IMAGE: &str = concat!(IMAGES_ROOT, "/{name}/latest");

/// Bytes escaped in a single path segment; non-ASCII is always escaped
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) async fn serve<C>(addr: &str, resolver: ImageResolver<C>) -> std::io::Result<()>
where
    C: ImageCatalog + 'static,
{
    let app = router(Arc::new(resolver));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{addr}");
    }
    axum::serve(listener, app).await
}

fn router<C>(resolver: Arc<ImageResolver<C>>) -> Router
where
    C: ImageCatalog + 'static,
{
    let images = Router::new()
        .route(LATEST_IMAGE, get(latest_image::<C>))
        .with_state(resolver);

    Router::new()
        .route("/healthz", get(healthz))
        .merge(images)
}

async fn latest_image<C>(
    Path(name): Path<String>,
    State(resolver): State<Arc<ImageResolver<C>>>,
    headers: http::HeaderMap,
) -> Result<Redirect, ChannelError>
where
    C: ImageCatalog,
{
    let host = headers
        .get(http::header::HOST)
        .and_then(|host| host.to_str().ok())
        .unwrap_or("localhost");
    tracing::info!(name, host, "Latest image requested");

    match resolver.resolve_latest(&name).await {
        Ok(Some(id)) => {
            let location = image_location(host, &name, &id);
            tracing::info!(name, id, "Redirecting to latest image");
            Ok(Redirect::temporary(&location))
        }
        Ok(None) => Err(ChannelError::NotFound(name)),
        Err(err) => {
            tracing::error!(name, %err, "Failed to resolve latest image");
            Err(ChannelError::Catalog)
        }
    }
}

fn image_location(host: &str, name: &str, id: &str) -> String {
    let name = utf8_percent_encode(name, PATH_SEGMENT);
    let id = utf8_percent_encode(id, PATH_SEGMENT);
    format!("http://{host}{IMAGES_ROOT}/{name}/{id}")
}

async fn healthz() -> &'static str {
    "ok"
}

enum ChannelError {
    Catalog,
    NotFound(String),
}

impl IntoResponse for ChannelError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Catalog => (
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "failed to fetch latest image id",
            )
                .into_response(),
            Self::NotFound(name) => {
                let message = format!("no image with name {name} found");
                tracing::info!("{message}");
                (http::StatusCode::NOT_FOUND, message).into_response()
            }
        }
    }
}
