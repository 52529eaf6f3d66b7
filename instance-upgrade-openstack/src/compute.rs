use serde::Serialize;

use super::*;

#[derive(Debug, Deserialize)]
struct ServerResponse {
    server: Server,
}

#[derive(Debug, Serialize)]
struct RebuildAction<'a> {
    rebuild: Rebuild<'a>,
}

#[derive(Debug, Serialize)]
struct Rebuild<'a> {
    #[serde(rename = "imageRef")]
    image_ref: &'a str,
}

impl<'a> RebuildAction<'a> {
    fn new(image_ref: &'a str) -> Self {
        let rebuild = Rebuild { image_ref };
        Self { rebuild }
    }
}

#[async_trait]
impl ComputeService for OpenStack {
    type Error = Error;

    async fn get_server(&self, id: &InstanceIdentity) -> Result<Server> {
        let url = format!("{}/servers/{id}", self.compute_url);
        send_json::<ServerResponse>(self.get(url))
            .await
            .map(|response| response.server)
    }

    async fn rebuild_server(&self, server: &str, image_ref: &str) -> Result<()> {
        let url = format!("{}/servers/{server}/action", self.compute_url);
        let action = RebuildAction::new(image_ref);
        send(self.post(url).json(&action)).await?;
        Ok(())
    }
}
