//! Projects (`/projects/...`).

use ecowiser_core::ProjectId;

use super::{ApiResult, page_param};
use crate::gateway::Gateway;
use crate::request::ApiRequest;
use crate::types::{Page, Project, ProjectDraft};

pub const PROJECTS_PATH: &str = "/projects/";
pub const CREATE_PATH: &str = "/projects/create/";

fn detail_path(id: ProjectId) -> String {
    format!("{PROJECTS_PATH}{id}/")
}

#[derive(Debug, Clone)]
pub struct ProjectService {
    gateway: Gateway,
}

impl ProjectService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, page: u32) -> ApiResult<Page<Project>> {
        let response = self
            .gateway
            .send(ApiRequest::get(PROJECTS_PATH).query("page", page_param(page)))
            .await?;
        Ok(response.page()?)
    }

    pub async fn get(&self, id: ProjectId) -> ApiResult<Project> {
        Ok(self.gateway.get(&detail_path(id)).await?.data()?)
    }

    pub async fn create(&self, draft: &ProjectDraft) -> ApiResult<Option<Project>> {
        Ok(self.gateway.post_json(CREATE_PATH, draft).await?.optional_data()?)
    }

    pub async fn update(&self, id: ProjectId, draft: &ProjectDraft) -> ApiResult<Option<Project>> {
        Ok(self
            .gateway
            .patch_json(&detail_path(id), draft)
            .await?
            .optional_data()?)
    }

    pub async fn delete(&self, id: ProjectId) -> ApiResult<()> {
        self.gateway.delete(&detail_path(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_paths_keep_trailing_slash() {
        assert_eq!(detail_path(ProjectId::new(42)), "/projects/42/");
    }
}
