//! Project resources: media files and CSV files (`/resources/...`).

use ecowiser_core::{ProjectId, ResourceId};

use super::ApiResult;
use crate::gateway::{Gateway, RawResponse};
use crate::request::{ApiRequest, Upload};
use crate::types::{
    CsvResource, CsvTable, CsvTableError, MediaResource, Visibility, VisibilityChange,
};

pub const UPLOAD_PATH: &str = "/resources/upload/";
pub const CSV_PATH: &str = "/resources/csv/";

fn media_path(id: impl core::fmt::Display) -> String {
    format!("/resources/media/{id}/")
}

fn visibility_path(id: ResourceId) -> String {
    format!("/resources/media/visibility/{id}/")
}

fn find_table(files: &[CsvResource], id: ResourceId) -> Result<CsvTable, CsvTableError> {
    files
        .iter()
        .find(|file| file.id == id)
        .ok_or(CsvTableError::NotFound)?
        .table()
}

/// Metadata sent alongside an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMeta {
    pub project: ProjectId,
    pub name: String,
    pub description: Option<String>,
}

impl UploadMeta {
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            project,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn apply(&self, upload: Upload) -> Upload {
        let upload = upload
            .text("project", self.project)
            .text("name", &self.name);
        match self.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => upload.text("description", description),
            None => upload,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceService {
    gateway: Gateway,
}

impl ResourceService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list_media(&self, project: ProjectId) -> ApiResult<Vec<MediaResource>> {
        let response = self.gateway.get(&media_path(project)).await?;
        Ok(response.optional_data()?.unwrap_or_default())
    }

    pub async fn upload_media(
        &self,
        meta: &UploadMeta,
        visibility: Visibility,
        file: Upload,
    ) -> ApiResult<Option<MediaResource>> {
        let upload = meta.apply(file).text("visibility", visibility);
        let response = self
            .gateway
            .send(ApiRequest::post(UPLOAD_PATH).multipart(upload))
            .await?;
        Ok(response.optional_data()?)
    }

    /// Raw file contents.
    pub async fn download(&self, id: ResourceId) -> ApiResult<RawResponse> {
        Ok(self.gateway.send_raw(ApiRequest::get(media_path(id))).await?)
    }

    pub async fn delete_media(&self, id: ResourceId) -> ApiResult<()> {
        self.gateway.delete(&media_path(id)).await?;
        Ok(())
    }

    pub async fn set_visibility(&self, id: ResourceId, visibility: Visibility) -> ApiResult<()> {
        self.gateway
            .post_json(&visibility_path(id), &VisibilityChange { visibility })
            .await?;
        Ok(())
    }

    pub async fn list_csv(&self, project: ProjectId) -> ApiResult<Vec<CsvResource>> {
        let response = self
            .gateway
            .send(ApiRequest::get(CSV_PATH).query("project_id", project))
            .await?;
        Ok(response.optional_data()?.unwrap_or_default())
    }

    /// One CSV file of `project`, ready to render as a table.
    pub async fn csv_table(&self, project: ProjectId, id: ResourceId) -> ApiResult<CsvTable> {
        let files = self.list_csv(project).await?;
        Ok(find_table(&files, id)?)
    }

    pub async fn upload_csv(
        &self,
        meta: &UploadMeta,
        file: Upload,
    ) -> ApiResult<Option<CsvResource>> {
        let upload = meta.apply(file.with_mime("text/csv"));
        let response = self
            .gateway
            .send(ApiRequest::post(CSV_PATH).multipart(upload))
            .await?;
        Ok(response.optional_data()?)
    }

    pub async fn delete_csv(&self, id: ResourceId) -> ApiResult<()> {
        self.gateway
            .send(ApiRequest::delete(CSV_PATH).query("id", id))
            .await?;
        Ok(())
    }
}
