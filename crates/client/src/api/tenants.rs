//! Tenant lifecycle (`/tenants/...`).

use ecowiser_auth::Capability;

use super::{ApiResult, require};
use crate::gateway::Gateway;
use crate::request::{ApiRequest, Upload};
use crate::types::{Tenant, TenantDraft};

pub const CREATE_PATH: &str = "/tenants/create/";
pub const MANAGE_PATH: &str = "/tenants/manage/";
pub const USAGE_REPORT_PATH: &str = "/tenants/generate-usage-report/";

const LOGO_FIELD: &str = "logo";

#[derive(Debug, Clone)]
pub struct TenantService {
    gateway: Gateway,
}

/// Form body for tenant create/update: plain fields, plus the logo as a file
/// part when one is given.
fn tenant_request(
    request: ApiRequest,
    fields: Vec<(String, String)>,
    logo: Option<Upload>,
) -> ApiRequest {
    match logo {
        Some(logo) => {
            let upload = fields
                .into_iter()
                .fold(logo.with_field_name(LOGO_FIELD), |upload, (k, v)| upload.text(k, v));
            request.multipart(upload)
        }
        None => request.form(fields),
    }
}

impl TenantService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Create a tenant for the signed-in user, then refresh the cached
    /// profile so it picks up the new tenant.
    pub async fn create(
        &self,
        draft: &TenantDraft,
        logo: Option<Upload>,
    ) -> ApiResult<Option<Tenant>> {
        let fields = vec![
            ("name".to_string(), draft.name.clone()),
            ("contact_email".to_string(), draft.contact_email.clone()),
            ("subscription_tier".to_string(), draft.subscription_tier.to_string()),
        ];
        let response = self
            .gateway
            .send(tenant_request(ApiRequest::post(CREATE_PATH), fields, logo))
            .await?;
        let tenant = response.optional_data()?;

        super::AuthService::new(self.gateway.clone()).refresh_user().await;
        Ok(tenant)
    }

    pub async fn current(&self) -> ApiResult<Tenant> {
        Ok(self.gateway.get(MANAGE_PATH).await?.data()?)
    }

    pub async fn update(
        &self,
        name: &str,
        contact_email: &str,
        logo: Option<Upload>,
    ) -> ApiResult<Option<Tenant>> {
        let fields = vec![
            ("name".to_string(), name.to_string()),
            ("contact_email".to_string(), contact_email.to_string()),
        ];
        let response = self
            .gateway
            .send(tenant_request(ApiRequest::patch(MANAGE_PATH), fields, logo))
            .await?;
        Ok(response.optional_data()?)
    }

    /// Delete the tenant. The account goes with it, so the session ends.
    pub async fn delete(&self) -> ApiResult<()> {
        require(&self.gateway, Capability::ManageTenant)?;
        self.gateway.delete(MANAGE_PATH).await?;
        tracing::info!("tenant deleted; signing out");
        self.gateway.logout();
        Ok(())
    }

    /// Ask the server to e-mail a usage report. Returns the server's message.
    pub async fn request_usage_report(&self) -> ApiResult<Option<String>> {
        Ok(self.gateway.get(USAGE_REPORT_PATH).await?.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestBody;

    #[test]
    fn logo_turns_the_form_into_an_upload() {
        let fields = vec![("name".to_string(), "Acme".to_string())];
        let with_logo = tenant_request(
            ApiRequest::patch(MANAGE_PATH),
            fields.clone(),
            Some(Upload::new("logo.png", vec![0x89])),
        );
        match with_logo.body {
            RequestBody::Multipart(upload) => {
                assert_eq!(upload.field, "logo");
                assert_eq!(upload.fields, fields);
            }
            other => panic!("unexpected body: {other:?}"),
        }

        let without = tenant_request(ApiRequest::patch(MANAGE_PATH), fields.clone(), None);
        assert_eq!(without.body, RequestBody::Form(fields));
    }
}
