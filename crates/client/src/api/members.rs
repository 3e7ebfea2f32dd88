//! Tenant membership (`/tenants/members/...`).

use ecowiser_auth::{Capability, Role};

use super::{ApiResult, page_param, require};
use crate::gateway::Gateway;
use crate::request::ApiRequest;
use crate::types::{Member, MemberRef, MemberRole, Page};

pub const MEMBERS_PATH: &str = "/tenants/members/";
pub const ROLE_PATH: &str = "/tenants/members/role/";

#[derive(Debug, Clone)]
pub struct MemberService {
    gateway: Gateway,
}

impl MemberService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, page: u32) -> ApiResult<Page<Member>> {
        let response = self
            .gateway
            .send(ApiRequest::get(MEMBERS_PATH).query("page", page_param(page)))
            .await?;
        Ok(response.page()?)
    }

    pub async fn invite(&self, email: &str, role: Role) -> ApiResult<Option<String>> {
        let body = MemberRole {
            user_email: email,
            role,
        };
        Ok(self.gateway.post_json(MEMBERS_PATH, &body).await?.message)
    }

    pub async fn change_role(&self, email: &str, role: Role) -> ApiResult<()> {
        require(&self.gateway, Capability::ManageMembers)?;
        let body = MemberRole {
            user_email: email,
            role,
        };
        self.gateway.post_json(ROLE_PATH, &body).await?;
        Ok(())
    }

    pub async fn remove(&self, email: &str) -> ApiResult<()> {
        require(&self.gateway, Capability::ManageMembers)?;
        let request = ApiRequest::delete(MEMBERS_PATH).json(&MemberRef { user_email: email });
        self.gateway.send(request).await?;
        Ok(())
    }
}
