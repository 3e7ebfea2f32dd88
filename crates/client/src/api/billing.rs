//! Subscription and invoices (`/billings/...`).

use ecowiser_auth::Capability;

use super::{ApiResult, page_param, require};
use crate::gateway::Gateway;
use crate::request::ApiRequest;
use crate::types::{Invoice, Page, Subscription, SubscriptionTier, TierChange};

pub const SUBSCRIPTION_PATH: &str = "/billings/subscription/";
pub const UPGRADE_PATH: &str = "/billings/upgrade/";
pub const INVOICES_PATH: &str = "/billings/invoices/";

#[derive(Debug, Clone)]
pub struct BillingService {
    gateway: Gateway,
}

impl BillingService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn subscription(&self) -> ApiResult<Subscription> {
        Ok(self.gateway.get(SUBSCRIPTION_PATH).await?.data()?)
    }

    /// Request a tier change. Returns the server's message, if any.
    pub async fn change_tier(&self, tier: SubscriptionTier) -> ApiResult<Option<String>> {
        require(&self.gateway, Capability::ViewBilling)?;
        let body = TierChange {
            subscription_tier: tier,
        };
        Ok(self.gateway.post_json(UPGRADE_PATH, &body).await?.message)
    }

    pub async fn invoices(&self, page: u32) -> ApiResult<Page<Invoice>> {
        let response = self
            .gateway
            .send(ApiRequest::get(INVOICES_PATH).query("page", page_param(page)))
            .await?;
        Ok(response.page()?)
    }
}
