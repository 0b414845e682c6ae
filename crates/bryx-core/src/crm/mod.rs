//! Port for the remote CRM bot API.

use async_trait::async_trait;

use crate::{domain::SaleId, Result};

pub mod models;

use models::{
    AllowedUsersResponse, ProductsResponse, RegistrationRequest, RegistrationResponse,
    SalesResponse, StatsResponse,
};

/// Page size used by the listing commands.
pub const LIST_PAGE_SIZE: u32 = 5;

/// Source of the allow-list.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn allowed_users(&self) -> Result<AllowedUsersResponse>;
}

/// Everything the router needs from the CRM.
///
/// Implementations must not retry: a failed call surfaces immediately.
#[async_trait]
pub trait CrmApi: UserDirectory {
    async fn register_user(&self, req: &RegistrationRequest) -> Result<RegistrationResponse>;
    async fn list_products(&self, page_size: u32) -> Result<ProductsResponse>;
    async fn list_sales(&self, page_size: u32) -> Result<SalesResponse>;
    async fn stats(&self) -> Result<StatsResponse>;
    async fn ship_sale(&self, sale_id: SaleId) -> Result<()>;
}
