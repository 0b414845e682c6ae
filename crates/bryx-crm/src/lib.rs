//! CRM adapter (HTTP).
//!
//! Implements the `bryx-core` CRM port over the `/api/bot` REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use bryx_core::{
    crm::{
        models::{
            AllowedUsersResponse, ProductsResponse, RegistrationRequest, RegistrationResponse,
            SalesResponse, StatsResponse,
        },
        CrmApi, UserDirectory,
    },
    domain::SaleId,
    errors::Error,
    Result,
};

const API_SUFFIX: &str = "/api/bot";
const ERROR_BODY_LIMIT: usize = 200;

/// Ensure the base URL ends with `/api/bot` and has no trailing slash.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with(API_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_SUFFIX}")
    }
}

#[derive(Clone, Debug)]
pub struct CrmClient {
    base_url: String,
    http: reqwest::Client,
}

impl CrmClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("crm client build error: {e}")))?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
    }

    /// Send and fail on transport errors or non-2xx statuses.
    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::External(format!("crm {what} request error: {e}")))?;

        let status = resp.status();
        debug!(what, status = status.as_u16(), "crm response");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let resp = self.send(req, what).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("crm {what} body error: {e}")))?;

        let parsed: Option<T> = serde_json::from_slice(&bytes)?;
        parsed.ok_or(Error::EmptyBody)
    }
}

#[async_trait]
impl UserDirectory for CrmClient {
    async fn allowed_users(&self) -> Result<AllowedUsersResponse> {
        self.json(self.request(Method::GET, "/users"), "users").await
    }
}

#[async_trait]
impl CrmApi for CrmClient {
    async fn register_user(&self, req: &RegistrationRequest) -> Result<RegistrationResponse> {
        let builder = self.request(Method::POST, "/users/register").json(req);
        self.json(builder, "register").await
    }

    async fn list_products(&self, page_size: u32) -> Result<ProductsResponse> {
        let builder = self
            .request(Method::GET, "/products")
            .query(&[("pageSize", page_size)]);
        self.json(builder, "products").await
    }

    async fn list_sales(&self, page_size: u32) -> Result<SalesResponse> {
        let builder = self
            .request(Method::GET, "/sales")
            .query(&[("pageSize", page_size)]);
        self.json(builder, "sales").await
    }

    async fn stats(&self) -> Result<StatsResponse> {
        self.json(self.request(Method::GET, "/stats"), "stats").await
    }

    async fn ship_sale(&self, sale_id: SaleId) -> Result<()> {
        let path = format!("/sales/{}/ship", sale_id.0);
        self.send(self.request(Method::POST, &path), "ship").await?;
        Ok(())
    }
}
