//! JSON payloads of the CRM bot API.
//!
//! The server speaks camelCase and may omit fields, so every struct is
//! `#[serde(default)]`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub username: String,
    /// Sent as a string; the CRM stores it verbatim.
    pub chat_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub message: String,
    pub is_confirmed: bool,
    pub user_id: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductsResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub status: String,
    pub supplier: String,
    pub color: Option<String>,
    pub is_favorite: bool,
    pub is_defective: bool,
    #[serde(deserialize_with = "de_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SalesResponse {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub sales: Vec<Sale>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub buyer: String,
    #[serde(deserialize_with = "de_datetime")]
    pub sale_date: Option<NaiveDateTime>,
    pub total_amount: f64,
    pub status: String,
    #[serde(alias = "TTN")]
    pub ttn: Option<String>,
    pub sold_through: Option<String>,
    pub additional_service: Option<String>,
    pub product_count: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsResponse {
    pub products: ProductStats,
    pub sales: SalesStats,
    pub categories: Vec<CategoryStats>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductStats {
    pub total: i64,
    pub in_stock: i64,
    pub sold: i64,
    pub expected: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SalesStats {
    pub total: i64,
    pub total_amount: f64,
    pub today: TodayStats,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TodayStats {
    pub count: i64,
    pub amount: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct AllowedUsersResponse {
    /// `None` when the server sent `null` or omitted the list.
    pub allowed_users: Option<Vec<String>>,
    pub count: i64,
}

/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`), naive ISO 8601 with optional
/// fractional seconds, or a bare date. Unparseable values become `None`.
fn de_datetime<'de, D>(d: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn products_page_reads_camel_case() {
        let v = json!({
            "total": 12,
            "page": 1,
            "pageSize": 5,
            "products": [{
                "id": 7,
                "name": "Nike Air",
                "category": "Shoes",
                "subcategory": null,
                "purchasePrice": 1000.0,
                "salePrice": 1999.5,
                "status": "InStock",
                "supplier": "Acme",
                "isFavorite": true,
                "isDefective": false,
                "createdAt": "2024-03-01T12:30:00.123"
            }]
        });
        let page: ProductsResponse = serde_json::from_value(v).unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.page_size, 5);
        let p = &page.products[0];
        assert_eq!(p.sale_price, 1999.5);
        assert!(p.is_favorite);
        assert_eq!(p.color, None);
        assert_eq!(
            p.created_at.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn missing_fields_default() {
        let s: Sale = serde_json::from_str(r#"{"id": 3, "TTN": "2045"}"#).unwrap();
        assert_eq!(s.id, 3);
        assert_eq!(s.ttn.as_deref(), Some("2045"));
        assert_eq!(s.sale_date, None);
        assert_eq!(s.product_count, 0);
    }

    #[test]
    fn allowed_users_null_list_is_none() {
        let r: AllowedUsersResponse =
            serde_json::from_str(r#"{"allowedUsers": null, "count": 0}"#).unwrap();
        assert_eq!(r.allowed_users, None);

        let r: AllowedUsersResponse =
            serde_json::from_str(r#"{"allowedUsers": ["@Alice", "bob"], "count": 2}"#).unwrap();
        assert_eq!(r.allowed_users.unwrap().len(), 2);
    }

    #[test]
    fn registration_request_serializes_camel_case() {
        let req = RegistrationRequest {
            username: "alice".to_string(),
            chat_id: "42".to_string(),
            first_name: Some("Alice".to_string()),
            last_name: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({"username": "alice", "chatId": "42", "firstName": "Alice", "lastName": null})
        );
    }

    #[test]
    fn datetime_formats() {
        assert!(parse_datetime("2024-05-01T10:00:00Z").is_some());
        assert!(parse_datetime("2024-05-01T10:00:00+03:00").is_some());
        assert!(parse_datetime("2024-05-01T10:00:00").is_some());
        assert!(parse_datetime("2024-05-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
