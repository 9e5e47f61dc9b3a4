//! Domain model structs persisted as JSON collections.
//!
//! Field names serialize in camelCase so documents written by earlier
//! deployments of the storefront load unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Storefront section a product is listed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Pubg,
    FreeFire,
    Topup,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pubg, Category::FreeFire, Category::Topup];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pubg => "pubg",
            Category::FreeFire => "free-fire",
            Category::Topup => "topup",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A listing managed from the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub category: Category,
    pub title: String,
    /// Non-negative price in the shop currency.
    pub price: f64,
    #[serde(default)]
    pub description: String,
    /// Public URL of the product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Copy of a product's display fields taken when a chat is opened.
///
/// Never refreshed: later edits to (or deletion of) the product leave
/// existing chats untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSnapshot {
    pub id: String,
    pub category: Category,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            category: p.category,
            title: p.title.clone(),
            price: p.price,
            description: p.description.clone(),
            image: p.image.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Customer,
    Admin,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A support thread opened by a customer about one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Arrival order; this is also the display order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&Category::ALL).unwrap();
        assert_eq!(json, r#"["pubg","free-fire","topup"]"#);
        assert_eq!("free-fire".parse::<Category>().unwrap(), Category::FreeFire);
        assert!("steam".parse::<Category>().is_err());
    }

    #[test]
    fn test_chat_reads_camel_case_document() {
        let raw = r#"{
            "id": "chat-lx1-abcde",
            "productId": "pubg-lx0-aaaaa",
            "productTitle": "Conqueror account",
            "customerName": "Ali",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "messages": [
                {"id": "msg-lx1-bbbbb", "from": "customer", "text": "hi", "createdAt": "2024-05-01T10:00:00.000Z"}
            ]
        }"#;

        let chat: Chat = serde_json::from_str(raw).unwrap();
        assert_eq!(chat.customer_name, "Ali");
        assert_eq!(chat.product_title.as_deref(), Some("Conqueror account"));
        assert!(chat.product.is_none());
        assert!(chat.whatsapp.is_none());
        assert_eq!(chat.messages[0].from, Sender::Customer);

        let back = serde_json::to_value(&chat).unwrap();
        assert!(back.get("whatsapp").is_none());
        assert_eq!(back["productId"], "pubg-lx0-aaaaa");
    }
}
