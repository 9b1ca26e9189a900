use serde::{Deserialize, Serialize};

/// One previous owner of a catalog sneaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub id: String,
    pub name: String,
    pub date: String,
}

/// A sneaker model in the reference catalog.
///
/// Every field is required on the wire; a stored record missing any of them
/// fails to decode rather than surfacing half-populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub gallery: Vec<String>,
    pub history: Vec<OwnershipRecord>,
    pub manufacture_number: String,
}

/// A record from the legacy `myCollection` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture_number: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub history: Vec<OwnershipRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}
