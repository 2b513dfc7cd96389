//! Built-in schema descriptors for the console's management screens.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::schema::{EntitySchema, SchemaError};
use crate::sort::{RankTable, SortDirection, SortKind};

pub const ORDERS: &str = "orders";
pub const PARTNERS: &str = "partners";
pub const BUNDLES: &str = "bundles";
pub const NOTIFICATIONS: &str = "notifications";
pub const POINTS: &str = "points";
pub const BANNERS: &str = "banners";
pub const SUBCATEGORIES: &str = "subcategories";
pub const PRODUCTS: &str = "products";

/// Most urgent first.
#[must_use]
pub fn priority_ranks() -> RankTable {
    RankTable::new(["critical", "high", "medium", "low"])
}

#[must_use]
pub fn severity_ranks() -> RankTable {
    RankTable::new(["critical", "error", "warning", "info"])
}

/// Highest tier first.
#[must_use]
pub fn tier_ranks() -> RankTable {
    RankTable::new(["platinum", "gold", "silver", "bronze"])
}

const TIERS: [&str; 4] = ["platinum", "gold", "silver", "bronze"];

/// Orders list.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn orders() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(ORDERS)
        .searchable(["orderNumber", "customer.name", "customer.email"])
        .facet(
            "status",
            ["pending", "processing", "shipped", "delivered", "cancelled", "refunded"],
        )
        .facet_at("payment", "payment.status", ["paid", "unpaid", "refunded"])
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .sort_at("revenue", "total", SortKind::Numeric, SortDirection::Desc)
        .sort_at("name", "customer.name", SortKind::Text, SortDirection::Asc)
        .sort("priority", SortKind::Rank(priority_ranks()), SortDirection::Asc)
        .build()
}

/// Partners list.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn partners() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(PARTNERS)
        .searchable(["name", "email", "company"])
        .facet("status", ["active", "pending", "suspended"])
        .facet("tier", TIERS)
        .facet("type", ["supplier", "affiliate", "reseller"])
        .sort("revenue", SortKind::Numeric, SortDirection::Desc)
        .sort("name", SortKind::Text, SortDirection::Asc)
        .sort_at("date", "joinedAt", SortKind::Timestamp, SortDirection::Desc)
        .sort("tier", SortKind::Rank(tier_ranks()), SortDirection::Asc)
        .build()
}

/// Product bundles.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn bundles() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(BUNDLES)
        .searchable(["name", "description", "sku"])
        .facet("status", ["active", "draft", "archived"])
        .facet("category", Vec::<String>::new())
        .sort_at("revenue", "sales.revenue", SortKind::Numeric, SortDirection::Desc)
        .sort_at("price", "pricing.bundlePrice", SortKind::Numeric, SortDirection::Asc)
        .sort("name", SortKind::Text, SortDirection::Asc)
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .build()
}

/// Notification centre.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn notifications() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(NOTIFICATIONS)
        .searchable(["title", "message"])
        .facet("type", ["system", "order", "promotion", "alert"])
        .facet("priority", ["critical", "high", "medium", "low"])
        .facet("severity", ["critical", "error", "warning", "info"])
        .facet("status", ["unread", "read", "archived"])
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .sort("priority", SortKind::Rank(priority_ranks()), SortDirection::Asc)
        .sort("severity", SortKind::Rank(severity_ranks()), SortDirection::Asc)
        .sort_at("name", "title", SortKind::Text, SortDirection::Asc)
        .build()
}

/// Loyalty point transactions.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn points() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(POINTS)
        .searchable(["customer.name", "customer.email", "description"])
        .facet("type", ["earned", "redeemed", "expired", "adjusted"])
        .facet_at("tier", "customer.tier", TIERS)
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .sort("points", SortKind::Numeric, SortDirection::Desc)
        .sort_at("name", "customer.name", SortKind::Text, SortDirection::Asc)
        .sort_at("tier", "customer.tier", SortKind::Rank(tier_ranks()), SortDirection::Asc)
        .build()
}

/// Marketing banners.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn banners() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(BANNERS)
        .searchable(["title", "description"])
        .facet("status", ["active", "scheduled", "expired", "draft"])
        .facet("placement", ["homepage", "category", "checkout", "sidebar"])
        .sort_at("date", "startDate", SortKind::Timestamp, SortDirection::Desc)
        .sort_at("clicks", "engagement.clicks", SortKind::Numeric, SortDirection::Desc)
        .sort_at("ctr", "engagement.ctr", SortKind::Numeric, SortDirection::Desc)
        .sort_at("name", "title", SortKind::Text, SortDirection::Asc)
        .build()
}

/// Catalogue subcategories.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn subcategories() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(SUBCATEGORIES)
        .searchable(["name", "slug", "description", "parentCategory"])
        .facet("status", ["active", "inactive"])
        .facet_at("parent", "parentCategory", Vec::<String>::new())
        .sort("name", SortKind::Text, SortDirection::Asc)
        .sort_at("products", "productCount", SortKind::Numeric, SortDirection::Desc)
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .build()
}

/// Product list.
///
/// # Errors
///
/// Returns [`SchemaError`] if the descriptor is malformed.
pub fn products() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder(PRODUCTS)
        .searchable(["name", "sku", "brand", "category"])
        .facet("status", ["active", "draft", "out_of_stock", "archived"])
        .facet("category", Vec::<String>::new())
        .sort_at("price", "pricing.basePrice", SortKind::Numeric, SortDirection::Asc)
        .sort_at("stock", "inventory.quantity", SortKind::Numeric, SortDirection::Desc)
        .sort("name", SortKind::Text, SortDirection::Asc)
        .sort_at("date", "createdAt", SortKind::Timestamp, SortDirection::Desc)
        .build()
}

/// Every built-in schema, keyed by entity name.
#[derive(Debug, Clone)]
pub struct Catalog {
    schemas: BTreeMap<String, Arc<EntitySchema>>,
}

impl Catalog {
    /// Builds all built-in descriptors.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] encountered.
    pub fn builtin() -> Result<Self, SchemaError> {
        let schemas = [
            orders()?,
            partners()?,
            bundles()?,
            notifications()?,
            points()?,
            banners()?,
            subcategories()?,
            products()?,
        ];
        Ok(Self::from_schemas(schemas))
    }

    /// Catalog over caller-supplied schemas. Later entries replace earlier
    /// ones with the same entity name.
    pub fn from_schemas<I>(schemas: I) -> Self
    where
        I: IntoIterator<Item = EntitySchema>,
    {
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.entity().to_string(), Arc::new(schema)))
                .collect(),
        }
    }

    /// Schema for `entity`, if registered.
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(entity).cloned()
    }

    /// Registered entity names, sorted.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}
