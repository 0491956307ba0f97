// ==========================================
// Delivery Route Back Office - catalog API
// ==========================================
// Role: family and product queries for selection front ends
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::{Family, Product};
use crate::repository::family_repo::{FamilyQuery, FamilyRepository};
use crate::repository::product_repo::{ProductQuery, ProductRepository};

// ==========================================
// FamilySummary - family + derived product count
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilySummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub total_products: i64,
}

// ==========================================
// CatalogApi
// ==========================================
pub struct CatalogApi {
    family_repo: Arc<FamilyRepository>,
    product_repo: Arc<ProductRepository>,
}

impl CatalogApi {
    pub fn new(family_repo: Arc<FamilyRepository>, product_repo: Arc<ProductRepository>) -> Self {
        Self {
            family_repo,
            product_repo,
        }
    }

    /// List families matching the filter
    pub async fn list_families(&self, query: FamilyQuery) -> ApiResult<Vec<Family>> {
        Ok(self.family_repo.list(&query)?)
    }

    /// Family detail with its active-product count
    pub async fn get_family(&self, id: i64) -> ApiResult<FamilySummary> {
        let family = self
            .family_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Family {id}")))?;
        let total_products = self.family_repo.count_active_products(id)?;

        Ok(FamilySummary {
            id: family.id,
            name: family.name,
            description: family.description,
            active: family.active,
            total_products,
        })
    }

    /// List products matching the filter
    pub async fn list_products(&self, query: ProductQuery) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list(&query)?)
    }

    pub async fn get_product(&self, id: i64) -> ApiResult<Product> {
        self.product_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Product {id}")))
    }
}
