// ==========================================
// Delivery Route Back Office - repository layer
// ==========================================
// Role: data access interfaces over SQLite
// Hard rule: repositories contain no business logic
// Constraint: all queries are parameterized
// ==========================================

pub mod error;
pub mod family_repo;
pub mod order_repo;
pub mod product_repo;
pub mod route_repo;

// Re-export core repositories
pub use error::{RepositoryError, RepositoryResult};
pub use family_repo::{FamilyQuery, FamilyRepository};
pub use order_repo::{OrderItemRow, OrderQuery, OrderRepository, OrderTotals};
pub use product_repo::{ProductQuery, ProductRepository};
pub use route_repo::{RouteQuery, RouteRepository};

/// Resolve an `ordering` request against a per-entity column whitelist.
///
/// `ordering` uses the listing convention: a bare column name sorts
/// ascending, a `-` prefix sorts descending. Unknown columns are rejected
/// instead of silently ignored.
pub(crate) fn resolve_ordering(
    ordering: Option<&str>,
    allowed: &[&str],
    default: &str,
) -> RepositoryResult<String> {
    let requested = ordering.unwrap_or(default).trim();
    let (column, direction) = match requested.strip_prefix('-') {
        Some(rest) => (rest, "DESC"),
        None => (requested, "ASC"),
    };

    if !allowed.contains(&column) {
        return Err(RepositoryError::ValidationError(format!(
            "unknown ordering column: {column}"
        )));
    }

    Ok(format!("{column} {direction}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ordering() {
        let allowed = ["order_date", "nf", "created_at"];
        assert_eq!(
            resolve_ordering(None, &allowed, "-created_at").unwrap(),
            "created_at DESC"
        );
        assert_eq!(
            resolve_ordering(Some("nf"), &allowed, "-created_at").unwrap(),
            "nf ASC"
        );
        assert_eq!(
            resolve_ordering(Some("-order_date"), &allowed, "-created_at").unwrap(),
            "order_date DESC"
        );
        assert!(resolve_ordering(Some("nf; DROP TABLE orders"), &allowed, "-created_at").is_err());
    }
}
