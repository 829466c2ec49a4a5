//! PackageRepository port - read access to packages and their price rules.

use async_trait::async_trait;

use crate::domain::catalog::Package;
use crate::domain::foundation::{DomainError, PackageId};

/// Port for loading packages.
///
/// Implementations must return packages with their full set of price rules
/// loaded; the pricing resolver works on the in-memory aggregate.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Find a package by id, including soft-deleted and inactive ones.
    ///
    /// Returns `None` if no such package exists.
    async fn find_by_id(&self, id: &PackageId) -> Result<Option<Package>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PackageRepository) {}
    }
}
