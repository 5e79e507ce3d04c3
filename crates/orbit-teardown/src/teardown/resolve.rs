//! Network domain lookup by name

use super::error::TeardownError;
use crate::api::CloudControlApi;
use orbit_common::NetworkDomain;
use tracing::info;

/// Resolve a network domain by name within a datacenter.
///
/// # Errors
/// - [`TeardownError::DomainNotFound`] if no domain has that name
/// - [`TeardownError::Resolve`] if the lookup itself fails
pub async fn resolve_network_domain<C: CloudControlApi>(
    api: &C,
    name: &str,
    datacenter_id: &str,
) -> Result<NetworkDomain, TeardownError> {
    info!(name = %name, datacenter_id = %datacenter_id, "Resolving network domain...");

    let domain = api
        .get_network_domain_by_name(name, datacenter_id)
        .await
        .map_err(|source| TeardownError::Resolve {
            name: name.to_string(),
            source,
        })?;

    domain.ok_or_else(|| TeardownError::DomainNotFound {
        name: name.to_string(),
        datacenter_id: datacenter_id.to_string(),
    })
}
