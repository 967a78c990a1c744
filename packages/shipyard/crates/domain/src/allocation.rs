//! Port and service-name allocation.
//!
//! Allocation is a pure function of the ordered project list, the registry
//! left by previous runs, and the port policy. Running it twice with the same
//! inputs yields the same result.

use crate::entities::allocation::ServiceAllocation;
use crate::entities::project::{name_from_path, path_key};
use crate::entities::registry::ProjectRegistry;
use crate::fingerprint::short_path_digest;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BASE_PORT: u16 = 25565;

/// Ports published by the baseline infrastructure services
/// (coordination, messaging, database, proxy).
pub const INFRASTRUCTURE_PORTS: [u16; 4] = [2181, 9092, 27017, 25577];

const COLLISION_DIGEST_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("No free port left at or above {base} for project {project}")]
    PortsExhausted { base: u16, project: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPolicy {
    pub base: u16,
    pub reserved: BTreeSet<u16>,
}

impl Default for PortPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_PORT,
            reserved: INFRASTRUCTURE_PORTS.into_iter().collect(),
        }
    }
}

/// A project asking for an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    pub name: String,
    pub path: PathBuf,
}

/// Lowercases `name` and collapses every run of non-alphanumeric characters
/// into a single `-`. Never returns an empty string.
pub fn normalize_service_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if out.is_empty() {
        "project".to_string()
    } else {
        out
    }
}

/// Assigns a port and service name to every request.
///
/// Projects already in `registry` keep their port, name and replica count.
/// New projects take the lowest free port at or above `policy.base`, in
/// input order. `reserved_names` (the baseline service names) are never
/// handed out.
pub fn allocate(
    requests: &[AllocationRequest],
    registry: &ProjectRegistry,
    policy: &PortPolicy,
    reserved_names: &[&str],
) -> Result<Vec<ServiceAllocation>, AllocationError> {
    let mut taken_ports: BTreeSet<u16> = registry.ports();
    taken_ports.extend(policy.reserved.iter().copied());

    let mut taken_names: BTreeSet<String> = registry.service_names();
    taken_names.extend(reserved_names.iter().map(|n| n.to_string()));

    let mut seen = HashSet::new();
    let mut next_port = Some(policy.base);
    let mut allocations = Vec::with_capacity(requests.len());

    for request in requests {
        let key = path_key(&request.path);
        if !seen.insert(key.clone()) {
            continue;
        }

        if let Some(entry) = registry.get(&key) {
            allocations.push(ServiceAllocation {
                name: entry.name.clone(),
                path: request.path.clone(),
                port: entry.port,
                service_name: entry.service_name.clone(),
                replicas: entry.replicas,
            });
            continue;
        }

        let port = loop {
            let candidate = next_port.ok_or_else(|| AllocationError::PortsExhausted {
                base: policy.base,
                project: request.name.clone(),
            })?;
            next_port = candidate.checked_add(1);
            if !taken_ports.contains(&candidate) {
                break candidate;
            }
        };
        taken_ports.insert(port);

        let service_name = unique_service_name(request, &taken_names);
        taken_names.insert(service_name.clone());

        allocations.push(ServiceAllocation {
            name: request.name.clone(),
            path: request.path.clone(),
            port,
            service_name,
            replicas: 1,
        });
    }

    Ok(allocations)
}

/// Normalized project names claimed by more than one path, counting both
/// `paths` and the projects already in `registry`.
pub fn shared_names(paths: &[PathBuf], registry: &ProjectRegistry) -> BTreeSet<String> {
    let mut claims: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for path in paths {
        claims
            .entry(normalize_service_name(&name_from_path(path)))
            .or_default()
            .insert(path_key(path));
    }
    for (key, entry) in &registry.projects {
        claims
            .entry(normalize_service_name(&entry.name))
            .or_default()
            .insert(key.clone());
    }
    claims
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(name, _)| name)
        .collect()
}

/// Base name, then `<base>-<path digest>`, then `<base>-<path digest>-<n>`.
fn unique_service_name(request: &AllocationRequest, taken: &BTreeSet<String>) -> String {
    let base = normalize_service_name(&request.name);
    if !taken.contains(&base) {
        return base;
    }

    let hashed = format!(
        "{}-{}",
        base,
        short_path_digest(&request.path, COLLISION_DIGEST_LEN)
    );
    if !taken.contains(&hashed) {
        return hashed;
    }

    let mut n = 2u32;
    loop {
        let candidate = format!("{}-{}", hashed, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
