//! Inventory-backed credentials.
//!
//! The device table is a CSV file with a header row:
//!
//! ```text
//! hostname,address,proxy,auth
//! edge-r1,192.0.2.10,dc1,core
//! lab-sw1,198.51.100.7,,lab
//! ```
//!
//! Hostnames match case-insensitively. `proxy` is optional per row.

use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use super::{resolve_path, ConnectionParams, CredentialsFile, InventorySection, ResolveError};

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    hostname: String,
    address: String,
    proxy: Option<String>,
    auth: String,
}

pub(super) fn resolve(
    file: &CredentialsFile,
    inventory: &InventorySection,
    cfgfile: &Path,
    base_dir: &Path,
    host: &str,
) -> Result<ConnectionParams, ResolveError> {
    let table = resolve_path(base_dir, &inventory.path.to_string_lossy());
    let record = find_device(&table, host)?;

    let profile = file
        .auth
        .get(&record.auth)
        .ok_or_else(|| ResolveError::section_missing(cfgfile, format!("auth.{}", record.auth)))?;

    let proxy = match record.proxy.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            let entry = file
                .proxy
                .get(id)
                .ok_or_else(|| ResolveError::section_missing(cfgfile, format!("proxy.{}", id)))?;
            Some(entry.jump.trim().to_string())
        }
        _ => None,
    };

    Ok(ConnectionParams {
        address: record.address,
        port: profile.port,
        username: profile.username.clone(),
        secret: profile.secret(cfgfile, base_dir)?,
        proxy,
    })
}

fn find_device(table: &Path, host: &str) -> Result<DeviceRecord, ResolveError> {
    let reader = File::open(table).map_err(|source| ResolveError::FileUnreadable {
        path: table.to_path_buf(),
        source,
    })?;
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let wanted = host.trim();
    for row in csv.deserialize::<DeviceRecord>() {
        let record = row.map_err(|e| ResolveError::malformed(table, e))?;
        if record.hostname.eq_ignore_ascii_case(wanted) {
            return Ok(record);
        }
    }

    Err(ResolveError::HostNotFound {
        host: wanted.to_string(),
        path: table.to_path_buf(),
    })
}
