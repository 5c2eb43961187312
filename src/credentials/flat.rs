//! Flat credentials: one `[credentials]` table, host argument is the address.

use std::path::Path;

use super::{ConnectionParams, FlatCredentials, ResolveError};

pub(super) fn resolve(
    credentials: &FlatCredentials,
    cfgfile: &Path,
    base_dir: &Path,
    host: &str,
) -> Result<ConnectionParams, ResolveError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ResolveError::HostNotFound {
            host: host.to_string(),
            path: cfgfile.to_path_buf(),
        });
    }

    Ok(ConnectionParams {
        address: host.to_string(),
        port: credentials.auth.port,
        username: credentials.auth.username.clone(),
        secret: credentials.auth.secret(cfgfile, base_dir)?,
        proxy: credentials
            .proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    })
}
