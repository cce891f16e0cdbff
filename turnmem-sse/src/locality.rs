//! Remote-address localhost normalization, shared by `addClient` (spec
//! §4.8) and the HTTP surface's remote-address guard (spec §4.9).

const LOCALHOST_HOSTS: &[&str] = &["127.0.0.1", "::1", "::ffff:127.0.0.1", "localhost"];

/// True if `remote` (an address as reported by the transport, with or
/// without a trailing port) normalizes to one of the accepted localhost
/// forms.
pub fn is_localhost(remote: &str) -> bool {
    LOCALHOST_HOSTS.contains(&strip_port(remote.trim()).as_str())
}

fn strip_port(remote: &str) -> String {
    if let Some(rest) = remote.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }
    if remote.matches(':').count() == 1 {
        if let Some((host, _port)) = remote.rsplit_once(':') {
            return host.to_string();
        }
    }
    remote.to_string()
}

#[cfg(test)]
#[path = "locality.test.rs"]
mod tests;
