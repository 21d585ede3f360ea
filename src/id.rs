//! Tenant identifier generation
//!
//! A tenant identifier correlates one client installation with one
//! configuration record and one response stream. It is generated once and
//! persisted in durable client storage.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Encode a number in lowercase base-36.
fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Generate a new tenant identifier
///
/// Format: `{timestamp_base36}-{random_hex}`
/// Example: `lx2v9k8f-a1b2`
pub fn generate_tenant_id() -> String {
    let timestamp = now_ms();
    let random: u16 = rand::rng().random();
    format!("{}-{:04x}", to_base36(timestamp), random)
}
