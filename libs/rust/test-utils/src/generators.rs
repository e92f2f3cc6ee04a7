//! Shared proptest generators.
//!
//! Reusable strategies for the identifiers and request inputs exchanged
//! with auth-platform services.

use proptest::prelude::*;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Generate lowercase hyphenated GUIDs (8-4-4-4-12 hex groups).
pub fn guid_strategy() -> impl Strategy<Value = String> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
}

/// Generate IPv4 client addresses in canonical form.
pub fn ipv4_strategy() -> impl Strategy<Value = String> {
    any::<[u8; 4]>().prop_map(|octets| Ipv4Addr::from(octets).to_string())
}

/// Generate IPv6 client addresses in canonical form.
pub fn ipv6_strategy() -> impl Strategy<Value = String> {
    any::<[u16; 8]>().prop_map(|segments| Ipv6Addr::from(segments).to_string())
}

/// Generate client addresses of either family.
pub fn client_ip_strategy() -> impl Strategy<Value = String> {
    prop_oneof![3 => ipv4_strategy(), 1 => ipv6_strategy()]
}

/// Generate email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9._]{0,15}@[a-z]{3,10}\\.(com|org|net)"
}

/// Generate strings that are not GUIDs.
pub fn non_guid_strategy() -> impl Strategy<Value = String> {
    "[g-z]{1,40}"
}

/// Generate opaque strings shaped like refresh tokens (base64, 44 chars).
pub fn refresh_token_like_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/]{43}="
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;
    use std::net::IpAddr;

    #[test]
    fn test_guid_format() {
        let mut runner = TestRunner::default();
        for _ in 0..10 {
            let value = guid_strategy().new_tree(&mut runner).unwrap().current();
            let groups: Vec<usize> = value.split('-').map(str::len).collect();
            assert_eq!(groups, vec![8, 4, 4, 4, 12]);
        }
    }

    #[test]
    fn test_client_ip_parses() {
        let mut runner = TestRunner::default();
        for _ in 0..20 {
            let value = client_ip_strategy().new_tree(&mut runner).unwrap().current();
            assert!(value.parse::<IpAddr>().is_ok(), "not an address: {value}");
        }
    }

    #[test]
    fn test_refresh_token_like_length() {
        let mut runner = TestRunner::default();
        let value = refresh_token_like_strategy()
            .new_tree(&mut runner)
            .unwrap()
            .current();
        assert_eq!(value.len(), 44);
    }
}
