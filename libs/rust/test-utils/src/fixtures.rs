//! Test fixtures with sample data.

/// GUID of the user present in the reference issue/rotate scenario.
pub const SCENARIO_USER_GUID: &str = "11111111-1111-1111-1111-111111111111";

/// Email of the scenario user.
pub const SCENARIO_USER_EMAIL: &str = "scenario@example.com";

/// Client address used by the reference scenario (TEST-NET-3).
pub const SCENARIO_CLIENT_IP: &str = "203.0.113.5";

/// A GUID that no fixture ever provisions.
pub const UNKNOWN_USER_GUID: &str = "99999999-9999-9999-9999-999999999999";

/// Base64 (standard alphabet) signing secret for tests.
pub const TEST_SIGNING_KEY_B64: &str =
    "dGVzdC1zaWduaW5nLWtleS1mb3ItYXV0aC10b2tlbi1zZXJ2aWNlLTY0LWJ5dGVzLWxvbmctcGFkZGluZyE=";

/// A second, unrelated signing secret for cross-key tests.
pub const OTHER_SIGNING_KEY_B64: &str = "b3RoZXItc2lnbmluZy1rZXktbm90LXRydXN0ZWQtYnktdGhlLXNlcnZpY2U=";
