pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_NAME: &str = "name";
pub const KEY_ROLE: &str = "role";
pub const KEY_ORGANIZATION_NAME: &str = "organization_name";
/// Older dashboard builds wrote the organization under this key. It is read
/// as a fallback and removed whenever the canonical key is written.
pub const LEGACY_KEY_ORGANIZATION: &str = "organization";

pub const ALL_KEYS: [&str; 6] = [
    KEY_ACCESS_TOKEN,
    KEY_REFRESH_TOKEN,
    KEY_NAME,
    KEY_ROLE,
    KEY_ORGANIZATION_NAME,
    LEGACY_KEY_ORGANIZATION,
];
