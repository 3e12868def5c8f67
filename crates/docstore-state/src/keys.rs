//! Reserved document keys.
//!
//! System keys share the `ecm:` prefix; blob keys live inside the nested
//! State that describes a blob reference and are unprefixed.

pub const KEY_PREFIX: &str = "ecm:";

pub const KEY_ID: &str = "ecm:id";
pub const KEY_PARENT_ID: &str = "ecm:parentId";
pub const KEY_ANCESTOR_IDS: &str = "ecm:ancestorIds";
pub const KEY_NAME: &str = "ecm:name";
pub const KEY_PRIMARY_TYPE: &str = "ecm:primaryType";

pub const KEY_LOCK_OWNER: &str = "ecm:lockOwner";
pub const KEY_LOCK_CREATED: &str = "ecm:lockCreated";

pub const KEY_CHANGE_TOKEN: &str = "ecm:changeToken";
pub const KEY_SYS_CHANGE_TOKEN: &str = "ecm:sysChangeToken";

pub const KEY_IS_PROXY: &str = "ecm:isProxy";
pub const KEY_PROXY_TARGET_ID: &str = "ecm:proxyTargetId";
pub const KEY_PROXY_IDS: &str = "ecm:proxyIds";

pub const KEY_BLOB_NAME: &str = "name";
pub const KEY_BLOB_MIME_TYPE: &str = "mime-type";
pub const KEY_BLOB_ENCODING: &str = "encoding";
pub const KEY_BLOB_DIGEST: &str = "digest";
pub const KEY_BLOB_LENGTH: &str = "length";
pub const KEY_BLOB_DATA: &str = "data";

/// Returns `true` for keys managed by the repository itself.
pub fn is_system_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX)
}
