//! Browser domain: permission control.

use serde::Serialize;

/// A permission name wrapped the way Browser.setPermission expects it.
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDescriptor {
    /// Permission name, e.g. "geolocation", "notifications".
    pub name: String,
}

/// Parameters for Browser.setPermission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPermissionParams {
    /// Descriptor of the permission to override.
    pub permission: PermissionDescriptor,
    /// Setting: "granted", "denied", or "prompt".
    pub setting: String,
    /// Origin the override applies to; omitted means all origins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl SetPermissionParams {
    /// Override one permission for one origin.
    #[must_use]
    pub fn new(name: impl Into<String>, setting: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            permission: PermissionDescriptor { name: name.into() },
            setting: setting.into(),
            origin: Some(origin.into()),
        }
    }
}

/// Parameters for Browser.grantPermissions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionsParams {
    /// Permission names to grant.
    pub permissions: Vec<String>,
    /// Origin the grant applies to; omitted means all origins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl GrantPermissionsParams {
    /// Grant the given permissions for one origin.
    #[must_use]
    pub fn for_origin(permissions: Vec<String>, origin: impl Into<String>) -> Self {
        Self {
            permissions,
            origin: Some(origin.into()),
        }
    }
}
