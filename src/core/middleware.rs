use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ORGANIZATION_HEADER: &str = "X-Organization-Id";
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const USER_NAME_HEADER: &str = "X-User-Name";

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Viewer,
    Commenter,
    Auditor,
    Admin,
}

impl UserRole {
    fn rank(self) -> u8 {
        match self {
            Self::Viewer => 0,
            Self::Commenter => 1,
            Self::Auditor => 2,
            Self::Admin => 3,
        }
    }

    /// Roles are hierarchical: an admin may do everything an auditor can.
    pub fn includes(self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Viewer => "viewer",
            Self::Commenter => "commenter",
            Self::Auditor => "auditor",
            Self::Admin => "admin",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "commenter" => Ok(Self::Commenter),
            "auditor" => Ok(Self::Auditor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{required} role required")]
pub struct AccessDenied {
    pub required: UserRole,
}

// ============================================================================
// Tenant Context
// ============================================================================

/// Caller identity forwarded by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub role: UserRole,
}

impl TenantContext {
    pub fn new(organization_id: Uuid, user_id: Uuid, role: UserRole) -> Self {
        Self {
            organization_id,
            user_id,
            user_name: None,
            role,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.user_name = Some(name.to_string());
        self
    }

    pub fn require(&self, required: UserRole) -> Result<(), AccessDenied> {
        if self.role.includes(required) {
            Ok(())
        } else {
            warn!(
                "User {} ({}) denied: {} role required",
                self.user_id, self.role, required
            );
            Err(AccessDenied { required })
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

type Rejection = (StatusCode, Json<serde_json::Value>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(serde_json::json!({ "error": message })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, Rejection> {
    match header_str(headers, name) {
        None => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| reject(StatusCode::BAD_REQUEST, &format!("Invalid {name} header"))),
    }
}

pub fn tenant_from_headers(headers: &HeaderMap) -> Result<TenantContext, Rejection> {
    let organization_id = header_uuid(headers, ORGANIZATION_HEADER)?.ok_or_else(|| {
        reject(
            StatusCode::BAD_REQUEST,
            "Organization context required",
        )
    })?;
    let user_id = header_uuid(headers, USER_ID_HEADER)?
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Authentication required"))?;
    let role = match header_str(headers, USER_ROLE_HEADER) {
        None => UserRole::Viewer,
        Some(value) => value
            .parse::<UserRole>()
            .map_err(|e| reject(StatusCode::BAD_REQUEST, &e))?,
    };

    Ok(TenantContext {
        organization_id,
        user_id,
        user_name: header_str(headers, USER_NAME_HEADER).map(str::to_string),
        role,
    })
}

// ============================================================================
// Axum Extractors
// ============================================================================

#[axum::async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        tenant_from_headers(&parts.headers)
    }
}
