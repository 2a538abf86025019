use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Issuer profile as stored in `usuarios`. The logo URL points at blob
/// storage and may be absent for accounts that never uploaded one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerProfile {
    pub id: UserId,
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub logo_url: Option<String>,
}
