//! Request/response types for admin auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminSessionResponse {
    pub admin_id: String,
    pub email: String,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = AdminLoginRequest {
            email: "admin@pspk.or.ke".to_string(),
            password: "hunter2".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: AdminLoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "admin@pspk.or.ke");
        assert_eq!(decoded.password, "hunter2");
        Ok(())
    }
}
