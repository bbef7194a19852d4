use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::common::ApiResponse;
use crate::config::Config;
use crate::error::AppError;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // 用户名
    pub uid: i64,     // 用户ID
    pub role: String, // 用户角色
    pub exp: i64,     // 过期时间
    pub iat: i64,     // 签发时间
}

pub fn generate_token(
    username: &str,
    user_id: i64,
    role: &str,
    config: &Config,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::seconds(config.jwt_expiration().as_secs() as i64))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: username.to_string(),
        uid: user_id,
        role: role.to_string(),
        exp: expiration,
        iat: Utc::now().timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// 角色门槛校验，角色不符返回权限错误
pub fn require_role(claims: &Claims, required: &str) -> Result<(), AppError> {
    if claims.role == required {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

// 所有 handler 的返回体统一为 Json<ApiResponse<T>>
pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/notes".into(),
            redis_url: "redis://localhost".into(),
            jwt_secret: "test-secret".into(),
            jwt_expiration_secs: 3600,
            rate_limit_requests: 100,
            rate_limit_window_secs: 60,
            cache_ttl_secs: 300,
            store_timeout_ms: 1000,
            server_host: "127.0.0.1".into(),
            server_port: 3000,
        }
    }

    #[test]
    fn token_roundtrip() {
        let config = test_config();
        let (token, _) = generate_token("alice", 42, "admin", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let config = test_config();
        let (token, _) = generate_token("alice", 42, "user", &config).unwrap();
        let mut other = test_config();
        other.jwt_secret = "other-secret".into();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn role_gate_blocks_non_admin() {
        let claims = Claims {
            sub: "alice".into(),
            uid: 1,
            role: "user".into(),
            exp: 0,
            iat: 0,
        };
        assert!(require_role(&claims, "admin").is_err());

        let admin = Claims {
            role: "admin".into(),
            ..claims
        };
        assert!(require_role(&admin, "admin").is_ok());
    }

    #[test]
    fn password_hash_roundtrip() {
        let hashed = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }
}
