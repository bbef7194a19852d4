/// 限流计数器键前缀
const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// 生成限流计数器键（客户端 + 路由模板）
pub fn rate_limit_key(client_id: &str, route_id: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, client_id, route_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_clients_get_distinct_keys() {
        assert_ne!(
            rate_limit_key("1.2.3.4", "/notes"),
            rate_limit_key("5.6.7.8", "/notes")
        );
    }

    #[test]
    fn distinct_routes_get_distinct_keys() {
        assert_ne!(
            rate_limit_key("1.2.3.4", "/notes"),
            rate_limit_key("1.2.3.4", "/users/me")
        );
    }
}
