use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    pub payment_url_default: String,
    pub payment_url_fallback: String,
    pub worker_count: usize,
    pub summary_decimals: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            http_port: env_parsed("HTTP_PORT", 9999),
            redis_host: env_or("REDIS_HOST", "localhost"),
            redis_port: env_parsed("REDIS_PORT", 6379),
            payment_url_default: env_or("PAYMENT_URL_DEFAULT", "http://localhost:8001"),
            payment_url_fallback: env_or("PAYMENT_URL_FALLBACK", "http://localhost:8002"),
            worker_count: env_parsed("PAYMENT_WORKERS", 50usize).max(1),
            summary_decimals: env_parsed("SUMMARY_DECIMALS", 1),
        }
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

fn env_parsed<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parsing_and_defaults() {
        std::env::remove_var("HTTP_PORT");
        std::env::remove_var("PAYMENT_WORKERS");
        std::env::remove_var("REDIS_HOST");
        std::env::remove_var("REDIS_PORT");
        std::env::remove_var("PAYMENT_URL_DEFAULT");
        std::env::remove_var("PAYMENT_URL_FALLBACK");
        std::env::remove_var("SUMMARY_DECIMALS");

        let config = Config::from_env();
        assert_eq!(config.http_port, 9999);
        assert_eq!(config.worker_count, 50);
        assert_eq!(config.payment_url_default, "http://localhost:8001");
        assert_eq!(config.payment_url_fallback, "http://localhost:8002");
        assert_eq!(config.summary_decimals, 1);
        assert_eq!(config.redis_url(), "redis://localhost:6379");

        std::env::set_var("PAYMENT_WORKERS", "not-a-number");
        assert_eq!(Config::from_env().worker_count, 50);

        std::env::set_var("PAYMENT_WORKERS", "0");
        assert_eq!(Config::from_env().worker_count, 1);

        std::env::set_var("PAYMENT_WORKERS", "8");
        assert_eq!(Config::from_env().worker_count, 8);
        std::env::remove_var("PAYMENT_WORKERS");
    }
}
