use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
    pub email_recipient: Option<String>,
    pub cloud_url: Option<String>,
    pub download_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("APP_PORT must be a number"),
            environment: env::var("REPORT_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "report-pipeline".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            email_recipient: non_empty_var("REPORT_EMAIL_RECIPIENT"),
            cloud_url: non_empty_var("REPORT_CLOUD_URL"),
            download_dir: env::var("REPORT_DOWNLOAD_DIR").unwrap_or_else(|_| "reports".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            port: 8080,
            environment: "development".to_string(),
            otel_service_name: "report-pipeline".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
            email_recipient: None,
            cloud_url: None,
            download_dir: "reports".to_string(),
        }
    }

    #[test]
    fn test_is_production() {
        let mut config = sample();
        assert!(!config.is_production());
        config.environment = "production".to_string();
        assert!(config.is_production());
    }
}
