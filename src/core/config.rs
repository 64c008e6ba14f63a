/// Server configuration
///
/// # Environment variables
///
/// Every item can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/bhoj/edge | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | JOB_TICK_SECS | 60 | Poll job scheduler interval |
/// | ENABLE_JOB_SCHEDULER | true | Run the built-in scheduler |
/// | LOG_TO_FILE | false | Also write daily-rolling log files |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/bhoj HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Tick of the built-in job scheduler, seconds
    pub job_tick_secs: u64,
    /// Whether the built-in scheduler runs (off when an external cron hits
    /// the job routes instead)
    pub enable_job_scheduler: bool,
    /// Also write daily-rolling log files under `{work_dir}/logs`
    pub log_to_file: bool,
    /// Graceful shutdown budget, milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/bhoj/edge".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            job_tick_secs: std::env::var("JOB_TICK_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            enable_job_scheduler: std::env::var("ENABLE_JOB_SCHEDULER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_to_file: std::env::var("LOG_TO_FILE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Database path under the working directory
    pub fn db_path(&self) -> String {
        format!("{}/db", self.work_dir)
    }

    /// Log directory under the working directory
    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.work_dir)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
