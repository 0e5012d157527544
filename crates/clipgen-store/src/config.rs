//! Table configuration.

/// DynamoDB table and index names.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Shorts generation jobs table
    pub jobs_table: String,
    /// Presets table
    pub presets_table: String,
    /// Users table
    pub users_table: String,
    /// GSI on `userId` (sort key `createdAt`) for jobs and presets
    pub user_index: String,
    /// GSI on `email` for users
    pub email_index: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            jobs_table: "GenerateShortsJobs".to_string(),
            presets_table: "Presets".to_string(),
            users_table: "Users".to_string(),
            user_index: "UserIndex".to_string(),
            email_index: "EmailIndex".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            jobs_table: std::env::var("GENERATE_SHORTS_JOBS_TABLE_NAME")
                .unwrap_or(defaults.jobs_table),
            presets_table: std::env::var("PRESETS_TABLE_NAME").unwrap_or(defaults.presets_table),
            users_table: std::env::var("USERS_TABLE_NAME").unwrap_or(defaults.users_table),
            user_index: std::env::var("USER_INDEX_NAME").unwrap_or(defaults.user_index),
            email_index: std::env::var("EMAIL_INDEX_NAME").unwrap_or(defaults.email_index),
        }
    }
}
