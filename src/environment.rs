/// Named deployments of the Seed Examples API.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Environment {
    #[default]
    Production,
    Staging,
}

impl Environment {
    /// Returns the base URL of this environment.
    pub fn url(self) -> &'static str {
        match self {
            Self::Production => "https://production.com/api",
            Self::Staging => "https://staging.com/api",
        }
    }
}

/// Base URL used when no option overrides it.
pub const DEFAULT_BASE_URL: &str = "https://production.com/api";
