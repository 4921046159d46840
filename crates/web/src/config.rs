use anyhow::{Context, Result, ensure};
use storage::dto::user::{SortOrder, UserListKind, UserSortField};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Rating every user starts from, shown as the first trajectory entry.
    pub default_rating: i32,
    pub ranklist_sort: String,
    pub ranklist_order: String,
    pub userlist_sort: String,
    pub userlist_order: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            default_rating: match std::env::var("DEFAULT_RATING") {
                Ok(value) => value.parse().context("DEFAULT_RATING must be a number")?,
                Err(_) => 1500,
            },
            ranklist_sort: env_or("RANKLIST_SORT", "rating"),
            ranklist_order: env_or("RANKLIST_ORDER", "desc"),
            userlist_sort: env_or("USERLIST_SORT", "id"),
            userlist_order: env_or("USERLIST_ORDER", "asc"),
        };

        config.validate_listing_defaults()?;

        Ok(config)
    }

    /// Each listing's default sort must be one that listing accepts.
    fn validate_listing_defaults(&self) -> Result<()> {
        let listings = [
            (UserListKind::Ranklist, &self.ranklist_sort, &self.ranklist_order),
            (UserListKind::Userlist, &self.userlist_sort, &self.userlist_order),
        ];
        for (kind, sort, order) in listings {
            ensure!(
                UserSortField::parse(sort).is_some_and(|field| kind.allows(field)),
                "Default sort column {sort} is not allowed for {kind:?}"
            );
            ensure!(
                SortOrder::parse(order).is_some(),
                "Unknown default sort order: {order}"
            );
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
