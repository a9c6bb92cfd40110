use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A phrase that signals the caller may be in crisis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CrisisKeyword {
    pub keyword: String,
    /// e.g. `suicide`, `domestic_violence`, `medical_emergency`
    pub crisis_type: String,
    /// 1 (lowest) to 5 (highest)
    pub severity: i32,
}

impl CrisisKeyword {
    pub fn new(keyword: impl Into<String>, crisis_type: impl Into<String>, severity: i32) -> Self {
        Self {
            keyword: keyword.into(),
            crisis_type: crisis_type.into(),
            severity,
        }
    }

    pub async fn find_active(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT keyword, crisis_type, severity
            FROM crisis_keywords
            WHERE is_active = true
            ORDER BY severity DESC, keyword
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
