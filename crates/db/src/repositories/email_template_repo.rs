//! Repository for the `email_templates` table.

use sqlx::PgPool;

use crate::models::email_template::EmailTemplate;

const COLUMNS: &str = "id, name, subject, html_content, variables, created_at, updated_at";

/// Read access to the seeded email templates.
pub struct EmailTemplateRepo;

impl EmailTemplateRepo {
    /// Find a template by its unique name.
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<EmailTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_templates WHERE name = $1");
        sqlx::query_as::<_, EmailTemplate>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// All templates, alphabetically by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<EmailTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_templates ORDER BY name");
        sqlx::query_as::<_, EmailTemplate>(&query)
            .fetch_all(pool)
            .await
    }
}
