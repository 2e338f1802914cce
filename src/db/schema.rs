use sqlx::MySqlPool;

pub const CREATE_ATTENDANCES: &str = r#"
    CREATE TABLE IF NOT EXISTS attendances (
        id INT NOT NULL AUTO_INCREMENT,
        userId VARCHAR(255) NOT NULL,
        eventId VARCHAR(255) NOT NULL,
        status ENUM('present', 'absent') NOT NULL DEFAULT 'present',
        createdAt DATETIME NOT NULL,
        updatedAt DATETIME NOT NULL,
        PRIMARY KEY (id),
        KEY idx_attendances_event_created (eventId, createdAt)
    )
"#;

/// Creates the tables if absent. Existing tables are left untouched.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_ATTENDANCES).execute(pool).await?;
    Ok(())
}
