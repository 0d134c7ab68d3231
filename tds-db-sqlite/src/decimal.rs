use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};
use tds_core::RepositoryError;

/// Get a decimal value from a row.
///
/// Rates and thresholds are written as TEXT, but hand-edited databases may
/// hold INTEGER or REAL values, so all three storage classes are accepted.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            val.trim().parse::<Decimal>().map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to parse decimal '{}' in column '{}': {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        "NULL" => Ok(Decimal::ZERO),
        _ => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            type_name, column
        ))),
    }
}

/// Get an optional decimal value from a row, returning None for NULL values.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Convert a Decimal to its TEXT storage form, without trailing zeros.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn create_test_table(pool: &sqlx::sqlite::SqlitePool) {
        sqlx::query(
            "CREATE TABLE test_decimals (
                id INTEGER PRIMARY KEY,
                int_value INTEGER,
                real_value REAL,
                null_value REAL,
                text_value TEXT,
                blob_value BLOB
            )",
        )
        .execute(pool)
        .await
        .expect("Failed to create test table");
    }

    async fn setup_test_db() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        create_test_table(&pool).await;
        pool
    }

    async fn fetch(
        pool: &sqlx::sqlite::SqlitePool,
        insert: &str,
        column: &str,
    ) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert test data");

        sqlx::query(&format!("SELECT {column} FROM test_decimals WHERE id = 1"))
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    // get_decimal tests

    #[tokio::test]
    async fn test_get_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '0.1')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(0.1)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_padded_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, ' 5000000 ')",
            "text_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(5000000)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_unparseable_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, 'not a number')",
            "text_value",
        )
        .await;

        let result = get_decimal(&row, "text_value");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Failed to parse decimal 'not a number'")));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, int_value) VALUES (1, 12345)",
            "int_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(12345)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, real_value) VALUES (1, 123.45)",
            "real_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_null_returns_zero() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, null_value) VALUES (1, NULL)",
            "null_value",
        )
        .await;

        assert_eq!(get_decimal(&row, "null_value"), Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = setup_test_db().await;
        let row = fetch(&pool, "INSERT INTO test_decimals (id) VALUES (1)", "id").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nonexistent_column' not found:")));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, blob_value) VALUES (1, x'00ff')",
            "blob_value",
        )
        .await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    // get_optional_decimal tests

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, text_value) VALUES (1, '20000')",
            "text_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(Some(dec!(20000))));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = setup_test_db().await;
        let row = fetch(
            &pool,
            "INSERT INTO test_decimals (id, null_value) VALUES (1, NULL)",
            "null_value",
        )
        .await;

        assert_eq!(get_optional_decimal(&row, "null_value"), Ok(None));
    }

    // decimal_to_text tests

    #[test]
    fn test_decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(10.00)), "10");
        assert_eq!(decimal_to_text(dec!(0.10)), "0.1");
    }

    #[test]
    fn test_decimal_to_text_zero() {
        assert_eq!(decimal_to_text(Decimal::ZERO), "0");
    }
}
