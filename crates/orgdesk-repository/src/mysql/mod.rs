//! MySQL repository implementations.

mod access_token_repository;
mod catalog;
mod division_repository;
mod position_repository;
mod role_repository;
mod user_repository;

pub use access_token_repository::MySqlAccessTokenRepository;
pub use division_repository::MySqlDivisionRepository;
pub use position_repository::MySqlPositionRepository;
pub use role_repository::MySqlRoleRepository;
pub use user_repository::MySqlUserRepository;

use orgdesk_core::{OrgdeskError, OrgdeskResult, Sort, SortColumn};
use sqlx::mysql::MySqlQueryResult;

/// Maps a duplicate-key error on a known unique index to the same field
/// error the uniqueness rule would have produced.
///
/// `keys` pairs an index name with the payload field it guards.
pub(crate) fn map_unique(err: sqlx::Error, keys: &[(&str, &str)]) -> OrgdeskError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if let Some((_, field)) = keys.iter().find(|(index, _)| message.contains(index)) {
                let attribute = field.replace('_', " ");
                return OrgdeskError::field(*field, format!("The {attribute} has already been taken."));
            }
        }
    }
    err.into()
}

/// Builds a `LIKE` pattern matching `term` anywhere, case-insensitively.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Returns an `ORDER BY` body with the primary key as tie-breaker.
pub(crate) fn order_by<S: SortColumn>(sort: Sort<S>) -> String {
    if sort.column == S::PRIMARY {
        sort.to_sql()
    } else {
        format!("{}, {} ASC", sort.to_sql(), S::PRIMARY.column())
    }
}

pub(crate) fn inserted_id(result: &MySqlQueryResult) -> OrgdeskResult<i64> {
    i64::try_from(result.last_insert_id())
        .map_err(|_| OrgdeskError::internal("insert id out of range"))
}

pub(crate) fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgdesk_core::{SortDirection, UserSort};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ada"), "%ada%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_order_by_adds_tie_breaker() {
        let sort = Sort {
            column: UserSort::Name,
            direction: SortDirection::Desc,
        };
        assert_eq!(order_by(sort), "u_name DESC, u_id ASC");
        assert_eq!(order_by(Sort::<UserSort>::default()), "u_id ASC");
    }

    #[test]
    fn test_to_count() {
        assert_eq!(to_count(5), 5);
        assert_eq!(to_count(-1), 0);
    }
}
