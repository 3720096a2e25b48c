//! Per-entity sort allow-lists.
//!
//! Sort columns arrive as free text; each entity exposes a closed enum of the
//! columns it may be ordered by, so only known column names reach SQL.

use std::fmt::Debug;

/// Direction of an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` case-insensitively; anything else is ascending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A closed set of sortable columns for one entity.
pub trait SortColumn: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Column used when none, or an unknown one, is requested.
    const PRIMARY: Self;

    /// Maps a client-supplied column name to a known column.
    fn parse(name: &str) -> Option<Self>;

    /// Returns the column name used in SQL.
    fn column(self) -> &'static str;
}

/// A resolved ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<S> {
    pub column: S,
    pub direction: SortDirection,
}

impl<S: SortColumn> Sort<S> {
    /// Resolves the requested ordering. Unknown columns fall back to the
    /// primary key, exactly as if no column had been requested.
    #[must_use]
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            column: sort_by.map(str::trim).and_then(S::parse).unwrap_or(S::PRIMARY),
            direction: SortDirection::parse(sort_order),
        }
    }

    /// Returns the `ORDER BY` body, e.g. `u_name DESC`.
    #[must_use]
    pub fn to_sql(self) -> String {
        format!("{} {}", self.column.column(), self.direction.as_sql())
    }
}

impl<S: SortColumn> Default for Sort<S> {
    fn default() -> Self {
        Self {
            column: S::PRIMARY,
            direction: SortDirection::Asc,
        }
    }
}

macro_rules! sort_columns {
    ($(#[$meta:meta])* $name:ident, primary = $primary:ident, { $($variant:ident => $column:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl SortColumn for $name {
            const PRIMARY: Self = Self::$primary;

            fn parse(name: &str) -> Option<Self> {
                match name {
                    $($column => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn column(self) -> &'static str {
                match self {
                    $(Self::$variant => $column),+
                }
            }
        }
    };
}

sort_columns!(
    /// Sortable user columns.
    UserSort, primary = Id, {
        Id => "u_id",
        EmployeeId => "u_employee_id",
        Name => "u_name",
        Email => "u_email",
        JoinDate => "u_join_date",
    }
);

sort_columns!(
    /// Sortable role columns.
    RoleSort, primary = Id, {
        Id => "role_id",
        Name => "role_name",
        Level => "role_level",
    }
);

sort_columns!(
    /// Sortable division columns.
    DivisionSort, primary = Id, {
        Id => "div_id",
        Code => "div_code",
        Name => "div_name",
    }
);

sort_columns!(
    /// Sortable position columns.
    PositionSort, primary = Id, {
        Id => "pos_id",
        Code => "pos_code",
        Name => "pos_name",
    }
);
