//! Result type aliases for Orgdesk.

use crate::OrgdeskError;

/// A specialized `Result` type for Orgdesk operations.
pub type OrgdeskResult<T> = Result<T, OrgdeskError>;
