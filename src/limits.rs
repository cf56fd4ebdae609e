//! Static input bounds. Lengths are counted in unicode code points.
use super::error::LedgerError;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LEN: usize = 20;
pub const MAX_PERMISSIONS: usize = 5;
pub const MAX_CHANGES_LEN: usize = 500;
pub const MAX_ATTACHMENT_DESCRIPTION_LEN: usize = 200;

pub fn check_len(field: &str, value: &str, max: usize) -> Result<(), LedgerError> {
    let len = value.chars().count();
    if len > max {
        return Err(LedgerError::InvalidParameter(format!(
            "{field} is {len} characters, limit is {max}"
        )));
    }
    Ok(())
}

pub fn check_count(field: &str, count: usize, max: usize) -> Result<(), LedgerError> {
    if count > max {
        return Err(LedgerError::InvalidParameter(format!(
            "{field} has {count} entries, limit is {max}"
        )));
    }
    Ok(())
}
