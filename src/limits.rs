use crate::model::Ms;

/// 2000-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 946_684_800_000;
/// 2100-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

pub const MAX_CENTERS: usize = 10_000;
pub const MAX_CENTER_NAME_LEN: usize = 200;

pub const MIN_TEMPLATE_NAME_LEN: usize = 2;
pub const MAX_TEMPLATE_NAME_LEN: usize = 100;
pub const MIN_TEMPLATE_DESCRIPTION_LEN: usize = 10;
pub const MAX_TEMPLATE_DESCRIPTION_LEN: usize = 500;
pub const MIN_TEMPLATE_CAPACITY: u32 = 1;
pub const MAX_TEMPLATE_CAPACITY: u32 = 50;
pub const MAX_TEMPLATES_PER_CENTER: usize = 1_000;

pub const MIN_HOLIDAY_NAME_LEN: usize = 2;
pub const MAX_HOLIDAY_NAME_LEN: usize = 100;
pub const MAX_HOLIDAYS_PER_CENTER: usize = 1_000;

pub const MAX_SESSIONS_PER_CENTER: usize = 100_000;
