//! Endpoint paths, relative to the configured API base URL.

pub const TOKEN: &str = "token/";
pub const TOKEN_REFRESH: &str = "token/refresh/";
pub const TOKEN_VERIFY: &str = "token/verify/";
pub const REGISTER: &str = "register/";
pub const CURRENT_USER: &str = "user/me/";
pub const TASKS: &str = "tasks/";
pub const PERSONAS: &str = "personas/";
pub const DAILY_SUGGESTIONS: &str = "daily-suggestions/";
