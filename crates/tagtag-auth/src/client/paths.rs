//! Identity endpoint paths, relative to the configured base URL.

/// `POST` credentials, returns a token pair.
pub const LOGIN: &str = "/auth/login";
/// `POST` a refresh token, returns a token pair.
pub const REFRESH: &str = "/auth/refresh";
/// `POST` the access token being discarded.
pub const LOGOUT: &str = "/auth/logout";
/// `POST` a new account.
pub const REGISTER: &str = "/auth/register";
/// `GET` the principal's access codes.
pub const ACCESS_CODES: &str = "/auth/codes";
/// `GET` the principal's profile.
pub const PROFILE: &str = "/auth/me";
/// `GET` the principal's flat menu records.
pub const MENUS: &str = "/auth/menu/all";
/// `GET` a new slider captcha challenge.
pub const CAPTCHA_INIT: &str = "/auth/captcha/translate/init";
/// `POST` a slider captcha answer.
pub const CAPTCHA_VERIFY: &str = "/auth/captcha/translate/verify";
