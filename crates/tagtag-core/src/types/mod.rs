//! Core type definitions shared across the Tagtag workspace.

pub mod captcha;
pub mod credentials;
pub mod menu;
pub mod principal;
pub mod response;
pub mod token;

pub use captcha::{CaptchaChallenge, CaptchaVerification, CaptchaVerifyRequest};
pub use credentials::{Credentials, RegisterRequest};
pub use menu::{MenuRecord, MenuType};
pub use principal::{Principal, Profile};
pub use response::ApiEnvelope;
pub use token::{StoredToken, TokenPair};
