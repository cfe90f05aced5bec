//! Phone-number authentication.
//!
//! Login is OTP-based: the client requests a one-time code for a phone
//! number, then exchanges the code for a JWT. There is no password. The
//! SMS gateway is mocked: the code is written to the log, which is
//! enough for development and tests.
//!
//! The relay itself trusts the participant identifier a connection
//! announces; the token authenticates the REST client UI.

pub mod handlers;
pub mod otp;
pub mod sessions;
pub mod users;

pub use handlers::{request_otp, verify_otp};
pub use otp::OtpStore;
