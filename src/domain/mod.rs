pub mod lockout;
pub mod password;
pub mod session;
pub mod token;
pub mod user;
