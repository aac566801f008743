pub mod binding;
pub mod link;
pub mod otp;
pub mod recovery;
pub mod register;
pub mod session;
