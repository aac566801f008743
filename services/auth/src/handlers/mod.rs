pub mod link;
pub mod login;
pub mod otp;
pub mod recover;
pub mod register;
pub mod telegram;
