pub mod args;
pub mod capture;
pub mod debug;
pub mod error;
pub mod help;
pub mod kerberos;
pub mod lifecycle;
pub mod output;
