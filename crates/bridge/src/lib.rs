// docpush-bridge library entry point (shared by the server binary and the CLI).

pub mod config;
pub mod error;
pub mod git;
pub mod google;
pub mod handler;
pub mod server;
