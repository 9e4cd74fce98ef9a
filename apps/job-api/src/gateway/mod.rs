pub mod server;
pub mod session;
pub mod watch;
