pub mod config;
pub mod init;
pub mod query;
pub mod record;
pub mod row;
