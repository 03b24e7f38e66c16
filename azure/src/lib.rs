//! Azure clients: the database client (SQL Server or Table storage) and the pieces it is built from.

pub mod auth;

pub mod database;

pub mod keyfile;
