// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    PostgresBuiltinCommandRepository, PostgresChatterRepository, PostgresCustomCommandRepository,
    PostgresStreamStatusRepository,
};
