#![forbid(unsafe_code)]

pub mod repository;
pub mod rest;
pub mod sqlite;

pub use repository::{
    AttemptRecord, AttemptRepository, InMemoryRepository, QuestionRecord, QuestionRepository,
    Storage, StorageError,
};
