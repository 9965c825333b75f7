//! Argon2id hashing for share link passwords.

pub mod hasher;

pub use hasher::PasswordHasher;
