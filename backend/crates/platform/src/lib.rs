//! Platform - shared infrastructure primitives
//!
//! Cryptographic and HTTP-adjacent building blocks used by the auth
//! domain:
//! - `password`: slow salted password hashing (Argon2id)
//! - `crypto`: fast secret digests, constant-time comparison, secret generation
//! - `cookie`: Set-Cookie building and Cookie-header extraction
//! - `client`: client IP extraction from request headers

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
