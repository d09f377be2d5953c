//! Bookly Application Library
//!
//! A REST API for a book review web service: books, auth, and reviews
//! modules wired onto the kernel/http bootstrap.

pub mod modules;
