//! Core library for h2print: extract canonical signatures of HTTP/2 client
//! behavior from a reference server's receive log, reduce them to stable
//! SHA-1 fingerprints, and resolve fingerprints against a local database.

pub mod db;
pub mod signature;
pub mod trace;
