//! Fallible code lives only at the edges (store files, CSV export, CLI);
//! the calculators themselves never fail.

pub type Result<T> = std::result::Result<T, anyhow::Error>;
