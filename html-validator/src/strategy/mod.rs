//! Record sources.
//!
//! Only the filesystem source exists today. The stages accept any
//! `Stream<Item = FileRecord>`, so other sources need no shared trait.

pub mod fs;
