//! bsuf_dump Library
//!
//! Decodes SolarEdge `.bsuf` firmware update containers and extracts the
//! firmware images they carry.

pub mod bsuf;
pub mod output;
pub mod reader;

pub use bsuf::{BsufError, BsufFile, DecodedEntry, Entry, EntryBody, SaveOutcome};
pub use reader::{DataReader, FileReader, ReadError, StreamReader, Whence, Window};
