//! One module per binary. Each exposes its argument parser and an async function that runs it
//! against a [`UserInteraction`].

use super::*;

pub mod convert;
pub mod manuscript;
pub mod search_and_download;

pub use convert::{convert, ConvertArgs};
pub use manuscript::{write_manuscript, WriteManuscriptArgs};
pub use search_and_download::{search_and_download, SearchAndDownloadArgs};
