pub mod error;
pub mod header;
pub mod index;
pub mod block;
pub mod io_stream;
pub mod archive;
pub mod convert;

pub use error::{AfsError, Result};
pub use header::{Header, MAGIC};
pub use index::{read_index, BlockIndex, IndexEntry};
pub use block::extract_block;
pub use io_stream::{AfsReader, AfsWriter};
pub use archive::{extract_all, extract_all_with, open_and_validate, ExtractOptions};
