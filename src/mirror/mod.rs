//! Source side: discovering the remote index tree and mirroring it to disk.

mod crawler;
mod filter;
mod path_map;
mod source;
mod store;

pub use crawler::{CrawlPolicy, Crawler, DEFAULT_MAX_DEPTH};
pub use filter::{
    BlockReason, DEFAULT_BLOCKED_EXTENSIONS, DEFAULT_BLOCKED_FILENAMES, LinkClass, LinkFilter,
};
pub use path_map::{
    append_file, append_segment, as_directory, is_within, local_path, relative_path, remote_url,
    strip_query,
};
pub use source::{ByteStream, HttpSource, IndexSource, extract_links};
pub use store::{PART_SUFFIX, is_part_file, part_path, write_atomically};
