//! Content module - the document model, front-matter parsing and loading

mod document;
mod error;
pub mod frontmatter;
pub mod loader;
pub mod markdown;

pub use document::ContentDocument;
pub use error::{Field, LoadError, ParseError};
pub use frontmatter::{parse, parse_with, serialize, ParseOptions};
pub use markdown::{Block, FenceInfo, Link};
