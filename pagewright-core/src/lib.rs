pub mod config;
pub mod elements;
pub mod environment;
pub mod error;
pub mod format;
pub mod frontmatter;
pub mod markdown;
pub mod markup;
pub mod page;
pub mod scanner;
pub mod site;
pub mod template;
pub mod util;
pub mod writer;

// Re-export main types
pub use elements::{Elements, Heading, Image, extract_elements};
pub use environment::Environment;
pub use error::{Error, Result};
pub use format::Format;
pub use frontmatter::{FrontMatter, ValueKind, split_front_matter_and_markup};
pub use markdown::LinkMapping;
pub use markup::Markup;
pub use page::{AssetKind, AssociatedFile, Page};
pub use scanner::collect_inputs;
pub use site::{MountedPage, Site, SiteFile, SiteFiles};
pub use writer::{FileContent, FileWriter, MemoryWriter, Writer};
