//! Content module: posts, pages, MDX serialization and pagination

pub(crate) mod frontmatter;
pub mod loader;
mod mdx;
mod paginate;
mod post;

pub use frontmatter::FrontMatter;
pub use loader::ContentLoader;
pub use mdx::{Heading, MdxDocument, MdxRenderer};
pub use paginate::{PageContext, Paginator};
pub use post::{slug_from_file_stem, Page, Post, Tag};
