//! Small reusable view pieces shared by the screens.

mod code_block;
mod metadata;
mod region_tag;

pub use code_block::BashCodeBlock;
pub use metadata::{FilePreview, MetadataPanel};
pub use region_tag::RegionTag;
