pub mod marks;
pub mod media;
pub mod paragraph;

pub use marks::interleave;
pub use media::MediaResolver;
pub use paragraph::ParagraphRenderer;
