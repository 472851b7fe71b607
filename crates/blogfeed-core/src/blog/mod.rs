mod models;
mod normalizer;

pub use models::{BlogPost, NewBlogPost};
pub use normalizer::{extract_first_image_url, normalize_item, slugify, FALLBACK_SLUG};
