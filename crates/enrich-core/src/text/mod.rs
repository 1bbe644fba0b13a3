mod normalize;
mod truncate;

pub use normalize::{char_len, normalize};
pub use truncate::{TRUNCATION_SEPARATOR, TruncationPolicy, truncate};
