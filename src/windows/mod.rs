//! Sliding windows over documents and the filtered transform driver.

pub mod settings;
pub mod sliding;
pub mod transform;

pub use settings::{WINDOW_BR, WINDOW_BR_SEP, WindowSettings};
pub use sliding::{sliding_para_window, sliding_word_window, truncate_at_wordtok_offset};
pub use transform::{
    TextDocTransform, filtered_transform, remove_window_br, sliding_window_transform,
};
