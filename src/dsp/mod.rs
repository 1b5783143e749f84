//! DSP Building Blocks
//!
//! Buffer-to-buffer operations the composer is assembled from. Each one
//! returns a new buffer and leaves its input untouched.

mod fade;
mod looping;
mod segment;

pub use fade::{fade_in, fade_out, Fade, FadeDirection};
pub use looping::extend_to_at_least;
pub use segment::{intro_window, outro_window_from_end, window_at};
