pub mod api;
pub mod assemble;
pub mod chord;
pub mod error;
pub mod key;
pub mod measures;
pub mod payload;
pub mod song;
pub mod time_signature;
pub mod transpose;

pub use api::*;
pub use assemble::{assemble_grid, assemble_section, Grid, GridCell};
pub use chord::normalize;
pub use error::*;
pub use key::{detect_key, rank_keys, KeyScore};
pub use measures::build_measures;
pub use payload::*;
pub use song::*;
pub use time_signature::{estimate_time_signature, infer_time_signature, MeterEstimate, MeterSource};
pub use transpose::{transpose_for_instrument, transpose_song, transpose_song_to_key};
