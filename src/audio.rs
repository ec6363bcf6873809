//! Background melody, owned by the view that plays it.

pub mod melody;

pub use melody::{HAPPY_BIRTHDAY, LOOP_SECONDS, MelodySession, Note, sample_at, write_f32le};
