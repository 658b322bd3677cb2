// Not every test crate uses every generator.
#![allow(dead_code)]

pub mod frame_generator;
