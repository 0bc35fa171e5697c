#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
pub mod errors;
pub mod fps;
pub mod lights;
pub mod logging;

pub use lights::math8::mod_wrap;
