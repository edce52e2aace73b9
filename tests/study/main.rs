#![allow(clippy::float_cmp)]

mod ask_tell;
mod builder;
mod enqueue;
mod export;
mod objective;
mod top_trials;
