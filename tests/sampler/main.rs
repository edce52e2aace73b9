#![allow(clippy::float_cmp)]

mod random;
mod tpe;
