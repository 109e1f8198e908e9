//! HTML text in and out of a [`Document`](crate::Document).

mod parse;
mod serialize;
