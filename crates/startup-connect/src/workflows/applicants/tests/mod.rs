mod common;
mod counter;
mod recorder;
