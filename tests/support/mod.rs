#![allow(dead_code)]

pub mod segfold_env;
pub mod tables;
