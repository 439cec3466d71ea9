#![allow(dead_code)]

pub mod log_validator;
pub mod sites;
