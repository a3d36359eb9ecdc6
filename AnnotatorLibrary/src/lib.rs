#![allow(non_snake_case)]

pub mod management;
pub mod utils;
pub mod web;
