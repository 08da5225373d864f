pub mod console;
pub mod rest;
