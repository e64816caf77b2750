pub mod cli;
pub mod db;
pub mod document;
pub mod models;

#[cfg(test)]
mod document_test;
