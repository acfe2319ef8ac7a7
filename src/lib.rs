pub mod alias;
pub mod cli;
pub mod commands;
pub mod doctor;
pub mod error;
pub mod expand;
pub mod links;
pub mod paths;
pub mod registry;
pub mod repair;
pub mod settings;
pub mod store;
pub mod switch;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
