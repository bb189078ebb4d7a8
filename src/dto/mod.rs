pub mod admin;
pub mod guest;
pub mod health;
pub mod scoreboard;
pub mod setup;
pub mod validation;
