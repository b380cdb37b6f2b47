pub mod follow;
pub mod interactive;
pub mod menu;
pub mod terminal;
