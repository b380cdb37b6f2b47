pub mod commands;
pub mod launcher;
pub mod shot_clock;
pub mod view;
