//! A single-screen terminal widget showing the day's Islamic prayer times
//! for Egyptian cities. Timings come from the AlAdhan API; when a fetch
//! fails the last good answer stays on screen.

pub mod city;
pub mod config;
pub mod display;
pub mod state;
pub mod timings;
