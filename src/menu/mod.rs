//! Console menu module
//!
//! Text rendering and line-based prompts for the interactive menu loop.

mod builder;
mod ids;
mod prompt;

pub use builder::{
    build_main_menu, build_monitor_list, build_recording_controls, build_recording_list,
};
pub use ids::MenuChoice;
pub use prompt::Prompter;
