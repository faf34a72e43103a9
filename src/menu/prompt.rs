//! Interactive prompts over any line reader and writer
//!
//! End of input is treated as "no answer": selections return `None` and
//! yes/no questions return `false`, so a closed stdin ends the program
//! instead of spinning on re-prompts.

use std::io::{BufRead, Write};

use crate::backend::MonitorInfo;
use crate::error::Result;
use crate::session::RecordingInfo;

use super::builder::{build_main_menu, build_monitor_list, build_recording_list};
use super::ids::MenuChoice;

/// Console prompter
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Show `prompt` and read one trimmed line; `None` at end of input
    pub fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Show the main menu until a valid choice is entered
    pub fn main_menu(&mut self) -> Result<Option<MenuChoice>> {
        loop {
            let Some(answer) = self.ask(&build_main_menu())? else {
                return Ok(None);
            };
            match MenuChoice::from_input(&answer) {
                Some(choice) => return Ok(Some(choice)),
                None => self.say("Invalid choice. Please enter 0, 1, or 2.")?,
            }
        }
    }

    /// `y`/`Y` is yes, anything else is no
    pub fn yes_no(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (y/n): ", question))?;
        Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y")))
    }

    /// Read a number in `1..=count`, re-prompting on bad input
    ///
    /// Returns the 0-based index.
    pub fn select_number(&mut self, prompt: &str, count: usize) -> Result<Option<usize>> {
        self.read_choice(prompt, count, false)
    }

    /// Like [`Self::select_number`], but `0` cancels
    pub fn select_number_or_cancel(&mut self, prompt: &str, count: usize) -> Result<Option<usize>> {
        self.read_choice(prompt, count, true)
    }

    fn read_choice(&mut self, prompt: &str, count: usize, cancel: bool) -> Result<Option<usize>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(0) if cancel => return Ok(None),
                Ok(n) if (1..=count).contains(&n) => return Ok(Some(n - 1)),
                Ok(_) => self.say(&format!("Please enter a number between 1 and {}", count))?,
                Err(_) => self.say("Please enter a valid number")?,
            }
        }
    }

    /// Pick a monitor; a single monitor is picked without asking
    ///
    /// Returns the 1-based monitor number.
    pub fn select_monitor(&mut self, monitors: &[MonitorInfo]) -> Result<Option<usize>> {
        match monitors.len() {
            0 => {
                self.say("No monitors detected.")?;
                Ok(None)
            }
            1 => {
                self.say("Only one monitor detected, using primary monitor.")?;
                Ok(Some(1))
            }
            count => {
                self.say(&build_monitor_list(monitors))?;
                let index = self.select_number(
                    &format!("Select monitor number (1-{}): ", count),
                    count,
                )?;
                Ok(index.map(|i| i + 1))
            }
        }
    }

    /// Pick one of the listed recordings; `0` backs out
    pub fn select_recording<'a>(
        &mut self,
        recordings: &'a [RecordingInfo],
    ) -> Result<Option<&'a RecordingInfo>> {
        if recordings.is_empty() {
            return Ok(None);
        }
        self.say(&build_recording_list(recordings))?;
        let index = self.select_number_or_cancel(
            "\nEnter recording number to replay (0 to cancel): ",
            recordings.len(),
        )?;
        Ok(index.map(|i| &recordings[i]))
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
