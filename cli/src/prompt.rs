use std::{
    fmt::Display,
    io::{self, BufRead, StdinLock, Stdout, Write},
    str::FromStr,
};

use color_eyre::{Result, eyre::bail};
use strum::IntoEnumIterator;

/// Line based questions and numbered menus on top of any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, msg: impl Display) -> Result<()> {
        writeln!(self.output, "{msg}")?;
        Ok(())
    }

    /// Reads one trimmed line. End of input is an error.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input ended while waiting for an answer to '{}'", question.trim());
        }
        Ok(line.trim().to_string())
    }

    pub fn ask_optional(&mut self, question: &str) -> Result<Option<String>> {
        let answer = self.ask(question)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    pub fn ask_or(&mut self, question: &str, default: &str) -> Result<String> {
        Ok(self
            .ask_optional(question)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// An empty or unparsable answer gives `default`
    pub fn ask_parsed_or<T: FromStr>(&mut self, question: &str, default: T) -> Result<T> {
        Ok(self.ask_optional_parsed(question)?.unwrap_or(default))
    }

    pub fn ask_optional_parsed<T: FromStr>(&mut self, question: &str) -> Result<Option<T>> {
        let Some(answer) = self.ask_optional(question)? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                self.say(format!("Invalid input '{answer}'. Using the default value."))?;
                Ok(None)
            }
        }
    }

    /// y/n question, Enter gives `default`
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = self.ask(question)?.to_lowercase();
        Ok(match answer.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    /// Numbered menu, asks again until one of the listed numbers is entered. Returns the
    /// index into `items`.
    pub fn choose<T: Display>(&mut self, title: &str, items: &[T], question: &str) -> Result<usize> {
        self.say(format!("\n{title}"))?;
        for (i, item) in items.iter().enumerate() {
            self.say(format!("{}. {item}", i + 1))?;
        }
        loop {
            match self.ask(question)?.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                Ok(_) => self.say("Invalid choice. Please enter a number from the list.")?,
                Err(_) => self.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    pub fn choose_enum<T: IntoEnumIterator + Display>(&mut self, title: &str) -> Result<T> {
        let mut options: Vec<T> = T::iter().collect();
        let idx = self.choose(title, &options, "Enter the number of your choice: ")?;
        Ok(options.swap_remove(idx))
    }
}
