//! Interactive console prompts.
//!
//! Generic over the reader and writer so the prompt loop can be driven from
//! tests without a terminal.

use std::io::{self, BufRead, Write};

use crate::model::Interval;

pub const TITLE: &str = " Парсер http://krasecology.ru/operative/air";

const PROMPT: &str = "Выберите временной интервал для получения данных.\n\
                      Введите:\n \
                      1 - для получения данных за день,\n \
                      2 - для получения данных за неделю.\n\
                      Нажмите Enter для продолжения. Для выхода введите q.\n>> ";

/// What the user asked for at the interval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Run(Interval),
    Quit,
}

pub fn print_title<W: Write>(output: &mut W) -> io::Result<()> {
    let rule = "=".repeat(44);
    writeln!(output, "\n{}\n{}\n{}\n", rule, TITLE, rule)
}

/// Asks until the user enters `1`, `2` or `q`. End of input counts as quit.
pub fn prompt_interval<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Choice> {
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Choice::Quit);
        }

        if line.trim() == "q" {
            return Ok(Choice::Quit);
        }
        if let Some(interval) = Interval::from_choice(&line) {
            return Ok(Choice::Run(interval));
        }
    }
}

/// Keeps the console window open until the user presses Enter.
pub fn wait_for_exit<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
    write!(output, "\nСканирование завершено.\nНажмите Enter для выхода.")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}
