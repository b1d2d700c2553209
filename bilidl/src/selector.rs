use anyhow::Result;
use requestty::Question;
use std::process;

/// List selection seam between the download flow and the terminal, so the
/// flow can run against scripted answers.
pub trait Selector {
    /// Index of the chosen row.
    fn select_one(&mut self, message: &str, rows: &[String]) -> Result<usize>;

    /// Indices of the chosen rows, in listing order.
    fn select_many(&mut self, message: &str, rows: &[String]) -> Result<Vec<usize>>;
}

/// Interactive terminal prompts. Interrupting a prompt leaves the program
/// quietly with exit code 0.
pub struct TtySelector;

impl Selector for TtySelector {
    fn select_one(&mut self, message: &str, rows: &[String]) -> Result<usize> {
        let question = Question::select("row")
            .should_loop(false)
            .message(message)
            .choices(rows.to_vec())
            .build();

        let answer = prompt(requestty::prompt_one(question))?;
        Ok(answer.as_list_item().unwrap().index)
    }

    fn select_many(&mut self, message: &str, rows: &[String]) -> Result<Vec<usize>> {
        let question = Question::multi_select("rows")
            .should_loop(false)
            .message(message)
            .choices(rows.to_vec())
            .build();

        let answer = prompt(requestty::prompt_one(question))?;
        Ok(answer
            .as_list_items()
            .unwrap()
            .iter()
            .map(|item| item.index)
            .collect())
    }
}

fn prompt(result: requestty::Result<requestty::Answer>) -> Result<requestty::Answer> {
    match result {
        Err(requestty::ErrorKind::Interrupted) => process::exit(0),
        other => Ok(other?),
    }
}
