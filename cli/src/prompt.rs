//! Line input from the operator's terminal.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one line. `None` at end of input.
    pub async fn line(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    /// A yes/no question; anything but y/yes is a no.
    pub async fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        let answer = self.line(&format!("{question} [y/N] ")).await?;
        Ok(answer.as_deref().is_some_and(is_yes))
    }

    /// Read a required value, failing at end of input.
    pub async fn required(&mut self, label: &str) -> anyhow::Result<String> {
        self.line(label)
            .await?
            .ok_or_else(|| anyhow::anyhow!("input closed before {} was entered", label.trim()))
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
