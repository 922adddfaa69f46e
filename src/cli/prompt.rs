use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::error::Result;

/// Line-oriented question/answer over any async reader and writer.
pub struct Prompt<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    pub async fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        self.out.write_all(text.as_ref().as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    /// Trimmed answer, or `None` once input is exhausted.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        self.out.write_all(question.as_bytes()).await?;
        self.out.write_all(b" ").await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    /// Re-asks until the answer parses.
    pub async fn ask_number<T: FromStr>(&mut self, question: &str) -> Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(question).await? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say("Please enter a whole number.").await?,
            }
        }
    }

    /// Like [`Prompt::ask_number`] but a blank answer yields `Some(None)`.
    pub async fn ask_optional_number<T: FromStr>(
        &mut self,
        question: &str,
    ) -> Result<Option<Option<T>>> {
        loop {
            let Some(answer) = self.ask(question).await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(None));
            }
            match answer.parse() {
                Ok(value) => return Ok(Some(Some(value))),
                Err(_) => self.say("Please enter a whole number or leave blank.").await?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
