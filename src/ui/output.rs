//! Message sink for operation output
//!
//! Operations report through an explicit sink instead of printing from the
//! middle of the logic. Messages are recorded in order, which is what makes
//! the pretend/apply symmetry testable, and echoed to stdout unless quiet.

/// Ordered message sink; collects everything, echoes unless quiet.
#[derive(Debug, Default)]
pub struct Output {
  quiet: bool,
  messages: Vec<String>,
}

impl Output {
  pub fn new(quiet: bool) -> Self {
    Self {
      quiet,
      messages: Vec::new(),
    }
  }

  /// Report a success or progress message.
  pub fn ok(&mut self, message: impl Into<String>) {
    let message = message.into();
    if !self.quiet {
      println!("{}", message);
    }
    self.messages.push(message);
  }

  /// Report a warning; still recorded in order with the rest.
  #[allow(dead_code)]
  pub fn warn(&mut self, message: impl Into<String>) {
    let message = message.into();
    if !self.quiet {
      eprintln!("⚠️  {}", message);
    }
    self.messages.push(message);
  }

  /// Report a failure message (the error itself travels as a value).
  pub fn fail(&mut self, message: impl Into<String>) {
    let message = message.into();
    if !self.quiet {
      eprintln!("❌ {}", message);
    }
    self.messages.push(message);
  }

  /// Raw multi-line tool output, recorded line by line.
  pub fn raw(&mut self, text: &str) {
    for line in text.lines() {
      self.messages.push(line.to_string());
    }
    if !self.quiet && !text.is_empty() {
      print!("{}", text);
    }
  }

  pub fn messages(&self) -> &[String] {
    &self.messages
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages_keep_order() {
    let mut output = Output::new(true);
    output.ok("first");
    output.warn("second");
    output.fail("third");
    assert_eq!(output.messages(), &["first", "second", "third"]);
  }

  #[test]
  fn test_raw_splits_lines() {
    let mut output = Output::new(true);
    output.raw("one\ntwo\n");
    assert_eq!(output.messages(), &["one", "two"]);
  }
}
