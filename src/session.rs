//! Interactive calculator: a line-oriented form that recomputes on every edit.

use anyhow::Result;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::models::{try_parse_amount, PositionPlan, RawInputs, SizingInputs};
use crate::trading::{PositionSizer, SizingConfig};

const HELP: &str = "\
Commands:
  account <value>   Set the account value
  entry <value>     Set the entry price
  stop <value>      Set the stop loss
  risk <percent>    Type a risk percentage (0 to 100)
  slide <percent>   Move the risk slider
  show              Show the current position
  json              Show the current position as JSON
  reset             Restore the default values
  help              Show this help
  quit              Leave the calculator";

/// Form state behind the calculator screen.
///
/// The risk percentage has a single numeric source of truth; its text is
/// what the risk field currently displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorForm {
    account_value: String,
    entry_price: String,
    stop_loss: String,
    risk_percentage: Decimal,
    risk_text: String,
}

impl Default for CalculatorForm {
    fn default() -> Self {
        Self {
            account_value: "10000".to_string(),
            entry_price: "100".to_string(),
            stop_loss: "95".to_string(),
            risk_percentage: dec!(2),
            risk_text: "2.0".to_string(),
        }
    }
}

impl CalculatorForm {
    pub fn set_account_value(&mut self, text: &str) {
        self.account_value = text.to_string();
    }

    pub fn set_entry_price(&mut self, text: &str) {
        self.entry_price = text.to_string();
    }

    pub fn set_stop_loss(&mut self, text: &str) {
        self.stop_loss = text.to_string();
    }

    /// Apply a typed risk percentage.
    ///
    /// A number in `[0, 100]` updates both value and text. Empty text clears
    /// the field but keeps the last value. Anything else is rejected and
    /// leaves the form untouched.
    pub fn set_risk_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            self.risk_text.clear();
            return true;
        }

        match try_parse_amount(text) {
            Some(value) if value >= Decimal::ZERO && value <= dec!(100) => {
                self.risk_percentage = value;
                self.risk_text = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Move the risk slider. The value stays within the configured bounds
    /// and the field shows it with one decimal.
    pub fn slide_risk(&mut self, value: Decimal, config: &SizingConfig) {
        let value = config.clamp_risk(value);
        self.risk_percentage = value;
        self.risk_text = format!(
            "{:.1}",
            value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        );
    }

    pub fn risk_percentage(&self) -> Decimal {
        self.risk_percentage
    }

    pub fn risk_text(&self) -> &str {
        &self.risk_text
    }

    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs::new(
            self.account_value.as_str(),
            self.entry_price.as_str(),
            self.stop_loss.as_str(),
            self.risk_percentage.to_string(),
        )
    }

    /// Numeric inputs for the sizer; unparseable fields count as zero.
    pub fn inputs(&self) -> SizingInputs {
        SizingInputs {
            risk_percentage: self.risk_percentage,
            ..self.raw_inputs().parse()
        }
    }

    /// One-line summary of the fields as displayed.
    pub fn summary(&self) -> String {
        format!(
            "Account: {} | Entry: {} | Stop: {} | Risk: {}%",
            self.account_value, self.entry_price, self.stop_loss, self.risk_text
        )
    }
}

/// Parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Account(String),
    Entry(String),
    Stop(String),
    Risk(String),
    Slide(String),
    Show,
    Json,
    Reset,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim().to_string()),
            None => (line, String::new()),
        };

        match word.to_lowercase().as_str() {
            "" => Self::Empty,
            "account" | "a" => Self::Account(rest),
            "entry" | "e" => Self::Entry(rest),
            "stop" | "s" => Self::Stop(rest),
            "risk" | "r" => Self::Risk(rest),
            "slide" => Self::Slide(rest),
            "show" => Self::Show,
            "json" => Self::Json,
            "reset" => Self::Reset,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(word.to_string()),
        }
    }
}

/// What the session should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// Calculator session: owns the form and recomputes after each edit.
pub struct Session {
    sizer: PositionSizer,
    form: CalculatorForm,
}

impl Session {
    pub fn new(sizer: PositionSizer) -> Self {
        Self {
            sizer,
            form: CalculatorForm::default(),
        }
    }

    pub fn form(&self) -> &CalculatorForm {
        &self.form
    }

    /// Recompute the plan for the current form.
    pub fn plan(&self) -> PositionPlan {
        self.sizer.compute(&self.form.inputs())
    }

    /// Apply one line of input.
    pub fn handle(&mut self, line: &str) -> Result<Outcome> {
        let command = Command::parse(line);
        debug!(command = ?command, "Calculator command");

        let output = match command {
            Command::Account(text) => {
                self.form.set_account_value(&text);
                self.render()
            }
            Command::Entry(text) => {
                self.form.set_entry_price(&text);
                self.render()
            }
            Command::Stop(text) => {
                self.form.set_stop_loss(&text);
                self.render()
            }
            Command::Risk(text) => {
                if self.form.set_risk_text(&text) {
                    self.render()
                } else {
                    format!(
                        "Risk must be a number between 0 and 100; keeping {}%",
                        self.form.risk_percentage().normalize()
                    )
                }
            }
            Command::Slide(text) => match try_parse_amount(&text) {
                Some(value) => {
                    self.form.slide_risk(value, self.sizer.config());
                    self.render()
                }
                None => format!("Slider needs a number, got {:?}", text),
            },
            Command::Show => self.render(),
            Command::Json => serde_json::to_string_pretty(&self.plan())?,
            Command::Reset => {
                self.form = CalculatorForm::default();
                self.render()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
            Command::Empty => String::new(),
            Command::Unknown(word) => {
                format!("Unknown command {:?}. Type 'help' for a list of commands.", word)
            }
        };

        Ok(Outcome::Continue(output))
    }

    fn render(&self) -> String {
        format!("{}\n{}", self.form.summary(), self.plan())
    }
}

/// Drive a session from `reader` until `quit` or end of input.
pub async fn run_session<R, W>(session: &mut Session, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting interactive calculator");

    let welcome = format!(
        "Position size calculator. Type 'help' for commands.\n{}\n",
        session.render()
    );
    writer.write_all(welcome.as_bytes()).await?;
    writer.write_all(b"> ").await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match session.handle(&line)? {
            Outcome::Continue(output) => {
                if !output.is_empty() {
                    writer.write_all(output.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                }
                writer.write_all(b"> ").await?;
                writer.flush().await?;
            }
            Outcome::Quit => break,
        }
    }

    writer.write_all(b"\nGoodbye.\n").await?;
    writer.flush().await?;
    info!("Interactive calculator closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(PositionSizer::new(SizingConfig::default()))
    }

    #[test]
    fn test_default_form_matches_starting_screen() {
        let form = CalculatorForm::default();

        assert_eq!(form.risk_text(), "2.0");
        assert_eq!(
            form.inputs(),
            SizingInputs::new(dec!(10000), dec!(100), dec!(95), dec!(2))
        );
    }

    #[test]
    fn test_risk_text_rules() {
        let mut form = CalculatorForm::default();

        assert!(form.set_risk_text("5"));
        assert_eq!(form.risk_percentage(), dec!(5));
        assert_eq!(form.risk_text(), "5");

        // Out of range or not a number: ignored
        assert!(!form.set_risk_text("150"));
        assert!(!form.set_risk_text("-1"));
        assert!(!form.set_risk_text("abc"));
        assert_eq!(form.risk_percentage(), dec!(5));
        assert_eq!(form.risk_text(), "5");

        // Clearing the field keeps the last value
        assert!(form.set_risk_text(""));
        assert_eq!(form.risk_text(), "");
        assert_eq!(form.risk_percentage(), dec!(5));

        assert!(form.set_risk_text("0"));
        assert_eq!(form.risk_percentage(), dec!(0));
    }

    #[test]
    fn test_slider_rerenders_text() {
        let config = SizingConfig::default();
        let mut form = CalculatorForm::default();

        form.slide_risk(dec!(3.14159), &config);
        assert_eq!(form.risk_text(), "3.1");
        assert_eq!(form.risk_percentage(), dec!(3.14159));

        form.slide_risk(dec!(500), &config);
        assert_eq!(form.risk_text(), "100.0");
        assert_eq!(form.risk_percentage(), dec!(100));

        form.slide_risk(dec!(0), &config);
        assert_eq!(form.risk_text(), "0.1");
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("account 50000"), Command::Account("50000".to_string()));
        assert_eq!(Command::parse("  ENTRY   12.5 "), Command::Entry("12.5".to_string()));
        assert_eq!(Command::parse("risk"), Command::Risk(String::new()));
        assert_eq!(Command::parse("exit"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("buy 100"), Command::Unknown("buy".to_string()));
    }

    #[test]
    fn test_session_recomputes_on_edit() {
        let mut session = session();

        for line in ["account 50000", "entry 50", "stop 48", "risk 5"] {
            assert!(matches!(session.handle(line).unwrap(), Outcome::Continue(_)));
        }

        let plan = session.plan();
        assert_eq!(plan.max_shares, dec!(1000));
        assert!(plan.show_purchase_power_limit);

        match session.handle("show").unwrap() {
            Outcome::Continue(output) => {
                assert!(output.contains("Risk: 5%"));
                assert!(output.contains("limited by available purchase power"));
            }
            Outcome::Quit => panic!("show should not quit"),
        }
    }

    #[test]
    fn test_partially_typed_values_do_not_fail() {
        let mut session = session();

        session.handle("entry 9").unwrap();
        assert!(session.plan().is_empty());

        session.handle("entry").unwrap();
        assert!(session.plan().is_empty());

        session.handle("entry 1o0").unwrap();
        assert!(session.plan().is_empty());
    }

    #[test]
    fn test_rejected_risk_keeps_plan() {
        let mut session = session();
        let before = session.plan();

        match session.handle("risk 250").unwrap() {
            Outcome::Continue(output) => assert!(output.contains("between 0 and 100")),
            Outcome::Quit => panic!("risk should not quit"),
        }
        assert_eq!(session.plan(), before);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut session = session();
        session.handle("account 1").unwrap();
        session.handle("slide 50").unwrap();
        session.handle("reset").unwrap();

        assert_eq!(session.form(), &CalculatorForm::default());
    }

    #[test]
    fn test_run_session_until_quit() {
        let input: &[u8] = b"account 50000\nentry 50\nstop 48\nrisk 5\njson\nquit\naccount 1\n";
        let mut output = Vec::new();
        let mut session = session();

        tokio_test::block_on(run_session(&mut session, input, &mut output)).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"showPurchasePowerLimit\": true"));
        assert!(text.contains("Maximum Shares:   1,000"));
        assert!(text.ends_with("Goodbye.\n"));
        // Nothing after quit is applied
        assert_eq!(session.plan().max_shares, dec!(1000));
    }

    #[tokio::test]
    async fn test_run_session_ends_at_eof() {
        let input: &[u8] = b"slide 100\nbogus\n";
        let mut output = Vec::new();
        let mut session = session();

        run_session(&mut session, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Risk: 100.0%"));
        assert!(text.contains("Unknown command \"bogus\""));
        assert!(text.ends_with("Goodbye.\n"));
        assert!(session.plan().show_purchase_power_limit);
    }
}
