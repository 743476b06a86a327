//! These structs provide the CLI interface for the budget CLI.

use crate::store::BackendPreference;
use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand};
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_COLOR: &str = "#000000";

/// budget: A command-line tool for tracking personal spending.
///
/// Categories, transactions and monthly budgets are kept as JSON documents under the budget home
/// directory. They are read and written either directly or through the native budget engine,
/// which is tried first and falls back to direct document access if it cannot start.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory, its data directory and the configuration file.
    ///
    /// By default the home directory is $HOME/budget-tracker. Pass --budget-home or set
    /// BUDGET_HOME to put it somewhere else.
    Init,
    /// Add, change, remove or list categories.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Add, change, remove or list transactions.
    #[command(subcommand)]
    Transaction(TransactionCommand),
    /// Add, change, remove or list monthly budgets.
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Monthly figures computed from the transactions.
    #[command(subcommand)]
    Report(ReportCommand),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget data and configuration is held. Defaults to ~/budget-tracker
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,

    /// Which storage backend to use. Overrides the `backend` setting in config.json.
    #[arg(long, env = "BUDGET_BACKEND", value_enum)]
    backend: Option<BackendPreference>,
}

impl Common {
    pub fn new(
        log_level: LevelFilter,
        budget_home: PathBuf,
        backend: Option<BackendPreference>,
    ) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
            backend,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }

    pub fn backend(&self) -> Option<BackendPreference> {
        self.backend
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Add a category. Without --id the next free id is used.
    Add(CategoryArgs),
    /// Replace the category with the given --id.
    Update(CategoryArgs),
    /// Remove a category. Transactions and budgets that use it are kept.
    Delete(IdArgs),
    /// List all categories.
    List,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct CategoryArgs {
    /// Zero asks for the next free id.
    #[arg(long, default_value_t = 0)]
    id: i32,

    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Hex color code, e.g. #4CAF50
    #[arg(long, default_value = DEFAULT_COLOR)]
    color: String,
}

impl CategoryArgs {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        description: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            color: color.into(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn color(&self) -> &str {
        &self.color
    }
}

#[derive(Debug, ClapArgs, Clone)]
pub struct IdArgs {
    #[arg(long)]
    id: i32,
}

impl IdArgs {
    pub fn new(id: i32) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i32 {
        self.id
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionCommand {
    /// Add a transaction. Without --id the next free id is used, without --date today is used.
    Add(TransactionArgs),
    /// Replace the transaction with the given --id.
    Update(TransactionArgs),
    /// Remove a transaction.
    Delete(IdArgs),
    /// List transactions, optionally only those of one month or one category.
    List(TransactionListArgs),
}

#[derive(Debug, ClapArgs, Clone)]
pub struct TransactionArgs {
    /// Zero asks for the next free id.
    #[arg(long, default_value_t = 0)]
    id: i32,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    amount: Decimal,

    #[arg(long, default_value = "")]
    description: String,

    /// The id of the category this transaction belongs to.
    #[arg(long)]
    category: i32,

    /// Record the transaction as income rather than an expense.
    #[arg(long)]
    income: bool,
}

impl TransactionArgs {
    pub fn new(
        id: i32,
        date: Option<String>,
        amount: Decimal,
        description: impl Into<String>,
        category: i32,
        income: bool,
    ) -> Self {
        Self {
            id,
            date,
            amount,
            description: description.into(),
            category,
            income,
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> i32 {
        self.category
    }

    pub fn income(&self) -> bool {
        self.income
    }
}

#[derive(Debug, Default, ClapArgs, Clone)]
pub struct TransactionListArgs {
    /// Only transactions whose date starts with this YYYY-MM.
    #[arg(long)]
    month: Option<String>,

    /// Only transactions in this category.
    #[arg(long)]
    category: Option<i32>,
}

impl TransactionListArgs {
    pub fn new(month: Option<String>, category: Option<i32>) -> Self {
        Self { month, category }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn category(&self) -> Option<i32> {
        self.category
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetCommand {
    /// Set the allocation for a category in a month. Fails if one is already set.
    Add(BudgetArgs),
    /// Change an existing allocation.
    Update(BudgetArgs),
    /// Remove the allocation for a category in a month.
    Delete(BudgetKeyArgs),
    /// List budgets, optionally only those of one month.
    List(MonthArgs),
}

#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetArgs {
    #[clap(flatten)]
    key: BudgetKeyArgs,

    #[arg(long)]
    amount: Decimal,
}

impl BudgetArgs {
    pub fn new(category: i32, month: impl Into<String>, amount: Decimal) -> Self {
        Self {
            key: BudgetKeyArgs::new(category, month),
            amount,
        }
    }

    pub fn key(&self) -> &BudgetKeyArgs {
        &self.key
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

#[derive(Debug, ClapArgs, Clone)]
pub struct BudgetKeyArgs {
    /// The id of the category the budget is for.
    #[arg(long)]
    category: i32,

    /// The month as YYYY-MM.
    #[arg(long)]
    month: String,
}

impl BudgetKeyArgs {
    pub fn new(category: i32, month: impl Into<String>) -> Self {
        Self {
            category,
            month: month.into(),
        }
    }

    pub fn category(&self) -> i32 {
        self.category
    }

    pub fn month(&self) -> &str {
        &self.month
    }
}

#[derive(Debug, Default, ClapArgs, Clone)]
pub struct MonthArgs {
    /// A month as YYYY-MM.
    #[arg(long)]
    month: Option<String>,
}

impl MonthArgs {
    pub fn new(month: Option<String>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// Income, expense, balance, category totals and budget status for one month.
    Month(ReportMonthArgs),
    /// Income or expense totals for every month that has any.
    Trend(TrendArgs),
}

#[derive(Debug, Default, ClapArgs, Clone)]
pub struct ReportMonthArgs {
    /// The month as YYYY-MM. Defaults to the current month.
    month: Option<String>,
}

impl ReportMonthArgs {
    pub fn new(month: Option<String>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }
}

#[derive(Debug, ClapArgs, Clone)]
#[command(group(ArgGroup::new("kind").required(true).args(["income", "expense"])))]
pub struct TrendArgs {
    /// Total the income transactions.
    #[arg(long)]
    income: bool,

    /// Total the expense transactions.
    #[arg(long)]
    expense: bool,
}

impl TrendArgs {
    pub fn new(income: bool) -> Self {
        Self {
            income,
            expense: !income,
        }
    }

    pub fn income(&self) -> bool {
        self.income
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget-tracker"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory.",
            );
            PathBuf::from("budget-tracker")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_transaction_add() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/b",
            "--backend",
            "document",
            "transaction",
            "add",
            "--amount",
            "12.5",
            "--category",
            "3",
            "--income",
        ])
        .unwrap();
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/b"));
        assert_eq!(args.common().backend(), Some(BackendPreference::Document));
        let Command::Transaction(TransactionCommand::Add(add)) = args.command() else {
            panic!("wrong command {:?}", args.command());
        };
        assert_eq!(add.id(), 0);
        assert_eq!(add.date(), None);
        assert_eq!(add.amount(), dec!(12.5));
        assert_eq!(add.category(), 3);
        assert!(add.income());
    }

    #[test]
    fn test_amount_must_be_a_number() {
        for amount in ["NaN", "inf", "ten"] {
            let parsed = Args::try_parse_from([
                "budget", "budget", "add", "--category", "1", "--month", "2024-03", "--amount",
                amount,
            ]);
            assert!(parsed.is_err(), "{amount}");
        }
        let parsed = Args::try_parse_from([
            "budget", "budget", "add", "--category", "1", "--month", "2024-03", "--amount",
            "199.99",
        ])
        .unwrap();
        let Command::Budget(BudgetCommand::Add(add)) = parsed.command() else {
            panic!("wrong command {:?}", parsed.command());
        };
        assert_eq!(add.amount(), dec!(199.99));
    }

    #[test]
    fn test_parse_category_defaults() {
        let args = Args::try_parse_from(["budget", "category", "add", "--name", "Food"]).unwrap();
        let Command::Category(CategoryCommand::Add(add)) = args.command() else {
            panic!("wrong command {:?}", args.command());
        };
        assert_eq!(add.name(), "Food");
        assert_eq!(add.color(), DEFAULT_COLOR);
        assert_eq!(add.description(), "");
    }

    #[test]
    fn test_trend_needs_a_kind() {
        assert!(Args::try_parse_from(["budget", "report", "trend"]).is_err());
        assert!(
            Args::try_parse_from(["budget", "report", "trend", "--income", "--expense"]).is_err()
        );
        let args = Args::try_parse_from(["budget", "report", "trend", "--expense"]).unwrap();
        let Command::Report(ReportCommand::Trend(trend)) = args.command() else {
            panic!("wrong command {:?}", args.command());
        };
        assert!(!trend.income());
    }

    #[test]
    fn test_report_month_is_positional() {
        let args = Args::try_parse_from(["budget", "report", "month", "2024-03"]).unwrap();
        let Command::Report(ReportCommand::Month(month)) = args.command() else {
            panic!("wrong command {:?}", args.command());
        };
        assert_eq!(month.month(), Some("2024-03"));
    }
}
