use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TxnTypeArg {
    Expense,
    Refund,
    Cashback,
}

#[derive(Debug, Parser)]
#[command(name = "spent", version, about = "Inbox spending tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output structured JSON
    #[arg(long, global = true)]
    json: bool,

    /// Account to operate on (defaults to the only configured account)
    #[arg(long, global = true)]
    account: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import transactions from Gmail
    Sync,
    /// List recent transactions
    List(ListArgs),
    /// Show per-type totals and net spending
    Summary,
    /// Show top merchants by expense total
    Merchants(MerchantsArgs),
    /// Add a manual transaction
    Add(AddArgs),
    /// Delete one transaction by id
    Remove { id: i64 },
    /// Manage account configuration
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Show database stats
    Stats,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Filter by transaction type
    #[arg(long, value_enum)]
    r#type: Option<TxnTypeArg>,
    #[arg(long, default_value_t = 100)]
    limit: usize,
}

#[derive(Debug, Args)]
struct MerchantsArgs {
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    merchant: String,
    #[arg(long)]
    amount: f64,
    #[arg(long, value_enum, default_value = "expense")]
    r#type: TxnTypeArg,
    /// Transaction date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
enum AccountCommands {
    /// List configured accounts
    List,
    /// Add account configuration
    Add {
        email: String,
        /// Gmail OAuth client id / secret / refresh token as JSON, e.g.
        /// '{"client_id":"...","client_secret":"...","refresh_token":"..."}'
        #[arg(long)]
        config: Option<String>,
    },
    /// Remove account configuration
    Remove { account_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::dispatch(cli).await
}

mod commands {
    use anyhow::{anyhow, Context, Result};
    use chrono::{NaiveDate, TimeZone, Utc};

    use spent::db::models::{Account, Transaction, TxnType};
    use spent::db::{Database, TransactionFilters};
    use spent::engine::ImportEngine;
    use spent::mail::GmailProvider;
    use spent::output::{self, OutputFormat};

    use super::{AccountCommands, AddArgs, Cli, Commands, ListArgs, MerchantsArgs, TxnTypeArg};

    pub async fn dispatch(cli: Cli) -> Result<()> {
        let format = OutputFormat::from_json_flag(cli.json);
        match cli.command {
            Commands::Sync => handle_sync(cli.account.as_deref(), format).await,
            Commands::List(args) => handle_list(args, cli.account.as_deref(), format),
            Commands::Summary => handle_summary(cli.account.as_deref(), format),
            Commands::Merchants(args) => handle_merchants(args, cli.account.as_deref(), format),
            Commands::Add(args) => handle_add(args, cli.account.as_deref()),
            Commands::Remove { id } => handle_remove(id, cli.account.as_deref()),
            Commands::Accounts { command } => handle_accounts(command, format),
            Commands::Stats => handle_stats(format),
        }
    }

    fn open_database() -> Result<Database> {
        let db_path = Database::default_db_path().context("resolve default database path")?;
        Database::open(&db_path)
            .with_context(|| format!("open spent database at {}", db_path.display()))
    }

    async fn handle_sync(account_id: Option<&str>, format: OutputFormat) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;

        // Auth is the one fatal failure: no summary without a live credential.
        let provider = GmailProvider::connect(&account)
            .await
            .context("connect to gmail")?;

        let engine = ImportEngine::new();
        let summary = engine.run(&provider, &db, &account).await?;

        println!("{}", output::format_import_summary(format, &summary)?);
        Ok(())
    }

    fn handle_list(args: ListArgs, account_id: Option<&str>, format: OutputFormat) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;

        let transactions = db.list_transactions(TransactionFilters {
            account_id: Some(account.account_id),
            txn_type: args.r#type.map(map_txn_type),
            limit: args.limit,
        })?;

        println!("{}", output::format_transactions(format, &transactions)?);
        Ok(())
    }

    fn handle_summary(account_id: Option<&str>, format: OutputFormat) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;
        let summary = db.spending_summary(&account.account_id)?;
        println!("{}", output::format_summary(format, &summary)?);
        Ok(())
    }

    fn handle_merchants(
        args: MerchantsArgs,
        account_id: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;
        let merchants = db.merchant_summary(&account.account_id, args.limit)?;
        println!("{}", output::format_merchants(format, &merchants)?);
        Ok(())
    }

    fn handle_add(args: AddArgs, account_id: Option<&str>) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;

        let date = match args.date {
            Some(raw) => {
                let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("invalid --date '{raw}', expected YYYY-MM-DD"))?;
                let midnight = day
                    .and_hms_opt(0, 0, 0)
                    .ok_or_else(|| anyhow!("invalid --date '{raw}'"))?;
                Utc.from_utc_datetime(&midnight).to_rfc3339()
            }
            None => Utc::now().to_rfc3339(),
        };

        let txn = Transaction {
            id: None,
            account_id: account.account_id,
            merchant: args.merchant,
            order_reference: None,
            amount: args.amount,
            transaction_date: date,
            txn_type: map_txn_type(args.r#type),
            dedupe_hash: None,
            notes: args.notes,
            is_manual: true,
            created_at: None,
        };
        let id = db.insert_manual_transaction(&txn)?;
        println!("Added transaction {id}");
        Ok(())
    }

    fn handle_remove(id: i64, account_id: Option<&str>) -> Result<()> {
        let db = open_database()?;
        let account = resolve_single_account(&db, account_id)?;
        let removed = db.delete_transaction(id, &account.account_id)?;
        if removed == 0 {
            println!("No transaction found: {id}");
        } else {
            println!("Removed transaction {id}");
        }
        Ok(())
    }

    fn handle_accounts(command: AccountCommands, format: OutputFormat) -> Result<()> {
        let db = open_database()?;

        match command {
            AccountCommands::List => {
                let accounts = db.list_accounts()?;
                println!("{}", output::format_accounts(format, &accounts)?);
            }
            AccountCommands::Add { email, config } => {
                let config = config
                    .map(|raw| {
                        serde_json::from_str::<serde_json::Value>(&raw)
                            .context("parse --config as JSON")
                    })
                    .transpose()?;
                let account = Account {
                    account_id: email.trim().to_ascii_lowercase(),
                    email_address: email,
                    display_name: None,
                    enabled: true,
                    last_sync: None,
                    config,
                };
                db.insert_account(&account)?;
                println!("Added account: {}", account.account_id);
            }
            AccountCommands::Remove { account_id } => {
                let removed = db.remove_account(&account_id)?;
                if removed == 0 {
                    println!("No account found: {account_id}");
                } else {
                    println!("Removed account: {account_id}");
                }
            }
        }
        Ok(())
    }

    fn handle_stats(format: OutputFormat) -> Result<()> {
        let db = open_database()?;
        let stats = db.get_stats()?;
        println!("{}", output::format_stats(format, &stats)?);
        Ok(())
    }

    fn map_txn_type(value: TxnTypeArg) -> TxnType {
        match value {
            TxnTypeArg::Expense => TxnType::Expense,
            TxnTypeArg::Refund => TxnType::Refund,
            TxnTypeArg::Cashback => TxnType::Cashback,
        }
    }

    fn resolve_single_account(db: &Database, account_id: Option<&str>) -> Result<Account> {
        if let Some(account_id) = account_id {
            return db
                .get_account(account_id)?
                .ok_or_else(|| anyhow!("account not found: {account_id}"));
        }

        let mut accounts = db.list_accounts()?;
        match accounts.len() {
            0 => Err(anyhow!(
                "no accounts configured; use 'spent accounts add' first"
            )),
            1 => Ok(accounts.remove(0)),
            _ => Err(anyhow!(
                "multiple accounts configured; pass --account <id> to disambiguate"
            )),
        }
    }
}
