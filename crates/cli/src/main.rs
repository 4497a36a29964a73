use std::path::PathBuf;
use std::sync::Arc;

use chitfund_core::config::{
    actor_from_env_values, data_dir_from_env_value, store_file_from_env_value,
};
use chitfund_core::draft::{KycStatus, SubscriberStatus};
use chitfund_core::{
    AnswerSheet, ChangeNotifier, CoreConfig, DirectoryCallbacks, JsonFileRepository,
    OnboardingContext, OnboardingWizard, StaticIdentity, SubmitOutcome, SubscriberDirectory,
    SubscriberId, SubscriberQuery, SubscriberRecord,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chitfund")]
#[command(about = "Chit fund subscriber onboarding CLI")]
struct Cli {
    /// Data directory (overrides CHITFUND_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Onboard a subscriber from a YAML answer sheet
    Onboard {
        /// Path to the answer sheet
        answers: PathBuf,
    },
    /// List subscribers
    List {
        /// Match against name, email, phone or subscriber id
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        kyc: Option<KycArg>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Show one subscriber as JSON
    Show {
        /// Subscriber id, e.g. SUB1767225600000
        id: String,
    },
    /// Summary figures over all subscribers
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl From<StatusArg> for SubscriberStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => SubscriberStatus::Pending,
            StatusArg::Active => SubscriberStatus::Active,
            StatusArg::Inactive => SubscriberStatus::Inactive,
            StatusArg::Suspended => SubscriberStatus::Suspended,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KycArg {
    Pending,
    Verified,
    Rejected,
}

impl From<KycArg> for KycStatus {
    fn from(arg: KycArg) -> Self {
        match arg {
            KycArg::Pending => KycStatus::Pending,
            KycArg::Verified => KycStatus::Verified,
            KycArg::Rejected => KycStatus::Rejected,
        }
    }
}

fn resolve_config(data_dir: Option<PathBuf>) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    let data_dir = data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("CHITFUND_DATA_DIR").ok()));
    let store_file = store_file_from_env_value(std::env::var("CHITFUND_STORE_FILE").ok())?;
    let actor = actor_from_env_values(
        std::env::var("CHITFUND_ACTOR_NAME").ok(),
        std::env::var("CHITFUND_ACTOR_ROLE").ok(),
    )?;
    Ok(CoreConfig::new(data_dir, store_file, actor)?)
}

fn print_row(record: &SubscriberRecord) {
    let details = &record.details;
    println!(
        "ID: {}, Name: {}, Branch: {}, Status: {:?}, KYC: {:?}, Created: {}",
        record.subscriber_id,
        record.full_name(),
        details.branch,
        details.status,
        details.kyc_status,
        record.audit.created_at.format("%Y-%m-%d %H:%M"),
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("chitfund_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'chitfund --help' for commands");
        return Ok(());
    };

    let cfg = resolve_config(cli.data_dir)?;
    let directory = Arc::new(SubscriberDirectory::new(
        Arc::new(JsonFileRepository::from_config(&cfg)),
        ChangeNotifier::default(),
    ));

    match command {
        Commands::Onboard { answers } => {
            let sheet = AnswerSheet::from_path(&answers)?;
            let context = OnboardingContext::resuming_after(
                Arc::new(StaticIdentity::new(cfg.default_actor().clone())),
                directory.last_issued_id()?,
            );
            let mut wizard =
                OnboardingWizard::new(context, DirectoryCallbacks::new(directory.clone()));

            match sheet.run(&mut wizard)? {
                SubmitOutcome::Completed(id) => println!("Onboarded subscriber: {}", id),
                SubmitOutcome::Blocked(errors) => {
                    eprintln!("Step {} is incomplete:", wizard.step());
                    for (field, message) in errors.iter() {
                        eprintln!("  {}: {}", field, message);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::List {
            search,
            status,
            kyc,
            branch,
        } => {
            let query = SubscriberQuery {
                text: search,
                status: status.map(Into::into),
                kyc_status: kyc.map(Into::into),
                branch,
                ..SubscriberQuery::default()
            };
            let subscribers = directory.search(&query)?;
            if subscribers.is_empty() {
                println!("No subscribers found.");
            } else {
                for record in &subscribers {
                    print_row(record);
                }
            }
        }
        Commands::Show { id } => {
            let id: SubscriberId = id.parse()?;
            let record = directory.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Stats => {
            let stats = directory.stats()?;
            println!("Total subscribers:   {}", stats.total);
            println!("Active:              {}", stats.active);
            println!("KYC pending:         {}", stats.pending_kyc);
            println!("KYC verified:        {}", stats.verified_kyc);
            println!("Total contributions: {}", stats.total_contributions);
            match stats.average_credit_score {
                Some(avg) => println!("Avg credit score:    {:.1}", avg),
                None => println!("Avg credit score:    n/a"),
            }
        }
    }

    Ok(())
}
