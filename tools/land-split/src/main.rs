use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use land_split::cache::TtlCache;
use land_split::client::HttpPaymentApi;
use land_split::config::{Config, ConfigArgs};
use land_split::report::split_table;
use land_split::request::SplitRequest;
use landdeal_common::api::{submit_payment, PaymentApi};
use landdeal_common::currency::Currency;
use landdeal_common::form::SplitForm;
use landdeal_common::payment::{DealId, InvestorToOwnerRequest, PaymentRequest, SubmitRoute};
use landdeal_common::split;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "land-split", about = "Split land-deal payments across parties")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Currency used when printing amounts.
    #[arg(long, value_enum, default_value_t = CurrencyArg::Inr, global = true)]
    currency: CurrencyArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum CurrencyArg {
    Inr,
    Usd,
}

impl From<CurrencyArg> for Currency {
    fn from(arg: CurrencyArg) -> Self {
        match arg {
            CurrencyArg::Inr => Currency::Inr,
            CurrencyArg::Usd => Currency::Usd,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show the computed amount of every party in a request file.
    Preview { request: PathBuf },
    /// Print an equal percentage split for N parties.
    SplitEqually { parties: usize },
    /// Validate a request file without sending it.
    Check {
        request: PathBuf,
        /// Accept percentage or amount mismatches.
        #[arg(long)]
        force: bool,
    },
    /// Validate a request file and record the payment.
    Submit {
        request: PathBuf,
        #[arg(long)]
        force: bool,
        /// Print the payload instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the participants of a deal as blank party rows.
    Import { deal_id: u64 },
}

fn print_problems(form: &SplitForm) {
    for err in form.errors() {
        eprintln!("error: {err}");
    }
    for warning in form.warnings() {
        eprintln!("warning: {warning} (forced)");
    }
}

fn http_api(config: &Config) -> anyhow::Result<HttpPaymentApi> {
    let cache = Arc::new(TtlCache::new(config.cache_ttl));
    Ok(HttpPaymentApi::new(config, cache)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_args(cli.config)?;
    let currency = Currency::from(cli.currency);

    match cli.command {
        Command::Preview { request } => {
            let request = SplitRequest::load(&request)?;
            let form = request.form(config.split, false)?;
            print!("{}", split_table(&form, &currency));
        }
        Command::SplitEqually { parties } => {
            for (index, share) in split::split_equally(parties).iter().enumerate() {
                println!("{:>3}  {share}%", index + 1);
            }
        }
        Command::Check { request, force } => {
            let request = SplitRequest::load(&request)?;
            let mut form = request.form(config.split, force)?;
            let outcome = form.validate();
            print!("{}", split_table(&form, &currency));
            print_problems(&form);
            if outcome.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            println!("split is valid");
        }
        Command::Submit {
            request,
            force,
            dry_run,
        } => {
            let request = SplitRequest::load(&request)?;
            let mut form = request.form(config.split, force)?;
            let finalized = match form.submit() {
                Ok(finalized) => finalized,
                Err(_) => {
                    print_problems(&form);
                    return Ok(ExitCode::FAILURE);
                }
            };
            print_problems(&form);
            let draft = request.draft();

            if dry_run {
                let payload = match SubmitRoute::for_parties(&finalized.parties) {
                    SubmitRoute::InvestorToOwner {
                        investor_id,
                        owner_id,
                    } => serde_json::to_string_pretty(&InvestorToOwnerRequest::new(
                        &draft,
                        &finalized,
                        investor_id,
                        owner_id,
                    ))?,
                    SubmitRoute::Standard => {
                        serde_json::to_string_pretty(&PaymentRequest::new(&draft, &finalized))?
                    }
                };
                println!("{payload}");
                return Ok(ExitCode::SUCCESS);
            }

            let api = http_api(&config)?;
            match submit_payment(&api, request.deal_id, &draft, &finalized).await {
                Ok(done) => {
                    let id = done
                        .created
                        .payment_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!("payment {id} recorded for deal {}: {}", request.deal_id, done.created.message);
                }
                Err(err) if err.is_party_mismatch() => {
                    eprintln!("error: {err}; fix the split or re-run with --force");
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Import { deal_id } => {
            let api = http_api(&config)?;
            let roster = api.deal_participants(DealId(deal_id)).await?;
            if roster.is_empty() {
                tracing::warn!(deal_id, "deal has no owners, investors or buyers");
            }
            println!("{}", serde_json::to_string_pretty(&roster.party_rows())?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
