use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radar_core::client::{HttpRatesApi, RatesApi, ServiceError};
use radar_core::comparison::{ComparisonTable, SortColumn, SortDirection, SortSpec};
use radar_core::domain::bank::BankDirectory;
use radar_core::domain::locale::{Language, Locale};
use radar_core::domain::term::{MortgageTerm, RatePreference};
use radar_core::present::{summarize, AssessmentSummary, ComparisonSummary};
use radar_core::wizard::{
    assemble, OfferAnswer, OfferDraft, Phase, SelfRateDraft, Settled, Wizard, WizardCommand,
    WizardInput,
};
use tokio::sync::{mpsc, watch};

#[derive(Debug, Parser)]
#[command(name = "radar_cli")]
struct Args {
    /// Display locale, e.g. `sv-SE` or `en`. Defaults to DEFAULT_LOCALE.
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the supported banks.
    Banks,

    /// Show the rate comparison table for one term.
    Compare {
        #[arg(long, default_value = "3m", value_parser = parse_comparison_term)]
        term: MortgageTerm,

        #[arg(long, value_parser = parse_column)]
        sort: Option<SortColumn>,

        /// `down` (ascending) or `up` (descending).
        #[arg(long, value_parser = parse_direction)]
        dir: Option<SortDirection>,
    },

    /// Assess a current rate, or one or more offers.
    Assess {
        #[arg(long)]
        bank: Option<String>,

        #[arg(long)]
        loan_amount: Option<f64>,

        /// Current rate in percent (self-rate flow).
        #[arg(long)]
        rate: Option<f64>,

        #[arg(long, value_parser = parse_term)]
        current_term: Option<MortgageTerm>,

        /// YYYY-MM-DD; only sent for fixed terms.
        #[arg(long)]
        binding_end: Option<NaiveDate>,

        #[arg(long, value_parser = parse_preference)]
        preference: Option<RatePreference>,

        /// Offered rate as TERM=RATE, e.g. `FIXED_3Y=3.45`. Repeatable.
        #[arg(long = "offer", value_parser = parse_offer)]
        offers: Vec<OfferDraft>,

        /// Validate and print the payload without sending it.
        #[arg(long)]
        dry_run: bool,

        /// Keep running and re-assess for each locale tag read from stdin.
        #[arg(long, conflicts_with = "dry_run")]
        follow: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = radar_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let locale = args
        .lang
        .as_deref()
        .map(Locale::parse)
        .unwrap_or_else(|| settings.locale());
    let banks = BankDirectory::default();

    match args.command {
        Command::Banks => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(banks.banks())?);
            } else {
                for bank in banks.banks() {
                    println!("{:<22} {:>3}  {}", bank.key, bank.id, bank.display_name);
                }
            }
            Ok(())
        }
        Command::Compare { term, sort, dir } => {
            let api = HttpRatesApi::from_settings(&settings)?;
            let sort = sort.map(|column| SortSpec {
                column,
                direction: dir.unwrap_or_else(|| column.default_direction()),
            });
            compare(&api, term, sort, locale.contract_language(), args.json).await
        }
        Command::Assess {
            bank,
            loan_amount,
            rate,
            current_term,
            binding_end,
            preference,
            offers,
            dry_run,
            follow,
        } => {
            let input = build_input(
                bank,
                loan_amount,
                SelfRateDraft {
                    user_rate: rate,
                    current_term,
                    binding_end_date: binding_end,
                    preference,
                },
                offers,
            );

            if dry_run {
                let validated = assemble(&input, &banks, locale.contract_language())?;
                tracing::info!(
                    dry_run = true,
                    incomplete_offers = validated.incomplete_offers.len(),
                    "assessment payload assembled"
                );
                println!("{}", serde_json::to_string_pretty(&validated.request)?);
                return Ok(());
            }

            let api = HttpRatesApi::from_settings(&settings)?;
            if follow {
                assemble(&input, &banks, locale.contract_language())?;
                return assess_following(&api, banks, locale, input, args.json).await;
            }
            assess(&api, banks, locale, input, args.json).await
        }
    }
}

async fn compare(
    api: &dyn RatesApi,
    term: MortgageTerm,
    sort: Option<SortSpec>,
    language: Language,
    json: bool,
) -> anyhow::Result<()> {
    let mut table = ComparisonTable::new(term);
    table.set_sort(sort);

    let ticket = table.begin_fetch(term);
    let outcome = api.fetch_comparison(term).await;
    if let Err(err) = &outcome {
        sentry_anyhow::capture_anyhow(err);
        if let Some(diag) = err.downcast_ref::<ServiceError>() {
            tracing::debug!(stage = diag.stage, body = ?diag.raw_body, "comparison fetch diagnostics");
        }
    }
    table.complete_fetch(ticket, outcome);

    let view = table
        .view(language)
        .with_context(|| table.error().unwrap_or("no comparison data").to_string())?;
    let summary = ComparisonSummary::from(&view);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{} (average month: {})", summary.term, summary.average_month);
    for row in &summary.rows {
        println!(
            "{:<24} {:>8} {:>7} {:>8}  {}",
            row.bank_name, row.list_rate, row.change, row.average_rate, row.last_changed
        );
    }
    if !summary.no_data.is_empty() {
        println!("no data: {}", summary.no_data.join(", "));
    }
    Ok(())
}

async fn assess(
    api: &dyn RatesApi,
    banks: BankDirectory,
    locale: Locale,
    input: WizardInput,
    json: bool,
) -> anyhow::Result<()> {
    let language = locale.contract_language();
    let mut wizard = Wizard::new(banks, locale);
    *wizard.input_mut() = input;

    match wizard.submit(api).await {
        Phase::Result => {
            let result = wizard.result().context("assessment finished without a result")?;
            let summary = summarize(result, language);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            if !wizard.incomplete_offers().is_empty() {
                tracing::warn!(rows = ?wizard.incomplete_offers(), "incomplete offers were not sent");
            }
            Ok(())
        }
        Phase::ValidationFailed => {
            let errors = wizard
                .validation_errors()
                .context("validation failed without errors")?;
            for e in &errors.errors {
                eprintln!("{:?}: {}", e.field, e.message(language));
            }
            anyhow::bail!("invalid input")
        }
        phase => {
            anyhow::bail!(
                "assessment failed ({phase:?}): {}",
                wizard.request_error().unwrap_or("unknown error")
            )
        }
    }
}

async fn assess_following(
    api: &dyn RatesApi,
    banks: BankDirectory,
    locale: Locale,
    input: WizardInput,
    json: bool,
) -> anyhow::Result<()> {
    let (commands, command_rx) = mpsc::channel(4);
    let (locale_tx, locale_rx) = watch::channel(locale.clone());
    let (settled_tx, mut settled_rx) = mpsc::channel(4);

    commands.send(WizardCommand::Edit(input)).await?;
    commands.send(WizardCommand::Submit).await?;

    let stdin = tokio::task::spawn_blocking(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let tag = line.trim();
            if tag.is_empty() {
                continue;
            }
            tracing::debug!(locale = tag, "switching locale");
            if locale_tx.send(Locale::parse(tag)).is_err() {
                break;
            }
        }
        drop(commands);
    });

    let printer = async {
        while let Some(settled) = settled_rx.recv().await {
            print_settled(&settled, json)?;
        }
        anyhow::Ok(())
    };

    let mut wizard = Wizard::new(banks, locale);
    let ((), printed) = tokio::join!(wizard.run(api, command_rx, locale_rx, settled_tx), printer);
    stdin.await.context("stdin reader panicked")?;
    printed
}

fn print_settled(settled: &Settled, json: bool) -> anyhow::Result<()> {
    if settled.phase == Phase::RequestFailed {
        eprintln!("assessment failed; showing the last result");
    }
    let Some(result) = &settled.result else {
        eprintln!("no result ({:?})", settled.phase);
        return Ok(());
    };
    let summary = summarize(result, settled.language);
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &AssessmentSummary) {
    println!("[{}] {}", s.badge.code, s.badge.label);
    if let Some(bank) = &s.bank {
        println!("{bank}");
    }
    println!("{}", s.analysis_text);
    for text in [&s.additional_context, &s.recommendation, &s.preference_advice]
        .into_iter()
        .flatten()
    {
        println!("{text}");
    }
    if let Some(saving) = &s.yearly_saving {
        println!("{saving}");
    }
    if let Some(intro) = &s.alternatives_intro {
        println!("{intro}");
    }
    for alt in &s.alternatives {
        println!(
            "  {:<12} {:>7} {:>7}  {}",
            alt.term, alt.average_rate, alt.difference_from_best, alt.yearly_effect
        );
    }
    for offer in &s.offers {
        println!(
            "  {:<12} {:>7} [{}] {}  {}",
            offer.term, offer.offered_rate, offer.badge.code, offer.badge.label, offer.yearly_effect
        );
    }
}

/// Offers select the offer branch; any self-rate flag selects the self-rate branch.
fn build_input(
    bank: Option<String>,
    loan_amount: Option<f64>,
    self_rate: SelfRateDraft,
    offers: Vec<OfferDraft>,
) -> WizardInput {
    let mut input = WizardInput {
        bank_key: bank,
        loan_amount,
        ..Default::default()
    };

    let any_self_rate = self_rate != SelfRateDraft::default();
    if !offers.is_empty() {
        input.answer_has_offer(OfferAnswer::Yes);
        if let Some(slot) = input.offers_mut() {
            *slot = offers;
        }
    } else if any_self_rate {
        input.answer_has_offer(OfferAnswer::No);
        if let Some(slot) = input.self_rate_mut() {
            *slot = self_rate;
        }
    }
    input
}

fn parse_term(s: &str) -> Result<MortgageTerm, String> {
    MortgageTerm::parse(s).ok_or_else(|| format!("unknown term: {s}"))
}

fn parse_comparison_term(s: &str) -> Result<MortgageTerm, String> {
    MortgageTerm::parse_comparison(s).ok_or_else(|| {
        let supported: Vec<&str> = MortgageTerm::COMPARISON
            .iter()
            .map(|t| t.short_code())
            .collect();
        format!("no comparison table for {s}; use one of {}", supported.join(", "))
    })
}

fn parse_preference(s: &str) -> Result<RatePreference, String> {
    RatePreference::parse(s).ok_or_else(|| format!("unknown preference: {s}"))
}

fn parse_column(s: &str) -> Result<SortColumn, String> {
    SortColumn::parse(s).ok_or_else(|| format!("unknown sort column: {s}"))
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    SortDirection::parse(s).ok_or_else(|| format!("unknown direction: {s}"))
}

fn parse_offer(s: &str) -> Result<OfferDraft, String> {
    let (term, rate) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TERM=RATE, got {s}"))?;
    let term = parse_term(term)?;
    let rate = rate
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| format!("invalid rate {rate}: {e}"))?;
    Ok(OfferDraft {
        term: Some(term),
        rate: Some(rate),
    })
}

fn init_sentry(settings: &radar_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
