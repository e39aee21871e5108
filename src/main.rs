use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use budgetwise::cache::PlanCache;
use budgetwise::cli::Args;
use budgetwise::config::Config;
use budgetwise::log::{self, ArtifactSink};
use budgetwise::pipeline::Pipeline;
use budgetwise::provider::{make_provider, GenerationClient};
use budgetwise::reference::{self, Region};
use budgetwise::session::driver::SessionDriver;
use budgetwise::session::{Session, Step};
use budgetwise::ux::{self, Input};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref().map(Path::new))?;
    if let Some(p) = args.provider.clone() {
        cfg.provider = p;
    }
    if let Some(m) = args.model.clone() {
        cfg.model = Some(m);
    }
    if let Some(t) = args.timeout_secs {
        cfg.timeout_secs = t;
    }
    cfg.save_request |= args.save_request;
    cfg.save_response |= args.save_response;
    cfg.resolve_credentials();

    if args.list_regions {
        for r in reference::regions() {
            ux::show_brackets(&r, &reference::income_brackets(&r));
        }
        return Ok(());
    }

    let lang_code = args.language.clone().unwrap_or_else(|| cfg.default_language.clone());
    let language = reference::find_language(&lang_code)
        .ok_or_else(|| anyhow!("unknown language: {lang_code}"))?;

    let session_id = Uuid::new_v4();
    tracing::debug!(session = %session_id, provider = ?cfg.provider, model = cfg.model(), "starting session");
    let client = GenerationClient::new(make_provider(&cfg))
        .with_artifacts(ArtifactSink::from_config(&cfg, session_id));
    let pipeline = Arc::new(Pipeline::new(Arc::new(PlanCache::new()), client));
    let driver = SessionDriver::spawn(pipeline, language);

    match args.region.as_deref() {
        Some(code) => one_shot(&driver, code, args.bracket, args.json).await,
        None => interactive(&driver).await,
    }
}

async fn one_shot(driver: &SessionDriver, code: &str, bracket: Option<usize>, json: bool) -> Result<()> {
    let region = reference::find_region(code).ok_or_else(|| anyhow!("unknown region: {code}"))?;
    let brackets = reference::income_brackets(&region);
    let n = bracket.ok_or_else(|| anyhow!("--bracket is required with --region (1..={})", brackets.len()))?;
    let chosen = n
        .checked_sub(1)
        .and_then(|i| brackets.get(i))
        .cloned()
        .ok_or_else(|| anyhow!("bracket {n} out of range (1..={})", brackets.len()))?;

    driver.select_region(region.clone()).await?;
    driver.select_income(chosen).await?;
    let s = wait_for_plan(driver, &region, !json).await?;

    match s.displayed_plan() {
        Some(plan) if json => println!("{}", serde_json::to_string_pretty(plan.as_ref())?),
        Some(plan) => ux::show_dashboard(&region, plan),
        None => bail!("{}", s.error().unwrap_or("no plan produced")),
    }
    Ok(())
}

async fn wait_for_plan(driver: &SessionDriver, region: &Region, show_spinner: bool) -> Result<Session> {
    if !driver.snapshot().in_flight() {
        return Ok(driver.settled().await?);
    }
    let pb = show_spinner.then(|| ux::spinner(format!("Building your plan for {}...", region.name)));
    let s = driver.settled().await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(s?)
}

async fn interactive(driver: &SessionDriver) -> Result<()> {
    let regions = reference::regions();
    let languages = reference::languages();

    loop {
        let s = driver.settled().await?;
        ux::show_languages(&languages, s.language());

        let label = match s.step() {
            Step::SelectRegion => {
                ux::show_regions(&regions);
                "region # or code (l <lang>, q):"
            }
            Step::SelectIncome => {
                let region = s.region().context("income step without a region")?;
                if let Some(e) = s.error() {
                    ux::show_error(e);
                }
                ux::show_brackets(region, &reference::income_brackets(region));
                "bracket # (b back, r reset, t retry, l <lang>, q):"
            }
            Step::ViewDashboard => {
                if let (Some(region), Some(plan)) = (s.region(), s.displayed_plan()) {
                    ux::show_dashboard(region, plan);
                }
                "(l <lang>, b back, r reset, q):"
            }
        };

        let Some(line) = ux::prompt(label) else { return Ok(()) };
        match ux::parse_input(&line) {
            Input::Quit => return Ok(()),
            Input::Empty => {}
            Input::Back => driver.back().await?,
            Input::Reset => driver.reset().await?,
            Input::Language(code) => match reference::find_language(&code) {
                Some(l) => driver.change_language(l).await?,
                None => println!("unknown language: {code}"),
            },
            Input::Retry => match (s.step(), s.bracket()) {
                (Step::SelectIncome, Some(b)) => {
                    if let Err(e) = driver.select_income(b.clone()).await {
                        println!("{e}");
                    }
                }
                _ => println!("nothing to retry"),
            },
            Input::Pick(pick) => match s.step() {
                Step::SelectRegion => {
                    match ux::pick_index(&pick, regions.len(), |i| regions[i].code.clone()) {
                        Some(i) => driver.select_region(regions[i].clone()).await?,
                        None => println!("no such region: {pick}"),
                    }
                }
                Step::SelectIncome => {
                    let Some(region) = s.region() else { continue };
                    let brackets = reference::income_brackets(region);
                    match ux::pick_index(&pick, brackets.len(), |_| String::new()) {
                        Some(i) => {
                            if let Err(e) = driver.select_income(brackets[i].clone()).await {
                                println!("{e}");
                            }
                        }
                        None => println!("no such bracket: {pick}"),
                    }
                }
                Step::ViewDashboard => println!("unknown command: {pick}"),
            },
        }

        if let Some(region) = driver.snapshot().region() {
            wait_for_plan(driver, region, true).await?;
        }
    }
}
