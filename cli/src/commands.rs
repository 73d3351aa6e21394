//! One-shot subcommands.

use anyhow::{anyhow, bail, Context};
use std::path::Path;
use std::time::Duration;

use pollcheck_app::{
    AuthMode, FetchOutcome, LoginForm, Session, StatsDashboard, StatsOutcome, ToggleFlow,
    ToggleOutcome, VoterListController,
};
use pollcheck_client::{AuthService, ClientConfig, HttpRegistry, VoterRegistry};
use pollcheck_import::NdjsonSink;
use pollcheck_types::{Gender, VoteFilter, VoterQuery};

use crate::prompt::Prompt;
use crate::render;

const SESSION_EXPIRED: &str = "Session expired. Log in again with `pollcheck login`.";

/// Gender and age narrowing for plain listings.
pub struct ListRefinements {
    pub gender: Option<Gender>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

impl ListRefinements {
    fn is_empty(&self) -> bool {
        self.gender.is_none() && self.min_age.is_none() && self.max_age.is_none()
    }
}

/// Deadline for one core call: the HTTP client's own limits plus slack, so
/// the client's timeout normally fires first.
pub fn call_timeout(config: &ClientConfig) -> Duration {
    config.request_timeout() + config.connect_timeout()
}

async fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => Prompt::stdin().required("Password: ").await,
    }
}

async fn submit(form: &mut LoginForm, registry: &HttpRegistry) -> anyhow::Result<()> {
    match form.submit(registry).await {
        Ok(auth) => {
            let name = if auth.user.name.is_empty() {
                &auth.user.username
            } else {
                &auth.user.name
            };
            println!("Logged in as {name} ({})", auth.user.username);
            Ok(())
        }
        Err(e) => Err(anyhow!(form.error().map(str::to_string).unwrap_or_else(|| e.to_string()))),
    }
}

pub async fn login(
    registry: &HttpRegistry,
    username: String,
    password: Option<String>,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let mut form = LoginForm::new().with_call_timeout(call_timeout(config));
    form.username = username;
    form.password = password_or_prompt(password).await?;
    submit(&mut form, registry).await
}

pub async fn register(
    registry: &HttpRegistry,
    username: String,
    name: String,
    security_code: String,
    password: Option<String>,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let mut form = LoginForm::new().with_call_timeout(call_timeout(config));
    form.switch_mode(AuthMode::Register);
    form.username = username;
    form.name = name;
    form.security_code = security_code;
    form.password = password_or_prompt(password).await?;
    submit(&mut form, registry).await
}

pub async fn logout(registry: &HttpRegistry, yes: bool) -> anyhow::Result<()> {
    let mut session = Session::from_token_present(registry.has_session());
    if !session.request_logout() {
        println!("Not logged in.");
        return Ok(());
    }
    if !yes && !Prompt::stdin().confirm("Log out?").await? {
        session.cancel_logout();
        println!("Still logged in.");
        return Ok(());
    }
    if session.confirm_logout() {
        registry.logout().await?;
        println!("Logged out.");
    }
    Ok(())
}

pub async fn whoami(registry: &HttpRegistry) -> anyhow::Result<()> {
    match registry.current_user().await? {
        Some(user) => println!("{} ({})", user.name, user.username),
        None => println!("Not logged in."),
    }
    Ok(())
}

fn check_fetch(outcome: FetchOutcome) -> anyhow::Result<()> {
    match outcome {
        FetchOutcome::Applied | FetchOutcome::Stale => Ok(()),
        FetchOutcome::Failed(e) => Err(e.into()),
        FetchOutcome::SessionExpired => bail!(SESSION_EXPIRED),
    }
}

pub async fn voters(
    registry: &HttpRegistry,
    search: &str,
    filter: VoteFilter,
    page: u32,
    refine: ListRefinements,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    VoterQuery::new(page, filter)
        .with_age_range(refine.min_age, refine.max_age)
        .validate()?;

    let mut list = VoterListController::new().with_call_timeout(call_timeout(config));
    list.set_search_query(search);
    list.set_vote_filter(filter);
    list.set_list_refinements(refine.gender, refine.min_age, refine.max_age);
    list.set_page(page);
    if !refine.is_empty() && pollcheck_types::is_searchable(search) {
        tracing::warn!("gender and age refinements are ignored when searching");
    }

    check_fetch(list.fetch(registry).await)?;
    render::list(&list);
    Ok(())
}

pub async fn lookup(registry: &HttpRegistry, voter_id: &str) -> anyhow::Result<()> {
    let voter = registry.voter_by_id(voter_id).await?;
    render::voter_detail(&voter);
    Ok(())
}

/// Resolve the voter by its roll ID, then run the toggle workflow on it.
pub async fn toggle(
    registry: &HttpRegistry,
    voter_id: &str,
    yes: bool,
    config: &ClientConfig,
) -> anyhow::Result<()> {
    let mut list = VoterListController::new().with_call_timeout(call_timeout(config));
    check_fetch(list.load_voter(registry, voter_id).await)
        .with_context(|| format!("looking up voter {voter_id}"))?;
    let id = list
        .voters()
        .first()
        .map(|v| v.id.clone())
        .ok_or_else(|| anyhow!("Voter {voter_id} not found"))?;

    let outcome = match list.toggle(registry, &id).await {
        ToggleFlow::Done(outcome) => outcome,
        ToggleFlow::AwaitingConfirmation(voter) => {
            let question = format!("Un-mark {} ({}) as voted?", voter.display_name(), voter.voter_id);
            if !yes && !Prompt::stdin().confirm(&question).await? {
                list.cancel_unvote();
                println!("Cancelled. No change made.");
                return Ok(());
            }
            list.confirm_and_toggle(registry)
                .await
                .ok_or_else(|| anyhow!("no pending un-vote to confirm"))?
        }
        ToggleFlow::Busy => bail!("another vote change is still in progress"),
        ToggleFlow::NotFound => bail!("Voter {voter_id} not found"),
    };

    match outcome {
        ToggleOutcome::Applied(voter) => {
            render::voter_detail(&voter);
            Ok(())
        }
        ToggleOutcome::Detached(result) => {
            println!("Vote updated (voted: {}).", result.has_voted);
            Ok(())
        }
        ToggleOutcome::Failed(e) => Err(anyhow!(e).context("vote not changed")),
        ToggleOutcome::SessionExpired => {
            bail!(SESSION_EXPIRED)
        }
    }
}

pub async fn stats(registry: &HttpRegistry, config: &ClientConfig) -> anyhow::Result<()> {
    let mut dashboard = StatsDashboard::new().with_call_timeout(call_timeout(config));
    match dashboard.load(registry).await {
        StatsOutcome::Applied | StatsOutcome::Stale => {}
        StatsOutcome::Failed(e) => return Err(e.into()),
        StatsOutcome::SessionExpired => {
            bail!(SESSION_EXPIRED)
        }
    }
    render::stats_state(dashboard.state(), dashboard.is_refreshing());
    Ok(())
}

pub fn import(file: &Path, out: &Path) -> anyhow::Result<()> {
    let mut sink = NdjsonSink::create(out)?;
    let report = pollcheck_import::import_file(file, &mut sink)
        .with_context(|| format!("importing {}", file.display()))?;

    println!(
        "Imported {} of {} rows in {} batches into {}",
        report.inserted,
        report.total_rows,
        report.batches,
        out.display()
    );
    for rejection in &report.rejected {
        println!("  row {}: {}", rejection.index + 1, rejection.reason);
    }
    Ok(())
}
