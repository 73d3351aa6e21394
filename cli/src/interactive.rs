//! `pollcheck shell`: a line-oriented front end over [`Shell`].

use pollcheck_app::{
    AuthMode, FetchOutcome, Navigation, Shell, StatsOutcome, ToggleFlow, ToggleOutcome, View,
};
use pollcheck_client::{AuthService, ClientConfig, HttpRegistry};
use pollcheck_types::VoteFilter;

use crate::commands::call_timeout;
use crate::prompt::Prompt;
use crate::render;

const HELP: &str = "\
commands:
  go <home|search|dashboard|practice>
  login <username>            register <username>
  search <text>               filter <all|voted|not_voted>
  next | prev | retry | view
  toggle <row>                yes | no
  stats                       logout
  help                        quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Go(View),
    Login(String),
    Register(String),
    Search(String),
    Filter(VoteFilter),
    Next,
    Prev,
    Toggle(usize),
    Yes,
    No,
    Stats,
    Retry,
    View,
    Logout,
    Help,
    Quit,
    Blank,
}

fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let input = match word.to_ascii_lowercase().as_str() {
        "" => Input::Blank,
        "go" => Input::Go(rest.parse().map_err(|e| format!("{e}"))?),
        "login" if !rest.is_empty() => Input::Login(rest.to_string()),
        "register" if !rest.is_empty() => Input::Register(rest.to_string()),
        "login" | "register" => return Err(format!("usage: {word} <username>")),
        // Search text is kept exactly as typed after the command word.
        "search" => Input::Search(rest.to_string()),
        "filter" => Input::Filter(rest.parse().map_err(|e| format!("{e}"))?),
        "next" => Input::Next,
        "prev" | "previous" => Input::Prev,
        "toggle" => match rest.parse::<usize>() {
            Ok(row) if row >= 1 => Input::Toggle(row),
            _ => return Err("usage: toggle <row number>".into()),
        },
        "yes" | "y" => Input::Yes,
        "no" | "n" => Input::No,
        "stats" => Input::Stats,
        "retry" => Input::Retry,
        "view" | "ls" => Input::View,
        "logout" => Input::Logout,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(input)
}

struct Repl<'a> {
    shell: Shell,
    registry: &'a HttpRegistry,
    prompt: Prompt,
}

pub async fn run(registry: &HttpRegistry, config: &ClientConfig) -> anyhow::Result<()> {
    let shell = Shell::from_view_names(config.enabled_views.as_slice(), registry.has_session())?
        .with_call_timeout(call_timeout(config));
    let mut repl = Repl {
        shell,
        registry,
        prompt: Prompt::stdin(),
    };

    if let Some(user) = repl.shell.restore_session(registry).await {
        println!("Welcome back, {}.", user.username);
    }
    println!("{HELP}");

    loop {
        let label = format!("pollcheck:{}> ", repl.shell.view());
        let Some(line) = repl.prompt.line(&label).await? else {
            break;
        };
        match parse(&line) {
            Ok(Input::Quit) => break,
            Ok(input) => repl.handle(input).await?,
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

impl Repl<'_> {
    async fn handle(&mut self, input: Input) -> anyhow::Result<()> {
        match input {
            Input::Blank | Input::Quit => {}
            Input::Help => println!("{HELP}"),
            Input::Go(view) => self.go(view).await,
            Input::Login(username) => self.login(AuthMode::Login, username).await?,
            Input::Register(username) => self.login(AuthMode::Register, username).await?,
            Input::Search(text) => {
                if self.require_search() {
                    self.shell.set_search_text(text);
                    self.reload().await;
                }
            }
            Input::Filter(filter) => {
                if self.require_search() {
                    self.shell.set_vote_filter(filter);
                    self.reload().await;
                }
            }
            Input::Next => {
                if self.require_search() {
                    match self.shell.next_page(self.registry).await {
                        Some(outcome) => self.after_fetch(outcome),
                        None => println!("Already on the last page."),
                    }
                }
            }
            Input::Prev => {
                if self.require_search() {
                    match self.shell.previous_page(self.registry).await {
                        Some(outcome) => self.after_fetch(outcome),
                        None => println!("Already on the first page."),
                    }
                }
            }
            Input::Retry => {
                if self.require_search() {
                    let outcome = self.shell.retry_list(self.registry).await;
                    self.after_fetch(outcome);
                }
            }
            Input::View => match self.shell.view() {
                View::Search => render::list(self.shell.list()),
                View::Dashboard => self.show_stats().await,
                View::Home => println!("Home. Use `go search` to look up voters."),
                View::Practice => println!("Practice mode is not available in the terminal."),
            },
            Input::Toggle(row) => {
                if self.require_search() {
                    self.toggle(row).await;
                }
            }
            Input::Yes => self.yes().await,
            Input::No => {
                if self.shell.list().pending_unvote().is_some() {
                    self.shell.cancel_unvote();
                    println!("Cancelled. No change made.");
                } else if self.shell.session().logout_pending() {
                    self.shell.cancel_logout();
                    println!("Still logged in.");
                }
            }
            Input::Stats => self.go(View::Dashboard).await,
            Input::Logout => {
                if self.shell.request_logout() {
                    println!("Log out? Type `yes` to confirm or `no` to stay.");
                } else {
                    println!("Not logged in.");
                }
            }
        }
        Ok(())
    }

    /// Search-view commands only make sense on the search view.
    fn require_search(&self) -> bool {
        if self.shell.view() == View::Search {
            return true;
        }
        println!("Switch to the search view first: `go search`.");
        false
    }

    async fn go(&mut self, view: View) {
        match self.shell.navigate(view) {
            Navigation::Shown(View::Search) => self.reload().await,
            Navigation::Shown(View::Dashboard) => self.show_stats().await,
            Navigation::Shown(v) => println!("{v}"),
            Navigation::LoginRequired => println!("Please log in first: `login <username>`."),
            Navigation::Disabled => println!("The {view} view is not enabled."),
        }
    }

    async fn login(&mut self, mode: AuthMode, username: String) -> anyhow::Result<()> {
        self.shell.open_login();
        let form = self.shell.login_form_mut();
        form.switch_mode(mode);
        form.username = username;
        form.password = self.prompt.required("Password: ").await?;
        if mode == AuthMode::Register {
            let name = self.prompt.required("Full name: ").await?;
            let code = self.prompt.required("Security code: ").await?;
            let form = self.shell.login_form_mut();
            form.name = name;
            form.security_code = code;
        }

        match self.shell.login(self.registry).await {
            Ok(user) => {
                println!("Logged in as {}.", user.username);
                if self.shell.view() == View::Search {
                    self.reload().await;
                }
            }
            Err(_) => {
                let message = self.shell.login_form().error().unwrap_or("Login failed");
                println!("{message}");
                self.shell.close_login();
            }
        }
        Ok(())
    }

    async fn reload(&mut self) {
        let outcome = self.shell.load_list(self.registry).await;
        self.after_fetch(outcome);
    }

    fn after_fetch(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::SessionExpired => session_expired(),
            _ => render::list(self.shell.list()),
        }
    }

    async fn toggle(&mut self, row: usize) {
        let Some(id) = self.shell.list().voters().get(row - 1).map(|v| v.id.clone()) else {
            println!("No row {row} on this page.");
            return;
        };
        match self.shell.toggle(self.registry, &id).await {
            ToggleFlow::AwaitingConfirmation(voter) => println!(
                "Un-mark {} ({}) as voted? Type `yes` to confirm or `no` to cancel.",
                voter.display_name(),
                voter.voter_id
            ),
            ToggleFlow::Busy => println!("Another vote change is still in progress."),
            ToggleFlow::NotFound => println!("That voter is no longer on this page."),
            ToggleFlow::Done(outcome) => self.after_toggle(outcome),
        }
    }

    fn after_toggle(&mut self, outcome: ToggleOutcome) {
        match outcome {
            ToggleOutcome::Applied(_) | ToggleOutcome::Failed(_) => render::list(self.shell.list()),
            ToggleOutcome::Detached(_) => println!("Vote updated."),
            ToggleOutcome::SessionExpired => session_expired(),
        }
    }

    async fn yes(&mut self) {
        if self.shell.list().pending_unvote().is_some() {
            match self.shell.confirm_unvote(self.registry).await {
                Some(outcome) => self.after_toggle(outcome),
                None => println!("Another vote change is still in progress."),
            }
        } else if self.shell.session().logout_pending() {
            self.shell.confirm_logout(self.registry).await;
            println!("Logged out.");
        } else {
            println!("Nothing to confirm.");
        }
    }

    async fn show_stats(&mut self) {
        match self.shell.sync_stats(self.registry).await {
            Some(StatsOutcome::SessionExpired) => {
                session_expired();
                return;
            }
            Some(StatsOutcome::Failed(e)) if self.shell.stats().stats().is_some() => {
                println!("Could not refresh stats ({e}); showing the last numbers.");
            }
            _ => {}
        }
        let stats = self.shell.stats();
        render::stats_state(stats.state(), stats.is_refreshing());
    }
}

fn session_expired() {
    println!("Session expired. Please log in again.");
}
