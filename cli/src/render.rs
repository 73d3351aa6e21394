//! Plain-text rendering for stdout.

use pollcheck_app::{ListView, StatsState, VoterListController};
use pollcheck_types::{Voter, VoterKey, VoterStats};

fn status(voter: &Voter) -> String {
    match (&voter.has_voted, &voter.voted_at) {
        (true, Some(at)) => format!("VOTED {at}"),
        (true, None) => "VOTED".to_string(),
        (false, _) => "-".to_string(),
    }
}

pub fn voter_rows(voters: &[Voter], toggling: Option<&VoterKey>) {
    println!(
        "{:>3}  {:<12}  {:<28}  {:>5}  {:<10}  {:<8}  STATUS",
        "#", "VOTER ID", "NAME", "AGE", "GENDER", "HOUSE"
    );
    for (i, v) in voters.iter().enumerate() {
        let busy = if toggling == Some(&v.id) { " ..." } else { "" };
        println!(
            "{:>3}  {:<12}  {:<28}  {:>5}  {:<10}  {:<8}  {}{busy}",
            i + 1,
            v.voter_id,
            v.display_name(),
            v.age_label(),
            v.gender.as_str(),
            v.house_label(),
            status(v),
        );
    }
}

/// The list area: loading, error, empty or rows plus the page footer.
pub fn list(list: &VoterListController) {
    match list.view() {
        ListView::Loading => println!("Loading..."),
        ListView::Error { message, retryable } => {
            println!("Error: {message}");
            if retryable {
                println!("Type `retry` to try again.");
            }
        }
        ListView::Empty { message } => println!("No voters found. {message}"),
        ListView::Rows(rows) => {
            voter_rows(rows, list.toggling());
            let pagination = list.pagination();
            if pagination.is_paged() {
                println!(
                    "{}  ({} voters){}{}",
                    list.page_label(),
                    pagination.total,
                    if list.can_go_previous() { "  [prev]" } else { "" },
                    if list.can_go_next() { "  [next]" } else { "" },
                );
            }
        }
    }
}

pub fn voter_detail(v: &Voter) {
    println!("[{}]", v.initial());
    println!("Voter ID   {}", v.voter_id);
    println!("Name       {} / {}", v.name_english, v.name_marathi);
    println!("Relation   {} / {}", v.relation_english, v.relation_marathi);
    println!("House      {}", v.house_label());
    println!("Age        {}", v.age_label());
    println!("Gender     {}", v.gender);
    println!("Status     {}", status(v));
}

pub fn stats(stats: &VoterStats) {
    println!("Total      {}", stats.total);
    println!("Voted      {}", stats.voted);
    println!("Not voted  {}", stats.not_voted);
    println!("Turnout    {:.2}%", stats.turnout_for_display());
    println!("Male       {}", stats.male_count());
    println!("Female     {}", stats.female_count());
    if !stats.by_age_group.is_empty() {
        println!("By age:");
        for group in &stats.by_age_group {
            println!("  {:<8} {}", group.range, group.count);
        }
    }
    if !stats.voting_by_gender.is_empty() {
        println!("Turnout by gender:");
        for (gender, t) in &stats.voting_by_gender {
            println!("  {gender:<11} voted {:<6} not voted {}", t.voted, t.not_voted);
        }
    }
}

pub fn stats_state(state: &StatsState, refreshing: bool) {
    match state {
        StatsState::Loading => println!("Loading stats..."),
        StatsState::Error(message) => println!("Error loading stats: {message}"),
        StatsState::Loaded(s) => {
            stats(s);
            if refreshing {
                println!("(refreshing)");
            }
        }
    }
}
