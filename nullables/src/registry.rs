//! Nullable Registry: an in-memory voter table that records its calls.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use pollcheck_client::{ApiError, AuthService, VoterRegistry};
use pollcheck_types::{
    AgeGroup, AuthResponse, Credentials, GenderTurnout, Pagination, Registration, ToggleResult,
    User, Voter, VoterKey, VoterQuery, VoterStats, VotersPage,
};

use crate::clock::NullClock;

/// Registry operations, for failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Search,
    ById,
    Stats,
    Toggle,
    Login,
    Register,
    Logout,
    CurrentUser,
}

/// A call as the Registry saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    List(VoterQuery),
    Search(String, VoterQuery),
    ById(String),
    Stats,
    Toggle(VoterKey),
    Login(String),
    Register(String),
    Logout,
    CurrentUser,
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::List(_) => Op::List,
            Self::Search(..) => Op::Search,
            Self::ById(_) => Op::ById,
            Self::Stats => Op::Stats,
            Self::Toggle(_) => Op::Toggle,
            Self::Login(_) => Op::Login,
            Self::Register(_) => Op::Register,
            Self::Logout => Op::Logout,
            Self::CurrentUser => Op::CurrentUser,
        }
    }
}

const AGE_BUCKETS: &[(&str, u32, u32)] = &[
    ("18-25", 18, 25),
    ("26-35", 26, 35),
    ("36-45", 36, 45),
    ("46-55", 46, 55),
    ("56-65", 56, 65),
    ("66+", 66, u32::MAX),
];

struct State {
    voters: Vec<Voter>,
    calls: Vec<Call>,
    failures: HashMap<Op, VecDeque<ApiError>>,
    token: Option<String>,
    accounts: BTreeMap<String, (String, User)>,
    security_code: String,
    issued: u64,
}

/// A test Registry that keeps voters in memory and answers deterministically.
pub struct NullRegistry {
    state: Mutex<State>,
    clock: NullClock,
}

impl NullRegistry {
    pub fn new(voters: Vec<Voter>) -> Self {
        Self {
            state: Mutex::new(State {
                voters,
                calls: Vec::new(),
                failures: HashMap::new(),
                token: None,
                accounts: BTreeMap::new(),
                security_code: "4821".to_string(),
                issued: 0,
            }),
            clock: NullClock::default(),
        }
    }

    /// Start with a stored session token, as if already logged in.
    pub fn logged_in(voters: Vec<Voter>) -> Self {
        let registry = Self::new(voters);
        registry.lock().token = Some("null-token".to_string());
        registry
    }

    /// `count` voters named `Voter 1..=count`, alternating gender, none voted.
    pub fn with_generated(count: usize) -> Self {
        Self::logged_in((1..=count).map(sample_voter).collect())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the next assertion.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next call of `op` fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, op: Op, error: ApiError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Register an operator account that `login` will accept.
    pub fn add_account(&self, username: &str, password: &str, name: &str) {
        let mut state = self.lock();
        let id = state.accounts.len() as u64 + 1;
        let user = User {
            id,
            username: username.to_string(),
            name: name.to_string(),
        };
        state
            .accounts
            .insert(username.to_string(), (password.to_string(), user));
    }

    /// Drop the server-side session: authenticated calls now answer 401.
    pub fn expire_session(&self) {
        self.lock().token = None;
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// All calls so far (for assertions).
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op() == op).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Current server-side copy of a voter.
    pub fn voter(&self, id: &VoterKey) -> Option<Voter> {
        self.lock().voters.iter().find(|v| &v.id == id).cloned()
    }

    /// Replace the whole table, as another operator's edits would.
    pub fn replace_voters(&self, voters: Vec<Voter>) {
        self.lock().voters = voters;
    }

    /// Record the call and pop an injected failure, if any.
    fn enter(&self, call: Call) -> Result<MutexGuard<'_, State>, ApiError> {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        if let Some(err) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            tracing::debug!(?op, "null registry injecting failure: {err}");
            return Err(err);
        }
        Ok(state)
    }

    /// As [`enter`](Self::enter), and answer 401 without a session.
    fn enter_authorized(&self, call: Call) -> Result<MutexGuard<'_, State>, ApiError> {
        let state = self.enter(call)?;
        if state.token.is_none() {
            return Err(ApiError::Unauthorized);
        }
        Ok(state)
    }
}

fn matches_query(voter: &Voter, query: &VoterQuery) -> bool {
    if let Some(voted) = query.vote_filter.has_voted() {
        if voter.has_voted != voted {
            return false;
        }
    }
    if let Some(gender) = query.gender {
        if voter.gender != gender {
            return false;
        }
    }
    let age = voter.age.unwrap_or(0);
    if query.min_age.is_some_and(|min| age < min) {
        return false;
    }
    if query.max_age.is_some_and(|max| age > max) {
        return false;
    }
    true
}

fn matches_text(voter: &Voter, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    [
        &voter.name_english,
        &voter.name_marathi,
        &voter.voter_id,
        &voter.relation_english,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn paginate(matching: Vec<&Voter>, query: &VoterQuery) -> VotersPage {
    let limit = query.limit.max(1);
    let total = matching.len() as u64;
    let pages = total.div_ceil(u64::from(limit)) as u32;
    let start = (query.page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let voters = matching
        .into_iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();
    VotersPage {
        voters,
        pagination: Pagination {
            page: query.page,
            limit,
            total,
            pages,
        },
    }
}

fn compute_stats(voters: &[Voter]) -> VoterStats {
    let total = voters.len() as u64;
    let voted = voters.iter().filter(|v| v.has_voted).count() as u64;
    let mut by_gender = BTreeMap::new();
    let mut voting_by_gender: BTreeMap<String, GenderTurnout> = BTreeMap::new();
    for v in voters {
        let key = v.gender.as_str().to_string();
        *by_gender.entry(key.clone()).or_insert(0) += 1;
        let entry = voting_by_gender.entry(key).or_default();
        if v.has_voted {
            entry.voted += 1;
        } else {
            entry.not_voted += 1;
        }
    }
    let by_age_group = AGE_BUCKETS
        .iter()
        .map(|(range, lo, hi)| AgeGroup {
            range: range.to_string(),
            count: voters
                .iter()
                .filter(|v| v.age.is_some_and(|a| a >= *lo && a <= *hi))
                .count() as u64,
        })
        .collect();
    let voting_percentage = if total == 0 {
        0.0
    } else {
        // Two decimals, as the Registry reports it.
        ((voted as f64 / total as f64) * 10_000.0).round() / 100.0
    };
    VoterStats {
        total,
        voted,
        not_voted: total - voted,
        voting_percentage,
        by_gender,
        by_age_group,
        voting_by_gender,
    }
}

/// Deterministic sample voter number `n` (1-based).
pub fn sample_voter(n: usize) -> Voter {
    use pollcheck_types::Gender;
    Voter {
        id: VoterKey::new(format!("id-{n:04}")),
        voter_id: format!("ABC{n:07}"),
        name_marathi: format!("मतदार {n}"),
        name_english: format!("Voter {n}"),
        relation_marathi: String::new(),
        relation_english: format!("Relative {n}"),
        house_no: format!("{}", n % 50 + 1),
        age: Some(18 + (n as u32 * 7) % 70),
        gender: if n % 2 == 0 {
            Gender::Female
        } else {
            Gender::Male
        },
        has_voted: false,
        voted_at: None,
    }
}

impl VoterRegistry for NullRegistry {
    async fn list_voters(&self, query: &VoterQuery) -> Result<VotersPage, ApiError> {
        let state = self.enter_authorized(Call::List(query.clone()))?;
        let matching = state
            .voters
            .iter()
            .filter(|v| matches_query(v, query))
            .collect();
        Ok(paginate(matching, query))
    }

    async fn search_voters(&self, text: &str, query: &VoterQuery) -> Result<VotersPage, ApiError> {
        let state = self.enter_authorized(Call::Search(text.to_string(), query.clone()))?;
        // The search endpoint only honours the vote filter.
        let filter_only = VoterQuery::new(query.page, query.vote_filter);
        let matching = state
            .voters
            .iter()
            .filter(|v| matches_text(v, text) && matches_query(v, &filter_only))
            .collect();
        Ok(paginate(matching, query))
    }

    async fn voter_by_id(&self, voter_id: &str) -> Result<Voter, ApiError> {
        let state = self.enter_authorized(Call::ById(voter_id.to_string()))?;
        state
            .voters
            .iter()
            .find(|v| v.voter_id == voter_id)
            .cloned()
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: "Voter not found".to_string(),
            })
    }

    async fn stats(&self) -> Result<VoterStats, ApiError> {
        let state = self.enter_authorized(Call::Stats)?;
        Ok(compute_stats(&state.voters))
    }

    async fn toggle_vote(&self, id: &VoterKey) -> Result<ToggleResult, ApiError> {
        let mut state = self.enter_authorized(Call::Toggle(id.clone()))?;
        let voter = state
            .voters
            .iter_mut()
            .find(|v| &v.id == id)
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: "Voter not found".to_string(),
            })?;
        voter.has_voted = !voter.has_voted;
        voter.voted_at = voter.has_voted.then(|| self.clock.stamp());
        Ok(ToggleResult {
            success: true,
            has_voted: voter.has_voted,
            voted_at: voter.voted_at.clone(),
        })
    }
}

impl AuthService for NullRegistry {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let mut state = self.enter(Call::Login(credentials.username.clone()))?;
        let user = match state.accounts.get(&credentials.username) {
            Some((password, user)) if *password == credentials.password => user.clone(),
            _ => {
                return Err(ApiError::Rejected {
                    status: 401,
                    message: "Invalid username or password".to_string(),
                })
            }
        };
        state.issued += 1;
        let token = format!("null-token-{}", state.issued);
        state.token = Some(token.clone());
        Ok(AuthResponse { token, user })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let mut state = self.enter(Call::Register(registration.username.clone()))?;
        if registration.security_code != state.security_code {
            return Err(ApiError::Rejected {
                status: 403,
                message: "Invalid security code".to_string(),
            });
        }
        if state.accounts.contains_key(&registration.username) {
            return Err(ApiError::Rejected {
                status: 409,
                message: "Username already exists".to_string(),
            });
        }
        let user = User {
            id: state.accounts.len() as u64 + 1,
            username: registration.username.clone(),
            name: registration.name.clone(),
        };
        state.accounts.insert(
            registration.username.clone(),
            (registration.password.clone(), user.clone()),
        );
        state.issued += 1;
        let token = format!("null-token-{}", state.issued);
        state.token = Some(token.clone());
        Ok(AuthResponse { token, user })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        // Logout ignores transport failures, so injected ones are swallowed too.
        let mut state = match self.enter(Call::Logout) {
            Ok(state) => state,
            Err(_) => self.lock(),
        };
        state.token = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let state = self.enter(Call::CurrentUser)?;
        if state.token.is_none() {
            return Ok(None);
        }
        Ok(state.accounts.values().next().map(|(_, user)| user.clone()))
    }

    fn has_session(&self) -> bool {
        self.lock().token.is_some()
    }
}
