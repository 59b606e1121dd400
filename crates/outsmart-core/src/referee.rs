//! Turn resolution: collecting every agent's move and settling the round.
//!
//! A round runs through these phases, always in this order:
//!
//! 1. **Collection** -- every agent is asked for a move concurrently. Any
//!    failure (transport, timeout, unparseable or illegal reply) yields an
//!    invalid [`TurnRecord`] for that agent only.
//!
//! 2. **Giving** -- each valid move's `give` target gains a coin. Every
//!    agent pays one coin, including agents whose move was not processed.
//!
//! 3. **Taking** -- each valid move's `take` target loses a coin to the
//!    taker.
//!
//! 4. **Alliances** -- two agents who gave to each other and took from the
//!    same victim gain a coin each, paid by the victim (two coins). An
//!    agent joins at most one alliance per round; the first pair found in
//!    roster order wins.
//!
//! 5. **Messages** -- private messages are delivered to their recipients'
//!    records. Messages to unknown names are dropped.
//!
//! Settlement reads the targets resolved from the frozen set of moves, so
//! no phase can see a move change under it. Only the coin transfers listed
//! above touch balances, which keeps the total number of coins constant.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use outsmart_types::{Coins, Move, TurnRecord};
use tracing::{debug, info, warn};

use crate::config::RulesConfig;
use crate::error::{ArenaError, MoveError};
use crate::parse::parse_move;
use crate::player::Player;
use crate::progress::ProgressSink;
use crate::prompt::{OtherCoins, PromptEngine, PromptView};
use crate::source::MoveSource;

/// Knobs for a single round's collection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefereeSettings {
    /// Token budget passed to each move source.
    pub max_tokens: u32,
    /// Per-agent deadline; a late agent's move is not processed.
    pub decision_timeout: Option<Duration>,
}

impl From<&RulesConfig> for RefereeSettings {
    fn from(rules: &RulesConfig) -> Self {
        Self {
            max_tokens: rules.max_tokens,
            decision_timeout: rules.decision_timeout(),
        }
    }
}

/// An alliance confirmed during settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alliance {
    /// The two allies, in the order they were found.
    pub members: (String, String),
    /// The player both allies took from.
    pub victim: String,
}

/// What happened in a settled round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    /// The round that was played.
    pub round: u32,
    /// Players whose move was not processed, in roster order.
    pub invalid: Vec<String>,
    /// Alliances formed this round.
    pub alliances: Vec<Alliance>,
    /// Total coins held by all players before settlement.
    pub coins_before: Coins,
    /// Total coins held by all players after settlement.
    pub coins_after: Coins,
}

impl RoundSummary {
    /// Whether settlement moved coins around without creating or
    /// destroying any.
    pub const fn is_balanced(&self) -> bool {
        self.coins_before == self.coins_after
    }
}

/// Give and take targets of one valid move, as roster positions.
#[derive(Debug, Clone, Copy)]
struct Pick {
    give: usize,
    take: usize,
}

/// Runs one round for a roster of players.
///
/// The referee borrows the roster for the duration of the round, mutates
/// balances during settlement, and appends each player's [`TurnRecord`] to
/// its history once the round is complete.
pub struct Referee<'a, S> {
    players: &'a mut [Player<S>],
    round: u32,
    prompts: &'a PromptEngine,
    settings: RefereeSettings,
    roster: Vec<String>,
    index: HashMap<String, usize>,
}

impl<'a, S: MoveSource> Referee<'a, S> {
    /// Prepare a round.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::TooFewPlayers`], [`ArenaError::EmptyName`] or
    /// [`ArenaError::DuplicateName`] if the roster cannot be settled.
    pub fn new(
        players: &'a mut [Player<S>],
        round: u32,
        prompts: &'a PromptEngine,
        settings: RefereeSettings,
    ) -> Result<Self, ArenaError> {
        validate_roster(players)?;
        let roster: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
        let index = roster
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(Self {
            players,
            round,
            prompts,
            settings,
            roster,
            index,
        })
    }

    /// Play the round: collect every move, then settle.
    ///
    /// Never fails. An agent that cannot produce a usable move gets an
    /// invalid record and still pays its give-cost.
    pub async fn do_turn(self, progress: &mut dyn ProgressSink) -> RoundSummary {
        progress.progress(0.0, &format!("Kicking off turn {}", self.round));
        let records = self.collect(progress).await;
        progress.progress(1.0, "Finishing up..");
        self.settle(records)
    }

    /// Ask every player for a move concurrently and wait for all of them.
    async fn collect(&self, progress: &mut dyn ProgressSink) -> Vec<TurnRecord> {
        let total = self.players.len();
        let mut pending: FuturesUnordered<_> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, player)| async move { (i, self.request_move(player).await) })
            .collect();

        let mut slots: Vec<Option<TurnRecord>> = vec![None; total];
        let mut completed: usize = 0;

        while let Some((i, outcome)) = pending.next().await {
            let Some(player) = self.players.get(i) else {
                continue;
            };
            let (record, status) = match outcome {
                Ok(mv) => {
                    info!(
                        round = self.round,
                        player = %player.name,
                        give = %mv.give,
                        take = %mv.take,
                        "move received"
                    );
                    (
                        TurnRecord::valid(player.name.as_str(), self.round, mv),
                        format!("{} has made a move", player.name),
                    )
                }
                Err(e) => {
                    warn!(
                        round = self.round,
                        player = %player.name,
                        model = %player.model,
                        error = %e,
                        "move not processed"
                    );
                    (
                        TurnRecord::invalid(player.name.as_str(), self.round),
                        format!("{}'s move was not processed", player.name),
                    )
                }
            };

            completed = completed.saturating_add(1);
            progress.progress(fraction(completed, total), &status);
            if let Some(slot) = slots.get_mut(i) {
                *slot = Some(record);
            }
        }

        slots
            .into_iter()
            .zip(self.roster.iter())
            .map(|(slot, name)| slot.unwrap_or_else(|| TurnRecord::invalid(name.as_str(), self.round)))
            .collect()
    }

    /// Produce, parse, and validate one player's move.
    async fn request_move(&self, player: &Player<S>) -> Result<Move, MoveError> {
        let view = self.prompt_view(player);
        let instructions = self.prompts.render(&view)?;
        let send = player.source().send(&instructions, self.settings.max_tokens);

        let raw = match self.settings.decision_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, send).await {
                Ok(reply) => reply?,
                Err(_) => {
                    return Err(MoveError::Timeout {
                        deadline_ms: deadline.as_millis(),
                    });
                }
            },
            None => send.await?,
        };

        parse_move(&raw, &player.name, &self.roster).inspect_err(|e| {
            debug!(
                round = self.round,
                player = %player.name,
                error = %e,
                raw_response = %raw,
                "unusable response"
            );
        })
    }

    fn prompt_view<'p>(&self, player: &'p Player<S>) -> PromptView<'p> {
        let standings = player
            .other_names
            .iter()
            .filter_map(|name| {
                let other = self.index.get(name).and_then(|&i| self.players.get(i))?;
                Some(OtherCoins {
                    name: name.clone(),
                    coins: other.coins,
                })
            })
            .collect();
        PromptView {
            name: &player.name,
            others: &player.other_names,
            coins: player.coins,
            round: self.round,
            standings,
            records: &player.records,
        }
    }

    /// Run the four settlement phases and hand the records to the players.
    fn settle(self, records: Vec<TurnRecord>) -> RoundSummary {
        let picks: Vec<Option<Pick>> = records
            .iter()
            .map(|record| {
                let mv = record.accepted_move()?;
                Some(Pick {
                    give: *self.index.get(&mv.give)?,
                    take: *self.index.get(&mv.take)?,
                })
            })
            .collect();

        let mut settlement = Settlement {
            players: self.players,
            records,
            index: &self.index,
        };

        let coins_before = settlement.total_coins();
        settlement.handle_giving(&picks);
        settlement.handle_taking(&picks);
        let alliances = settlement.handle_alliances(&picks);
        settlement.handle_messages();
        let coins_after = settlement.total_coins();

        let invalid: Vec<String> = settlement
            .records
            .iter()
            .filter(|r| r.is_invalid)
            .map(|r| r.name.clone())
            .collect();

        if coins_before != coins_after {
            warn!(
                round = self.round,
                coins_before, coins_after, "coin total changed during settlement"
            );
        }
        info!(
            round = self.round,
            invalid = invalid.len(),
            alliances = alliances.len(),
            "round settled"
        );

        for (player, record) in settlement.players.iter_mut().zip(settlement.records) {
            player.records.push(record);
        }

        RoundSummary {
            round: self.round,
            invalid,
            alliances,
            coins_before,
            coins_after,
        }
    }
}

/// Mutable state for the settlement phases of one round.
struct Settlement<'r, S> {
    players: &'r mut [Player<S>],
    records: Vec<TurnRecord>,
    index: &'r HashMap<String, usize>,
}

impl<S> Settlement<'_, S> {
    fn total_coins(&self) -> Coins {
        self.players
            .iter()
            .fold(0, |sum: Coins, p| sum.saturating_add(p.coins))
    }

    fn name(&self, i: usize) -> String {
        self.players.get(i).map(|p| p.name.clone()).unwrap_or_default()
    }

    fn adjust(&mut self, i: usize, delta: Coins) {
        if let Some(player) = self.players.get_mut(i) {
            player.coins = player.coins.saturating_add(delta);
        }
    }

    fn record_mut(&mut self, i: usize) -> Option<&mut TurnRecord> {
        self.records.get_mut(i)
    }

    /// Every player pays a coin; valid moves deliver it to their target.
    fn handle_giving(&mut self, picks: &[Option<Pick>]) {
        for (i, pick) in picks.iter().enumerate() {
            if let Some(pick) = pick {
                let giver = self.name(i);
                self.adjust(pick.give, 1);
                if let Some(record) = self.record_mut(pick.give) {
                    record.givers.push(giver);
                }
            }
            self.adjust(i, -1);
        }
    }

    /// Valid moves take a coin from their target.
    fn handle_taking(&mut self, picks: &[Option<Pick>]) {
        for (i, pick) in picks.iter().enumerate() {
            let Some(pick) = pick else {
                continue;
            };
            let taker = self.name(i);
            self.adjust(pick.take, -1);
            if let Some(record) = self.record_mut(pick.take) {
                record.takers.push(taker);
            }
            self.adjust(i, 1);
        }
    }

    /// Find mutual givers who also took from the same player.
    fn handle_alliances(&mut self, picks: &[Option<Pick>]) -> Vec<Alliance> {
        let mut allied = vec![false; picks.len()];
        let mut alliances = Vec::new();

        for (a, pick_a) in picks.iter().enumerate() {
            let Some(pick_a) = pick_a else {
                continue;
            };
            let b = pick_a.give;
            let Some(Some(pick_b)) = picks.get(b) else {
                continue;
            };
            if pick_b.give != a {
                continue;
            }
            if allied.get(a).copied().unwrap_or(true) || allied.get(b).copied().unwrap_or(true) {
                continue;
            }
            if pick_a.take != pick_b.take {
                continue;
            }

            let victim = pick_a.take;
            for i in [a, b] {
                if let Some(flag) = allied.get_mut(i) {
                    *flag = true;
                }
            }
            alliances.push(self.process_alliance(a, b, victim));
        }

        alliances
    }

    fn process_alliance(&mut self, a: usize, b: usize, victim: usize) -> Alliance {
        let name_a = self.name(a);
        let name_b = self.name(b);
        let name_victim = self.name(victim);

        self.adjust(a, 1);
        self.adjust(b, 1);
        self.adjust(victim, -2);

        if let Some(record) = self.record_mut(a) {
            record.alliance_partners.push(name_b.clone());
        }
        if let Some(record) = self.record_mut(b) {
            record.alliance_partners.push(name_a.clone());
        }
        if let Some(record) = self.record_mut(victim) {
            record.allied_against.extend([name_a.clone(), name_b.clone()]);
        }

        info!(ally = %name_a, partner = %name_b, victim = %name_victim, "alliance formed");
        Alliance {
            members: (name_a, name_b),
            victim: name_victim,
        }
    }

    /// Deliver each valid move's private messages.
    fn handle_messages(&mut self) {
        for i in 0..self.records.len() {
            let Some(messages) = self
                .records
                .get(i)
                .and_then(TurnRecord::accepted_move)
                .map(|mv| mv.messages.clone())
            else {
                continue;
            };
            let sender = self.name(i);
            for (recipient, text) in messages {
                let Some(&r) = self.index.get(&recipient) else {
                    debug!(sender = %sender, recipient = %recipient, "dropping message to unknown player");
                    continue;
                };
                if let Some(record) = self.record_mut(r) {
                    record.received_messages.push((sender.clone(), text));
                }
            }
        }
    }
}

/// Check that a roster has at least two players, each with a unique,
/// non-blank name.
pub(crate) fn validate_roster<S>(players: &[Player<S>]) -> Result<(), ArenaError> {
    if players.len() < 2 {
        return Err(ArenaError::TooFewPlayers {
            count: players.len(),
        });
    }
    let mut seen = HashSet::new();
    for player in players {
        if player.name.trim().is_empty() {
            return Err(ArenaError::EmptyName);
        }
        if !seen.insert(player.name.as_str()) {
            return Err(ArenaError::DuplicateName(player.name.clone()));
        }
    }
    Ok(())
}

/// `done / total` as a fraction in `[0, 1]`.
fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let done = u32::try_from(done).unwrap_or(u32::MAX);
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    (f64::from(done) / f64::from(total)).min(1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::{ScriptedReply, ScriptedSource};

    fn answer(give: &str, take: &str) -> String {
        format!(
            r#"{{"secret strategy": "s", "give coin to": "{give}", "take coin from": "{take}", "private messages": {{}}}}"#
        )
    }

    fn player(name: &str, replies: Vec<ScriptedReply>, all: &[&str]) -> Player<ScriptedSource> {
        let mut p = Player::new(name, "scripted", ScriptedSource::new(replies));
        p.reset(12);
        p.other_names = all
            .iter()
            .filter(|n| **n != name)
            .map(|n| (*n).to_owned())
            .collect();
        p
    }

    fn text(give: &str, take: &str) -> Vec<ScriptedReply> {
        vec![ScriptedReply::Text(answer(give, take))]
    }

    fn coins(players: &[Player<ScriptedSource>]) -> Vec<Coins> {
        players.iter().map(|p| p.coins).collect()
    }

    async fn run(players: &mut [Player<ScriptedSource>], settings: RefereeSettings) -> RoundSummary {
        let prompts = PromptEngine::new(&RulesConfig::default()).unwrap();
        Referee::new(players, 1, &prompts, settings)
            .unwrap()
            .do_turn(&mut crate::progress::NoProgress)
            .await
    }

    fn settings() -> RefereeSettings {
        RefereeSettings::from(&RulesConfig::default())
    }

    #[tokio::test]
    async fn three_player_alliance_scenario() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", text("B", "C"), &all),
            player("B", text("A", "C"), &all),
            player("C", text("A", "B"), &all),
        ];

        let summary = run(&mut players, settings()).await;

        assert_eq!(coins(&players), vec![15, 13, 7]);
        assert!(summary.invalid.is_empty());
        assert_eq!(
            summary.alliances,
            vec![Alliance {
                members: (String::from("A"), String::from("B")),
                victim: String::from("C"),
            }]
        );
        assert!(summary.is_balanced());

        let a = players.first().unwrap().last_record().unwrap();
        let b = players.get(1).unwrap().last_record().unwrap();
        let c = players.get(2).unwrap().last_record().unwrap();
        assert_eq!(a.alliance_partners, vec![String::from("B")]);
        assert_eq!(b.alliance_partners, vec![String::from("A")]);
        assert_eq!(c.allied_against, vec![String::from("A"), String::from("B")]);
        assert_eq!(a.givers, vec![String::from("B"), String::from("C")]);
        assert_eq!(c.takers, vec![String::from("A"), String::from("B")]);
    }

    #[tokio::test]
    async fn invalid_move_still_pays_give_cost() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", vec![ScriptedReply::Text(String::from("no json here"))], &all),
            player("B", text("C", "A"), &all),
            player("C", text("B", "A"), &all),
        ];

        let summary = run(&mut players, settings()).await;

        // A: -1 give cost, -1 taken by B, -1 taken by C, -2 alliance
        // B and C: -1 give, +1 received, +1 take, +1 alliance
        assert_eq!(coins(&players), vec![7, 14, 14]);
        assert_eq!(summary.invalid, vec![String::from("A")]);
        assert!(summary.is_balanced());
        let a = players.first().unwrap().last_record().unwrap();
        assert!(a.is_invalid);
        assert!(a.mv.is_none());
    }

    #[tokio::test]
    async fn invalid_player_can_still_receive_coins() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", vec![ScriptedReply::Fail(String::from("503"))], &all),
            player("B", text("A", "C"), &all),
            player("C", text("A", "B"), &all),
        ];

        run(&mut players, settings()).await;

        // A: -1 give cost, +1 from B, +1 from C
        assert_eq!(players.first().unwrap().coins, 13);
        assert!(players.first().unwrap().last_record().unwrap().is_invalid);
    }

    #[tokio::test]
    async fn one_sided_give_forms_no_alliance() {
        let all = ["A", "B", "C", "D"];
        let mut players = vec![
            player("A", text("B", "D"), &all),
            player("B", text("C", "D"), &all),
            player("C", text("A", "D"), &all),
            player("D", text("A", "B"), &all),
        ];

        let summary = run(&mut players, settings()).await;
        assert!(summary.alliances.is_empty());
        assert!(summary.is_balanced());
    }

    #[tokio::test]
    async fn mutual_give_with_different_takes_forms_no_alliance() {
        let all = ["A", "B", "C", "D"];
        let mut players = vec![
            player("A", text("B", "C"), &all),
            player("B", text("A", "D"), &all),
            player("C", text("D", "A"), &all),
            player("D", text("C", "B"), &all),
        ];

        let summary = run(&mut players, settings()).await;
        assert!(summary.alliances.is_empty());
        // Every player gave one, received one, took one, lost one.
        assert_eq!(coins(&players), vec![12, 12, 12, 12]);
    }

    #[tokio::test]
    async fn mutual_pair_counts_once_and_disjoint_pairs_both_ally() {
        // A<->B and C<->D are mutual pairs; both pairs target E.
        // B finds A as its partner too, but the pair is only rewarded once.
        let all = ["A", "B", "C", "D", "E"];
        let mut players = vec![
            player("A", text("B", "E"), &all),
            player("B", text("A", "E"), &all),
            player("C", text("D", "E"), &all),
            player("D", text("C", "E"), &all),
            player("E", text("A", "B"), &all),
        ];

        let summary = run(&mut players, settings()).await;
        assert_eq!(summary.alliances.len(), 2);
        let e = players.get(4).unwrap().last_record().unwrap();
        assert_eq!(e.allied_against.len(), 4);
        for p in players.iter().take(4) {
            assert_eq!(p.last_record().unwrap().alliance_partners.len(), 1);
        }
        assert!(summary.is_balanced());
    }

    #[tokio::test]
    async fn messages_are_delivered_and_unknown_recipients_dropped() {
        let all = ["A", "B", "C"];
        let raw = r#"{"secret strategy": "s", "give coin to": "B", "take coin from": "C",
            "private messages": {"B": "trust me", "C": "nothing personal", "Zed": "hello?"}}"#;
        let mut players = vec![
            player("A", vec![ScriptedReply::Text(raw.to_owned())], &all),
            player("B", text("A", "C"), &all),
            player("C", vec![ScriptedReply::Fail(String::from("down"))], &all),
        ];

        run(&mut players, settings()).await;

        let b = players.get(1).unwrap().last_record().unwrap();
        let c = players.get(2).unwrap().last_record().unwrap();
        assert_eq!(
            b.received_messages,
            vec![(String::from("A"), String::from("trust me"))]
        );
        assert_eq!(
            c.received_messages,
            vec![(String::from("A"), String::from("nothing personal"))]
        );
        assert!(players.first().unwrap().last_record().unwrap().received_messages.is_empty());
    }

    #[tokio::test]
    async fn messages_arrive_in_roster_order() {
        let all = ["Zed", "Amy", "Bo"];
        let to_bo = |give: &str, note: &str| {
            vec![ScriptedReply::Text(format!(
                r#"{{"secret strategy": "s", "give coin to": "{give}", "take coin from": "Bo",
                    "private messages": {{"Bo": "{note}"}}}}"#
            ))]
        };
        let mut players = vec![
            player("Zed", to_bo("Amy", "from zed"), &all),
            player("Amy", to_bo("Zed", "from amy"), &all),
            player("Bo", text("Zed", "Amy"), &all),
        ];

        run(&mut players, settings()).await;

        let bo = players.get(2).unwrap().last_record().unwrap();
        let senders: Vec<&str> = bo.received_messages.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(senders, vec!["Zed", "Amy"]);
        let recap = bo.to_string();
        assert!(recap.find("Message from Zed") < recap.find("Message from Amy"));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", text("B", "C"), &all),
            player("B", text("A", "C"), &all),
            player("A", text("B", "C"), &all),
            player("C", text("A", "B"), &all),
        ];
        let prompts = PromptEngine::new(&RulesConfig::default()).unwrap();

        let err = Referee::new(&mut players, 1, &prompts, settings()).err();
        assert_eq!(err, Some(ArenaError::DuplicateName(String::from("A"))));
        assert!(players.iter().all(|p| p.coins == 12 && p.records.is_empty()));
    }

    #[tokio::test]
    async fn lone_player_is_rejected() {
        let mut players = vec![player("A", text("B", "C"), &["A"])];
        let prompts = PromptEngine::new(&RulesConfig::default()).unwrap();

        let err = Referee::new(&mut players, 1, &prompts, settings()).err();
        assert_eq!(err, Some(ArenaError::TooFewPlayers { count: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn default_rules_time_out_a_stalled_agent() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player(
                "A",
                vec![ScriptedReply::Delayed(Duration::from_secs(6 * 3600), answer("B", "C"))],
                &all,
            ),
            player("B", text("C", "A"), &all),
            player("C", text("B", "A"), &all),
        ];

        let start = tokio::time::Instant::now();
        let summary = run(&mut players, settings()).await;
        assert!(start.elapsed() <= Duration::from_secs(61));
        assert_eq!(summary.invalid, vec![String::from("A")]);
        assert!(summary.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_agent_times_out_without_blocking_others() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player(
                "A",
                vec![ScriptedReply::Delayed(Duration::from_secs(120), answer("B", "C"))],
                &all,
            ),
            player("B", text("C", "A"), &all),
            player("C", text("B", "A"), &all),
        ];
        let settings = RefereeSettings {
            max_tokens: 400,
            decision_timeout: Some(Duration::from_secs(30)),
        };

        let summary = run(&mut players, settings).await;
        assert_eq!(summary.invalid, vec![String::from("A")]);
        assert!(summary.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn agents_are_asked_concurrently() {
        let all = ["A", "B", "C"];
        let delayed = |give: &str, take: &str| {
            vec![ScriptedReply::Delayed(Duration::from_secs(10), answer(give, take))]
        };
        let mut players = vec![
            player("A", delayed("B", "C"), &all),
            player("B", delayed("A", "C"), &all),
            player("C", delayed("A", "B"), &all),
        ];

        let start = tokio::time::Instant::now();
        run(&mut players, settings()).await;
        assert!(start.elapsed() < Duration::from_secs(20));
        assert_eq!(coins(&players), vec![15, 13, 7]);
    }

    #[tokio::test]
    async fn progress_reports_start_each_agent_and_finish() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", text("B", "C"), &all),
            player("B", text("A", "C"), &all),
            player("C", vec![], &all),
        ];
        let prompts = PromptEngine::new(&RulesConfig::default()).unwrap();
        let mut reports: Vec<(f64, String)> = Vec::new();
        let mut sink = |fraction: f64, status: &str| reports.push((fraction, status.to_owned()));

        Referee::new(&mut players, 1, &prompts, settings())
            .unwrap()
            .do_turn(&mut sink)
            .await;

        assert_eq!(reports.len(), 5);
        assert!(reports.first().unwrap().0.abs() < f64::EPSILON);
        assert!((reports.last().unwrap().0 - 1.0).abs() < f64::EPSILON);
        let fractions: Vec<f64> = reports.iter().map(|(f, _)| *f).collect();
        assert!(fractions.windows(2).all(|w| w.first() <= w.last()));
        assert!(reports.iter().any(|(_, s)| s == "C's move was not processed"));
    }

    #[tokio::test]
    async fn every_player_gets_exactly_one_record() {
        let all = ["A", "B", "C"];
        let mut players = vec![
            player("A", text("B", "C"), &all),
            player("B", vec![ScriptedReply::Fail(String::from("x"))], &all),
            player("C", vec![ScriptedReply::Text(answer("C", "A"))], &all),
        ];

        run(&mut players, settings()).await;
        for p in &players {
            assert_eq!(p.records.len(), 1);
            assert_eq!(p.records.first().unwrap().name, p.name);
            assert_eq!(p.records.first().unwrap().round, 1);
        }
        // C tried to give to itself.
        assert!(players.get(2).unwrap().last_record().unwrap().is_invalid);
    }

    #[test]
    fn fraction_is_clamped() {
        assert!((fraction(3, 3) - 1.0).abs() < f64::EPSILON);
        assert!((fraction(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((fraction(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
