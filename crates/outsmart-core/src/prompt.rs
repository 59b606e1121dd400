//! Rendering the instructions each agent receives, via `minijinja`.
//!
//! The system instruction explains the rules and the JSON answer format.
//! The user instruction depends on the round: round 1 asks for an opening
//! move; later rounds recap every previous round from the agent's point of
//! view and list everyone's current coins.
//!
//! Templates are compiled into the binary so a game never fails halfway
//! through because a template file went missing.

use minijinja::Environment;
use outsmart_types::{Coins, TurnRecord};
use serde::Serialize;

use crate::config::RulesConfig;
use crate::error::{ConfigError, MoveError};

const FORMAT_TEMPLATE: &str = r#"{
    "secret strategy": "Here you should secretly explain your plans, for your own benefit - the other players will not see this",
    "give coin to": "Here you should put the player you will give a coin to; must be one of {{ others|join(", ") }}",
    "take coin from": "Here you should put the player you will take a coin from; must be one of {{ others|join(", ") }}",
    "private messages":
    {
{% for other in others %}
      "{{ other }}": "Here you should put a private message for {{ other }}"{{ "," if not loop.last else "" }}
{% endfor %}
    }
}"#;

const SYSTEM_TEMPLATE: &str = r"You are playing a game that needs negotiation, diplomacy, strategy -- and a bit of deviousness!

Your name is {{ name }}.
There are {{ others|length }} other players and their names are:
{% for other in others %}
- {{ other }}
{% endfor %}

Game rules:

1. Each player starts with {{ starting_coins }} coins
2. With each turn:

- Players send a short private message to each of the other players
- Players choose to give 1 of their coins to a player, and take a coin from a different player
- At the end of the turn, the players receive their private messages and coin changes are made

3. There's a special rule. If 2 players chose to give each other coins, and both take a coin from the same player, that is considered an alliance and they are rewarded with an extra coin each, taken from the player they targeted.

The goal is to negotiate with the other players and make the most money. The game ends after {{ max_rounds }} turns or when a player runs out of coins.

Game mechanics:

You receive a summary at each turn of the private messages you received, and the changes to your coins.

You will then make your move by responding strictly using JSON. You should follow precisely this format, with no text before or after the JSON.

{% include 'format' %}


You must only respond in JSON, it must always give 1 coin and take 1 coin, and contain a private message to each of the other players.
Your goal is to end up with the most coins through strategy and negotiation.";

const USER_TEMPLATE: &str = r"Your player name is {{ name }} and the other players are {{ others|join(', ') }}.

{% if round == 1 %}
This is the first turn of the game. There have been no interactions between any players yet, and no coins exchanged.
You have {{ coins }} coins.
Please make your first move, by deciding which player to give a coin to, which player to take a coin from, and private messages for each player.
{% else %}
This is turn {{ round }} of the game. Here is a summary of your moves and the outcomes so far.

{{ history }}
That brings us to the current turn, {{ round }}.
As a result of the previous turns, you now have {{ coins }} coins.
Here are the coins now held by the others. Your goal is to rank as high as possible compared to them.
{% for other in standings %}
- {{ other.name }} has {{ other.coins }} coins
{% endfor %}
Please make your next move, by deciding which player to give a coin to, which player to take a coin from, and private messages for each player.
{% endif %}
You must respond strictly in JSON, and it must follow this format:

{% include 'format' %}


You must only respond in JSON.
Your goal is to make the most coins through strategy and negotiation.";

/// The rendered instructions for one agent's move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    /// Game rules and answer format.
    pub system: String,
    /// The request for this round's move.
    pub user: String,
}

/// Another player's balance, as shown to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherCoins {
    /// The other player's name.
    pub name: String,
    /// Their current balance.
    pub coins: Coins,
}

/// Everything the templates need to know about one agent this round.
#[derive(Debug, Clone)]
pub struct PromptView<'a> {
    /// The agent being prompted.
    pub name: &'a str,
    /// The other players, in the order this agent sees them.
    pub others: &'a [String],
    /// The agent's balance.
    pub coins: Coins,
    /// The round being played.
    pub round: u32,
    /// The other players' balances, in the same order as `others`.
    pub standings: Vec<OtherCoins>,
    /// The agent's records of completed rounds.
    pub records: &'a [TurnRecord],
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    name: &'a str,
    others: &'a [String],
    coins: Coins,
    round: u32,
    standings: &'a [OtherCoins],
    history: String,
    starting_coins: Coins,
    max_rounds: u32,
}

/// Renders agent instructions from the embedded templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
    starting_coins: Coins,
    max_rounds: u32,
}

impl PromptEngine {
    /// Compile the templates for a game played under `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Template`] if an embedded template fails to
    /// compile.
    pub fn new(rules: &RulesConfig) -> Result<Self, ConfigError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        for (name, source) in [
            ("format", FORMAT_TEMPLATE),
            ("system", SYSTEM_TEMPLATE),
            ("user", USER_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| ConfigError::Template(format!("failed to add {name} template: {e}")))?;
        }

        Ok(Self {
            env,
            starting_coins: rules.starting_coins,
            max_rounds: rules.max_rounds,
        })
    }

    /// Render the system and user instructions for one agent.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Prompt`] if rendering fails.
    pub fn render(&self, view: &PromptView<'_>) -> Result<Instructions, MoveError> {
        let history: String = view.records.iter().map(ToString::to_string).collect();
        let ctx = TemplateContext {
            name: view.name,
            others: view.others,
            coins: view.coins,
            round: view.round,
            standings: &view.standings,
            history,
            starting_coins: self.starting_coins,
            max_rounds: self.max_rounds,
        };

        let system = self.render_one("system", &ctx)?;
        let user = self.render_one("user", &ctx)?;
        Ok(Instructions { system, user })
    }

    fn render_one(&self, name: &str, ctx: &TemplateContext<'_>) -> Result<String, MoveError> {
        self.env
            .get_template(name)
            .map_err(|e| MoveError::Prompt(format!("missing {name} template: {e}")))?
            .render(ctx)
            .map_err(|e| MoveError::Prompt(format!("{name} render failed: {e}")))
    }
}
