//! A bot seated at a table: listens to the table's notifications and acts
//! whenever the turn comes to it.

use std::{sync::Arc, time::Duration};

use casino_poker::{
    PlayerId, TableManager,
    entities::{Phase, TableView},
    table::{TableId, TableNotification},
};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::sync::mpsc;

use crate::decision::{BotStyle, DecisionContext, DecisionMaker};

/// Notification buffer per bot. Large enough that a burst of state changes
/// never drops the one that hands the bot its turn.
const INBOX_CAPACITY: usize = 256;

pub struct Bot {
    pub id: PlayerId,
    pub name: String,
    table_id: TableId,
    decision_maker: DecisionMaker,
    rng: StdRng,
    stall_chance: f64,
    think_time_ms: u64,
    /// Turn generation of the last turn already handled.
    handled_turn: Option<u64>,
}

impl Bot {
    pub fn new(
        id: PlayerId,
        table_id: TableId,
        style: BotStyle,
        equity_iterations: usize,
        stall_chance: f64,
        think_time_ms: u64,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_os_rng(),
        };
        let decision_rng = StdRng::from_rng(&mut rng);
        Self {
            id,
            name: format!("{style}-bot-{id}"),
            table_id,
            decision_maker: DecisionMaker::new(style, equity_iterations, decision_rng),
            rng,
            stall_chance,
            think_time_ms,
            handled_turn: None,
        }
    }

    /// Subscribe to the table and take the seat. Returns the notification
    /// stream the bot plays from.
    pub async fn sit_down(
        &self,
        manager: &TableManager,
    ) -> anyhow::Result<mpsc::Receiver<TableNotification>> {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        manager.subscribe(self.table_id, self.id, tx).await?;
        let response = manager
            .join_table(self.table_id, self.id, self.name.clone())
            .await?;
        if let Some(reason) = response.error_message() {
            anyhow::bail!("{} couldn't join table {}: {}", self.name, self.table_id, reason);
        }
        info!("{} joined table {}", self.name, self.table_id);
        Ok(rx)
    }

    /// Play until the table shuts down or the bot is out of chips
    pub async fn run(
        mut self,
        manager: Arc<TableManager>,
        mut inbox: mpsc::Receiver<TableNotification>,
    ) {
        while let Some(notification) = inbox.recv().await {
            let view = notification.view;
            if view.phase == Phase::Finished {
                break;
            }
            if view.hand_number > 0 && view.player(self.id).is_none() {
                info!("{} has left table {}", self.name, self.table_id);
                break;
            }
            if !self.is_my_turn(&view) {
                continue;
            }
            self.handled_turn = Some(view.turn_generation);

            if self.rng.random_bool(self.stall_chance) {
                info!("{} is stalling", self.name);
                continue;
            }
            if self.think_time_ms > 0 {
                let pause = self.rng.random_range(0..=self.think_time_ms);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }

            if let Err(e) = self.act(&manager, &view).await {
                warn!("{} stopped playing: {}", self.name, e);
                break;
            }
        }
        debug!("{} is done", self.name);
    }

    fn is_my_turn(&self, view: &TableView) -> bool {
        view.phase.is_betting()
            && view.current_turn == Some(self.id)
            && self.handled_turn != Some(view.turn_generation)
    }

    async fn act(&mut self, manager: &TableManager, view: &TableView) -> anyhow::Result<()> {
        let choices = manager.legal_actions(self.id).await?;
        if choices.is_empty() {
            // The turn moved on while we were thinking.
            return Ok(());
        }
        let Some(me) = view.player(self.id) else {
            return Ok(());
        };
        let opponents = view
            .players
            .iter()
            .filter(|p| p.id != self.id && p.in_hand && !p.folded)
            .count();

        let ctx = DecisionContext {
            hole_cards: &me.cards,
            board_cards: &view.board,
            pot_size: view.pot,
            opponents,
            choices: &choices,
        };
        let action = self.decision_maker.decide(&ctx);
        debug!("{} {} ({} bot)", self.name, action, self.decision_maker.style());

        let response = manager.take_action(self.id, action).await?;
        if let Some(reason) = response.error_message() {
            warn!("{} tried to {} but was refused: {}", self.name, action, reason);
        }
        Ok(())
    }
}
