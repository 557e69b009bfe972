// ═══════════════════════════════════════════════════════════════════════
// Database — SQLite storage for game results and ELO ratings
// ═══════════════════════════════════════════════════════════════════════

use crate::error::Result;
use crate::runner::GameResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const INITIAL_ELO: f64 = 1500.0;
pub const DEFAULT_K: f64 = 32.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub name: String,
    pub elo: f64,
    pub games: u32,
    pub wins: u32,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database { conn: Connection::open(path)? };
        db.create_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS agents (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                elo         REAL NOT NULL DEFAULT 1500.0,
                games       INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS games (
                id          INTEGER PRIMARY KEY,
                seed        INTEGER NOT NULL,
                days        INTEGER NOT NULL,
                winner      TEXT NOT NULL,
                decisive    INTEGER NOT NULL,
                played_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS game_players (
                id            INTEGER PRIMARY KEY,
                game_id       INTEGER NOT NULL REFERENCES games(id),
                agent_id      INTEGER NOT NULL REFERENCES agents(id),
                color         TEXT NOT NULL,
                castles       INTEGER NOT NULL,
                heroes        INTEGER NOT NULL,
                army_strength REAL NOT NULL,
                gold          INTEGER NOT NULL,
                lost          INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Register an agent (or return the existing id).
    pub fn register_agent(&self, name: &str) -> Result<i64> {
        self.conn.execute("INSERT OR IGNORE INTO agents (name) VALUES (?1)", params![name])?;
        let id = self.conn.query_row("SELECT id FROM agents WHERE name = ?1", params![name], |row| row.get(0))?;
        Ok(id)
    }

    pub fn elo(&self, agent_id: i64) -> Result<f64> {
        let elo = self
            .conn
            .query_row("SELECT elo FROM agents WHERE id = ?1", params![agent_id], |row| row.get(0))
            .optional()?;
        Ok(elo.unwrap_or(INITIAL_ELO))
    }

    /// Store a finished game, bump per-agent counters and apply ELO.
    /// Returns the game id.
    pub fn record_game(&mut self, result: &GameResult, k: f64) -> Result<i64> {
        let mut ids: BTreeMap<&str, i64> = BTreeMap::new();
        for kingdom in &result.kingdoms {
            let id = self.register_agent(&kingdom.agent_name)?;
            ids.insert(kingdom.agent_name.as_str(), id);
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO games (seed, days, winner, decisive) VALUES (?1, ?2, ?3, ?4)",
            params![result.seed as i64, result.days_played, result.winner.to_string(), result.decisive],
        )?;
        let game_id = tx.last_insert_rowid();

        let mut winner_id = None;
        for kingdom in &result.kingdoms {
            let agent_id = ids.get(kingdom.agent_name.as_str()).copied().unwrap_or_default();
            let won = kingdom.color == result.winner;
            if won {
                winner_id = Some(agent_id);
            }
            tx.execute(
                "INSERT INTO game_players (game_id, agent_id, color, castles, heroes, army_strength, gold, lost)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    game_id,
                    agent_id,
                    kingdom.color.to_string(),
                    kingdom.castles as i64,
                    kingdom.heroes as i64,
                    kingdom.army_strength,
                    kingdom.gold,
                    kingdom.lost,
                ],
            )?;
            tx.execute(
                "UPDATE agents SET games = games + 1, wins = wins + ?1 WHERE id = ?2",
                params![i64::from(won), agent_id],
            )?;
        }
        tx.commit()?;

        if let Some(winner_id) = winner_id {
            let losers: Vec<i64> = ids.values().copied().filter(|&id| id != winner_id).collect();
            self.update_elo(winner_id, &losers, k)?;
        }
        debug!(game_id, seed = result.seed, "game stored");
        Ok(game_id)
    }

    /// Multiplayer ELO: the winner plays a pairwise match against each loser.
    pub fn update_elo(&self, winner_id: i64, loser_ids: &[i64], k: f64) -> Result<()> {
        for &loser_id in loser_ids {
            let winner_elo = self.elo(winner_id)?;
            let loser_elo = self.elo(loser_id)?;
            let (delta_w, delta_l) = elo_deltas(winner_elo, loser_elo, k);
            self.conn.execute("UPDATE agents SET elo = elo + ?1 WHERE id = ?2", params![delta_w, winner_id])?;
            self.conn.execute("UPDATE agents SET elo = elo + ?1 WHERE id = ?2", params![delta_l, loser_id])?;
        }
        Ok(())
    }

    pub fn leaderboard(&self) -> Result<Vec<LeaderboardRow>> {
        let mut stmt = self.conn.prepare("SELECT name, elo, games, wins FROM agents ORDER BY elo DESC, name")?;
        let rows = stmt.query_map([], |row| {
            Ok(LeaderboardRow { name: row.get(0)?, elo: row.get(1)?, games: row.get(2)?, wins: row.get(3)? })
        })?;
        let mut board = Vec::new();
        for row in rows {
            board.push(row?);
        }
        Ok(board)
    }

    pub fn game_count(&self) -> Result<u32> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?)
    }
}

/// Rating changes for one decided match.
pub fn elo_deltas(winner: f64, loser: f64, k: f64) -> (f64, f64) {
    let expected_winner = 1.0 / (1.0 + 10f64.powf((loser - winner) / 400.0));
    let delta = k * (1.0 - expected_winner);
    (delta, -delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::KingdomResult;
    use conquest_engine::Color;

    fn kingdom(color: Color, agent: &str, castles: usize, lost: bool) -> KingdomResult {
        KingdomResult {
            color,
            agent_name: agent.to_string(),
            castles,
            heroes: 1,
            army_strength: 120.5,
            gold: 3000,
            lost,
        }
    }

    fn result(seed: u64, winner: Color) -> GameResult {
        GameResult {
            seed,
            winner,
            decisive: true,
            days_played: 30,
            kingdoms: vec![
                kingdom(Color::Blue, "planner", if winner == Color::Blue { 2 } else { 0 }, winner != Color::Blue),
                kingdom(Color::Red, "passive", if winner == Color::Red { 2 } else { 0 }, winner != Color::Red),
            ],
        }
    }

    #[test]
    fn equal_ratings_swap_half_k() {
        let (w, l) = elo_deltas(1500.0, 1500.0, 32.0);
        assert!((w - 16.0).abs() < 1e-9);
        assert!((l + 16.0).abs() < 1e-9);
    }

    #[test]
    fn register_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let a = db.register_agent("planner").unwrap();
        assert_eq!(db.register_agent("planner").unwrap(), a);
        assert_ne!(db.register_agent("passive").unwrap(), a);
        assert_eq!(db.elo(a).unwrap(), INITIAL_ELO);
    }

    #[test]
    fn stored_games_feed_leaderboard() {
        let mut db = Database::in_memory().unwrap();
        db.record_game(&result(1, Color::Blue), DEFAULT_K).unwrap();
        db.record_game(&result(2, Color::Blue), DEFAULT_K).unwrap();
        db.record_game(&result(3, Color::Red), DEFAULT_K).unwrap();
        assert_eq!(db.game_count().unwrap(), 3);

        let board = db.leaderboard().unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].name, "planner");
        assert_eq!((board[0].games, board[0].wins), (3, 2));
        assert_eq!((board[1].games, board[1].wins), (3, 1));
        assert!(board[0].elo > INITIAL_ELO && board[1].elo < INITIAL_ELO);
        // Zero-sum between two agents
        assert!((board[0].elo + board[1].elo - 2.0 * INITIAL_ELO).abs() < 1e-6);
    }

    #[test]
    fn self_play_leaves_rating_unchanged() {
        let mut db = Database::in_memory().unwrap();
        let mut game = result(1, Color::Blue);
        game.kingdoms[1].agent_name = "planner".to_string();
        db.record_game(&game, DEFAULT_K).unwrap();
        let board = db.leaderboard().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].elo, INITIAL_ELO);
        assert_eq!((board[0].games, board[0].wins), (2, 1));
    }
}
