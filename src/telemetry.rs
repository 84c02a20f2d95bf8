//! Per-turn CSV logs for analysing matches afterwards. Nothing here is read back.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::error::Result;
use crate::utils::*;

const TURN_HEADER: &str = "match_id,game,step,role,player,bag_size,probes,update_ms,select_ms,move,rollouts,forwards";

/// One row of `<dir>/<match_id>.csv`
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub match_id: String,
    pub game: String,
    pub step: Step,
    pub role: String,
    pub player: String,
    pub bag_size: usize,
    pub probes: usize,
    pub update_ms: u128,
    pub select_ms: u128,
    pub chosen: String,
    pub rollouts: usize,
    pub forwards: usize,
}

/// Writes under a single directory, one file per match plus one per turn for the move scores
pub struct Telemetry {
    dir: PathBuf,
}

impl Telemetry {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn turn_log_path(&self, match_id: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", match_id))
    }

    pub fn distribution_path(&self, match_id: &str, step: Step) -> PathBuf {
        self.dir.join("move_distribution").join(match_id).join(format!("{}.csv", step))
    }

    /// Append a row to the match log, writing the header first if the file is new
    pub fn append_turn(&self, record: &TurnRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.turn_log_path(&record.match_id);
        let fresh = !path.exists();
        let mut writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&path)?);
        if fresh {
            writeln!(writer, "{}", TURN_HEADER)?;
        }
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            field(&record.match_id),
            field(&record.game),
            record.step,
            field(&record.role),
            field(&record.player),
            record.bag_size,
            record.probes,
            record.update_ms,
            record.select_ms,
            field(&record.chosen),
            record.rollouts,
            record.forwards,
        )?;
        writer.flush()?;
        Ok(())
    }

    /// (move, average score) for every candidate of one turn
    pub fn write_distribution(&self, match_id: &str, step: Step, scores: &[(String, Reward)]) -> Result<()> {
        let path = self.distribution_path(match_id, step);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "move,score")?;
        for (mv, score) in scores {
            writeln!(writer, "{},{}", field(mv), score)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Quote a value if it would break the row
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
