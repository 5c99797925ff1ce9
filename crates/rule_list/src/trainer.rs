//! Boundary to the external rule-list trainer.
//!
//! The trainer receives the two encoded files and the hyperparameters, and
//! returns the selected pool indices in decision-list order together with one
//! output distribution per selected rule. How it searches is its own business.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::conf::NON_DETERMINISTIC_SEED;
use crate::error::{Result, RuleListError};

/// Dirichlet concentration of the rule outputs: one value for every class, or
/// one per class. Only integers are representable, so a fractional alpha in a
/// configuration document fails to deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Alpha {
    Uniform(u32),
    PerClass(Vec<u32>),
}

impl Default for Alpha {
    fn default() -> Self {
        Alpha::Uniform(1)
    }
}

impl Alpha {
    /// Expand to exactly `n_classes` values.
    ///
    /// A per-class vector of the wrong length is replaced by its first value
    /// broadcast to every class.
    pub fn resolve(&self, n_classes: usize) -> Result<Vec<u32>> {
        match self {
            Alpha::Uniform(alpha) => Ok(vec![*alpha; n_classes]),
            Alpha::PerClass(alphas) if alphas.is_empty() => Err(RuleListError::InvalidAlpha {
                reason: "per-class alpha must not be empty".to_string(),
            }),
            Alpha::PerClass(alphas) if alphas.len() == n_classes => Ok(alphas.clone()),
            Alpha::PerClass(alphas) => {
                warn!(
                    expected = n_classes,
                    received = alphas.len(),
                    "alpha length does not match the number of classes, broadcasting the first value"
                );
                Ok(vec![alphas[0]; n_classes])
            }
        }
    }
}

/// Hyperparameters handed to the trainer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    /// Prior on the rule-list length.
    pub lambda: f64,
    /// Prior on the number of clauses per rule.
    pub eta: f64,
    pub max_iters: usize,
    pub n_chains: usize,
    /// One alpha per class.
    pub alpha: Vec<u32>,
    pub seed: Option<u32>,
    pub verbose: u8,
}

impl TrainParams {
    /// Seed as the trainer expects it; `None` becomes the clock-seed sentinel.
    pub fn seed_arg(&self) -> i64 {
        match self.seed {
            Some(seed) => i64::from(seed),
            None => NON_DETERMINISTIC_SEED,
        }
    }
}

/// What the trainer returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainOutput {
    /// Pool indices in decision-list order; 0 is the default rule.
    pub rule_ids: Vec<usize>,
    /// One output row per entry of `rule_ids`.
    pub outputs: Vec<Vec<f64>>,
    /// Textual form of the whole pool, index 0 being `"default"`.
    #[serde(default)]
    pub rule_pool: Vec<String>,
}

impl TrainOutput {
    pub fn validate(&self) -> Result<()> {
        if self.rule_ids.is_empty() {
            return Err(trainer_err("trainer selected no rules"));
        }
        if self.outputs.len() != self.rule_ids.len() {
            return Err(trainer_err(format!(
                "{} output rows for {} rules",
                self.outputs.len(),
                self.rule_ids.len()
            )));
        }
        let width = self.outputs[0].len();
        if let Some(row) = self.outputs.iter().position(|row| row.len() != width) {
            return Err(trainer_err(format!(
                "output row {} has {} classes, expected {}",
                row,
                self.outputs[row].len(),
                width
            )));
        }
        Ok(())
    }
}

/// The trainer contract.
pub trait Trainer {
    fn train(&self, data_file: &Path, label_file: &Path, params: &TrainParams)
        -> Result<TrainOutput>;
}

/// Both encoded files must exist before the trainer is invoked.
pub fn check_inputs(data_file: &Path, label_file: &Path) -> Result<()> {
    for path in [data_file, label_file] {
        if !path.exists() {
            return Err(RuleListError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Runs a trainer executable and reads a JSON [`TrainOutput`] from its stdout.
///
/// The program is called as
/// `<program> [args..] --data <file> --label <file> --lambda <f> --eta <f>
/// --iters <n> --chains <n> --alpha <a0,a1,..> --seed <i> --verbose <n>`.
#[derive(Clone, Debug)]
pub struct CommandTrainer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTrainer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandTrainer {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn command(&self, data_file: &Path, label_file: &Path, params: &TrainParams) -> Command {
        let alpha = params
            .alpha
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--data")
            .arg(data_file)
            .arg("--label")
            .arg(label_file)
            .arg("--lambda")
            .arg(params.lambda.to_string())
            .arg("--eta")
            .arg(params.eta.to_string())
            .arg("--iters")
            .arg(params.max_iters.to_string())
            .arg("--chains")
            .arg(params.n_chains.to_string())
            .arg("--alpha")
            .arg(alpha)
            .arg("--seed")
            .arg(params.seed_arg().to_string())
            .arg("--verbose")
            .arg(params.verbose.to_string());
        cmd
    }
}

impl Trainer for CommandTrainer {
    fn train(
        &self,
        data_file: &Path,
        label_file: &Path,
        params: &TrainParams,
    ) -> Result<TrainOutput> {
        check_inputs(data_file, label_file)?;
        debug!(program = %self.program.display(), "invoking trainer");
        let output = self.command(data_file, label_file, params).output()?;
        if !output.status.success() {
            return Err(trainer_err(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let result: TrainOutput = serde_json::from_slice(&output.stdout)?;
        result.validate()?;
        Ok(result)
    }
}

fn trainer_err(reason: impl Into<String>) -> RuleListError {
    RuleListError::Trainer {
        reason: reason.into(),
    }
}
