use std::fmt;
use std::io::BufWriter;
use std::time::Instant;

use estimator_api::api::{Estimator, FitError, PredictError};
use polars::prelude::*;
use tracing::{debug, info};

use crate::conf::RuleListConfig;
use crate::dataframe::{CategoricalDataFrameExt, CategoricalMatrix};
use crate::encoding::{write_data, write_labels};
use crate::error::{Result, RuleListError};
use crate::format::{DisplayNames, LabelMode};
use crate::mining::{mine_candidates, n_labels, FimMethod, MiningParams};
use crate::rule_list::{BoolMatrix, RuleList, SupportMatrix};
use crate::trainer::{check_inputs, TrainParams, Trainer};

pub const PREDICTION_COLUMN: &str = "prediction";

/// Bayesian rule list classifier over categorical data.
///
/// `fit_matrix` mines candidate rules, hands them to the trainer through two
/// temporary encoded files, and rebuilds the selected decision list. The
/// matrix methods (`predict`, `predict_proba`, ...) are the native API; the
/// [`Estimator`] impl wraps them for polars frames, so call it as
/// `Estimator::predict(&model, &df)`.
pub struct BayesianRuleList {
    pub config: RuleListConfig,
    trainer: Box<dyn Trainer + Send + Sync>,
    rule_list: Option<RuleList>,
    supports: Option<SupportMatrix>,
    frame_names: Option<DisplayNames>,
}

impl BayesianRuleList {
    pub fn new(
        config: RuleListConfig,
        trainer: impl Trainer + Send + Sync + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(BayesianRuleList {
            config,
            trainer: Box::new(trainer),
            rule_list: None,
            supports: None,
            frame_names: None,
        })
    }

    pub fn with_trainer(trainer: impl Trainer + Send + Sync + 'static) -> Self {
        BayesianRuleList {
            config: RuleListConfig::default(),
            trainer: Box::new(trainer),
            rule_list: None,
            supports: None,
            frame_names: None,
        }
    }

    pub fn rule_list(&self) -> Option<&RuleList> {
        self.rule_list.as_ref()
    }

    pub fn n_rules(&self) -> usize {
        self.rule_list.as_ref().map_or(0, RuleList::n_rules)
    }

    pub fn n_classes(&self) -> Option<usize> {
        self.rule_list.as_ref().map(RuleList::n_classes)
    }

    pub fn n_features(&self) -> Option<usize> {
        self.rule_list.as_ref().map(RuleList::n_features)
    }

    /// Support of each rule on the training data.
    pub fn supports(&self) -> Option<&SupportMatrix> {
        self.supports.as_ref()
    }

    fn fitted(&self) -> Result<&RuleList> {
        self.rule_list.as_ref().ok_or(RuleListError::NotFitted)
    }

    fn mining_params(&self) -> MiningParams {
        MiningParams {
            min_support: self.config.min_support,
            min_len: self.config.min_rule_len,
            max_len: self.config.max_rule_len,
            method: FimMethod::from_name(&self.config.fim_method),
        }
    }

    fn train_params(&self, n_classes: usize) -> Result<TrainParams> {
        Ok(TrainParams {
            lambda: self.config.lambda,
            eta: self.config.eta,
            max_iters: self.config.iters,
            n_chains: self.config.n_chains,
            alpha: self.config.alpha.resolve(n_classes)?,
            seed: self.config.seed,
            verbose: self.config.verbose,
        })
    }

    /// Fit on a categorical matrix and integer labels.
    ///
    /// Returns the new rule list; the previous one, if any, is replaced.
    pub fn fit_matrix(&mut self, x: &CategoricalMatrix, y: &[usize]) -> Result<RuleList> {
        self.config.validate()?;
        if x.n_rows() != y.len() {
            return Err(RuleListError::shape(format!(
                "x has {} rows but y has {} labels",
                x.n_rows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(RuleListError::shape("cannot fit on an empty dataset"));
        }
        let verbose = self.config.verbose;
        let n_classes = n_labels(y);

        let start = Instant::now();
        let mining = self.mining_params();
        let pool = mine_candidates(x, y, &mining)?;
        if verbose > 0 {
            info!(
                method = mining.method.as_str(),
                candidates = pool.n_mined(),
                elapsed_s = start.elapsed().as_secs_f64(),
                "rule mining done"
            );
        }

        // Both files are removed when the paths drop, whichever way we leave
        let mut data_file = tempfile::Builder::new()
            .prefix("rule_list_")
            .suffix(".data")
            .tempfile()?;
        let mut label_file = tempfile::Builder::new()
            .prefix("rule_list_")
            .suffix(".label")
            .tempfile()?;
        write_data(BufWriter::new(data_file.as_file_mut()), &pool)?;
        write_labels(BufWriter::new(label_file.as_file_mut()), y, n_classes)?;
        let data_path = data_file.into_temp_path();
        let label_path = label_file.into_temp_path();
        if verbose > 1 {
            debug!(
                data = %data_path.display(),
                label = %label_path.display(),
                "encoded trainer input"
            );
        }

        check_inputs(&data_path, &label_path)?;
        let params = self.train_params(n_classes)?;
        let start = Instant::now();
        let output = self.trainer.train(&data_path, &label_path, &params)?;
        output.validate()?;
        if verbose > 0 {
            info!(
                rules = output.rule_ids.len(),
                elapsed_s = start.elapsed().as_secs_f64(),
                "training done"
            );
        }

        let rule_list =
            RuleList::from_pool(&output.rule_ids, output.outputs, &pool, n_classes, x.n_cols())?;
        let supports = rule_list.compute_support(x, y)?;
        if verbose > 1 {
            for (i, count) in rule_list.capture_counts(x)?.iter().enumerate() {
                debug!(rule = i, captured = *count, n_samples = y.len(), "rule capture");
            }
        }

        data_path.close()?;
        label_path.close()?;

        self.frame_names = None;
        self.supports = Some(supports);
        self.rule_list = Some(rule_list.clone());
        Ok(rule_list)
    }

    pub fn predict_proba(&self, x: &CategoricalMatrix) -> Result<Vec<Vec<f64>>> {
        self.fitted()?.predict_proba(x)
    }

    pub fn predict(&self, x: &CategoricalMatrix) -> Result<Vec<usize>> {
        self.fitted()?.predict(x)
    }

    pub fn decision_path(&self, x: &CategoricalMatrix) -> Result<BoolMatrix> {
        self.fitted()?.decision_path(x)
    }

    pub fn caught_matrix(&self, x: &CategoricalMatrix) -> Result<BoolMatrix> {
        self.fitted()?.caught_matrix(x)
    }

    pub fn compute_support(&self, x: &CategoricalMatrix, y: &[usize]) -> Result<SupportMatrix> {
        self.fitted()?.compute_support(x, y)
    }

    pub fn score(
        &self,
        x: &CategoricalMatrix,
        y: &[usize],
        sample_weight: Option<&[f64]>,
    ) -> Result<f64> {
        self.fitted()?.score(x, y, sample_weight)
    }

    /// Configured names win; names read from the last fitted frame fill in.
    pub fn display_names(&self) -> DisplayNames {
        let frame = self.frame_names.clone().unwrap_or_default();
        DisplayNames::new(
            self.config.feature_names.clone().or(frame.feature_names),
            self.config.category_names.clone().or(frame.category_names),
        )
    }

    /// Render the fitted list with training support.
    pub fn render(&self, mode: LabelMode) -> Result<String> {
        Ok(self
            .fitted()?
            .render(&self.display_names(), mode, self.supports.as_ref()))
    }
}

impl fmt::Display for BayesianRuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule_list {
            Some(list) => f.write_str(&list.render(
                &self.display_names(),
                LabelMode::ByDistribution,
                None,
            )),
            None => f.write_str("BayesianRuleList(not fitted)"),
        }
    }
}

impl Estimator for BayesianRuleList {
    type Fitted = RuleList;

    fn _fit_impl(
        &mut self,
        x: &DataFrame,
        y: &DataFrame,
        sample_weights: Option<&Float64Chunked>,
    ) -> std::result::Result<RuleList, FitError> {
        if sample_weights.is_some() {
            return Err(FitError::InvalidInput(
                "sample weights are not supported when fitting a rule list".to_string(),
            ));
        }
        let frame = x.to_categorical()?;
        let labels = y.to_labels()?;
        let rule_list = self.fit_matrix(&frame.matrix, &labels)?;

        self.frame_names = Some(DisplayNames::new(
            Some(frame.feature_names.clone()),
            frame
                .has_category_names()
                .then(|| frame.category_names.clone()),
        ));
        Ok(rule_list)
    }

    fn _predict_impl(&self, x: &DataFrame) -> std::result::Result<DataFrame, PredictError> {
        let frame = x.to_categorical()?;
        let predictions: Vec<u32> = self
            .predict(&frame.matrix)?
            .into_iter()
            .map(|class| class as u32)
            .collect();
        let series = Series::new(PlSmallStr::from_static(PREDICTION_COLUMN), predictions);
        DataFrame::new(vec![series.into()]).map_err(|e| PredictError::Unknown(e.to_string()))
    }
}
