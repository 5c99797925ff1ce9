use std::path::Path;
use std::time::Instant;

use estimator_api::api::Estimator;
use polars::prelude::*;
use rule_list::encoding::{read_data_file, read_label_file};
use rule_list::{BayesianRuleList, LabelMode, RuleListConfig, TrainOutput, TrainParams, Trainer};

/// Greedy stand-in for the sampling trainer: repeatedly takes the purest
/// remaining candidate, then closes the list with the default rule.
struct GreedyTrainer {
    max_rules: usize,
}

impl Trainer for GreedyTrainer {
    fn train(
        &self,
        data_file: &Path,
        label_file: &Path,
        params: &TrainParams,
    ) -> rule_list::Result<TrainOutput> {
        let data = read_data_file(data_file)?;
        let labels = read_label_file(label_file)?;
        let mut unmatched = vec![true; data.n_samples];
        let mut rule_ids = Vec::new();
        let mut outputs = Vec::new();

        let counts_of = |caught: &[bool]| -> Vec<usize> {
            labels
                .masks
                .iter()
                .map(|mask| mask.iter().zip(caught).filter(|&(l, c)| *l && *c).count())
                .collect()
        };
        let output_of = |counts: &[usize]| -> Vec<f64> {
            let smoothed: Vec<f64> = counts
                .iter()
                .zip(&params.alpha)
                .map(|(n, a)| (*n + *a as usize) as f64)
                .collect();
            let total: f64 = smoothed.iter().sum();
            smoothed.into_iter().map(|v| v / total).collect()
        };

        while rule_ids.len() < self.max_rules {
            let best = data
                .masks
                .iter()
                .enumerate()
                .filter(|(id, _)| !rule_ids.contains(&(id + 1)))
                .filter_map(|(id, mask)| {
                    let caught: Vec<bool> =
                        mask.iter().zip(&unmatched).map(|(m, u)| *m && *u).collect();
                    let counts = counts_of(&caught);
                    let n: usize = counts.iter().sum();
                    let top = counts.iter().copied().max().unwrap_or(0);
                    (n > 0).then(|| (id + 1, top as f64 / n as f64, n, caught))
                })
                .max_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
            let Some((id, _, _, caught)) = best else {
                break;
            };
            outputs.push(output_of(&counts_of(&caught)));
            for (u, c) in unmatched.iter_mut().zip(&caught) {
                *u &= !*c;
            }
            rule_ids.push(id);
        }

        rule_ids.push(0);
        outputs.push(output_of(&counts_of(&unmatched)));
        Ok(TrainOutput {
            rule_ids,
            outputs,
            rule_pool: Vec::new(),
        })
    }
}

fn generate_sample_dataframes(n_samples: usize) -> (DataFrame, DataFrame) {
    let mut weather: Vec<&str> = Vec::with_capacity(n_samples);
    let mut windy: Vec<i64> = Vec::with_capacity(n_samples);
    let mut play: Vec<i64> = Vec::with_capacity(n_samples);

    for i in 0..n_samples {
        let w = ["sunny", "overcast", "rainy"][i % 3];
        let gust = ((i * 7) % 5 == 0) as i64;
        // overcast always plays, rain only without wind
        let label = match w {
            "overcast" => 1,
            "rainy" => (gust == 0) as i64,
            _ => (i % 4 == 0) as i64,
        };
        weather.push(w);
        windy.push(gust);
        play.push(label);
    }

    let cats = FrozenCategories::new(["sunny", "overcast", "rainy"]).unwrap();
    let weather = Series::new(PlSmallStr::from_static("weather"), weather)
        .cast(&DataType::from_frozen_categories(cats))
        .unwrap();
    let windy = Series::new(PlSmallStr::from_static("windy"), windy);
    let play = Series::new(PlSmallStr::from_static("play"), play);

    (
        DataFrame::new(vec![weather.into(), windy.into()]).unwrap(),
        DataFrame::new(vec![play.into()]).unwrap(),
    )
}

fn main() {
    println!("=== Simple Rule List (Polars) ===");

    let (x, y) = generate_sample_dataframes(120);
    println!(
        "DataFrame shape: {{ rows: {}, cols: {} }}",
        x.height(),
        x.width()
    );

    let config = RuleListConfig {
        max_rule_len: 2,
        min_support: 0.05,
        seed: Some(42),
        ..RuleListConfig::default()
    };
    let mut model = BayesianRuleList::new(config, GreedyTrainer { max_rules: 3 }).unwrap();

    let start = Instant::now();
    let list = Estimator::fit(&mut model, &x, &y, None).unwrap();
    println!("Fit in {:.2?} with {} rules", start.elapsed(), list.n_rules());

    println!("{}", model.render(LabelMode::ByDistribution).unwrap());
    println!("{}", model.render(LabelMode::ByLabel).unwrap());

    let predictions = Estimator::predict(&model, &x).unwrap();
    println!("{}", predictions.head(Some(5)));
}
