use polars::prelude::*;

use crate::error::{Result, RuleListError};

/// Dense row-major matrix of categorical codes, one column per feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoricalMatrix {
    data: Vec<i64>,
    n_rows: usize,
    n_cols: usize,
}

impl CategoricalMatrix {
    pub fn new(n_rows: usize, n_cols: usize, data: Vec<i64>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(RuleListError::shape(format!(
                "{} values cannot fill a {}x{} matrix",
                data.len(),
                n_rows,
                n_cols
            )));
        }
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    /// Build from row vectors. Every row must have the same length.
    pub fn from_rows<R: AsRef<[i64]>>(rows: &[R]) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(RuleListError::shape(format!(
                    "row {} has {} features, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), n_cols, data)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[i64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }
}

/// A categorical matrix extracted from a DataFrame, with the names needed to
/// render rules over it.
#[derive(Clone, Debug)]
pub struct CategoricalFrame {
    pub matrix: CategoricalMatrix,
    pub feature_names: Vec<String>,
    /// Per column: the category names of `Enum` and `Categorical` columns,
    /// `None` for integer columns.
    pub category_names: Vec<Option<Vec<String>>>,
}

impl CategoricalFrame {
    pub fn has_category_names(&self) -> bool {
        self.category_names.iter().any(Option::is_some)
    }
}

/// Extension methods for DataFrame
pub trait CategoricalDataFrameExt {
    /// Convert every column to categorical codes. Integer columns keep their
    /// values; `Enum` and `Categorical` columns use their physical codes and
    /// contribute names.
    fn to_categorical(&self) -> Result<CategoricalFrame>;

    /// Read the first column as non-negative class labels.
    fn to_labels(&self) -> Result<Vec<usize>>;
}

impl CategoricalDataFrameExt for DataFrame {
    fn to_categorical(&self) -> Result<CategoricalFrame> {
        let n_rows = self.height();
        let n_cols = self.width();
        let mut columns = Vec::with_capacity(n_cols);
        let mut feature_names = Vec::with_capacity(n_cols);
        let mut category_names = Vec::with_capacity(n_cols);

        for column in self.get_columns() {
            let series = column.as_materialized_series();
            let (codes, names) = series_codes(series)?;
            feature_names.push(series.name().to_string());
            category_names.push(names);
            columns.push(codes);
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for i in 0..n_rows {
            data.extend(columns.iter().map(|codes| codes[i]));
        }

        Ok(CategoricalFrame {
            matrix: CategoricalMatrix::new(n_rows, n_cols, data)?,
            feature_names,
            category_names,
        })
    }

    fn to_labels(&self) -> Result<Vec<usize>> {
        let column = self
            .get_columns()
            .first()
            .ok_or_else(|| RuleListError::shape("label frame has no columns"))?;
        let series = column.as_materialized_series();
        let (codes, _) = series_codes(series)?;
        codes
            .into_iter()
            .map(|code| {
                usize::try_from(code).map_err(|_| {
                    RuleListError::shape(format!(
                        "label column {:?} contains negative value {}",
                        series.name().as_str(),
                        code
                    ))
                })
            })
            .collect()
    }
}

fn series_codes(s: &Series) -> Result<(Vec<i64>, Option<Vec<String>>)> {
    match s.dtype() {
        // Enum and Categorical columns have a UInt32 physical backing in Polars
        DataType::Enum(_, categorical_mapping)
        | DataType::Categorical(_, categorical_mapping) => {
            let phys = s.to_physical_repr();
            let codes = non_null_i64(&phys, s.name())?;
            let names: Vec<String> = (0u32..)
                .map_while(|code| categorical_mapping.cat_to_str(code).map(str::to_string))
                .collect();
            Ok((codes, Some(names)))
        }
        dt if dt.is_integer() => Ok((non_null_i64(s, s.name())?, None)),
        dt => Err(RuleListError::shape(format!(
            "column {:?} has unsupported dtype {:?}; expected integer, Enum or Categorical codes",
            s.name().as_str(),
            dt
        ))),
    }
}

fn non_null_i64(s: &Series, name: &PlSmallStr) -> Result<Vec<i64>> {
    if s.null_count() > 0 {
        return Err(RuleListError::shape(format!(
            "column {:?} contains {} null values",
            name.as_str(),
            s.null_count()
        )));
    }
    // strict: a code that does not fit in i64 is an error, not a null
    let casted = s.strict_cast(&DataType::Int64)?;
    let ca = casted.i64()?;
    Ok(ca.into_no_null_iter().collect())
}
