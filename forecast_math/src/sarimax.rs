//! Seasonal ARIMA estimation with optional exogenous regressors.
//!
//! The model is a linear regression whose errors follow a multiplicative
//! seasonal ARIMA(p,d,q)(P,D,Q)s process:
//!
//! ```text
//! y_t = x_t' beta + u_t
//! phi(B) Phi(B^s) (1 - B)^d (1 - B^s)^D u_t = theta(B) Theta(B^s) e_t
//! ```
//!
//! Parameters are estimated by minimizing the conditional sum of squares of
//! the innovations with a Nelder-Mead search. The search is unconstrained:
//! stationarity and invertibility of the fitted polynomials are not enforced.

use crate::optimization::{minimize, SimplexSettings};
use crate::stats::{is_constant, normal_quantile, solve_linear_system};
use crate::{MathError, Result};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Longest seasonal period accepted, one year of daily observations
pub const MAX_SEASONAL_PERIOD: usize = 366;

/// Orders of a seasonal ARIMA process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaxSpec {
    /// Non-seasonal AR order
    pub p: usize,
    /// Non-seasonal differencing order
    pub d: usize,
    /// Non-seasonal MA order
    pub q: usize,
    /// Seasonal AR order
    pub seasonal_p: usize,
    /// Seasonal differencing order
    pub seasonal_d: usize,
    /// Seasonal MA order
    pub seasonal_q: usize,
    /// Seasonal period in observations
    pub period: usize,
}

impl SarimaxSpec {
    pub fn new(order: (usize, usize, usize), seasonal: (usize, usize, usize, usize)) -> Self {
        Self {
            p: order.0,
            d: order.1,
            q: order.2,
            seasonal_p: seasonal.0,
            seasonal_d: seasonal.1,
            seasonal_q: seasonal.2,
            period: seasonal.3,
        }
    }

    fn has_seasonal_terms(&self) -> bool {
        self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }

    fn effective_period(&self) -> usize {
        if self.has_seasonal_terms() {
            self.period
        } else {
            0
        }
    }

    /// Number of ARMA coefficients (excluding regressors)
    pub fn n_arma_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Observations consumed by differencing
    pub fn differencing_span(&self) -> usize {
        self.d + self.seasonal_d * self.effective_period()
    }

    /// Largest AR lag of the combined (non-seasonal x seasonal) polynomial
    pub fn ar_span(&self) -> usize {
        self.p + self.seasonal_p * self.effective_period()
    }

    /// Largest MA lag of the combined polynomial
    pub fn ma_span(&self) -> usize {
        self.q + self.seasonal_q * self.effective_period()
    }

    /// Minimum series length needed to estimate the model with `n_exog` regressors
    pub fn min_observations(&self, n_exog: usize) -> usize {
        self.differencing_span()
            + self.ar_span().max(self.ma_span())
            + self.n_arma_params()
            + n_exog
            + 1
    }

    fn validate(&self) -> Result<()> {
        if self.has_seasonal_terms() && self.period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must be at least 2 when seasonal terms are present, got {}",
                self.period
            )));
        }
        if self.period > MAX_SEASONAL_PERIOD {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must not exceed {}, got {}",
                MAX_SEASONAL_PERIOD, self.period
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for SarimaxSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SARIMAX({},{},{})({},{},{},{})",
            self.p,
            self.d,
            self.q,
            self.seasonal_p,
            self.seasonal_d,
            self.seasonal_q,
            self.period
        )
    }
}

/// Conditional-sum-of-squares SARIMAX estimator
#[derive(Debug, Clone)]
pub struct SarimaxEstimator {
    spec: SarimaxSpec,
    settings: SimplexSettings,
}

impl SarimaxEstimator {
    pub fn new(spec: SarimaxSpec) -> Self {
        Self {
            spec,
            settings: SimplexSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SimplexSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn spec(&self) -> SarimaxSpec {
        self.spec
    }

    /// Fit the model to `y`, with one regressor column per exogenous variable.
    pub fn fit(&self, y: &[f64], exog: Option<ArrayView2<f64>>) -> Result<SarimaxFit> {
        let spec = self.spec;
        spec.validate()?;

        let n_exog = exog.as_ref().map_or(0, |x| x.ncols());
        if let Some(x) = exog.as_ref() {
            if x.nrows() != y.len() {
                return Err(MathError::InvalidInput(format!(
                    "Regressor rows ({}) don't match series length ({})",
                    x.nrows(),
                    y.len()
                )));
            }
        }

        if y.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let needed = spec.min_observations(n_exog);
        if y.len() < needed {
            return Err(MathError::InsufficientData(format!(
                "{} needs at least {} observations, got {}",
                spec,
                needed,
                y.len()
            )));
        }

        if is_constant(y) {
            return Err(MathError::CalculationError(
                "Series is constant; the model is not identifiable".to_string(),
            ));
        }

        // Regressors are rescaled to unit magnitude so the simplex moves all
        // coefficients on a comparable scale.
        let (exog_scaled, exog_scale) = match exog {
            Some(x) => {
                let (scaled, scale) = scale_columns(x);
                (Some(scaled), scale)
            }
            None => (None, Vec::new()),
        };

        let diff_poly = differencing_polynomial(&spec);
        let w = apply_polynomial(&diff_poly, y);
        let z: Vec<Vec<f64>> = match exog_scaled.as_ref() {
            Some(x) => (0..n_exog)
                .map(|j| apply_polynomial(&diff_poly, &x.column(j).to_vec()))
                .collect(),
            None => Vec::new(),
        };

        let layout = ParamLayout::new(&spec, n_exog);
        let start = spec.ar_span();
        let n_eff = w.len().saturating_sub(start);
        if n_eff <= layout.len() {
            return Err(MathError::InsufficientData(format!(
                "{} leaves {} usable observations for {} parameters",
                spec,
                n_eff,
                layout.len()
            )));
        }

        let scale = {
            let ms = w.iter().map(|v| v * v).sum::<f64>() / w.len() as f64;
            if ms > 0.0 {
                ms
            } else {
                1.0
            }
        };

        let initial = initial_parameters(&layout, &w, &z);
        let objective = |params: &[f64]| {
            let (css, _) = conditional_residuals(params, &layout, &spec, &w, &z);
            css / (n_eff as f64 * scale)
        };

        let solution = minimize(objective, &initial, &self.settings);
        tracing::debug!(
            model = %spec,
            iterations = solution.iterations,
            converged = solution.converged,
            objective = solution.value,
            "simplex search finished"
        );
        if !solution.converged {
            return Err(MathError::NotConverged {
                iterations: solution.iterations,
            });
        }

        let params = solution.point;
        let (css, residuals) = conditional_residuals(&params, &layout, &spec, &w, &z);
        if !css.is_finite() {
            return Err(MathError::CalculationError(
                "Fitted model produced non-finite residuals".to_string(),
            ));
        }
        let sigma2 = css / n_eff as f64;

        let beta = params[layout.beta.clone()].to_vec();
        let levels: Vec<f64> = match exog_scaled.as_ref() {
            Some(x) => y
                .iter()
                .zip(x.rows())
                .map(|(yt, row)| yt - row.iter().zip(beta.iter()).map(|(a, b)| a * b).sum::<f64>())
                .collect(),
            None => y.to_vec(),
        };

        // Innovations are indexed like the differenced series; shift them onto
        // the level index so forecasting can read them by date position.
        let span = spec.differencing_span();
        let mut innovations = vec![0.0; y.len()];
        for (i, e) in residuals.iter().enumerate() {
            innovations[i + span] = *e;
        }

        let ar_poly = ar_polynomial(&params, &layout, &spec);
        let full_ar = multiply(&ar_poly, &diff_poly);
        let ma_poly = ma_polynomial(&params, &layout, &spec);

        Ok(SarimaxFit {
            spec,
            beta,
            exog_scale,
            ar: params[layout.ar.clone()].to_vec(),
            ma: params[layout.ma.clone()].to_vec(),
            seasonal_ar: params[layout.seasonal_ar.clone()].to_vec(),
            seasonal_ma: params[layout.seasonal_ma.clone()].to_vec(),
            sigma2,
            n_eff,
            iterations: solution.iterations,
            levels,
            innovations,
            full_ar: full_ar.iter().skip(1).map(|c| -c).collect(),
            full_ma: ma_poly.into_iter().skip(1).collect(),
        })
    }
}

/// A fitted SARIMAX model
#[derive(Debug, Clone)]
pub struct SarimaxFit {
    spec: SarimaxSpec,
    beta: Vec<f64>,
    exog_scale: Vec<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    sigma2: f64,
    n_eff: usize,
    iterations: usize,
    /// Series with the regression component removed
    levels: Vec<f64>,
    innovations: Vec<f64>,
    /// Coefficients c_k of u_t = sum c_k u_{t-k} + e_t + sum m_j e_{t-j}
    full_ar: Vec<f64>,
    full_ma: Vec<f64>,
}

/// Point forecast with a symmetric interval
#[derive(Debug, Clone, PartialEq)]
pub struct SarimaxForecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Nominal coverage of the interval
    pub level: f64,
}

impl SarimaxFit {
    pub fn spec(&self) -> SarimaxSpec {
        self.spec
    }

    /// Regression coefficients on the original regressor scale
    pub fn regression_coefficients(&self) -> Vec<f64> {
        self.beta
            .iter()
            .zip(self.exog_scale.iter())
            .map(|(b, s)| b / s)
            .collect()
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn n_exog(&self) -> usize {
        self.beta.len()
    }

    /// Gaussian log-likelihood of the conditional residuals
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n_eff as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI * self.sigma2).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        let k = (self.spec.n_arma_params() + self.beta.len() + 1) as f64;
        -2.0 * self.log_likelihood() + 2.0 * k
    }

    /// Forecast `steps` observations past the end of the training series.
    ///
    /// `exog` must hold the regressors for the forecast horizon when the model
    /// was fitted with regressors. `level` is the interval coverage, e.g. 0.95.
    pub fn forecast(
        &self,
        steps: usize,
        exog: Option<ArrayView2<f64>>,
        level: f64,
    ) -> Result<SarimaxForecast> {
        let z = normal_quantile(0.5 + level / 2.0)?;

        let regression: Vec<f64> = match (self.beta.is_empty(), exog) {
            (true, None) => vec![0.0; steps],
            (true, Some(_)) => {
                return Err(MathError::InvalidInput(
                    "Model was fitted without regressors".to_string(),
                ))
            }
            (false, None) => {
                return Err(MathError::InvalidInput(
                    "Forecast regressors are required for this model".to_string(),
                ))
            }
            (false, Some(x)) => {
                if x.nrows() != steps || x.ncols() != self.beta.len() {
                    return Err(MathError::InvalidInput(format!(
                        "Forecast regressors must be {}x{}, got {}x{}",
                        steps,
                        self.beta.len(),
                        x.nrows(),
                        x.ncols()
                    )));
                }
                x.rows()
                    .into_iter()
                    .map(|row| {
                        row.iter()
                            .zip(self.beta.iter().zip(self.exog_scale.iter()))
                            .map(|(v, (b, s))| v / s * b)
                            .sum()
                    })
                    .collect()
            }
        };

        let mut u = self.levels.clone();
        let mut e = self.innovations.clone();
        for _ in 0..steps {
            let t = u.len();
            let ar_part: f64 = self
                .full_ar
                .iter()
                .enumerate()
                .map(|(k, c)| c * u[t - 1 - k])
                .sum();
            let ma_part: f64 = self
                .full_ma
                .iter()
                .enumerate()
                .map(|(j, m)| m * e[t - 1 - j])
                .sum();
            u.push(ar_part + ma_part);
            e.push(0.0);
        }

        let psi = psi_weights(&self.full_ar, &self.full_ma, steps);
        let mut cumulative = 0.0;
        let mut mean = Vec::with_capacity(steps);
        let mut lower = Vec::with_capacity(steps);
        let mut upper = Vec::with_capacity(steps);
        for h in 0..steps {
            cumulative += psi[h] * psi[h];
            let se = (self.sigma2 * cumulative).sqrt();
            let point = u[self.levels.len() + h] + regression[h];
            mean.push(point);
            lower.push(point - z * se);
            upper.push(point + z * se);
        }

        Ok(SarimaxForecast {
            mean,
            lower,
            upper,
            level,
        })
    }
}

/// Index ranges of each coefficient group inside the parameter vector
#[derive(Debug, Clone)]
struct ParamLayout {
    beta: std::ops::Range<usize>,
    ar: std::ops::Range<usize>,
    ma: std::ops::Range<usize>,
    seasonal_ar: std::ops::Range<usize>,
    seasonal_ma: std::ops::Range<usize>,
}

impl ParamLayout {
    fn new(spec: &SarimaxSpec, n_exog: usize) -> Self {
        let beta = 0..n_exog;
        let ar = beta.end..beta.end + spec.p;
        let ma = ar.end..ar.end + spec.q;
        let seasonal_ar = ma.end..ma.end + spec.seasonal_p;
        let seasonal_ma = seasonal_ar.end..seasonal_ar.end + spec.seasonal_q;
        Self {
            beta,
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
        }
    }

    fn len(&self) -> usize {
        self.seasonal_ma.end
    }
}

fn scale_columns(x: ArrayView2<f64>) -> (Array2<f64>, Vec<f64>) {
    let mut scaled = x.to_owned();
    let mut scales = Vec::with_capacity(x.ncols());
    for mut col in scaled.columns_mut() {
        let max = col.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let s = if max > 1e-12 { max } else { 1.0 };
        col.mapv_inplace(|v| v / s);
        scales.push(s);
    }
    (scaled, scales)
}

/// Polynomial product; index k holds the coefficient of B^k
fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, ai) in a.iter().enumerate() {
        for (j, bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// `1 + sign * sum coeffs_i B^(spacing * (i + 1))`
fn lag_polynomial(coeffs: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

fn differencing_polynomial(spec: &SarimaxSpec) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..spec.d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    let s = spec.effective_period();
    for _ in 0..spec.seasonal_d {
        poly = multiply(&poly, &lag_polynomial(&[1.0], s, -1.0));
    }
    poly
}

fn ar_polynomial(params: &[f64], layout: &ParamLayout, spec: &SarimaxSpec) -> Vec<f64> {
    multiply(
        &lag_polynomial(&params[layout.ar.clone()], 1, -1.0),
        &lag_polynomial(
            &params[layout.seasonal_ar.clone()],
            spec.effective_period().max(1),
            -1.0,
        ),
    )
}

fn ma_polynomial(params: &[f64], layout: &ParamLayout, spec: &SarimaxSpec) -> Vec<f64> {
    multiply(
        &lag_polynomial(&params[layout.ma.clone()], 1, 1.0),
        &lag_polynomial(
            &params[layout.seasonal_ma.clone()],
            spec.effective_period().max(1),
            1.0,
        ),
    )
}

/// Apply a lag polynomial to a series, dropping the leading observations it consumes
fn apply_polynomial(poly: &[f64], series: &[f64]) -> Vec<f64> {
    let span = poly.len() - 1;
    if series.len() <= span {
        return Vec::new();
    }
    (span..series.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * series[t - k]).sum())
        .collect()
}

/// Conditional sum of squares and the innovations it was computed from
fn conditional_residuals(
    params: &[f64],
    layout: &ParamLayout,
    spec: &SarimaxSpec,
    w: &[f64],
    z: &[Vec<f64>],
) -> (f64, Vec<f64>) {
    let beta = &params[layout.beta.clone()];
    let v: Vec<f64> = (0..w.len())
        .map(|t| w[t] - z.iter().zip(beta.iter()).map(|(col, b)| col[t] * b).sum::<f64>())
        .collect();

    let ar: Vec<f64> = ar_polynomial(params, layout, spec)
        .into_iter()
        .skip(1)
        .map(|c| -c)
        .collect();
    let ma: Vec<f64> = ma_polynomial(params, layout, spec).into_iter().skip(1).collect();

    let start = spec.ar_span();
    let mut e = vec![0.0; v.len()];
    let mut css = 0.0;
    for t in start..v.len() {
        let mut pred = 0.0;
        for (k, a) in ar.iter().enumerate() {
            pred += a * v[t - 1 - k];
        }
        for (j, m) in ma.iter().enumerate() {
            if t > j {
                pred += m * e[t - 1 - j];
            }
        }
        e[t] = v[t] - pred;
        css += e[t] * e[t];
        if !css.is_finite() {
            return (f64::INFINITY, e);
        }
    }
    (css, e)
}

fn initial_parameters(layout: &ParamLayout, w: &[f64], z: &[Vec<f64>]) -> Vec<f64> {
    let mut initial = vec![0.0; layout.len()];

    if !z.is_empty() {
        // Ridge-stabilised least squares on the differenced data; a regressor
        // annihilated by differencing keeps a zero start.
        let k = z.len();
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for i in 0..k {
            for j in 0..k {
                xtx[i][j] = z[i].iter().zip(z[j].iter()).map(|(a, b)| a * b).sum();
            }
            xtx[i][i] += 1e-8;
            xty[i] = z[i].iter().zip(w.iter()).map(|(a, b)| a * b).sum();
        }
        if let Ok(beta) = solve_linear_system(xtx, xty) {
            initial[layout.beta.clone()].copy_from_slice(&beta);
        }
    }

    for (i, slot) in initial[layout.ar.clone()].iter_mut().enumerate() {
        *slot = 0.1 / (i + 1) as f64;
    }
    for (i, slot) in initial[layout.ma.clone()].iter_mut().enumerate() {
        *slot = 0.1 / (i + 1) as f64;
    }
    for (i, slot) in initial[layout.seasonal_ar.clone()].iter_mut().enumerate() {
        *slot = 0.1 / (i + 1) as f64;
    }
    for (i, slot) in initial[layout.seasonal_ma.clone()].iter_mut().enumerate() {
        *slot = 0.1 / (i + 1) as f64;
    }
    initial
}

/// MA(infinity) weights of u_t = sum c_k u_{t-k} + e_t + sum m_j e_{t-j}
fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for k in 1..=j.min(ar.len()) {
            value += ar[k - 1] * psi[j - k];
        }
        psi.push(value);
    }
    psi
}
