use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::common::metric_error::{ErrCode, MetricError, MetricResult};
use crate::math::boll::DEFAULT_BOLL_K;
use crate::table::time_series_table::ADJ_CLOSE;

/// Name token of each metric kind, as it appears in derived column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum MetricTag {
    #[strum(serialize = "MA")]
    Ma,
    #[strum(serialize = "EMA")]
    Ema,
    #[strum(serialize = "SD")]
    Sd,
    #[strum(serialize = "RSI")]
    Rsi,
    #[strum(serialize = "MACD")]
    Macd,
    #[strum(serialize = "Boll")]
    Boll,
    #[strum(serialize = "Returns")]
    Returns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Band {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum MetricKind {
    Returns,
    MovingAverage { window: usize },
    ExpMovingAverage { span: usize },
    StdDev { window: usize },
    Macd { fast: usize, slow: usize },
    Bollinger { window: usize, k: f64 },
    Rsi { window: usize },
}

/// Input of a metric: a column already on the table, another metric, or
/// one band of a Bollinger metric
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Column(String),
    Metric(Box<MetricSpec>),
    Band(Box<MetricSpec>, Band),
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Source::Column(name.to_string())
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Source::Column(name)
    }
}

/// Bollinger specs become their upper band
impl From<MetricSpec> for Source {
    fn from(spec: MetricSpec) -> Self {
        match spec.kind {
            MetricKind::Bollinger { .. } => Source::band(spec, Band::Upper),
            _ => Source::Metric(Box::new(spec)),
        }
    }
}

impl Source {
    pub fn band(spec: MetricSpec, band: Band) -> Self {
        Source::Band(Box::new(spec), band)
    }

    /// Column the metric reads
    pub fn name(&self) -> String {
        match self {
            Source::Column(name) => name.clone(),
            Source::Metric(spec) => spec.name(),
            Source::Band(spec, band) => spec.band_name(*band),
        }
    }

    /// Metric that has to run before this source can be read
    pub fn spec(&self) -> Option<&MetricSpec> {
        match self {
            Source::Column(_) => None,
            Source::Metric(spec) | Source::Band(spec, _) => Some(spec),
        }
    }
}

/// Declarative description of one derived column (two for Bollinger bands)
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub source: Source,
    pub kind: MetricKind,
}

impl MetricSpec {
    pub fn new(source: impl Into<Source>, kind: MetricKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }

    pub fn returns(source: impl Into<Source>) -> Self {
        Self::new(source, MetricKind::Returns)
    }

    pub fn ma(source: impl Into<Source>, window: usize) -> Self {
        Self::new(source, MetricKind::MovingAverage { window })
    }

    pub fn ema(source: impl Into<Source>, span: usize) -> Self {
        Self::new(source, MetricKind::ExpMovingAverage { span })
    }

    pub fn std_dev(source: impl Into<Source>, window: usize) -> Self {
        Self::new(source, MetricKind::StdDev { window })
    }

    pub fn macd(source: impl Into<Source>, fast: usize, slow: usize) -> Self {
        Self::new(source, MetricKind::Macd { fast, slow })
    }

    pub fn bollinger(source: impl Into<Source>, window: usize, k: f64) -> Self {
        Self::new(source, MetricKind::Bollinger { window, k })
    }

    pub fn rsi(source: impl Into<Source>, window: usize) -> Self {
        Self::new(source, MetricKind::Rsi { window })
    }

    /// Primary derived column name
    pub fn name(&self) -> String {
        match self.kind {
            MetricKind::Bollinger { .. } => self.band_name(Band::Upper),
            _ => self.render(),
        }
    }

    /// Every column this spec writes
    pub fn output_names(&self) -> Vec<String> {
        match self.kind {
            MetricKind::Bollinger { .. } => {
                vec![self.band_name(Band::Upper), self.band_name(Band::Lower)]
            }
            _ => vec![self.render()],
        }
    }

    fn render(&self) -> String {
        let src = self.source.name();
        match self.kind {
            MetricKind::Returns if src == ADJ_CLOSE => MetricTag::Returns.to_string(),
            MetricKind::Returns => format!("{src}_{}", MetricTag::Returns),
            MetricKind::MovingAverage { window } => format!("{src}_{}_{window}", MetricTag::Ma),
            MetricKind::ExpMovingAverage { span } => format!("{src}_{}_{span}", MetricTag::Ema),
            MetricKind::StdDev { window } => format!("{src}_{}_{window}", MetricTag::Sd),
            MetricKind::Rsi { window } => format!("{src}_{}_{window}", MetricTag::Rsi),
            MetricKind::Macd { fast, slow } => format!("{src}_{}_{fast}_{slow}", MetricTag::Macd),
            MetricKind::Bollinger { .. } => self.band_name(Band::Upper),
        }
    }

    /// Column name of one Bollinger band. Non-default multipliers are
    /// appended as `_x{k}`.
    pub fn band_name(&self, band: Band) -> String {
        let src = self.source.name();
        match self.kind {
            MetricKind::Bollinger { window, k } if k == DEFAULT_BOLL_K => {
                format!("{src}_{}_{band}_{window}", MetricTag::Boll)
            }
            MetricKind::Bollinger { window, k } => {
                format!("{src}_{}_{band}_{window}_x{k}", MetricTag::Boll)
            }
            _ => self.render(),
        }
    }

    /// Prerequisite metrics, in evaluation order
    pub fn dependencies(&self) -> Vec<MetricSpec> {
        let mut deps = Vec::new();
        if let Some(spec) = self.source.spec() {
            deps.push(spec.clone());
        }

        match self.kind {
            MetricKind::Macd { fast, slow } => {
                deps.push(Self::ema(self.source.clone(), fast));
                deps.push(Self::ema(self.source.clone(), slow));
            }
            MetricKind::Bollinger { window, .. } => {
                deps.push(Self::ma(self.source.clone(), window));
                deps.push(Self::std_dev(self.source.clone(), window));
            }
            _ => {}
        }
        deps
    }

    /// Raw column the whole dependency chain bottoms out in
    pub fn root_column(&self) -> &str {
        match &self.source {
            Source::Column(name) => name,
            Source::Metric(spec) | Source::Band(spec, _) => spec.root_column(),
        }
    }

    /// Recover a spec from a derived column name such as `Close_MACD_12_26`
    /// or `Returns_MA_50`.
    pub fn parse(name: &str) -> MetricResult<Self> {
        let tokens: Vec<&str> = name.split('_').collect();
        parse_tokens(&tokens).ok_or_else(|| {
            MetricError::new(format!("unknown metric {name:?}"), ErrCode::UnknownMetric)
        })
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MetricSpec {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_source(tokens: &[&str]) -> Option<Source> {
    if tokens.is_empty() || tokens.iter().any(|t| t.is_empty()) {
        return None;
    }
    let name = tokens.join("_");
    Some(match parse_tokens(tokens) {
        Some(spec) if is_lower_band(&spec, &name) => Source::band(spec, Band::Lower),
        Some(spec) => spec.into(),
        None => Source::Column(name),
    })
}

fn is_lower_band(spec: &MetricSpec, name: &str) -> bool {
    matches!(spec.kind, MetricKind::Bollinger { .. }) && spec.band_name(Band::Lower) == name
}

fn parse_tokens(tokens: &[&str]) -> Option<MetricSpec> {
    let n = tokens.len();
    let last = *tokens.last()?;

    if let Ok(MetricTag::Returns) = MetricTag::from_str(last) {
        if n == 1 {
            return Some(MetricSpec::returns(ADJ_CLOSE));
        }
        return Some(MetricSpec::returns(parse_source(&tokens[..n - 1])?));
    }

    // Bollinger with an explicit multiplier: <src>_Boll_<band>_<w>_x<k>
    if let Some(k) = last.strip_prefix('x').and_then(|k| k.parse::<f64>().ok()) {
        if n >= 5 && k.is_finite() {
            let window = positive(tokens[n - 2])?;
            Band::from_str(tokens[n - 3]).ok()?;
            if MetricTag::from_str(tokens[n - 4]).ok()? != MetricTag::Boll {
                return None;
            }
            return Some(MetricSpec::bollinger(parse_source(&tokens[..n - 4])?, window, k));
        }
        return None;
    }

    let window = positive(last)?;
    if n < 3 {
        return None;
    }

    if let Some(fast) = positive(tokens[n - 2]) {
        if n >= 4 && MetricTag::from_str(tokens[n - 3]).ok()? == MetricTag::Macd {
            return Some(MetricSpec::macd(parse_source(&tokens[..n - 3])?, fast, window));
        }
        return None;
    }

    if Band::from_str(tokens[n - 2]).is_ok() {
        if n >= 4 && MetricTag::from_str(tokens[n - 3]).ok()? == MetricTag::Boll {
            let source = parse_source(&tokens[..n - 3])?;
            return Some(MetricSpec::bollinger(source, window, DEFAULT_BOLL_K));
        }
        return None;
    }

    let source = parse_source(&tokens[..n - 2])?;
    let spec = match MetricTag::from_str(tokens[n - 2]).ok()? {
        MetricTag::Ma => MetricSpec::ma(source, window),
        MetricTag::Ema => MetricSpec::ema(source, window),
        MetricTag::Sd => MetricSpec::std_dev(source, window),
        MetricTag::Rsi => MetricSpec::rsi(source, window),
        _ => return None,
    };
    Some(spec)
}

fn positive(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|&w| w > 0)
}
