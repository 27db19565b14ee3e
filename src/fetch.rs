//! Range-batched fetching of run and lumisection metadata.
//!
//! [`OmsFetcher`] is the entry point analysis code uses: it splits wide run
//! ranges into requests the service will answer in one page, issues them one
//! after another and stitches the flattened results into a single [`Table`].

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{
    api::OmsApi,
    client::OmsClient,
    config::OmsConfig,
    credentials::OmsCredentials,
    diagnostics::DiagnosticHandlers,
    error::{OmsError, Result},
    models::{AttributeLevel, Filter, QueryResponse, RunRange, Table},
    query::{build_query, describe_filters, QueryParams},
};

/// Split `range` into consecutive windows of `step` runs.
///
/// Windows are `[s, s + step - 1]` for `s = start, start + step, ...` while
/// `s < end`, the last one clamped to `end`. When `end - start` is a multiple
/// of `step` the run `end` itself is not part of any window, and a range with
/// `start == end` yields no windows at all. Use [`subdivide_range_covering`]
/// when every run must be fetched.
///
/// ```rust
/// use oms_link::{subdivide_range, RunRange};
///
/// let windows = subdivide_range(RunRange::new(0, 2500)?, 1000)?;
/// let bounds: Vec<(u64, u64)> = windows.iter().map(|w| (w.start(), w.end())).collect();
/// assert_eq!(bounds, vec![(0, 999), (1000, 1999), (2000, 2500)]);
/// # Ok::<(), oms_link::OmsError>(())
/// ```
pub fn subdivide_range(range: RunRange, step: u64) -> Result<Vec<RunRange>> {
    if step == 0 {
        return Err(OmsError::InvalidStep);
    }

    let mut windows = Vec::new();
    let mut start = range.start();
    while start < range.end() {
        let end = start.saturating_add(step - 1).min(range.end());
        windows.push(RunRange::new(start, end)?);
        match start.checked_add(step) {
            Some(next) => start = next,
            None => break,
        }
    }

    Ok(windows)
}

/// [`subdivide_range`] plus a trailing `[end, end]` window when `end` is not
/// already covered, so the windows span all of `[start, end]`.
///
/// This is the partition [`OmsFetcher::fetch`] uses.
pub fn subdivide_range_covering(range: RunRange, step: u64) -> Result<Vec<RunRange>> {
    let mut windows = subdivide_range(range, step)?;
    if windows.last().map_or(true, |w| w.end() < range.end()) {
        windows.push(RunRange::single(range.end()));
    }
    Ok(windows)
}

/// Fetches OMS metadata as flat tables.
///
/// # Examples
///
/// ```rust,no_run
/// use oms_link::{AttributeLevel, OmsFetcher, RunRange};
///
/// # async fn example() -> oms_link::Result<()> {
/// let fetcher = OmsFetcher::from_env().await?;
/// let runs = fetcher
///     .fetch(
///         AttributeLevel::Runs,
///         RunRange::new(355_100, 362_760)?,
///         &["run_number".to_string(), "recorded_lumi".to_string()],
///         &[],
///     )
///     .await?;
/// println!("{} runs", runs.num_rows());
/// # Ok(())
/// # }
/// ```
pub struct OmsFetcher {
    api: Option<Arc<dyn OmsApi>>,
    diagnostics: DiagnosticHandlers,
    request_pause: Duration,
    last_results: Mutex<HashMap<AttributeLevel, Table>>,
}

impl OmsFetcher {
    /// Fetcher over any [`OmsApi`] implementation.
    pub fn new(api: Arc<dyn OmsApi>) -> Self {
        Self {
            api: Some(api),
            diagnostics: DiagnosticHandlers::default(),
            request_pause: OmsConfig::default().request_pause,
            last_results: Mutex::new(HashMap::new()),
        }
    }

    /// Fetcher over an HTTP client, taking the request pause from its config.
    pub fn from_client(client: OmsClient) -> Self {
        let pause = client.config().request_pause;
        Self::new(Arc::new(client)).with_request_pause(pause)
    }

    /// Fetcher without an API handle. Every query fails with
    /// [`OmsError::ClientNotInitialized`] until [`OmsFetcher::set_api`] is called.
    pub fn detached() -> Self {
        Self {
            api: None,
            diagnostics: DiagnosticHandlers::default(),
            request_pause: OmsConfig::default().request_pause,
            last_results: Mutex::new(HashMap::new()),
        }
    }

    /// Build an HTTP client from `config`, authenticate and wrap it.
    pub async fn connect(config: OmsConfig, credentials: OmsCredentials) -> Result<Self> {
        let client = OmsClient::builder()
            .config(config)
            .credentials(credentials)
            .build()?;
        client.authenticate().await?;
        debug!("[OMS_FETCH] Connected to {}", client.base_url());
        Ok(Self::from_client(client))
    }

    /// [`OmsFetcher::connect`] with configuration and credentials read from
    /// the environment.
    pub async fn from_env() -> Result<Self> {
        Self::connect(OmsConfig::from_env(), OmsCredentials::from_env()).await
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticHandlers) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }

    pub fn set_api(&mut self, api: Arc<dyn OmsApi>) {
        self.api = Some(api);
    }

    pub fn is_connected(&self) -> bool {
        self.api.is_some()
    }

    /// Issue one bounded query and return the raw response.
    pub async fn query(&self, params: &QueryParams) -> Result<QueryResponse> {
        let api = self.api.as_ref().ok_or_else(|| {
            OmsError::ClientNotInitialized(
                "no OMS API handle; construct the fetcher with OmsFetcher::new or OmsFetcher::connect"
                    .into(),
            )
        })?;

        let query = build_query(params, &self.diagnostics);
        debug!(
            "[OMS_QUERY] {} filters={}",
            api.data_query(&query),
            describe_filters(&query.filters)
        );

        let start = Instant::now();
        let response = api.data(&query).await?;
        debug!(
            "[OMS_QUERY] endpoint={} completed in {} ms",
            query.endpoint,
            start.elapsed().as_millis()
        );
        Ok(response)
    }

    /// [`OmsFetcher::query`] followed by flattening.
    pub async fn query_table(&self, params: &QueryParams) -> Result<Table> {
        let response = self.query(params).await?;
        Table::from_response(&response, &params.attributes)
    }

    /// Fetch `attributes` for every run in `range` at the given level.
    ///
    /// `range` is anything convertible into a [`RunRange`], including a single
    /// run number. Ranges wider than the level's range limit are split with
    /// [`subdivide_range_covering`] and fetched sequentially, pausing between
    /// requests.
    pub async fn fetch(
        &self,
        level: AttributeLevel,
        range: impl Into<RunRange>,
        attributes: &[String],
        filters: &[Filter],
    ) -> Result<Table> {
        let range = range.into();
        let entry_limit = level.entry_limit();
        let range_limit = level.range_limit();

        let params_for = |window: RunRange| {
            QueryParams::new(level.endpoint())
                .runs(window)
                .filters(filters.to_vec())
                .attributes(attributes.to_vec())
                .limit(entry_limit)
        };

        let table = if range.span() > range_limit {
            let windows = subdivide_range_covering(range, range_limit)?;
            debug!(
                "[OMS_FETCH] level={} range={} split into {} requests",
                level,
                range,
                windows.len()
            );

            let mut table = Table::with_columns(attributes.to_vec());
            for (i, window) in windows.into_iter().enumerate() {
                if i > 0 && !self.request_pause.is_zero() {
                    tokio::time::sleep(self.request_pause).await;
                }
                let part = self.query_table(&params_for(window)).await?;
                debug!("[OMS_FETCH] window {} returned {} rows", window, part.num_rows());
                table.concat(part);
            }
            table
        } else {
            self.query_table(&params_for(range)).await?
        };

        debug!(
            "[OMS_FETCH] level={} range={} fetched {} rows x {} columns",
            level,
            range,
            table.num_rows(),
            table.num_columns()
        );

        self.last_results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(level, table.clone());

        Ok(table)
    }

    /// Fetch run-level and lumisection-level tables for the same run range.
    pub async fn fetch_runs_and_lumisections(
        &self,
        range: impl Into<RunRange>,
        run_attributes: &[String],
        ls_attributes: &[String],
        run_filters: &[Filter],
        ls_filters: &[Filter],
    ) -> Result<(Table, Table)> {
        let range = range.into();
        let runs = self
            .fetch(AttributeLevel::Runs, range, run_attributes, run_filters)
            .await?;
        let lumisections = self
            .fetch(AttributeLevel::Lumisections, range, ls_attributes, ls_filters)
            .await?;
        Ok((runs, lumisections))
    }

    /// Table returned by the most recent successful [`OmsFetcher::fetch`] at `level`.
    pub fn last_fetch(&self, level: AttributeLevel) -> Option<Table> {
        self.last_results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&level)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(windows: &[RunRange]) -> Vec<(u64, u64)> {
        windows.iter().map(|w| (w.start(), w.end())).collect()
    }

    fn subdivide(start: u64, end: u64, step: u64) -> Vec<(u64, u64)> {
        bounds(&subdivide_range(RunRange::new(start, end).unwrap(), step).unwrap())
    }

    fn covering(start: u64, end: u64, step: u64) -> Vec<(u64, u64)> {
        bounds(&subdivide_range_covering(RunRange::new(start, end).unwrap(), step).unwrap())
    }

    #[test]
    fn test_subdivide_reference_example() {
        assert_eq!(subdivide(0, 2500, 1000), vec![(0, 999), (1000, 1999), (2000, 2500)]);
        assert_eq!(covering(0, 2500, 1000), subdivide(0, 2500, 1000));
    }

    #[test]
    fn test_subdivide_aligned_end_is_left_out() {
        assert_eq!(subdivide(0, 2000, 1000), vec![(0, 999), (1000, 1999)]);
        assert_eq!(subdivide(0, 9, 3), vec![(0, 2), (3, 5), (6, 8)]);
    }

    #[test]
    fn test_covering_adds_aligned_end() {
        assert_eq!(covering(0, 2000, 1000), vec![(0, 999), (1000, 1999), (2000, 2000)]);
        assert_eq!(covering(0, 9, 3), vec![(0, 2), (3, 5), (6, 8), (9, 9)]);
    }

    #[test]
    fn test_subdivide_last_window_one_short() {
        assert_eq!(subdivide(0, 2001, 1000), vec![(0, 999), (1000, 1999), (2000, 2001)]);
        assert_eq!(subdivide(5, 1006, 1000), vec![(5, 1004), (1005, 1006)]);
    }

    #[test]
    fn test_subdivide_degenerate() {
        assert!(subdivide(7, 7, 1000).is_empty());
        assert_eq!(covering(7, 7, 1000), vec![(7, 7)]);
        assert_eq!(subdivide(7, 8, 1000), vec![(7, 8)]);
    }

    #[test]
    fn test_covering_spans_range_exactly() {
        for &(start, end, step) in &[
            (0u64, 12_345u64, 1000u64),
            (355_100, 362_760, 1000),
            (355_100, 362_760, 5000),
            (1, 10, 3),
            (0, 9, 3),
            (100, 103, 1),
        ] {
            let windows = covering(start, end, step);
            assert_eq!(windows.first().unwrap().0, start);
            assert_eq!(windows.last().unwrap().1, end);
            for pair in windows.windows(2) {
                assert_eq!(pair[0].1 + 1, pair[1].0, "gap or overlap in {:?}", windows);
            }
            for (s, e) in &windows {
                assert!(s <= e);
                assert!(e - s < step);
            }
        }
    }

    #[test]
    fn test_subdivide_near_u64_max() {
        let windows = covering(u64::MAX - 5, u64::MAX, 4);
        assert_eq!(windows, vec![(u64::MAX - 5, u64::MAX - 2), (u64::MAX - 1, u64::MAX)]);
    }

    #[test]
    fn test_subdivide_zero_step() {
        let range = RunRange::new(0, 10).unwrap();
        assert!(matches!(subdivide_range(range, 0), Err(OmsError::InvalidStep)));
        assert!(matches!(subdivide_range_covering(range, 0), Err(OmsError::InvalidStep)));
    }

    #[tokio::test]
    async fn test_detached_fetcher_fails() {
        let fetcher = OmsFetcher::detached();
        assert!(!fetcher.is_connected());
        let err = fetcher.query(&QueryParams::new("runs")).await.unwrap_err();
        assert!(matches!(err, OmsError::ClientNotInitialized(_)));

        let err = fetcher
            .fetch(AttributeLevel::Runs, RunRange::single(1), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OmsError::ClientNotInitialized(_)));
        assert!(fetcher.last_fetch(AttributeLevel::Runs).is_none());
    }
}
