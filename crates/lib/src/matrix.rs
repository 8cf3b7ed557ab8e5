//! Platform matrix.
//!
//! A [`PlatformMatrix`] applies one function per supported platform and memoizes
//! each result independently. Keys are forced lazily: asking for one platform
//! never evaluates (or fails because of) another.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::debug;

use crate::platform::Platform;

type EvalFn<T, E> = Box<dyn Fn(&Platform) -> Result<T, E> + Send + Sync>;

pub struct PlatformMatrix<T, E> {
  cells: BTreeMap<Platform, OnceLock<Result<T, E>>>,
  eval: EvalFn<T, E>,
}

impl<T, E> PlatformMatrix<T, E> {
  /// Create a matrix over `platforms`. Duplicates collapse into one key.
  pub fn new<F>(platforms: impl IntoIterator<Item = Platform>, eval: F) -> Self
  where
    F: Fn(&Platform) -> Result<T, E> + Send + Sync + 'static,
  {
    Self {
      cells: platforms.into_iter().map(|p| (p, OnceLock::new())).collect(),
      eval: Box::new(eval),
    }
  }

  /// The supported platforms, in order.
  pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
    self.cells.keys()
  }

  pub fn contains(&self, platform: &Platform) -> bool {
    self.cells.contains_key(platform)
  }

  /// Result for `platform`, evaluating it on first access.
  ///
  /// Returns `None` if the platform is not part of the matrix.
  pub fn get(&self, platform: &Platform) -> Option<&Result<T, E>> {
    let cell = self.cells.get(platform)?;
    Some(cell.get_or_init(|| {
      debug!(platform = %platform, "evaluating platform");
      (self.eval)(platform)
    }))
  }

  pub fn is_evaluated(&self, platform: &Platform) -> bool {
    self.cells.get(platform).is_some_and(|cell| cell.get().is_some())
  }

  /// Force every platform and yield the results in platform order.
  pub fn evaluate_all(&self) -> impl Iterator<Item = (&Platform, &Result<T, E>)> {
    self.cells.keys().filter_map(|p| self.get(p).map(|r| (p, r)))
  }

  /// Force every platform and take ownership of the results.
  pub fn into_results(self) -> BTreeMap<Platform, Result<T, E>> {
    let Self { cells, eval } = self;
    cells
      .into_iter()
      .map(|(platform, cell)| {
        let result = cell.into_inner().unwrap_or_else(|| eval(&platform));
        (platform, result)
      })
      .collect()
  }
}
