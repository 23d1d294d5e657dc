//! Pool of box display names.
//!
//! Names are drawn without replacement; once every name has been handed out the
//! pool refills itself. Box names stay unique regardless because the box id is
//! appended (`<name>_<id>`).

use anyhow::{anyhow, Result};
use log::{debug, warn};
use rand::Rng;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Used when no names file is present.
pub const DEFAULT_NAMES: [&str; 16] = [
    "pistachio",
    "framboise",
    "citron",
    "cassis",
    "vanille",
    "chocolat",
    "caramel",
    "lavande",
    "rose",
    "cafe",
    "noisette",
    "myrtille",
    "mangue",
    "violette",
    "praline",
    "fraise",
];

#[derive(Debug, Clone)]
pub struct NamePool {
    names: Vec<String>,
    available: Vec<bool>,
}

impl NamePool {
    /// Build a pool from the given names. Blank entries are dropped; an empty list
    /// falls back to [`DEFAULT_NAMES`].
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            names = DEFAULT_NAMES.iter().map(|s| s.to_string()).collect();
        }
        let available = vec![true; names.len()];
        NamePool { names, available }
    }

    /// Read one name per line from `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let pool = Self::new(content.lines());
                debug!("Loaded {} box names from {}", pool.len(), path.display());
                Ok(pool)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Names file {} not found; using {} built-in names",
                    path.display(),
                    DEFAULT_NAMES.len()
                );
                Ok(Self::new(DEFAULT_NAMES))
            }
            Err(e) => Err(anyhow!("Failed reading names file {}: {}", path.display(), e)),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names not yet handed out in the current cycle.
    pub fn available(&self) -> usize {
        self.available.iter().filter(|a| **a).count()
    }

    /// Take a random unused name, refilling the pool first if it ran dry.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let mut free: Vec<usize> = self
            .available
            .iter()
            .enumerate()
            .filter(|(_, a)| **a)
            .map(|(i, _)| i)
            .collect();
        if free.is_empty() {
            debug!("Name pool exhausted; refilling {} names", self.names.len());
            self.available.iter_mut().for_each(|a| *a = true);
            free = (0..self.names.len()).collect();
        }
        let idx = free[rng.gen_range(0..free.len())];
        self.available[idx] = false;
        self.names[idx].clone()
    }

    /// Display name for box `id`.
    pub fn box_name<R: Rng + ?Sized>(&mut self, id: u32, rng: &mut R) -> String {
        format!("{}_{}", self.draw(rng), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn no_repeats_until_exhausted_then_recycles() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = NamePool::new(["a", "b", "c", "d"]);
        let first: HashSet<String> = (0..4).map(|_| pool.draw(&mut rng)).collect();
        assert_eq!(first.len(), 4);
        assert_eq!(pool.available(), 0);

        let second: HashSet<String> = (0..4).map(|_| pool.draw(&mut rng)).collect();
        assert_eq!(second, first);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let pool = NamePool::new(["  x ", "", "\t", "y"]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn empty_input_uses_defaults() {
        let pool = NamePool::new(Vec::<String>::new());
        assert_eq!(pool.len(), DEFAULT_NAMES.len());
    }

    #[test]
    fn box_name_appends_id() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut pool = NamePool::new(["only"]);
        assert_eq!(pool.box_name(12, &mut rng), "only_12");
        assert_eq!(pool.box_name(13, &mut rng), "only_13");
    }
}
