// taxonomy.rs - Taxonomy lookup returning a lineage for a taxon id

use crate::error::{Result, TypingError};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// NCBI root taxon; never part of a returned lineage
pub const ROOT_TAXID: u32 = 1;

/// Source of taxonomic lineages
pub trait TaxonomyService {
    /// Lineage of `taxid`, most general ancestor first, `taxid` itself last.
    /// Unknown taxa return an empty lineage.
    fn lineage(&self, taxid: u32) -> Result<Vec<u32>>;
}

/// Parent map loaded from a nodes file
#[derive(Debug, Default)]
pub struct TaxonomyDb {
    parents: HashMap<u32, u32>,
}

impl TaxonomyDb {
    /// Load `taxid<TAB>parent[<TAB>...]` lines; NCBI `nodes.dmp` (`\t|\t`) also works
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TypingError::io(path, e))?;
        let reader = BufReader::new(file);

        let mut parents = HashMap::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TypingError::io(path, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = trimmed
                .split('\t')
                .map(str::trim)
                .filter(|f| !f.is_empty() && *f != "|");

            let (taxid, parent) = match (fields.next(), fields.next()) {
                (Some(t), Some(p)) => (t, p),
                _ => continue,
            };

            let taxid: u32 = taxid.parse().map_err(|_| {
                TypingError::Taxonomy(format!(
                    "Invalid taxid '{}' at line {} of {}",
                    taxid,
                    line_num + 1,
                    path.display()
                ))
            })?;
            let parent: u32 = parent.parse().map_err(|_| {
                TypingError::Taxonomy(format!(
                    "Invalid parent taxid '{}' at line {} of {}",
                    parent,
                    line_num + 1,
                    path.display()
                ))
            })?;

            parents.insert(taxid, parent);
        }

        log::info!(
            "🌳 Taxonomy loaded: {} nodes from {}",
            parents.len(),
            path.display()
        );
        Ok(Self { parents })
    }

    pub fn from_parents(parents: HashMap<u32, u32>) -> Self {
        Self { parents }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl TaxonomyService for TaxonomyDb {
    fn lineage(&self, taxid: u32) -> Result<Vec<u32>> {
        if !self.parents.contains_key(&taxid) {
            log::warn!("⚠️  Taxid {} not present in taxonomy", taxid);
            return Ok(Vec::new());
        }

        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = taxid;

        while current != ROOT_TAXID {
            if !seen.insert(current) {
                return Err(TypingError::Taxonomy(format!(
                    "Cycle in taxonomy while resolving taxid {} (at {})",
                    taxid, current
                )));
            }
            path.push(current);
            match self.parents.get(&current) {
                Some(&parent) if parent != current => current = parent,
                _ => break,
            }
        }

        path.reverse();
        Ok(path)
    }
}

/// Fixed lineages keyed by taxid
#[derive(Debug, Default, Clone)]
pub struct StaticTaxonomy {
    lineages: HashMap<u32, Vec<u32>>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lineage(mut self, taxid: u32, lineage: Vec<u32>) -> Self {
        self.lineages.insert(taxid, lineage);
        self
    }
}

impl TaxonomyService for StaticTaxonomy {
    fn lineage(&self, taxid: u32) -> Result<Vec<u32>> {
        Ok(self.lineages.get(&taxid).cloned().unwrap_or_default())
    }
}
