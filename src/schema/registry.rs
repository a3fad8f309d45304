// registry.rs - Taxon to cgMLST schema bindings

use std::collections::{BTreeMap, HashMap};

/// Built-in bindings. Several taxa may share a schema (species complexes).
const DEFAULT_BINDINGS: &[(u32, &str)] = &[
    (1280, "staphylococcus_aureus"),
    (1639, "listeria_monocytogenes"),
    (562, "escherichia_coli"),
    (28901, "salmonella_enterica"),
    (197, "campylobacter_jejuni_coli"),
    (195, "campylobacter_jejuni_coli"),
    (573, "klebsiella_pneumoniae"),
    (1463165, "klebsiella_pneumoniae"),
    (244366, "klebsiella_pneumoniae"),
    (470, "acinetobacter_baumannii"),
    (1352, "enterococcus_faecium"),
    (287, "pseudomonas_aeruginosa"),
    (1773, "mycobacterium_tuberculosis"),
    (446, "legionella_pneumophila"),
    (1314, "streptococcus_pyogenes"),
];

/// Immutable taxon id → schema name map, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMap {
    bindings: HashMap<u32, String>,
}

impl SchemaMap {
    /// Map holding the built-in bindings
    pub fn builtin() -> Self {
        Self::from_pairs(DEFAULT_BINDINGS.iter().map(|(t, s)| (*t, s.to_string())))
    }

    pub fn from_pairs<I: IntoIterator<Item = (u32, String)>>(pairs: I) -> Self {
        Self {
            bindings: pairs.into_iter().collect(),
        }
    }

    /// New map with `overrides` added on top (overrides win)
    pub fn with_overrides<I: IntoIterator<Item = (u32, String)>>(&self, overrides: I) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.extend(overrides);
        Self { bindings }
    }

    pub fn get(&self, taxid: u32) -> Option<&str> {
        self.bindings.get(&taxid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Schema name → bound taxids, sorted, for display
    pub fn list_schemas(&self) -> BTreeMap<&str, Vec<u32>> {
        let mut schemas: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for (taxid, schema) in &self.bindings {
            schemas.entry(schema.as_str()).or_default().push(*taxid);
        }
        for taxids in schemas.values_mut() {
            taxids.sort_unstable();
        }
        schemas
    }

    /// Schema bound to the most specific lineage taxon present in the map.
    /// `lineage` runs from most general to most specific.
    pub fn resolve(&self, lineage: &[u32]) -> Option<&str> {
        lineage.iter().rev().find_map(|taxid| self.get(*taxid))
    }
}

impl Default for SchemaMap {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_species_in_lineage() {
        let map = SchemaMap::from_pairs([(1280, "staphylococcus_aureus".to_string())]);
        assert_eq!(map.resolve(&[2, 1280, 9999]), Some("staphylococcus_aureus"));
    }

    #[test]
    fn test_resolve_no_match() {
        let map = SchemaMap::builtin();
        assert_eq!(map.resolve(&[2, 99999]), None);
        assert_eq!(map.resolve(&[]), None);
    }

    #[test]
    fn test_most_specific_binding_wins() {
        let map = SchemaMap::from_pairs([
            (1279, "staphylococcus_genus".to_string()),
            (1280, "staphylococcus_aureus".to_string()),
        ]);
        assert_eq!(map.resolve(&[2, 1279, 1280]), Some("staphylococcus_aureus"));
        assert_eq!(map.resolve(&[2, 1279, 1281]), Some("staphylococcus_genus"));
    }

    #[test]
    fn test_species_complex_shares_schema() {
        let map = SchemaMap::builtin();
        assert_eq!(map.resolve(&[2, 244366]), Some("klebsiella_pneumoniae"));
        assert_eq!(map.resolve(&[2, 573]), Some("klebsiella_pneumoniae"));
        let listed = map.list_schemas();
        assert_eq!(listed["klebsiella_pneumoniae"], vec![573, 244366, 1463165]);
    }

    #[test]
    fn test_overrides_do_not_touch_base() {
        let base = SchemaMap::builtin();
        let custom = base.with_overrides([(1280, "saureus_v2".to_string()), (7, "x".to_string())]);
        assert_eq!(custom.get(1280), Some("saureus_v2"));
        assert_eq!(custom.get(7), Some("x"));
        assert_eq!(base.get(1280), Some("staphylococcus_aureus"));
        assert_eq!(custom.len(), base.len() + 1);
    }
}
