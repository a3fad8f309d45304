// resolve_schema.rs - Show the lineage of a taxon and the schema it resolves to

use cgtyper::cli::Config;
use cgtyper::data::{TaxonomyDb, TaxonomyService};
use cgtyper::schema::SchemaMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 3 && args.len() != 4 {
        eprintln!("Usage: {} <taxonomy_nodes> <taxid> [config.toml]", args[0]);
        eprintln!("Example: {} nodes.dmp 1280", args[0]);
        std::process::exit(1);
    }

    let taxid: u32 = args[2]
        .parse()
        .map_err(|_| format!("Invalid taxid '{}'", args[2]))?;

    let mut schema_map = SchemaMap::builtin();
    if let Some(config_path) = args.get(3) {
        let config = Config::from_file(config_path)?;
        schema_map = schema_map.with_overrides(config.schema_overrides()?);
    }

    println!("📋 Loading taxonomy from {}...", args[1]);
    let taxonomy = TaxonomyDb::from_file(&args[1])?;
    println!("✅ {} taxa loaded", taxonomy.len());

    let lineage = taxonomy.lineage(taxid)?;
    if lineage.is_empty() {
        println!("⚠️  Taxid {} is not in the taxonomy", taxid);
    } else {
        let path: Vec<String> = lineage.iter().map(|t| t.to_string()).collect();
        println!("🌳 Lineage: {}", path.join(" → "));
    }

    match schema_map.resolve(&lineage) {
        Some(schema) => {
            let bound_at = lineage
                .iter()
                .rev()
                .find(|t| schema_map.get(**t) == Some(schema))
                .copied()
                .unwrap_or(taxid);
            println!("📚 Schema: {} (bound at taxid {})", schema, bound_at);
        }
        None => println!("ℹ️  No cgMLST schema for taxid {}", taxid),
    }

    Ok(())
}
